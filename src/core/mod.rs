//! Configuration, request context and data model shared by every layer

pub mod config;
pub mod context;
pub mod models;

pub use config::{AppConfig, SummaryLanguage};
pub use context::{Interrupted, RequestContext};
pub use models::{Message, User};
