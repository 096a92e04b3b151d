//! Transcript summarization on top of a [`Provider`](crate::ai::Provider)

pub mod service;
pub mod users;

pub use service::SummaryService;
pub use users::{StaticUserDirectory, UserProvider};
