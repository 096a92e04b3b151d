//! Transcript helpers

pub mod filters;

pub use filters::retain_visible_messages;
