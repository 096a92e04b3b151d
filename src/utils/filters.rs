use crate::core::models::Message;

/// Filters a transcript, dropping posts that are both soft-deleted and empty.
///
/// Order is preserved; deleted posts that still carry text are kept.
#[must_use]
pub fn retain_visible_messages(messages: &[Message]) -> Vec<&Message> {
    messages.iter().filter(|msg| !msg.is_tombstone()).collect()
}
