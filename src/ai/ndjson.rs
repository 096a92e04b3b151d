//! Parser for the backend's newline-delimited JSON generation stream.
//!
//! This module provides a line-buffered parser that handles:
//! - Lines split across TCP chunks
//! - Multiple lines in one read
//! - A final line without a trailing newline (flushed by [`FragmentParser::finish`])
//!
//! Each line is one JSON object such as
//! `{"model":"gemma3:12b","response":"Once ","done":false}`.

use serde::Deserialize;

/// Events emitted by the generation stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// A piece of generated text.
    Fragment(String),
    /// The backend marked the generation as done.
    Completed,
    /// The backend reported an error, or a line could not be decoded.
    Error(String),
}

#[derive(Debug, Deserialize)]
struct GenerateChunk {
    #[serde(default)]
    response: String,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    done_reason: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Stateful parser that buffers incomplete lines across chunk boundaries.
#[derive(Debug, Default)]
pub struct FragmentParser {
    buffer: String,
}

impl FragmentParser {
    #[must_use]
    pub fn new() -> Self {
        Self {
            buffer: String::new(),
        }
    }

    /// Feeds a chunk of data and returns the events of every complete line, in order.
    pub fn feed(&mut self, chunk: &str) -> Vec<StreamEvent> {
        self.buffer.push_str(chunk);
        let mut events = Vec::new();

        while let Some(newline) = self.buffer.find('\n') {
            let line: String = self.buffer.drain(..=newline).collect();
            Self::parse_line(&line, &mut events);
        }

        events
    }

    /// Parses whatever is left in the buffer once the byte stream has ended.
    pub fn finish(&mut self) -> Vec<StreamEvent> {
        let rest = std::mem::take(&mut self.buffer);
        let mut events = Vec::new();
        Self::parse_line(&rest, &mut events);
        events
    }

    /// Parses a single line, pushing zero, one or two events.
    fn parse_line(line: &str, events: &mut Vec<StreamEvent>) {
        let line = line.trim();
        if line.is_empty() {
            return;
        }

        let chunk: GenerateChunk = match serde_json::from_str(line) {
            Ok(chunk) => chunk,
            Err(e) => {
                events.push(StreamEvent::Error(format!(
                    "Failed to parse generation fragment: {e}"
                )));
                return;
            }
        };

        if let Some(error) = chunk.error {
            events.push(StreamEvent::Error(error));
            return;
        }

        // The final object may still carry text alongside `done: true`.
        if !chunk.response.is_empty() {
            events.push(StreamEvent::Fragment(chunk.response));
        }

        if chunk.done {
            if let Some(reason) = chunk.done_reason.as_deref()
                && reason != "stop"
            {
                tracing::debug!(done_reason = %reason, "Generation finished with non-stop reason");
            }
            events.push(StreamEvent::Completed);
        }
    }

    /// Returns any remaining buffered data (for debugging/testing).
    #[must_use]
    pub fn remaining_buffer(&self) -> &str {
        &self.buffer
    }
}
