use serde::{Deserialize, Serialize};

use super::Event;

/// Stand-in key for reads that did not decode to exactly one character.
pub const PLACEHOLDER: char = ' ';

/// How a single raw read is turned into an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyDecoding {
    /// One character → `Key`, several → `MultiKey`, invalid bytes →
    /// `DecodeError`.
    #[default]
    Distinct,
    /// Anything but exactly one well-formed character collapses to
    /// `Key(PLACEHOLDER)`.
    Legacy,
}

/// Decodes the bytes of one read. Returns `None` only for an empty read in
/// `Distinct` mode.
pub fn decode_input(bytes: &[u8], mode: KeyDecoding) -> Option<Event> {
    let mut text = String::with_capacity(bytes.len());
    let mut invalid = false;
    for chunk in bytes.utf8_chunks() {
        text.push_str(chunk.valid());
        invalid |= !chunk.invalid().is_empty();
    }

    if invalid {
        tracing::warn!(bytes = ?bytes, "could not decode input");
    }

    let mut chars = text.chars();
    let single = match (chars.next(), chars.next()) {
        (Some(ch), None) if !invalid => Some(ch),
        _ => None,
    };

    let event = match mode {
        KeyDecoding::Legacy => Event::Key(single.unwrap_or(PLACEHOLDER)),
        KeyDecoding::Distinct => {
            if invalid {
                Event::DecodeError(bytes.to_vec())
            } else if let Some(ch) = single {
                Event::Key(ch)
            } else if text.is_empty() {
                return None;
            } else {
                Event::MultiKey(text)
            }
        }
    };
    Some(event)
}

#[cfg(test)]
#[path = "../../tests/unit/events/decode.rs"]
mod tests;
