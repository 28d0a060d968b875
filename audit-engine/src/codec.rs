//! Stored message encoding
//!
//! An audit message is persisted either as the plain base message, or as the
//! base message followed by a single delimiter character and a JSON object of
//! string parameters:
//!
//! ```text
//! message~{"encounterUuid":"81f57a25-3f10-11e4-821f-0800271c1b75","encounterType":"REG"}
//! ```
//!
//! Parameter keys keep the insertion order supplied by the caller. A base
//! message that already contains the delimiter is stored as-is; decoding such a
//! value splits at the first delimiter and is therefore ambiguous. No escaping
//! is applied.

use indexmap::IndexMap;

use crate::error::Result;

/// Reserved separator between the base message and its parameters.
pub const DEFAULT_MESSAGE_DELIMITER: char = '~';

/// Named message parameters, iterated in insertion order.
pub type MessageParams = IndexMap<String, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageCodec {
    delimiter: char,
}

impl MessageCodec {
    pub fn new(delimiter: char) -> Self {
        Self { delimiter }
    }

    pub fn delimiter(&self) -> char {
        self.delimiter
    }

    /// Encode a base message and its parameters into the stored form.
    ///
    /// Empty parameters leave the message untouched.
    pub fn encode(&self, message: &str, params: &MessageParams) -> Result<String> {
        if params.is_empty() {
            return Ok(message.to_string());
        }

        let encoded_params = serde_json::to_string(params)?;
        let mut stored = String::with_capacity(message.len() + 1 + encoded_params.len());
        stored.push_str(message);
        stored.push(self.delimiter);
        stored.push_str(&encoded_params);
        Ok(stored)
    }

    /// Split a stored message back into its base message and parameters.
    ///
    /// A stored value without the delimiter, or whose tail is not a JSON
    /// object of strings, decodes to the whole value with no parameters.
    pub fn decode(&self, stored: &str) -> (String, MessageParams) {
        let Some((message, tail)) = stored.split_once(self.delimiter) else {
            return (stored.to_string(), MessageParams::new());
        };

        match serde_json::from_str::<MessageParams>(tail) {
            Ok(params) => (message.to_string(), params),
            Err(_) => (stored.to_string(), MessageParams::new()),
        }
    }
}

impl Default for MessageCodec {
    fn default() -> Self {
        Self::new(DEFAULT_MESSAGE_DELIMITER)
    }
}
