//! # Error Types
//!
//! Defines the validation and decoding errors shared by both sides of the bus.

use thiserror::Error;

/// An item identifier that does not follow the `item<1..=30>` rule.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ItemError {
    /// The name does not start with the `item` prefix.
    #[error("Unexpected item {name}: missing '{prefix}' prefix")]
    MissingPrefix { name: String, prefix: &'static str },

    /// The suffix after the prefix is not a decimal integer.
    #[error("Unexpected item {name}: non-numeric item id")]
    NonNumeric { name: String },

    /// The numeric id is outside the admitted range.
    #[error("Unexpected item {name}: id {id} outside {min}..={max}")]
    OutOfRange { name: String, id: u32, min: u32, max: u32 },
}

impl ItemError {
    /// The rejected item name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::MissingPrefix { name, .. }
            | Self::NonNumeric { name }
            | Self::OutOfRange { name, .. } => name,
        }
    }
}

/// A control string received on the request channel that cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ControlParseError {
    /// The text does not start with a known command.
    #[error("Unknown control request: {0}")]
    UnknownCommand(String),

    /// A subscribe/unsubscribe request lacks the `_` separator.
    #[error("Control request {0} has no '_' separator")]
    MissingSeparator(String),

    /// The part after `_` is not a valid subscription id.
    #[error("Control request {text} carries an invalid subscription id")]
    InvalidSubscriptionId { text: String },

    /// The item part is not a valid item name.
    #[error("Control request carries an invalid item: {0}")]
    InvalidItem(#[from] ItemError),
}

/// A payload on the update channel that cannot be decoded or encoded.
#[derive(Debug, Error)]
pub enum WireError {
    /// JSON (de)serialization failed.
    #[error("Malformed bus message: {0}")]
    Json(#[from] serde_json::Error),

    /// The request channel carried bytes that are not UTF-8 text.
    #[error("Control request is not valid UTF-8")]
    NotText,
}
