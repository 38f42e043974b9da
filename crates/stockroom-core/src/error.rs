//! Error types for Stockroom Core.

use thiserror::Error;

use crate::types::ItemId;

/// Errors from decoding core values.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    #[error("identifier must not be empty")]
    EmptyId,

    #[error("unknown transaction direction: {0}")]
    UnknownDirection(String),
}

/// Validation errors for user-supplied items and movement requests.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("required field `{0}` is empty")]
    EmptyField(&'static str),

    #[error("request has no lines")]
    NoLines,

    #[error("line {line} for item {item_id} has zero quantity")]
    ZeroQuantity { line: usize, item_id: ItemId },

    #[error("quantity for item {item_id} overflows")]
    QuantityOverflow { item_id: ItemId },

    #[error("`{field}` of {value} exceeds the largest storable quantity")]
    QuantityOutOfRange { field: &'static str, value: u64 },
}
