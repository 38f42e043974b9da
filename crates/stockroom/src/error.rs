//! Error types for Stockroom.

use stockroom_core::{ItemId, TransactionId, ValidationError};
use stockroom_store::{Collection, StoreError};
use thiserror::Error;

use crate::report::ExportError;

/// Errors that can occur during Stockroom operations.
#[derive(Debug, Error)]
pub enum StockroomError {
    /// Validation error.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Item not found.
    #[error("item not found: {0}")]
    ItemNotFound(ItemId),

    /// Transaction not found.
    #[error("transaction not found: {0}")]
    TransactionNotFound(TransactionId),

    /// A dispense asks for more than is on hand.
    #[error("insufficient quantity for item {item_id}: requested {requested}, available {available}")]
    InsufficientQuantity {
        item_id: ItemId,
        requested: u64,
        available: u64,
    },

    /// A record with this id already exists.
    #[error("duplicate key in {collection}: {id}")]
    DuplicateKey { collection: Collection, id: String },

    /// Storage error.
    #[error("storage error: {0}")]
    Store(StoreError),

    /// Export error.
    #[error("export error: {0}")]
    Export(#[from] ExportError),
}

impl StockroomError {
    /// How much a rejected dispense was short by, if that is why it failed.
    pub fn shortfall(&self) -> Option<u64> {
        match self {
            StockroomError::InsufficientQuantity {
                requested,
                available,
                ..
            } => Some(requested.saturating_sub(*available)),
            _ => None,
        }
    }
}

impl From<StoreError> for StockroomError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateKey { collection, id } => {
                StockroomError::DuplicateKey { collection, id }
            }
            other => StockroomError::Store(other),
        }
    }
}

/// Result type for Stockroom operations.
pub type Result<T> = std::result::Result<T, StockroomError>;
