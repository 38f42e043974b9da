//! # Stockroom Core
//!
//! Pure primitives for Stockroom: stock items, ledger transactions, input
//! validation and the read-side projections used for dashboards and reports.
//!
//! This crate contains no I/O and no storage. Everything here is plain
//! computation over owned records, so the same rules apply whichever store
//! backend holds the data.
//!
//! ## Key Types
//!
//! - [`Item`] - A stock-keeping unit with on-hand quantity and threshold
//! - [`Transaction`] - An immutable record of a stock movement
//! - [`Direction`] - Whether a transaction dispenses (`out`) or receives (`in`)
//! - [`ItemId`] / [`TransactionId`] - String identifiers, UUID v4 when generated
//!
//! ## Queries
//!
//! All aggregation lives in the [`query`] module and operates on slices.

pub mod error;
pub mod item;
pub mod query;
pub mod transaction;
pub mod types;
pub mod validation;

pub use error::{CoreError, ValidationError};
pub use item::{Capacity, Item, ItemChanges, NewItem};
pub use query::{
    DailyCount, DashboardStats, DateRange, DepartmentSummary, ItemSummary, Language, StockLevel,
};
pub use transaction::{
    Direction, DispenseRequest, MovementRequest, ReceiveRequest, Transaction, TransactionLine,
};
pub use types::{truncate_millis, ItemId, TransactionId, MAX_QUANTITY};
pub use validation::{item_totals, validate_changes, validate_new_item, validate_request};
