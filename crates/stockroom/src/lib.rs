//! # Stockroom
//!
//! Inventory tracking for a single establishment: stock items, a ledger of
//! stock movements, and the reports built from them.
//!
//! ## Overview
//!
//! - **Items**: stock-keeping units with an on-hand quantity and a
//!   low-stock threshold
//! - **Transactions**: immutable records of stock moving out to a
//!   department (dispense) or back in (receive)
//! - **Queries**: low stock, per-department and per-item summaries,
//!   daily activity and dashboard numbers
//! - **Exports**: dispense receipts and inventory reports, rendered as
//!   bilingual text or JSON
//!
//! ## Key Guarantees
//!
//! - On-hand quantity never goes negative.
//! - A dispense either applies every line or changes nothing.
//! - The ledger is append-only.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use chrono::Utc;
//! use stockroom::{DispenseRequest, NewItem, Stockroom, StockroomConfig, TransactionLine};
//! use stockroom::store::SqliteStore;
//!
//! async fn example() -> stockroom::Result<()> {
//!     let store = SqliteStore::open("stockroom.db")?;
//!     let stockroom = Stockroom::new(store, StockroomConfig::default());
//!
//!     let rice = stockroom
//!         .add_item(NewItem::new("Rice", "أرز", "Food").quantity(10).min_quantity(2))
//!         .await?;
//!
//!     let request = DispenseRequest::new("Kitchen", Utc::now())
//!         .line(TransactionLine::new(rice.clone(), 4));
//!     let transaction_id = stockroom.dispense(request).await?;
//!
//!     let receipt = stockroom.receipt(&transaction_id).await?;
//!     println!("{}", stockroom.render_receipt(&receipt, &stockroom::TextRenderer::default())?);
//!     Ok(())
//! }
//! ```
//!
//! ## Re-exports
//!
//! - `stockroom::core` - Items, transactions, validation and projections
//! - `stockroom::store` - Storage abstraction, SQLite and in-memory stores

pub mod config;
pub mod error;
pub mod ledger;
pub mod report;

// Re-export component crates
pub use stockroom_core as core;
pub use stockroom_store as store;

// Re-export main types for convenience
pub use config::StockroomConfig;
pub use error::{Result, StockroomError};
pub use ledger::Stockroom;
pub use report::{
    DispenseReceipt, ExportError, InventoryReport, JsonRenderer, ReceiptLine, Renderer,
    TextRenderer,
};

// Re-export commonly used core types
pub use stockroom_core::{
    Capacity, DailyCount, DashboardStats, DateRange, DepartmentSummary, Direction,
    DispenseRequest, Item, ItemChanges, ItemId, ItemSummary, Language, NewItem, ReceiveRequest,
    StockLevel, Transaction, TransactionId, TransactionLine, ValidationError, MAX_QUANTITY,
};
