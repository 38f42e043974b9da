//! # Stockroom Store
//!
//! Storage abstraction for Stockroom. Provides a trait-based interface for
//! item and transaction persistence with SQLite and in-memory
//! implementations.
//!
//! ## Overview
//!
//! The store module abstracts persistence behind the [`Store`] trait, so
//! the ledger never depends on a particular engine. The primary
//! implementation is [`SqliteStore`], with [`MemoryStore`] for testing.
//!
//! ## Key Types
//!
//! - [`Store`] - The async trait for all storage operations
//! - [`SqliteStore`] - SQLite-based persistent storage
//! - [`MemoryStore`] - In-memory storage for tests
//! - [`MovementResult`] - Outcome of committing a stock movement
//! - [`Collection`] - The persisted record collections
//!
//! ## Usage
//!
//! ```rust,no_run
//! use stockroom_store::{SqliteStore, Store};
//!
//! async fn example() {
//!     // Open a SQLite database
//!     let store = SqliteStore::open("stockroom.db").unwrap();
//!
//!     // Or use an in-memory database for testing
//!     let store = SqliteStore::open_memory().unwrap();
//!
//!     let items = store.list_items().await.unwrap();
//!     assert!(items.is_empty());
//! }
//! ```
//!
//! ## Design Notes
//!
//! - **Strict inserts**: adding a record whose id exists fails with `DuplicateKey`
//! - **Append-only ledger**: transactions can be added and read, never changed
//! - **Atomic movements**: stock deltas and the transaction record commit together

pub mod error;
pub mod memory;
pub mod migration;
pub mod sqlite;
pub mod traits;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::{Collection, MovementResult, Store, StoreExt};
