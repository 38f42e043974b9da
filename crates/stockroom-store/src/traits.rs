//! Store trait: the abstract interface for item and ledger persistence.
//!
//! This trait allows the ledger to be storage-agnostic. Implementations
//! include SQLite (primary) and in-memory (for tests).

use std::collections::HashMap;
use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockroom_core::{item_totals, Item, ItemId, Transaction, TransactionId};

use crate::error::Result;

/// The persisted record collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Collection {
    Items,
    Transactions,
}

impl Collection {
    pub const fn as_str(self) -> &'static str {
        match self {
            Collection::Items => "items",
            Collection::Transactions => "transactions",
        }
    }

    /// Secondary indexes maintained for this collection.
    pub const fn indexes(self) -> &'static [&'static str] {
        match self {
            Collection::Items => &["by-category"],
            Collection::Transactions => &["by-date", "by-department"],
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of committing a stock movement.
///
/// Anything other than `Applied` means nothing was written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MovementResult {
    /// Quantities were updated and the transaction appended.
    Applied,
    /// A transaction with this id is already in the ledger.
    DuplicateTransaction,
    /// A line names an item that does not exist.
    ItemMissing(ItemId),
    /// An `out` movement asks for more than is on hand.
    Insufficient {
        item_id: ItemId,
        requested: u64,
        available: u64,
    },
    /// An `in` movement would overflow the on-hand quantity.
    Overflow(ItemId),
}

/// The Store trait: async interface for persistence.
///
/// All methods are async to support both sync (SQLite) and async backends.
/// For SQLite, we use `spawn_blocking` internally to avoid blocking the runtime.
///
/// # Design Notes
///
/// - **Strict inserts**: `add_*` fails with `DuplicateKey` if the id exists;
///   `put_item` overwrites.
/// - **Append-only ledger**: there is no update or delete for transactions.
/// - **Atomic movements**: `apply_movement` re-checks stock and commits all
///   quantity changes together with the transaction record, or nothing.
#[async_trait]
pub trait Store: Send + Sync {
    // ─────────────────────────────────────────────────────────────────────────
    // Item Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Get an item by id.
    async fn get_item(&self, id: &ItemId) -> Result<Option<Item>>;

    /// Insert or overwrite an item by id.
    async fn put_item(&self, item: &Item) -> Result<()>;

    /// Insert a new item. Fails with `DuplicateKey` if the id exists.
    async fn add_item(&self, item: &Item) -> Result<()>;

    /// Delete an item. Returns whether a record was removed.
    async fn delete_item(&self, id: &ItemId) -> Result<bool>;

    /// All items, ordered by name.
    async fn list_items(&self) -> Result<Vec<Item>>;

    /// Items in a category (`by-category` index), ordered by name.
    async fn items_by_category(&self, category: &str) -> Result<Vec<Item>>;

    // ─────────────────────────────────────────────────────────────────────────
    // Transaction Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Get a transaction by id.
    async fn get_transaction(&self, id: &TransactionId) -> Result<Option<Transaction>>;

    /// Append a transaction without touching stock.
    ///
    /// Fails with `DuplicateKey` if the id exists.
    async fn add_transaction(&self, transaction: &Transaction) -> Result<()>;

    /// All transactions, ordered by date ascending.
    async fn list_transactions(&self) -> Result<Vec<Transaction>>;

    /// Transactions with `start <= date <= end` (`by-date` index), ordered by date.
    async fn transactions_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Transaction>>;

    /// Transactions for a department (`by-department` index), ordered by date.
    async fn transactions_by_department(&self, department: &str) -> Result<Vec<Transaction>>;

    // ─────────────────────────────────────────────────────────────────────────
    // Movement Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Apply a stock movement atomically.
    ///
    /// Re-validates every per-item total against current stock, applies the
    /// deltas, stamps `last_updated` with `updated_at` and appends the
    /// transaction, all in one unit.
    async fn apply_movement(
        &self,
        transaction: &Transaction,
        updated_at: DateTime<Utc>,
    ) -> Result<MovementResult>;
}

/// Extension trait for common store patterns.
pub trait StoreExt: Store {
    /// Fetch the items named by `ids`, skipping ids that no longer exist.
    fn resolve_items<'a>(
        &'a self,
        ids: &'a [ItemId],
    ) -> impl std::future::Future<Output = Result<HashMap<ItemId, Item>>> + Send + 'a;
}

impl<S: Store + ?Sized> StoreExt for S {
    async fn resolve_items<'a>(&'a self, ids: &'a [ItemId]) -> Result<HashMap<ItemId, Item>> {
        let mut resolved = HashMap::new();
        for id in ids {
            if resolved.contains_key(id) {
                continue;
            }
            if let Some(item) = self.get_item(id).await? {
                resolved.insert(id.clone(), item);
            }
        }
        Ok(resolved)
    }
}

/// New quantities to write, or the reason the movement is rejected.
pub(crate) enum MovementPlan {
    Apply(Vec<(ItemId, u64)>),
    Reject(MovementResult),
}

/// Work out the post-movement quantity of every item the transaction names.
///
/// `on_hand` looks up the current quantity of an item, `None` if missing.
pub(crate) fn plan_movement<F>(transaction: &Transaction, mut on_hand: F) -> Result<MovementPlan>
where
    F: FnMut(&ItemId) -> Result<Option<u64>>,
{
    let totals = match item_totals(&transaction.lines) {
        Ok(totals) => totals,
        Err(stockroom_core::ValidationError::QuantityOverflow { item_id }) => {
            return Ok(MovementPlan::Reject(MovementResult::Overflow(item_id)));
        }
        Err(e) => return Err(crate::error::StoreError::InvalidData(e.to_string())),
    };

    let mut updates = Vec::with_capacity(totals.len());
    for (item_id, requested) in totals {
        let Some(available) = on_hand(&item_id)? else {
            return Ok(MovementPlan::Reject(MovementResult::ItemMissing(item_id)));
        };
        match transaction.direction.apply(available, requested) {
            Some(quantity) => updates.push((item_id, quantity)),
            None if transaction.is_dispense() => {
                return Ok(MovementPlan::Reject(MovementResult::Insufficient {
                    item_id,
                    requested,
                    available,
                }));
            }
            None => return Ok(MovementPlan::Reject(MovementResult::Overflow(item_id))),
        }
    }

    Ok(MovementPlan::Apply(updates))
}
