//! Test fixtures and helpers.
//!
//! Common setup code for integration and property tests.

use std::collections::HashMap;
use std::path::Path;

use chrono::Utc;
use stockroom::{Result, Stockroom, StockroomConfig};
use stockroom_core::{DispenseRequest, ItemId, NewItem, TransactionLine};
use stockroom_store::{MemoryStore, SqliteStore, Store};

/// A stockroom ready for tests.
pub struct TestFixture<S: Store = MemoryStore> {
    pub stockroom: Stockroom<S>,
}

impl TestFixture<MemoryStore> {
    /// Create a fixture over an empty in-memory store.
    pub fn new() -> Self {
        Self::with_store(MemoryStore::new())
    }
}

impl Default for TestFixture<MemoryStore> {
    fn default() -> Self {
        Self::new()
    }
}

impl TestFixture<SqliteStore> {
    /// Create a fixture over an in-memory SQLite database.
    pub fn sqlite() -> stockroom_store::Result<Self> {
        Ok(Self::with_store(SqliteStore::open_memory()?))
    }

    /// Create a fixture over a SQLite file.
    pub fn sqlite_at(path: impl AsRef<Path>) -> stockroom_store::Result<Self> {
        Ok(Self::with_store(SqliteStore::open(path)?))
    }
}

impl<S: Store> TestFixture<S> {
    pub fn with_store(store: S) -> Self {
        Self {
            stockroom: Stockroom::new(store, StockroomConfig::default()),
        }
    }

    /// Add an item named `name` with the given stock and threshold.
    pub async fn seed_item(&self, name: &str, quantity: u64, min_quantity: u64) -> Result<ItemId> {
        self.stockroom
            .add_item(
                NewItem::new(name, format!("{name} (ar)"), "General")
                    .quantity(quantity)
                    .min_quantity(min_quantity),
            )
            .await
    }

    /// Add several items, returning their ids in order.
    pub async fn seed_items(&self, items: &[NewItem]) -> Result<Vec<ItemId>> {
        let mut ids = Vec::with_capacity(items.len());
        for item in items {
            ids.push(self.stockroom.add_item(item.clone()).await?);
        }
        Ok(ids)
    }

    /// Current on-hand quantity of an item.
    pub async fn quantity(&self, id: &ItemId) -> Result<Option<u64>> {
        Ok(self.stockroom.get_item(id).await?.map(|item| item.quantity))
    }

    /// On-hand quantity of every item.
    pub async fn snapshot(&self) -> Result<HashMap<ItemId, u64>> {
        Ok(self
            .stockroom
            .list_items()
            .await?
            .into_iter()
            .map(|item| (item.id, item.quantity))
            .collect())
    }
}

/// Build a request dated now from `(item, quantity)` pairs.
pub fn request(department: &str, lines: &[(&ItemId, u64)]) -> DispenseRequest {
    lines.iter().fold(
        DispenseRequest::new(department, Utc::now()),
        |request, (id, quantity)| request.line(TransactionLine::new((*id).clone(), *quantity)),
    )
}
