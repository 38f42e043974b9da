//! In-memory implementation of the Store trait.
//!
//! This is primarily for testing. It has the same semantics as SQLite
//! but keeps everything in memory with no persistence.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use stockroom_core::{truncate_millis, Item, ItemId, Transaction, TransactionId};

use crate::error::{Result, StoreError};
use crate::traits::{plan_movement, Collection, MovementPlan, MovementResult, Store};

/// In-memory store implementation.
///
/// All data is lost when the store is dropped. Thread-safe via RwLock.
pub struct MemoryStore {
    inner: RwLock<MemoryStoreInner>,
}

#[derive(Default)]
struct MemoryStoreInner {
    items: HashMap<ItemId, Item>,
    transactions: HashMap<TransactionId, Transaction>,
}

impl MemoryStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(MemoryStoreInner::default()),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, MemoryStoreInner>> {
        self.inner
            .read()
            .map_err(|e| StoreError::Poisoned(e.to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, MemoryStoreInner>> {
        self.inner
            .write()
            .map_err(|e| StoreError::Poisoned(e.to_string()))
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn sorted_items(mut items: Vec<Item>) -> Vec<Item> {
    items.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
    items
}

fn sorted_transactions(mut transactions: Vec<Transaction>) -> Vec<Transaction> {
    transactions.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.id.cmp(&b.id)));
    transactions
}

#[async_trait]
impl Store for MemoryStore {
    async fn get_item(&self, id: &ItemId) -> Result<Option<Item>> {
        Ok(self.read()?.items.get(id).cloned())
    }

    async fn put_item(&self, item: &Item) -> Result<()> {
        self.write()?.items.insert(item.id.clone(), item.clone());
        Ok(())
    }

    async fn add_item(&self, item: &Item) -> Result<()> {
        let mut inner = self.write()?;
        if inner.items.contains_key(&item.id) {
            return Err(StoreError::DuplicateKey {
                collection: Collection::Items,
                id: item.id.to_string(),
            });
        }
        inner.items.insert(item.id.clone(), item.clone());
        Ok(())
    }

    async fn delete_item(&self, id: &ItemId) -> Result<bool> {
        Ok(self.write()?.items.remove(id).is_some())
    }

    async fn list_items(&self) -> Result<Vec<Item>> {
        let items = self.read()?.items.values().cloned().collect();
        Ok(sorted_items(items))
    }

    async fn items_by_category(&self, category: &str) -> Result<Vec<Item>> {
        let items = self
            .read()?
            .items
            .values()
            .filter(|item| item.category == category)
            .cloned()
            .collect();
        Ok(sorted_items(items))
    }

    async fn get_transaction(&self, id: &TransactionId) -> Result<Option<Transaction>> {
        Ok(self.read()?.transactions.get(id).cloned())
    }

    async fn add_transaction(&self, transaction: &Transaction) -> Result<()> {
        let mut inner = self.write()?;
        if inner.transactions.contains_key(&transaction.id) {
            return Err(StoreError::DuplicateKey {
                collection: Collection::Transactions,
                id: transaction.id.to_string(),
            });
        }
        inner
            .transactions
            .insert(transaction.id.clone(), transaction.clone());
        Ok(())
    }

    async fn list_transactions(&self) -> Result<Vec<Transaction>> {
        let transactions = self.read()?.transactions.values().cloned().collect();
        Ok(sorted_transactions(transactions))
    }

    async fn transactions_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Transaction>> {
        let start = truncate_millis(start);
        let transactions = self
            .read()?
            .transactions
            .values()
            .filter(|t| start <= t.date && t.date <= end)
            .cloned()
            .collect();
        Ok(sorted_transactions(transactions))
    }

    async fn transactions_by_department(&self, department: &str) -> Result<Vec<Transaction>> {
        let transactions = self
            .read()?
            .transactions
            .values()
            .filter(|t| t.department == department)
            .cloned()
            .collect();
        Ok(sorted_transactions(transactions))
    }

    async fn apply_movement(
        &self,
        transaction: &Transaction,
        updated_at: DateTime<Utc>,
    ) -> Result<MovementResult> {
        let mut inner = self.write()?;

        if inner.transactions.contains_key(&transaction.id) {
            return Ok(MovementResult::DuplicateTransaction);
        }

        let plan = plan_movement(transaction, |id| {
            Ok(inner.items.get(id).map(|item| item.quantity))
        })?;
        let updates = match plan {
            MovementPlan::Apply(updates) => updates,
            MovementPlan::Reject(rejected) => return Ok(rejected),
        };

        for (item_id, quantity) in updates {
            if let Some(item) = inner.items.get_mut(&item_id) {
                item.quantity = quantity;
                item.last_updated = truncate_millis(updated_at);
            }
        }
        inner
            .transactions
            .insert(transaction.id.clone(), transaction.clone());

        tracing::debug!(
            transaction_id = %transaction.id,
            direction = %transaction.direction,
            lines = transaction.lines.len(),
            "movement applied"
        );
        Ok(MovementResult::Applied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stockroom_core::{Direction, MovementRequest, NewItem, TransactionLine};

    fn make_item(id: &str, quantity: u64) -> Item {
        let new = NewItem::new(format!("Item {id}"), format!("صنف {id}"), "General")
            .quantity(quantity)
            .min_quantity(2);
        Item::from_new(ItemId::from(id), new, Utc::now())
    }

    fn make_txn(id: &str, direction: Direction, lines: &[(&str, u64)]) -> Transaction {
        let mut request = MovementRequest::new("Kitchen", Utc::now());
        for (item_id, quantity) in lines {
            request = request.line(TransactionLine::new(*item_id, *quantity));
        }
        Transaction::from_request(TransactionId::from(id), direction, request)
    }

    #[tokio::test]
    async fn test_memory_store_basic() {
        let store = MemoryStore::new();
        let item = make_item("A", 10);

        store.add_item(&item).await.unwrap();
        let retrieved = store.get_item(&item.id).await.unwrap().unwrap();
        assert_eq!(retrieved, item);

        assert!(store.delete_item(&item.id).await.unwrap());
        assert!(!store.delete_item(&item.id).await.unwrap());
        assert!(store.get_item(&item.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_memory_store_duplicate_key() {
        let store = MemoryStore::new();
        let item = make_item("A", 10);
        store.add_item(&item).await.unwrap();

        let err = store.add_item(&item).await.unwrap_err();
        assert!(matches!(
            err,
            StoreError::DuplicateKey {
                collection: Collection::Items,
                ..
            }
        ));

        // put overwrites instead
        let mut edited = item.clone();
        edited.quantity = 3;
        store.put_item(&edited).await.unwrap();
        assert_eq!(store.get_item(&item.id).await.unwrap().unwrap().quantity, 3);
    }

    #[tokio::test]
    async fn test_memory_store_movement_all_or_nothing() {
        let store = MemoryStore::new();
        store.add_item(&make_item("A", 10)).await.unwrap();
        store.add_item(&make_item("B", 1)).await.unwrap();

        let txn = make_txn("t1", Direction::Out, &[("A", 4), ("B", 2)]);
        let result = store.apply_movement(&txn, Utc::now()).await.unwrap();
        assert_eq!(
            result,
            MovementResult::Insufficient {
                item_id: ItemId::from("B"),
                requested: 2,
                available: 1,
            }
        );
        assert_eq!(store.get_item(&ItemId::from("A")).await.unwrap().unwrap().quantity, 10);
        assert!(store.list_transactions().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_memory_store_movement_applied() {
        let store = MemoryStore::new();
        store.add_item(&make_item("A", 10)).await.unwrap();

        let txn = make_txn("t1", Direction::Out, &[("A", 4)]);
        let at = Utc::now();
        assert_eq!(
            store.apply_movement(&txn, at).await.unwrap(),
            MovementResult::Applied
        );
        let item = store.get_item(&ItemId::from("A")).await.unwrap().unwrap();
        assert_eq!(item.quantity, 6);
        assert_eq!(item.last_updated, truncate_millis(at));
        assert_eq!(store.get_transaction(&txn.id).await.unwrap(), Some(txn.clone()));

        assert_eq!(
            store.apply_movement(&txn, at).await.unwrap(),
            MovementResult::DuplicateTransaction
        );
        assert_eq!(store.get_item(&ItemId::from("A")).await.unwrap().unwrap().quantity, 6);
    }

    #[tokio::test]
    async fn test_memory_store_indexes() {
        let store = MemoryStore::new();
        let mut soap = make_item("S", 1);
        soap.category = "Cleaning".into();
        store.add_item(&soap).await.unwrap();
        store.add_item(&make_item("A", 1)).await.unwrap();

        let cleaning = store.items_by_category("Cleaning").await.unwrap();
        assert_eq!(cleaning, vec![soap]);

        let mut laundry = make_txn("t2", Direction::Out, &[("A", 1)]);
        laundry.department = "Laundry".into();
        store.add_transaction(&laundry).await.unwrap();
        store
            .add_transaction(&make_txn("t1", Direction::Out, &[("A", 1)]))
            .await
            .unwrap();

        let found = store.transactions_by_department("Laundry").await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, TransactionId::from("t2"));
    }
}
