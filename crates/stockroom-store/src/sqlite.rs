//! SQLite implementation of the Store trait.
//!
//! This is the primary storage backend for Stockroom. It uses rusqlite with
//! bundled SQLite, wrapped in async via tokio::spawn_blocking.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension};

use stockroom_core::{Capacity, Direction, Item, ItemId, Transaction, TransactionId, TransactionLine};

use crate::error::{Result, StoreError};
use crate::migration;
use crate::traits::{plan_movement, Collection, MovementPlan, MovementResult, Store};

const ITEM_COLUMNS: &str = "id, name, name_ar, quantity, min_quantity, category, unit,
                            capacity_value, capacity_unit, last_updated";

const TRANSACTION_COLUMNS: &str = "id, direction, department, date, lines";

/// SQLite-based store implementation.
///
/// Thread-safe via internal Mutex. All operations use spawn_blocking
/// to avoid blocking the async runtime.
pub struct SqliteStore {
    /// The SQLite connection, protected by a mutex.
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open a SQLite database at the given path.
    ///
    /// Creates the file and runs migrations if it doesn't exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let mut conn = Connection::open(path)?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory SQLite database.
    ///
    /// Useful for testing.
    pub fn open_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Close the connection, flushing any pending state.
    pub fn close(self) -> Result<()> {
        let conn = Arc::try_unwrap(self.conn)
            .map_err(|_| StoreError::InvalidData("connection is still in use".into()))?
            .into_inner()
            .map_err(|e| StoreError::Poisoned(e.to_string()))?;
        conn.close().map_err(|(_, e)| StoreError::Database(e))
    }

    /// Run a blocking operation on the connection off the async runtime.
    async fn run<F, T>(&self, op: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);

        tokio::task::spawn_blocking(move || {
            let mut conn = conn
                .lock()
                .map_err(|e| StoreError::Poisoned(e.to_string()))?;
            op(&mut conn)
        })
        .await
        .map_err(|e| StoreError::Task(format!("spawn_blocking failed: {}", e)))?
    }
}

fn to_sql_quantity(quantity: u64) -> Result<i64> {
    i64::try_from(quantity)
        .map_err(|_| StoreError::InvalidData(format!("quantity {} exceeds storage range", quantity)))
}

fn from_sql_quantity(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<u64> {
    let value: i64 = row.get(idx)?;
    u64::try_from(value).map_err(|_| rusqlite::Error::IntegralValueOutOfRange(idx, value))
}

fn from_sql_millis(row: &rusqlite::Row<'_>, idx: usize, column: &str) -> rusqlite::Result<DateTime<Utc>> {
    let millis: i64 = row.get(idx)?;
    Utc.timestamp_millis_opt(millis)
        .single()
        .ok_or_else(|| rusqlite::Error::InvalidColumnType(idx, column.into(), Type::Integer))
}

// Helper to convert a row to Item
fn row_to_item(row: &rusqlite::Row<'_>) -> rusqlite::Result<Item> {
    let capacity_value: Option<i64> = row.get(7)?;
    let capacity_unit: Option<String> = row.get(8)?;

    let capacity = match (capacity_value, capacity_unit) {
        (Some(value), Some(unit)) => Some(Capacity {
            value: u32::try_from(value)
                .map_err(|_| rusqlite::Error::IntegralValueOutOfRange(7, value))?,
            unit,
        }),
        _ => None,
    };

    Ok(Item {
        id: ItemId::new(row.get::<_, String>(0)?),
        name: row.get(1)?,
        name_ar: row.get(2)?,
        quantity: from_sql_quantity(row, 3)?,
        min_quantity: from_sql_quantity(row, 4)?,
        category: row.get(5)?,
        unit: row.get(6)?,
        capacity,
        last_updated: from_sql_millis(row, 9, "last_updated")?,
    })
}

/// A transaction row before its lines are decoded.
struct TransactionRow {
    id: String,
    direction: String,
    department: String,
    date: DateTime<Utc>,
    lines: Vec<u8>,
}

impl TransactionRow {
    fn into_transaction(self) -> Result<Transaction> {
        let direction: Direction = self
            .direction
            .parse()
            .map_err(|e: stockroom_core::CoreError| StoreError::InvalidData(e.to_string()))?;
        Ok(Transaction {
            id: TransactionId::new(self.id),
            date: self.date,
            department: self.department,
            direction,
            lines: decode_lines(&self.lines)?,
        })
    }
}

fn row_to_transaction(row: &rusqlite::Row<'_>) -> rusqlite::Result<TransactionRow> {
    Ok(TransactionRow {
        id: row.get(0)?,
        direction: row.get(1)?,
        department: row.get(2)?,
        date: from_sql_millis(row, 3, "date")?,
        lines: row.get(4)?,
    })
}

// Helper to encode lines to CBOR
fn encode_lines(lines: &[TransactionLine]) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    ciborium::into_writer(lines, &mut buf)
        .map_err(|e| StoreError::Serialization(e.to_string()))?;
    Ok(buf)
}

fn decode_lines(bytes: &[u8]) -> Result<Vec<TransactionLine>> {
    ciborium::from_reader(bytes).map_err(|e| StoreError::Serialization(e.to_string()))
}

fn query_items(conn: &Connection, filter: &str, args: impl rusqlite::Params) -> Result<Vec<Item>> {
    let sql = format!(
        "SELECT {ITEM_COLUMNS} FROM items {filter} ORDER BY name, id"
    );
    let mut stmt = conn.prepare(&sql)?;
    let items = stmt
        .query_map(args, row_to_item)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(items)
}

fn query_transactions(
    conn: &Connection,
    filter: &str,
    args: impl rusqlite::Params,
) -> Result<Vec<Transaction>> {
    let sql = format!(
        "SELECT {TRANSACTION_COLUMNS} FROM transactions {filter} ORDER BY date, id"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(args, row_to_transaction)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    rows.into_iter().map(TransactionRow::into_transaction).collect()
}

fn write_item(conn: &Connection, item: &Item, replace: bool) -> Result<()> {
    let verb = if replace { "INSERT OR REPLACE" } else { "INSERT" };
    let sql = format!(
        "{verb} INTO items ({ITEM_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)"
    );
    conn.execute(
        &sql,
        params![
            item.id.as_str(),
            item.name,
            item.name_ar,
            to_sql_quantity(item.quantity)?,
            to_sql_quantity(item.min_quantity)?,
            item.category,
            item.unit,
            item.capacity.as_ref().map(|c| i64::from(c.value)),
            item.capacity.as_ref().map(|c| c.unit.as_str()),
            item.last_updated.timestamp_millis(),
        ],
    )?;
    Ok(())
}

fn insert_transaction(conn: &Connection, transaction: &Transaction) -> Result<()> {
    conn.execute(
        &format!(
            "INSERT INTO transactions ({TRANSACTION_COLUMNS}, recorded_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)"
        ),
        params![
            transaction.id.as_str(),
            transaction.direction.as_str(),
            transaction.department,
            transaction.date.timestamp_millis(),
            encode_lines(&transaction.lines)?,
            Utc::now().timestamp_millis(),
        ],
    )?;
    Ok(())
}

fn exists(conn: &Connection, collection: Collection, id: &str) -> Result<bool> {
    let sql = format!(
        "SELECT EXISTS(SELECT 1 FROM {} WHERE id = ?1)",
        collection.as_str()
    );
    Ok(conn.query_row(&sql, params![id], |row| row.get(0))?)
}

#[async_trait]
impl Store for SqliteStore {
    async fn get_item(&self, id: &ItemId) -> Result<Option<Item>> {
        let id = id.clone();

        self.run(move |conn| {
            conn.query_row(
                &format!("SELECT {ITEM_COLUMNS} FROM items WHERE id = ?1"),
                params![id.as_str()],
                row_to_item,
            )
            .optional()
            .map_err(StoreError::from)
        })
        .await
    }

    async fn put_item(&self, item: &Item) -> Result<()> {
        let item = item.clone();
        self.run(move |conn| write_item(conn, &item, true)).await
    }

    async fn add_item(&self, item: &Item) -> Result<()> {
        let item = item.clone();

        self.run(move |conn| {
            if exists(conn, Collection::Items, item.id.as_str())? {
                return Err(StoreError::DuplicateKey {
                    collection: Collection::Items,
                    id: item.id.to_string(),
                });
            }
            write_item(conn, &item, false)
        })
        .await
    }

    async fn delete_item(&self, id: &ItemId) -> Result<bool> {
        let id = id.clone();

        self.run(move |conn| {
            let removed = conn.execute("DELETE FROM items WHERE id = ?1", params![id.as_str()])?;
            Ok(removed > 0)
        })
        .await
    }

    async fn list_items(&self) -> Result<Vec<Item>> {
        self.run(|conn| query_items(conn, "", [])).await
    }

    async fn items_by_category(&self, category: &str) -> Result<Vec<Item>> {
        let category = category.to_string();
        self.run(move |conn| query_items(conn, "WHERE category = ?1", params![category]))
            .await
    }

    async fn get_transaction(&self, id: &TransactionId) -> Result<Option<Transaction>> {
        let id = id.clone();

        self.run(move |conn| {
            conn.query_row(
                &format!("SELECT {TRANSACTION_COLUMNS} FROM transactions WHERE id = ?1"),
                params![id.as_str()],
                row_to_transaction,
            )
            .optional()?
            .map(TransactionRow::into_transaction)
            .transpose()
        })
        .await
    }

    async fn add_transaction(&self, transaction: &Transaction) -> Result<()> {
        let transaction = transaction.clone();

        self.run(move |conn| {
            if exists(conn, Collection::Transactions, transaction.id.as_str())? {
                return Err(StoreError::DuplicateKey {
                    collection: Collection::Transactions,
                    id: transaction.id.to_string(),
                });
            }
            insert_transaction(conn, &transaction)
        })
        .await
    }

    async fn list_transactions(&self) -> Result<Vec<Transaction>> {
        self.run(|conn| query_transactions(conn, "", [])).await
    }

    async fn transactions_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Transaction>> {
        let (start, end) = (start.timestamp_millis(), end.timestamp_millis());
        self.run(move |conn| {
            query_transactions(conn, "WHERE date >= ?1 AND date <= ?2", params![start, end])
        })
        .await
    }

    async fn transactions_by_department(&self, department: &str) -> Result<Vec<Transaction>> {
        let department = department.to_string();
        self.run(move |conn| {
            query_transactions(conn, "WHERE department = ?1", params![department])
        })
        .await
    }

    async fn apply_movement(
        &self,
        transaction: &Transaction,
        updated_at: DateTime<Utc>,
    ) -> Result<MovementResult> {
        let transaction = transaction.clone();

        self.run(move |conn| {
            // Dropping `tx` without commit rolls everything back.
            let tx = conn.transaction()?;

            if exists(&tx, Collection::Transactions, transaction.id.as_str())? {
                return Ok(MovementResult::DuplicateTransaction);
            }

            let plan = plan_movement(&transaction, |id| {
                let quantity: Option<i64> = tx
                    .query_row(
                        "SELECT quantity FROM items WHERE id = ?1",
                        params![id.as_str()],
                        |row| row.get(0),
                    )
                    .optional()?;
                quantity
                    .map(|q| {
                        u64::try_from(q).map_err(|_| {
                            StoreError::InvalidData(format!("negative quantity stored for {}", id))
                        })
                    })
                    .transpose()
            })?;
            let updates = match plan {
                MovementPlan::Apply(updates) => updates,
                MovementPlan::Reject(rejected) => return Ok(rejected),
            };

            let updated_ms = updated_at.timestamp_millis();
            for (item_id, quantity) in &updates {
                tx.execute(
                    "UPDATE items SET quantity = ?1, last_updated = ?2 WHERE id = ?3",
                    params![to_sql_quantity(*quantity)?, updated_ms, item_id.as_str()],
                )?;
            }
            insert_transaction(&tx, &transaction)?;
            tx.commit()?;

            tracing::debug!(
                transaction_id = %transaction.id,
                direction = %transaction.direction,
                items = updates.len(),
                "movement committed"
            );
            Ok(MovementResult::Applied)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stockroom_core::{MovementRequest, NewItem};

    fn make_item(id: &str, quantity: u64) -> Item {
        let new = NewItem::new(format!("Item {id}"), format!("صنف {id}"), "General")
            .quantity(quantity)
            .min_quantity(2)
            .unit("box")
            .capacity(Capacity::new(12, "pcs"));
        // Millisecond precision survives a round trip through the database.
        let now = Utc.timestamp_millis_opt(1_710_000_000_123).unwrap();
        Item::from_new(ItemId::from(id), new, now)
    }

    fn make_txn(id: &str, direction: Direction, department: &str, date_ms: i64, lines: &[(&str, u64)]) -> Transaction {
        let date = Utc.timestamp_millis_opt(date_ms).unwrap();
        let mut request = MovementRequest::new(department, date);
        for (item_id, quantity) in lines {
            request = request.line(TransactionLine::new(*item_id, *quantity).notes("shelf 3"));
        }
        Transaction::from_request(TransactionId::from(id), direction, request)
    }

    #[tokio::test]
    async fn test_add_and_get_item() {
        let store = SqliteStore::open_memory().unwrap();
        let item = make_item("A", 10);

        store.add_item(&item).await.unwrap();
        let retrieved = store.get_item(&item.id).await.unwrap().unwrap();
        assert_eq!(retrieved, item);

        let err = store.add_item(&item).await.unwrap_err();
        assert!(matches!(err, StoreError::DuplicateKey { .. }));
    }

    #[tokio::test]
    async fn test_put_and_delete_item() {
        let store = SqliteStore::open_memory().unwrap();
        let mut item = make_item("A", 10);
        store.put_item(&item).await.unwrap();

        item.quantity = 7;
        item.capacity = None;
        store.put_item(&item).await.unwrap();
        assert_eq!(store.get_item(&item.id).await.unwrap(), Some(item.clone()));

        assert!(store.delete_item(&item.id).await.unwrap());
        assert!(!store.delete_item(&item.id).await.unwrap());
        assert!(store.list_items().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_transaction_roundtrip_and_indexes() {
        let store = SqliteStore::open_memory().unwrap();
        let t1 = make_txn("t1", Direction::Out, "Kitchen", 1_000, &[("A", 4), ("B", 1)]);
        let t2 = make_txn("t2", Direction::In, "Laundry", 2_000, &[("A", 9)]);
        let t3 = make_txn("t3", Direction::Out, "Kitchen", 3_000, &[("B", 2)]);
        for t in [&t3, &t1, &t2] {
            store.add_transaction(t).await.unwrap();
        }

        assert_eq!(store.get_transaction(&t1.id).await.unwrap(), Some(t1.clone()));
        assert_eq!(store.list_transactions().await.unwrap(), vec![t1.clone(), t2.clone(), t3.clone()]);

        let kitchen = store.transactions_by_department("Kitchen").await.unwrap();
        assert_eq!(kitchen, vec![t1.clone(), t3.clone()]);

        let window = store
            .transactions_between(
                Utc.timestamp_millis_opt(2_000).unwrap(),
                Utc.timestamp_millis_opt(3_000).unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(window, vec![t2, t3]);

        assert!(matches!(
            store.add_transaction(&t1).await,
            Err(StoreError::DuplicateKey { collection: Collection::Transactions, .. })
        ));
    }

    #[tokio::test]
    async fn test_items_by_category() {
        let store = SqliteStore::open_memory().unwrap();
        let mut soap = make_item("S", 4);
        soap.category = "Cleaning".into();
        store.add_item(&soap).await.unwrap();
        store.add_item(&make_item("A", 4)).await.unwrap();

        assert_eq!(store.items_by_category("Cleaning").await.unwrap(), vec![soap]);
        assert!(store.items_by_category("Tools").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_apply_movement_rolls_back_on_rejection() {
        let store = SqliteStore::open_memory().unwrap();
        store.add_item(&make_item("A", 10)).await.unwrap();
        store.add_item(&make_item("B", 1)).await.unwrap();

        let txn = make_txn("t1", Direction::Out, "Kitchen", 1_000, &[("A", 4), ("B", 5)]);
        let result = store.apply_movement(&txn, Utc::now()).await.unwrap();
        assert!(matches!(result, MovementResult::Insufficient { requested: 5, available: 1, .. }));

        assert_eq!(store.get_item(&ItemId::from("A")).await.unwrap().unwrap().quantity, 10);
        assert!(store.get_transaction(&txn.id).await.unwrap().is_none());

        let missing = make_txn("t2", Direction::Out, "Kitchen", 1_000, &[("A", 1), ("Z", 1)]);
        assert_eq!(
            store.apply_movement(&missing, Utc::now()).await.unwrap(),
            MovementResult::ItemMissing(ItemId::from("Z"))
        );
        assert_eq!(store.get_item(&ItemId::from("A")).await.unwrap().unwrap().quantity, 10);
    }

    #[tokio::test]
    async fn test_apply_movement_commits() {
        let store = SqliteStore::open_memory().unwrap();
        store.add_item(&make_item("A", 10)).await.unwrap();

        let out = make_txn("t1", Direction::Out, "Kitchen", 1_000, &[("A", 4)]);
        let at = Utc.timestamp_millis_opt(1_720_000_000_000).unwrap();
        assert_eq!(store.apply_movement(&out, at).await.unwrap(), MovementResult::Applied);

        let item = store.get_item(&ItemId::from("A")).await.unwrap().unwrap();
        assert_eq!(item.quantity, 6);
        assert_eq!(item.last_updated, at);

        let back_in = make_txn("t2", Direction::In, "Store", 2_000, &[("A", 3)]);
        store.apply_movement(&back_in, at).await.unwrap();
        assert_eq!(store.get_item(&ItemId::from("A")).await.unwrap().unwrap().quantity, 9);

        assert_eq!(
            store.apply_movement(&out, at).await.unwrap(),
            MovementResult::DuplicateTransaction
        );
        assert_eq!(store.list_transactions().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_file_backed_store_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stockroom.db");

        let store = SqliteStore::open(&path).unwrap();
        store.add_item(&make_item("A", 10)).await.unwrap();
        store
            .apply_movement(&make_txn("t1", Direction::Out, "Kitchen", 1_000, &[("A", 4)]), Utc::now())
            .await
            .unwrap();
        store.close().unwrap();

        let reopened = SqliteStore::open(&path).unwrap();
        let item = reopened.get_item(&ItemId::from("A")).await.unwrap().unwrap();
        assert_eq!(item.quantity, 6);
        assert_eq!(reopened.list_transactions().await.unwrap().len(), 1);
    }
}
