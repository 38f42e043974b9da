//! Database schema migrations for SQLite.
//!
//! We use a simple versioned migration system. Each migration is a SQL string
//! that transforms the schema from version N to N+1.

use chrono::Utc;
use rusqlite::Connection;

use crate::error::{Result, StoreError};

/// Current schema version.
pub const CURRENT_VERSION: u32 = 1;

/// Initialize or migrate the database schema.
///
/// This function is idempotent - it can be called multiple times safely.
pub fn migrate(conn: &mut Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at INTEGER NOT NULL
        )",
        [],
    )?;

    let current: u32 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
            [],
            |row| row.get(0),
        )?;

    if current < CURRENT_VERSION {
        let tx = conn.transaction()?;

        for version in (current + 1)..=CURRENT_VERSION {
            apply_migration(&tx, version)?;

            tx.execute(
                "INSERT INTO schema_migrations (version, applied_at) VALUES (?1, ?2)",
                rusqlite::params![version, Utc::now().timestamp_millis()],
            )?;
            tracing::debug!(version, "applied schema migration");
        }

        tx.commit()?;
    }

    Ok(())
}

/// Apply a specific migration version.
fn apply_migration(conn: &Connection, version: u32) -> Result<()> {
    match version {
        1 => apply_v1(conn),
        _ => Err(StoreError::Migration(format!(
            "unknown migration version: {}",
            version
        ))),
    }
}

/// Migration v1: items, the transaction ledger and their lookup indexes.
fn apply_v1(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        -- Stock items
        CREATE TABLE items (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            name_ar TEXT NOT NULL,
            quantity INTEGER NOT NULL CHECK (quantity >= 0),
            min_quantity INTEGER NOT NULL CHECK (min_quantity >= 0),
            category TEXT NOT NULL,
            unit TEXT,                        -- nullable, no sentinel values
            capacity_value INTEGER,           -- set together with capacity_unit
            capacity_unit TEXT,
            last_updated INTEGER NOT NULL     -- Unix ms
        );

        -- Append-only ledger
        CREATE TABLE transactions (
            id TEXT PRIMARY KEY,
            direction TEXT NOT NULL CHECK (direction IN ('in', 'out')),
            department TEXT NOT NULL,
            date INTEGER NOT NULL,            -- movement date (Unix ms)
            lines BLOB NOT NULL,              -- CBOR array of lines
            recorded_at INTEGER NOT NULL      -- local time of commit
        );

        CREATE TRIGGER transactions_no_update BEFORE UPDATE ON transactions
        BEGIN
            SELECT RAISE(ABORT, 'transactions are append-only');
        END;

        CREATE TRIGGER transactions_no_delete BEFORE DELETE ON transactions
        BEGIN
            SELECT RAISE(ABORT, 'transactions are append-only');
        END;

        -- Secondary indexes: by-category, by-date, by-department
        CREATE INDEX idx_items_by_category ON items(category);
        CREATE INDEX idx_transactions_by_date ON transactions(date);
        CREATE INDEX idx_transactions_by_department ON transactions(department);
        "#,
    )?;

    Ok(())
}
