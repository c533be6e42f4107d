pub mod event_store;
pub mod house_store;

pub use event_store::EventStore;
pub use house_store::HouseStore;

use crate::error::{CoreError, Result};
use rusqlite::Connection;
use std::path::Path;
use tokio::sync::Mutex;

pub struct Storage {
    conn: Mutex<Connection>,
}

impl Storage {
    pub async fn new(db_path: &Path) -> Result<Self> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = db_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| CoreError::internal(format!("Failed to create directory: {}", e)))?;
        }

        let conn = Connection::open(db_path)?;
        let storage = Self {
            conn: Mutex::new(conn),
        };

        storage.init_schema().await?;
        tracing::debug!("Opened house database at {}", db_path.display());
        Ok(storage)
    }

    async fn init_schema(&self) -> Result<()> {
        let conn = self.conn.lock().await;

        // Single row: configuration, ledger balances and request nonce
        conn.execute(
            "CREATE TABLE IF NOT EXISTS house (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                config TEXT NOT NULL,
                available TEXT NOT NULL,
                escrowed TEXT NOT NULL,
                owed TEXT NOT NULL,
                surplus TEXT NOT NULL,
                oracle_credit TEXT NOT NULL,
                request_nonce INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            )",
            [],
        )?;

        // Pending bets keyed by randomness request
        conn.execute(
            "CREATE TABLE IF NOT EXISTS bets (
                request_id TEXT PRIMARY KEY,
                amount TEXT NOT NULL,
                bet_on INTEGER NOT NULL,
                bettor TEXT NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS amount_due (
                account TEXT PRIMARY KEY,
                amount TEXT NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS events (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                kind TEXT NOT NULL,
                payload TEXT NOT NULL,
                created_at INTEGER NOT NULL
            )",
            [],
        )?;

        Ok(())
    }

    pub async fn get_connection(&self) -> tokio::sync::MutexGuard<'_, Connection> {
        self.conn.lock().await
    }
}
