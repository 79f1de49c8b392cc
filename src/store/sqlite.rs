//! Cross-process shared store on a SQLite file.
//!
//! Every tab process opens the same file. Writes append to a `changes` log;
//! a subscription runs a poller thread with its own connection that forwards
//! rows written by other handles.

use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;
use rusqlite::{params, OptionalExtension, Transaction, TransactionBehavior};
use tokio::sync::mpsc;
use tracing::{debug, warn};
use uuid::Uuid;

use super::{SharedStore, StoreChange, StoreSubscription};
use crate::database::connection::Database;
use crate::types::errors::StoreError;

/// Change rows kept for lagging pollers.
const CHANGE_LOG_RETENTION: i64 = 1024;

/// Store handle backed by a SQLite file.
pub struct SqliteStore {
    db: Mutex<Database>,
    path: PathBuf,
    writer: String,
    poll_interval: Duration,
}

impl SqliteStore {
    /// Opens (or creates) the store file. Each call yields a distinct writer identity.
    pub fn open<P: AsRef<Path>>(path: P, poll_interval: Duration) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| StoreError::DatabaseError(format!("Failed to create store directory: {}", e)))?;
            }
        }
        let db = Database::open(&path)?;
        Ok(Self {
            db: Mutex::new(db),
            path,
            writer: Uuid::new_v4().to_string(),
            poll_interval,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Highest change sequence written so far (0 if none).
    fn last_seq(&self) -> Result<i64, StoreError> {
        let db = self.db.lock();
        let seq = db
            .connection()
            .query_row("SELECT COALESCE(MAX(seq), 0) FROM changes", [], |row| row.get(0))?;
        Ok(seq)
    }

    /// Applies a write (`Some`) or removal (`None`) and logs it if anything changed.
    fn write(&self, key: &str, value: Option<&str>) -> Result<(), StoreError> {
        let db = self.db.lock();
        let conn = db.connection();
        let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)?;

        let old_value: Option<String> = tx
            .query_row("SELECT value FROM entries WHERE key = ?1", [key], |row| row.get(0))
            .optional()?;
        if old_value.as_deref() == value {
            return Ok(());
        }

        match value {
            Some(v) => tx.execute(
                "INSERT INTO entries (key, value) VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                params![key, v],
            )?,
            None => tx.execute("DELETE FROM entries WHERE key = ?1", [key])?,
        };
        tx.execute(
            "INSERT INTO changes (key, old_value, new_value, writer) VALUES (?1, ?2, ?3, ?4)",
            params![key, old_value, value, self.writer],
        )?;
        tx.execute(
            "DELETE FROM changes WHERE seq <= (SELECT MAX(seq) FROM changes) - ?1",
            [CHANGE_LOG_RETENTION],
        )?;
        tx.commit()?;
        Ok(())
    }
}

impl SharedStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let db = self.db.lock();
        let value = db
            .connection()
            .query_row("SELECT value FROM entries WHERE key = ?1", [key], |row| row.get(0))
            .optional()?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.write(key, Some(value))
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.write(key, None)
    }

    fn entries(&self) -> Result<Vec<(String, String)>, StoreError> {
        let db = self.db.lock();
        let mut stmt = db.connection().prepare("SELECT key, value FROM entries")?;
        let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;

        let mut result = Vec::new();
        for row in rows {
            result.push(row?);
        }
        Ok(result)
    }

    fn subscribe(&self) -> Result<StoreSubscription, StoreError> {
        let start = self.last_seq()?;
        let poller_db = Database::open(&self.path)?;
        let (tx, rx) = mpsc::unbounded_channel();
        let writer = self.writer.clone();
        let interval = self.poll_interval;

        thread::Builder::new()
            .name("tabsync-store-poller".to_string())
            .spawn(move || poll_changes(poller_db, writer, start, interval, tx))
            .map_err(|e| StoreError::SubscriptionFailed(e.to_string()))?;
        Ok(rx)
    }
}

fn poll_changes(
    db: Database,
    writer: String,
    mut last_seq: i64,
    interval: Duration,
    tx: mpsc::UnboundedSender<StoreChange>,
) {
    while !tx.is_closed() {
        thread::sleep(interval);
        match read_changes_after(&db, last_seq) {
            Ok(rows) => {
                for (seq, row_writer, change) in rows {
                    last_seq = seq;
                    if row_writer != writer && tx.send(change).is_err() {
                        return;
                    }
                }
            }
            Err(e) => warn!("Store change poll failed: {}", e),
        }
    }
    debug!("Store subscription closed, poller exiting");
}

fn read_changes_after(db: &Database, seq: i64) -> Result<Vec<(i64, String, StoreChange)>, StoreError> {
    let mut stmt = db.connection().prepare(
        "SELECT seq, writer, key, old_value, new_value FROM changes WHERE seq > ?1 ORDER BY seq",
    )?;
    let rows = stmt.query_map([seq], |row| {
        Ok((
            row.get(0)?,
            row.get(1)?,
            StoreChange {
                key: row.get(2)?,
                old_value: row.get(3)?,
                new_value: row.get(4)?,
            },
        ))
    })?;

    let mut result = Vec::new();
    for row in rows {
        result.push(row?);
    }
    Ok(result)
}
