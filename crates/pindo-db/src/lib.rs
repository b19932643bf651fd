pub mod migrations;
pub mod queries;

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use anyhow::{Result, anyhow};
use pindo_core::{Records, Store};
use rusqlite::{Connection, OpenFlags, TransactionBehavior};
use tracing::info;

use crate::queries::SqliteRecords;

const READER_POOL_SIZE: usize = 4;

/// SQLite-backed store: one writer plus a small pool of read-only
/// connections. In-memory databases have no readers and read through the
/// writer, since a second connection would open a different database.
pub struct Database {
    writer: Mutex<Connection>,
    readers: Vec<Mutex<Connection>>,
    reader_idx: AtomicUsize,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        let writer = Connection::open(path)?;

        // WAL mode for concurrent reads
        writer.pragma_update(None, "journal_mode", "WAL")?;
        writer.pragma_update(None, "foreign_keys", "ON")?;
        writer.busy_timeout(Duration::from_secs(5))?;

        migrations::run(&writer)?;

        let mut readers = Vec::with_capacity(READER_POOL_SIZE);
        for _ in 0..READER_POOL_SIZE {
            let conn = Connection::open_with_flags(
                path,
                OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
            )?;
            conn.busy_timeout(Duration::from_secs(5))?;
            readers.push(Mutex::new(conn));
        }

        info!(
            "Database opened at {} (1 writer + {} readers)",
            path.display(),
            READER_POOL_SIZE
        );
        Ok(Self {
            writer: Mutex::new(writer),
            readers,
            reader_idx: AtomicUsize::new(0),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        let writer = Connection::open_in_memory()?;
        writer.pragma_update(None, "foreign_keys", "ON")?;

        migrations::run(&writer)?;

        Ok(Self {
            writer: Mutex::new(writer),
            readers: Vec::new(),
            reader_idx: AtomicUsize::new(0),
        })
    }

    pub fn with_conn<F, T, E>(&self, f: F) -> std::result::Result<T, E>
    where
        F: FnOnce(&Connection) -> std::result::Result<T, E>,
        E: From<anyhow::Error>,
    {
        if self.readers.is_empty() {
            let conn = self.lock_writer()?;
            return f(&conn);
        }

        let idx = self.reader_idx.fetch_add(1, Ordering::Relaxed) % self.readers.len();
        let conn = self.readers[idx]
            .lock()
            .map_err(|e| anyhow!("Reader lock poisoned: {}", e))?;
        f(&conn)
    }

    pub fn with_conn_mut<F, T, E>(&self, f: F) -> std::result::Result<T, E>
    where
        F: FnOnce(&mut Connection) -> std::result::Result<T, E>,
        E: From<anyhow::Error>,
    {
        let mut conn = self.lock_writer()?;
        f(&mut conn)
    }

    fn lock_writer(&self) -> Result<MutexGuard<'_, Connection>> {
        self.writer
            .lock()
            .map_err(|e| anyhow!("Writer lock poisoned: {}", e))
    }
}

impl Store for Database {
    /// Runs `f` inside a deferred transaction so every query sees the same
    /// snapshot. The transaction is rolled back on return.
    fn read<T, F>(&self, f: F) -> pindo_core::Result<T>
    where
        F: FnOnce(&dyn Records) -> pindo_core::Result<T>,
    {
        self.with_conn(|conn| {
            let tx = conn.unchecked_transaction().map_err(anyhow::Error::from)?;
            f(&SqliteRecords::new(&tx))
        })
    }

    /// Runs `f` inside an IMMEDIATE transaction on the writer, committing
    /// only if `f` succeeds.
    fn write<T, F>(&self, f: F) -> pindo_core::Result<T>
    where
        F: FnOnce(&dyn Records) -> pindo_core::Result<T>,
    {
        self.with_conn_mut(|conn| {
            let tx = conn
                .transaction_with_behavior(TransactionBehavior::Immediate)
                .map_err(anyhow::Error::from)?;
            let out = f(&SqliteRecords::new(&tx))?;
            tx.commit().map_err(anyhow::Error::from)?;
            Ok(out)
        })
    }
}
