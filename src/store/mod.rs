//! Append-only SQLite log of probe results.
//!
//! Every record lands in the `ping` table. The store assigns `id` and `date`;
//! callers only supply the observation. Records are never updated or deleted.
//!
//! Each handle owns one connection. Several handles may append to the same
//! file at once: WAL journaling plus a busy timeout let SQLite serialize the
//! writers, and `AUTOINCREMENT` keeps ids strictly increasing and never reused.

pub mod record;

use std::path::{Path, PathBuf};
use std::time::Duration;

use rusqlite::{Connection, params};

use crate::icmp_probe::result::ProbeResult;
pub use record::PingRecord;

const CREATE_TABLE_SQL: &str = "CREATE TABLE IF NOT EXISTS ping (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    date TIMESTAMP DEFAULT CURRENT_TIMESTAMP NOT NULL,
    latency REAL,
    dest_ip TEXT,
    timeout INTEGER(1),
    had_no_route INTEGER(1)
)";

const INSERT_SQL: &str =
    "INSERT INTO ping (latency, dest_ip, timeout, had_no_route) VALUES (?1, ?2, ?3, ?4)";

/// How long a writer waits for a concurrent writer to release the database.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store at {} is unavailable", path.display())]
    Unavailable {
        path: PathBuf,
        source: rusqlite::Error,
    },

    #[error("failed to append probe result")]
    WriteFailed(#[source] rusqlite::Error),

    #[error("failed to read probe results")]
    ReadFailed(#[source] rusqlite::Error),

    #[error("failed to close store")]
    CloseFailed(#[source] rusqlite::Error),
}

/// One connection to the result store.
#[derive(Debug)]
pub struct ResultStore {
    conn: Connection,
}

impl ResultStore {
    /// Connects to the store at `path` and creates the schema if it is missing.
    ///
    /// Safe to call any number of times against the same location; existing
    /// records are left alone.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let unavailable = |source| StoreError::Unavailable {
            path: path.clone(),
            source,
        };

        let conn = Connection::open(&path).map_err(unavailable)?;
        conn.busy_timeout(BUSY_TIMEOUT).map_err(unavailable)?;
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| {
            row.get::<_, String>(0)
        })
        .map_err(unavailable)?;
        // Commit only returns once the record is on disk.
        conn.pragma_update(None, "synchronous", "FULL")
            .map_err(unavailable)?;
        conn.execute(CREATE_TABLE_SQL, []).map_err(unavailable)?;

        Ok(Self { conn })
    }

    /// Durably appends one result and returns the id the store assigned.
    pub fn append(&self, result: &ProbeResult) -> Result<i64, StoreError> {
        self.conn
            .execute(
                INSERT_SQL,
                params![
                    result.latency(),
                    result.target,
                    result.is_timeout(),
                    result.is_unreachable()
                ],
            )
            .map_err(StoreError::WriteFailed)?;

        Ok(self.conn.last_insert_rowid())
    }

    /// All stored records in id order.
    pub fn records(&self) -> Result<Vec<PingRecord>, StoreError> {
        let sql = format!("SELECT {} FROM ping ORDER BY id", PingRecord::COLUMNS);
        let mut stmt = self.conn.prepare(&sql).map_err(StoreError::ReadFailed)?;
        let rows = stmt
            .query_map([], PingRecord::from_row)
            .map_err(StoreError::ReadFailed)?;

        rows.collect::<Result<Vec<_>, _>>()
            .map_err(StoreError::ReadFailed)
    }

    /// Releases the connection. Dropping the handle closes it as well, but
    /// only this reports a failure to do so.
    pub fn close(self) -> Result<(), StoreError> {
        self.conn
            .close()
            .map_err(|(_, e)| StoreError::CloseFailed(e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::icmp_probe::result::Outcome;
    use tempfile::TempDir;

    fn create_db_path(temp_dir: &TempDir) -> PathBuf {
        temp_dir.path().join("sqlite.db")
    }

    #[test]
    fn test_open_is_idempotent() {
        let temp_dir = TempDir::new().expect("failed to create temp directory");
        let db_path = create_db_path(&temp_dir);

        let store = ResultStore::open(&db_path).expect("first open");
        store
            .append(&ProbeResult::new("8.8.8.8", Outcome::Reply { latency_ms: 23.4 }))
            .expect("append");
        store.close().expect("close");

        let store = ResultStore::open(&db_path).expect("second open");
        let store_again = ResultStore::open(&db_path).expect("third open");
        assert_eq!(store.records().expect("records").len(), 1);
        assert_eq!(store_again.records().expect("records").len(), 1);

        let tables: i64 = store
            .conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'ping'",
                [],
                |row| row.get(0),
            )
            .expect("schema query");
        assert_eq!(tables, 1);
    }

    #[test]
    fn test_append_survives_reopen() {
        let temp_dir = TempDir::new().expect("failed to create temp directory");
        let db_path = create_db_path(&temp_dir);

        let store = ResultStore::open(&db_path).expect("open");
        let reply = store
            .append(&ProbeResult::new("8.8.8.8", Outcome::Reply { latency_ms: 23.4 }))
            .expect("append reply");
        let timeout = store
            .append(&ProbeResult::new("10.13.37.1", Outcome::Timeout))
            .expect("append timeout");
        let unreachable = store
            .append(&ProbeResult::new("10.13.37.1", Outcome::Unreachable))
            .expect("append unreachable");
        store.close().expect("close");

        let store = ResultStore::open(&db_path).expect("reopen");
        let records = store.records().expect("records");
        assert_eq!(records.len(), 3);

        assert_eq!(records[0].id, reply);
        assert_eq!(records[0].target, "8.8.8.8");
        assert_eq!(records[0].latency, 23.4);
        assert!(!records[0].timeout);
        assert!(!records[0].unreachable);

        assert_eq!(records[1].id, timeout);
        assert_eq!(records[1].latency, 0.0);
        assert!(records[1].timeout);
        assert!(!records[1].unreachable);

        assert_eq!(records[2].id, unreachable);
        assert_eq!(records[2].outcome(), Outcome::Unreachable);
        assert!(!records[2].timeout);
        assert!(records[2].unreachable);

        assert!(records[0].timestamp <= records[2].timestamp);
    }

    #[test]
    fn test_ids_strictly_increase_without_gaps() {
        let temp_dir = TempDir::new().expect("failed to create temp directory");
        let store = ResultStore::open(create_db_path(&temp_dir)).expect("open");

        let ids: Vec<i64> = (0..10)
            .map(|i| {
                store
                    .append(&ProbeResult::new(
                        format!("host-{i}"),
                        Outcome::Reply { latency_ms: i as f64 },
                    ))
                    .expect("append")
            })
            .collect();

        for pair in ids.windows(2) {
            assert_eq!(pair[1], pair[0] + 1);
        }
    }

    #[test]
    fn test_concurrent_connections_do_not_collide() {
        let temp_dir = TempDir::new().expect("failed to create temp directory");
        let db_path = create_db_path(&temp_dir);
        ResultStore::open(&db_path).expect("init").close().expect("close");

        let handles: Vec<_> = (0..8)
            .map(|worker| {
                let db_path = db_path.clone();
                std::thread::spawn(move || {
                    let store = ResultStore::open(&db_path).expect("open");
                    let ids: Vec<i64> = (0..5)
                        .map(|_| {
                            store
                                .append(&ProbeResult::new(
                                    format!("worker-{worker}"),
                                    Outcome::Timeout,
                                ))
                                .expect("append")
                        })
                        .collect();
                    store.close().expect("close");
                    ids
                })
            })
            .collect();

        let mut ids: Vec<i64> = handles
            .into_iter()
            .flat_map(|h| h.join().expect("worker panicked"))
            .collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 40);

        let store = ResultStore::open(&db_path).expect("reopen");
        assert_eq!(store.records().expect("records").len(), 40);
    }

    #[test]
    fn test_open_unwritable_location() {
        let temp_dir = TempDir::new().expect("failed to create temp directory");
        let db_path = temp_dir.path().join("missing").join("sqlite.db");

        let err = ResultStore::open(&db_path).expect_err("open should fail");
        assert!(matches!(err, StoreError::Unavailable { .. }));
    }
}
