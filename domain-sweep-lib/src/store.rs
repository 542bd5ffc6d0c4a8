//! SQLite-backed candidate store.
//!
//! One table, `domains`, holds a row per generated label. The prepare phase
//! recreates the table and bulk inserts; the detect phase pages through it and
//! writes outcomes back one row at a time. A single connection is held for the
//! lifetime of the store and reused across pages.

use crate::error::DomainSweepError;
use crate::types::{Candidate, CandidateStatus, PageFilter, StatusCounts};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use tracing::{debug, info};

/// Rows between progress lines during bulk insert.
const PROGRESS_EVERY: usize = 100_000;

/// Drops and recreates the `domains` table and its status index.
pub(crate) const RECREATE_SCHEMA: &str = r#"
BEGIN;

DROP TABLE IF EXISTS domains;

CREATE TABLE domains (
  id          INTEGER PRIMARY KEY AUTOINCREMENT,
  name        VARCHAR(64),
  len         INT,
  suffix      VARCHAR(64),
  status      INT NULL,
  result      VARCHAR(200) NULL,
  created_at  DATE,
  updated_at  DATE NULL
);

CREATE INDEX domains_idx_status ON domains(status);

COMMIT;
"#;

const SELECT_COLUMNS: &str =
    "SELECT id, name, len, suffix, status, result, created_at, updated_at FROM domains";

/// Persistent table of candidate records.
pub struct CandidateStore {
    conn: Connection,
}

impl CandidateStore {
    /// Open (or create) the store file at `path`.
    ///
    /// # Errors
    ///
    /// Returns `StoreConnection`, which is fatal for the current run.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, DomainSweepError> {
        let path = path.as_ref();
        let conn = Connection::open(path).map_err(|e| {
            DomainSweepError::store_connection(path.to_string_lossy(), e.to_string())
        })?;
        apply_pragmas(&conn).map_err(|e| {
            DomainSweepError::store_connection(path.to_string_lossy(), e.to_string())
        })?;
        debug!(path = %path.display(), "opened candidate store");
        Ok(Self { conn })
    }

    /// Open a private in-memory store.
    pub fn open_in_memory() -> Result<Self, DomainSweepError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| DomainSweepError::store_connection(":memory:", e.to_string()))?;
        Ok(Self { conn })
    }

    /// Drop and recreate the `domains` table and its status index.
    pub fn recreate(&self) -> Result<(), DomainSweepError> {
        self.conn
            .execute_batch(RECREATE_SCHEMA)
            .map_err(|e| DomainSweepError::store("recreate table", e.to_string()))?;
        info!("recreated domains table");
        Ok(())
    }

    /// Insert one row per name with status, result and updated_at left null.
    ///
    /// Rows are committed every 100 000 inserts, so a failure part way keeps
    /// the batches already committed. Returns the number of rows inserted.
    pub fn insert_candidates<I>(&mut self, names: I, suffix: &str) -> Result<usize, DomainSweepError>
    where
        I: IntoIterator<Item = String>,
    {
        self.insert_in_batches(names, suffix, PROGRESS_EVERY)
    }

    fn insert_in_batches<I>(
        &mut self,
        names: I,
        suffix: &str,
        batch_size: usize,
    ) -> Result<usize, DomainSweepError>
    where
        I: IntoIterator<Item = String>,
    {
        let mut names = names.into_iter().peekable();
        let mut inserted = 0usize;

        while names.peek().is_some() {
            let tx = self
                .conn
                .transaction()
                .map_err(|e| DomainSweepError::store("begin insert", e.to_string()))?;
            {
                let mut stmt = tx
                    .prepare_cached(
                        "INSERT INTO domains(name, len, suffix, created_at) VALUES (?1, ?2, ?3, ?4)",
                    )
                    .map_err(|e| DomainSweepError::store("prepare insert", e.to_string()))?;

                for name in names.by_ref().take(batch_size) {
                    if inserted % PROGRESS_EVERY == 0 {
                        info!(len = name.len(), name = %name, inserted, "inserting candidates");
                    }
                    stmt.execute(params![name, name.len() as i64, suffix, Utc::now()])
                        .map_err(|e| DomainSweepError::store("insert candidate", e.to_string()))?;
                    inserted += 1;
                }
            }
            tx.commit()
                .map_err(|e| DomainSweepError::store("commit insert", e.to_string()))?;
            debug!(inserted, "insert batch committed");
        }

        Ok(inserted)
    }

    /// Read up to `limit` rows ordered by id, skipping the first `offset` matches.
    pub fn fetch_page(
        &self,
        filter: PageFilter,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Candidate>, DomainSweepError> {
        let sql = match filter {
            PageFilter::Undetected => format!(
                "{} WHERE status IS NULL ORDER BY id LIMIT ?1 OFFSET ?2",
                SELECT_COLUMNS
            ),
            PageFilter::All => format!("{} ORDER BY id LIMIT ?1 OFFSET ?2", SELECT_COLUMNS),
        };

        let mut stmt = self
            .conn
            .prepare_cached(&sql)
            .map_err(|e| DomainSweepError::store("prepare page query", e.to_string()))?;
        let rows = stmt
            .query_map(params![limit as i64, offset as i64], candidate_from_row)
            .map_err(|e| DomainSweepError::store("page query", e.to_string()))?;

        rows.collect::<Result<Vec<_>, _>>()
            .map_err(|e| DomainSweepError::store("read page row", e.to_string()))
    }

    /// Write a detection outcome for one row.
    ///
    /// With a known `status` the status, result and updated_at columns are set.
    /// Otherwise only result and updated_at change; the status column is left
    /// exactly as it was.
    pub fn record_detection(
        &self,
        id: i64,
        status: Option<CandidateStatus>,
        result: &str,
        at: DateTime<Utc>,
    ) -> Result<(), DomainSweepError> {
        let changed = match status.and_then(CandidateStatus::to_column) {
            Some(code) => self.conn.execute(
                "UPDATE domains SET status = ?1, result = ?2, updated_at = ?3 WHERE id = ?4",
                params![code, result, at, id],
            ),
            None => self.conn.execute(
                "UPDATE domains SET result = ?1, updated_at = ?2 WHERE id = ?3",
                params![result, at, id],
            ),
        }
        .map_err(|e| DomainSweepError::store("update candidate", e.to_string()))?;

        if changed == 0 {
            return Err(DomainSweepError::store(
                "update candidate",
                format!("no candidate with id {}", id),
            ));
        }
        Ok(())
    }

    pub fn get(&self, id: i64) -> Result<Option<Candidate>, DomainSweepError> {
        self.conn
            .query_row(
                &format!("{} WHERE id = ?1", SELECT_COLUMNS),
                [id],
                candidate_from_row,
            )
            .optional()
            .map_err(|e| DomainSweepError::store("get candidate", e.to_string()))
    }

    pub fn count(&self) -> Result<u64, DomainSweepError> {
        let n: i64 = self
            .conn
            .query_row("SELECT COUNT(1) FROM domains", [], |r| r.get(0))
            .map_err(|e| DomainSweepError::store("count", e.to_string()))?;
        Ok(n as u64)
    }

    /// Row counts grouped into unknown / unavailable / available.
    pub fn count_by_status(&self) -> Result<StatusCounts, DomainSweepError> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT
                   SUM(CASE WHEN status IS NULL THEN 1 ELSE 0 END),
                   SUM(CASE WHEN status = 0 THEN 1 ELSE 0 END),
                   SUM(CASE WHEN status <> 0 THEN 1 ELSE 0 END)
                 FROM domains",
            )
            .map_err(|e| DomainSweepError::store("prepare status count", e.to_string()))?;

        stmt.query_row([], |r| {
            Ok(StatusCounts {
                unknown: r.get::<_, Option<i64>>(0)?.unwrap_or(0) as u64,
                unavailable: r.get::<_, Option<i64>>(1)?.unwrap_or(0) as u64,
                available: r.get::<_, Option<i64>>(2)?.unwrap_or(0) as u64,
            })
        })
        .map_err(|e| DomainSweepError::store("status count", e.to_string()))
    }
}

fn apply_pragmas(conn: &Connection) -> rusqlite::Result<()> {
    conn.pragma_update_and_check(None, "journal_mode", "WAL", |r| r.get::<_, String>(0))?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    Ok(())
}

fn candidate_from_row(row: &Row<'_>) -> rusqlite::Result<Candidate> {
    Ok(Candidate {
        id: row.get(0)?,
        name: row.get(1)?,
        length: row.get::<_, i64>(2)? as usize,
        suffix: row.get(3)?,
        status: CandidateStatus::from_column(row.get(4)?),
        result: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded(names: &[&str]) -> CandidateStore {
        let mut store = CandidateStore::open_in_memory().unwrap();
        store.recreate().unwrap();
        store
            .insert_candidates(names.iter().map(|s| s.to_string()), "com")
            .unwrap();
        store
    }

    #[test]
    fn test_insert_sets_defaults() {
        let store = seeded(&["ab", "abc"]);
        assert_eq!(store.count().unwrap(), 2);

        let first = store.get(1).unwrap().unwrap();
        assert_eq!(first.name, "ab");
        assert_eq!(first.length, 2);
        assert_eq!(first.suffix, "com");
        assert_eq!(first.status, CandidateStatus::Unknown);
        assert!(first.result.is_none());
        assert!(first.updated_at.is_none());

        let second = store.get(2).unwrap().unwrap();
        assert_eq!(second.length, 3);
        assert!(second.created_at >= first.created_at);
    }

    #[test]
    fn test_recreate_destroys_rows() {
        let store = seeded(&["ab", "cd"]);
        store.recreate().unwrap();
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn test_fetch_page_orders_by_id() {
        let store = seeded(&["aa", "ab", "ac", "ad", "ae"]);
        let page = store.fetch_page(PageFilter::All, 2, 2).unwrap();
        let names: Vec<_> = page.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["ac", "ad"]);
    }

    #[test]
    fn test_undetected_filter_skips_known_rows() {
        let store = seeded(&["aa", "ab", "ac"]);
        store
            .record_detection(2, Some(CandidateStatus::Unavailable), "{}", Utc::now())
            .unwrap();

        let undetected = store.fetch_page(PageFilter::Undetected, 10, 0).unwrap();
        let ids: Vec<_> = undetected.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![1, 3]);

        let all = store.fetch_page(PageFilter::All, 10, 0).unwrap();
        assert_eq!(all.len(), 3);
    }

    #[test]
    fn test_record_without_status_keeps_status_column() {
        let store = seeded(&["aa"]);
        store
            .record_detection(1, Some(CandidateStatus::Available(1)), "first", Utc::now())
            .unwrap();
        store
            .record_detection(1, None, "second", Utc::now())
            .unwrap();

        let row = store.get(1).unwrap().unwrap();
        assert_eq!(row.status, CandidateStatus::Available(1));
        assert_eq!(row.result.as_deref(), Some("second"));
        assert!(row.updated_at.is_some());
    }

    #[test]
    fn test_record_unknown_status_never_clears() {
        let store = seeded(&["aa"]);
        store
            .record_detection(1, Some(CandidateStatus::Unavailable), "x", Utc::now())
            .unwrap();
        store
            .record_detection(1, Some(CandidateStatus::Unknown), "y", Utc::now())
            .unwrap();
        assert_eq!(
            store.get(1).unwrap().unwrap().status,
            CandidateStatus::Unavailable
        );
    }

    #[test]
    fn test_record_missing_id_is_error() {
        let store = seeded(&["aa"]);
        let err = store
            .record_detection(42, None, "{}", Utc::now())
            .unwrap_err();
        assert!(matches!(err, DomainSweepError::StoreError { .. }));
    }

    #[test]
    fn test_count_by_status() {
        let store = seeded(&["aa", "ab", "ac", "ad"]);
        store
            .record_detection(1, Some(CandidateStatus::Unavailable), "{}", Utc::now())
            .unwrap();
        store
            .record_detection(2, Some(CandidateStatus::Available(1)), "{}", Utc::now())
            .unwrap();
        store
            .record_detection(3, Some(CandidateStatus::Available(2)), "{}", Utc::now())
            .unwrap();

        let counts = store.count_by_status().unwrap();
        assert_eq!(
            counts,
            StatusCounts {
                unknown: 1,
                unavailable: 1,
                available: 2,
            }
        );
        assert_eq!(counts.total(), 4);
    }

    #[test]
    fn test_insert_commits_in_batches() {
        let mut store = seeded(&[]);
        let names = ["aa", "ab", "ac", "ad", "ae"].map(String::from);
        assert_eq!(store.insert_in_batches(names, "com", 2).unwrap(), 5);

        let page = store.fetch_page(PageFilter::All, 10, 0).unwrap();
        let names: Vec<_> = page.iter().map(|c| (c.id, c.name.as_str())).collect();
        assert_eq!(
            names,
            vec![(1, "aa"), (2, "ab"), (3, "ac"), (4, "ad"), (5, "ae")]
        );
    }

    #[test]
    fn test_insert_failure_keeps_committed_batches() {
        let mut store = seeded(&[]);
        store
            .conn
            .execute_batch(
                "CREATE TRIGGER reject_ad BEFORE INSERT ON domains WHEN NEW.name = 'ad'
                 BEGIN SELECT RAISE(ABORT, 'rejected'); END;",
            )
            .unwrap();

        let names = ["aa", "ab", "ac", "ad", "ae"].map(String::from);
        let err = store.insert_in_batches(names, "com", 2).unwrap_err();
        assert!(matches!(err, DomainSweepError::StoreError { .. }));

        // First batch committed, the failing one rolled back.
        assert_eq!(store.count().unwrap(), 2);
    }

    #[test]
    fn test_count_by_status_empty_table() {
        let store = seeded(&[]);
        assert_eq!(store.count_by_status().unwrap(), StatusCounts::default());
    }
}
