//! SQL insert script export.
//!
//! Writes one `c-<n>.sql` file per label length, each line an `INSERT` for the
//! `domains` table. The shortest length's script starts by dropping and
//! recreating the table, so replaying the scripts in length order with the
//! `sqlite3` shell against any database file yields the same rows `prepare`
//! would.

use crate::error::DomainSweepError;
use crate::generate::{enumerate, Alphabet};
use crate::store::RECREATE_SCHEMA;
use chrono::{DateTime, Utc};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};
use tracing::info;

/// Lines between progress messages.
const PROGRESS_EVERY: usize = 100_000;

/// A script written by `export_scripts`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedScript {
    pub length: usize,
    pub path: PathBuf,
    pub rows: usize,
}

/// Script file name for one length.
pub fn script_file_name(length: usize) -> String {
    format!("c-{}.sql", length)
}

/// One `INSERT` statement, newline terminated.
///
/// Labels come from the enumerator and never contain quotes.
pub fn insert_statement(name: &str, suffix: &str, at: DateTime<Utc>) -> String {
    format!(
        "INSERT INTO domains(name, len, suffix, created_at) values('{}',{},'{}','{}');\n",
        name,
        name.len(),
        suffix,
        at.format("%Y-%m-%d %H:%M:%S")
    )
}

/// Write an insert statement per name to `writer`. Returns the line count.
pub fn write_insert_script<W, I>(
    writer: &mut W,
    names: I,
    suffix: &str,
    at: DateTime<Utc>,
) -> Result<usize, DomainSweepError>
where
    W: Write,
    I: IntoIterator<Item = String>,
{
    let mut written = 0usize;
    for name in names {
        if written % PROGRESS_EVERY == 0 {
            info!(len = name.len(), name = %name, written, "writing insert script");
        }
        writer.write_all(insert_statement(&name, suffix, at).as_bytes())?;
        written += 1;
    }
    writer.flush()?;
    Ok(written)
}

/// Write `c-<n>.sql` into `dir` for every length in `lengths`.
///
/// The first script is prefixed with the table schema. Existing scripts are
/// replaced.
pub fn export_scripts(
    dir: &Path,
    alphabet: &Alphabet,
    lengths: RangeInclusive<usize>,
    suffix: &str,
) -> Result<Vec<ExportedScript>, DomainSweepError> {
    let mut scripts = Vec::new();

    let enumerations = lengths
        .map(|length| enumerate(alphabet, length).map(|names| (length, names)))
        .collect::<Result<Vec<_>, _>>()?;

    for (index, (length, names)) in enumerations.into_iter().enumerate() {
        let path = dir.join(script_file_name(length));

        let file = File::create(&path).map_err(|e| {
            DomainSweepError::file_error(path.to_string_lossy(), e.to_string())
        })?;
        let mut writer = BufWriter::new(file);

        let rows = write_script(&mut writer, index == 0, names, suffix).map_err(|e| {
            DomainSweepError::file_error(path.to_string_lossy(), e.to_string())
        })?;

        info!(length, rows, path = %path.display(), "insert script written");
        scripts.push(ExportedScript { length, path, rows });
    }

    Ok(scripts)
}

fn write_script<W, I>(
    writer: &mut W,
    with_schema: bool,
    names: I,
    suffix: &str,
) -> Result<usize, DomainSweepError>
where
    W: Write,
    I: IntoIterator<Item = String>,
{
    if with_schema {
        writer.write_all(RECREATE_SCHEMA.trim_start().as_bytes())?;
    }
    write_insert_script(writer, names, suffix, Utc::now())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_insert_statement_format() {
        let at = Utc.with_ymd_and_hms(2024, 3, 9, 8, 5, 1).unwrap();
        assert_eq!(
            insert_statement("a0", "com", at),
            "INSERT INTO domains(name, len, suffix, created_at) values('a0',2,'com','2024-03-09 08:05:01');\n"
        );
    }

    #[test]
    fn test_write_insert_script_counts_lines() {
        let mut buf = Vec::new();
        let names = vec!["aa".to_string(), "ab".to_string(), "ac".to_string()];
        let n = write_insert_script(&mut buf, names, "com", Utc::now()).unwrap();
        assert_eq!(n, 3);

        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text.lines().count(), 3);
        assert!(text.lines().nth(1).unwrap().contains("values('ab',2,'com'"));
    }

    #[test]
    fn test_export_scripts_per_length() {
        let dir = tempfile::tempdir().unwrap();
        let alphabet = Alphabet::alphanumeric();

        let scripts = export_scripts(dir.path(), &alphabet, 1..=2, "com").unwrap();
        assert_eq!(scripts.len(), 2);
        assert_eq!(scripts[0].rows, 36);
        assert_eq!(scripts[1].rows, 1296);
        assert_eq!(scripts[1].path, dir.path().join("c-2.sql"));

        let first = std::fs::read_to_string(dir.path().join("c-1.sql")).unwrap();
        assert!(first.starts_with("BEGIN;"));
        assert!(first.contains("CREATE TABLE domains"));
        assert_eq!(inserts(&first).len(), 36);
        assert!(inserts(&first)[0]
            .starts_with("INSERT INTO domains(name, len, suffix, created_at) values('0',1,'com','"));

        let second = std::fs::read_to_string(dir.path().join("c-2.sql")).unwrap();
        assert!(!second.contains("CREATE TABLE"));
        assert_eq!(second.lines().count(), 1296);
    }

    fn inserts(text: &str) -> Vec<&str> {
        text.lines().filter(|l| l.starts_with("INSERT")).collect()
    }

    #[test]
    fn test_scripts_replay_into_any_database() {
        let dir = tempfile::tempdir().unwrap();
        let alphabet = Alphabet::alphanumeric();
        let scripts = export_scripts(dir.path(), &alphabet, 1..=2, "com").unwrap();

        let conn = rusqlite::Connection::open(dir.path().join("replay.db")).unwrap();
        // Stale rows from an earlier run must not survive a replay.
        conn.execute_batch(
            "CREATE TABLE domains (id INTEGER PRIMARY KEY, name TEXT, len INT, suffix TEXT, created_at DATE);
             INSERT INTO domains(name, len, suffix, created_at) values('stale',5,'com','2020-01-01 00:00:00');",
        )
        .unwrap();

        for script in &scripts {
            let sql = std::fs::read_to_string(&script.path).unwrap();
            conn.execute_batch(&sql).unwrap();
        }

        let rows: i64 = conn
            .query_row("SELECT COUNT(1) FROM domains", [], |r| r.get(0))
            .unwrap();
        assert_eq!(
            rows as usize,
            crate::generate::estimate_range_count(&alphabet, 1..=2)
        );
        let distinct: i64 = conn
            .query_row(
                "SELECT COUNT(DISTINCT name || '.' || suffix) FROM domains",
                [],
                |r| r.get(0),
            )
            .unwrap();
        assert_eq!(distinct, rows);
    }

    #[test]
    fn test_export_invalid_length_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let err = export_scripts(dir.path(), &Alphabet::alphanumeric(), 4..=6, "com").unwrap_err();
        assert!(matches!(err, DomainSweepError::InvalidLength { .. }));
        assert!(!dir.path().join("c-4.sql").exists());
    }

    #[test]
    fn test_export_replaces_existing_script() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("c-1.sql"), "stale\n".repeat(100)).unwrap();

        export_scripts(dir.path(), &Alphabet::alphanumeric(), 1..=1, "com").unwrap();

        let text = std::fs::read_to_string(dir.path().join("c-1.sql")).unwrap();
        assert_eq!(inserts(&text).len(), 36);
        assert!(!text.contains("stale"));
    }
}
