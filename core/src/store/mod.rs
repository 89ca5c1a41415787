//! SQLite persistence for generated runs.
//!
//! RULE: Only the store talks to the database.
//! Pipeline stages work on in-memory tables and never execute SQL.

mod case;
mod client;
mod note;

use crate::{
    config::PipelineConfig,
    error::{PipelineError, PipelineResult},
    model::RawTables,
    types::{RunId, DATE_FORMAT},
};
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;

pub struct CaseStore {
    conn: Connection,
}

/// Row counts of one stored run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RunCounts {
    pub clients: usize,
    pub cases: usize,
    pub notes: usize,
}

impl CaseStore {
    pub fn open(path: &str) -> PipelineResult<Self> {
        let conn = Connection::open_with_flags(
            path,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI,
        )?;
        // WAL is ignored for :memory: and shared-memory URIs.
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> PipelineResult<Self> {
        let conn = Connection::open(":memory:")?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Apply all schema migrations in order. Idempotent.
    pub fn migrate(&self) -> PipelineResult<()> {
        self.conn
            .execute_batch(include_str!("../../../migrations/001_case_tables.sql"))?;
        Ok(())
    }

    pub fn new_run_id() -> RunId {
        uuid::Uuid::new_v4().to_string()
    }

    // ── Run ────────────────────────────────────────────────────

    pub fn insert_run(&self, run_id: &str, config: &PipelineConfig, version: &str) -> PipelineResult<()> {
        self.conn.execute(
            "INSERT INTO run (run_id, seed, version, as_of, config_json) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                run_id,
                config.seed as i64,
                version,
                format_date(config.as_of),
                serde_json::to_string(config)?,
            ],
        )?;
        Ok(())
    }

    /// Configuration a run was generated with, if the run exists.
    pub fn run_config(&self, run_id: &str) -> PipelineResult<Option<PipelineConfig>> {
        let json: Option<String> = self
            .conn
            .query_row(
                "SELECT config_json FROM run WHERE run_id = ?1",
                params![run_id],
                |row| row.get(0),
            )
            .optional()?;
        json.map(|j| serde_json::from_str::<PipelineConfig>(&j))
            .transpose()
            .map_err(Into::into)
    }

    /// Write all three tables of a run in one transaction.
    pub fn insert_raw_tables(&self, run_id: &str, raw: &RawTables) -> PipelineResult<RunCounts> {
        let tx = self.conn.unchecked_transaction()?;
        for c in &raw.clients {
            self.insert_client(run_id, c)?;
        }
        for c in &raw.cases {
            self.insert_case(run_id, c)?;
        }
        for n in &raw.notes {
            self.insert_note(run_id, n)?;
        }
        tx.commit()?;
        log::info!(
            "store: run {run_id} saved {} clients, {} cases, {} notes",
            raw.clients.len(),
            raw.cases.len(),
            raw.notes.len()
        );
        Ok(RunCounts {
            clients: raw.clients.len(),
            cases: raw.cases.len(),
            notes: raw.notes.len(),
        })
    }

    /// Read a run back. Labels and dates are validated on the way in.
    pub fn load_raw_tables(&self, run_id: &str) -> PipelineResult<RawTables> {
        Ok(RawTables {
            clients: self.clients(run_id)?,
            cases: self.cases(run_id)?,
            notes: self.notes(run_id)?,
        })
    }

    pub fn counts(&self, run_id: &str) -> PipelineResult<RunCounts> {
        Ok(RunCounts {
            clients: self.count_rows("client", run_id)?,
            cases: self.count_rows("legal_case", run_id)?,
            notes: self.count_rows("case_note", run_id)?,
        })
    }

    fn count_rows(&self, table: &'static str, run_id: &str) -> PipelineResult<usize> {
        let count: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM {table} WHERE run_id = ?1"),
            params![run_id],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}

pub(crate) fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub(crate) fn parse_stored_date(column: &str, row: usize, raw: &str) -> PipelineResult<NaiveDate> {
    NaiveDate::parse_from_str(raw, DATE_FORMAT).map_err(|_| PipelineError::InvalidDateFormat {
        column: column.to_string(),
        row,
        value: raw.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrate_twice_is_harmless() {
        let store = CaseStore::in_memory().unwrap();
        store.migrate().unwrap();
        store.migrate().unwrap();
    }

    #[test]
    fn run_config_round_trips() {
        let store = CaseStore::in_memory().unwrap();
        store.migrate().unwrap();
        let config = PipelineConfig::default_test();
        let run_id = CaseStore::new_run_id();
        store.insert_run(&run_id, &config, "test").unwrap();
        let loaded = store.run_config(&run_id).unwrap().unwrap();
        assert_eq!(loaded.seed, config.seed);
        assert_eq!(loaded.as_of, config.as_of);
        assert_eq!(loaded.generator.num_cases, 200);
        assert!(store.run_config("missing").unwrap().is_none());
    }

    #[test]
    fn stored_dates_are_validated() {
        let err = parse_stored_date("open_date", 3, "31/12/2024").unwrap_err();
        assert!(matches!(err, PipelineError::InvalidDateFormat { row: 3, .. }));
    }
}
