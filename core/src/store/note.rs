use super::{format_date, parse_stored_date, CaseStore};
use crate::{
    error::PipelineResult,
    model::{CaseNote, NoteType},
};
use rusqlite::params;

impl CaseStore {
    // ── Case note ─────────────────────────────────────────────────

    pub fn insert_note(&self, run_id: &str, n: &CaseNote) -> PipelineResult<()> {
        self.conn.execute(
            "INSERT INTO case_note (
                run_id, note_id, case_id, note_date, note_type, note_text, created_by
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                run_id,
                n.note_id,
                n.case_id,
                format_date(n.note_date),
                n.note_type.label(),
                &n.note_text,
                &n.created_by,
            ],
        )?;
        Ok(())
    }

    /// Notes of a run in id order.
    pub fn notes(&self, run_id: &str) -> PipelineResult<Vec<CaseNote>> {
        let mut stmt = self.conn.prepare(
            "SELECT note_id, case_id, note_date, note_type, note_text, created_by
             FROM case_note WHERE run_id = ?1 ORDER BY note_id ASC",
        )?;
        let rows = stmt
            .query_map(params![run_id], |row| {
                Ok((
                    row.get::<_, u32>(0)?,
                    row.get::<_, u32>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, String>(5)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .enumerate()
            .map(|(i, (note_id, case_id, date, note_type, note_text, created_by))| -> PipelineResult<CaseNote> {
                Ok(CaseNote {
                    note_id,
                    case_id,
                    note_date: parse_stored_date("note_date", i, &date)?,
                    note_type: NoteType::from_label(&note_type)?,
                    note_text,
                    created_by,
                })
            })
            .collect()
    }

    pub fn note_count_for_case(&self, run_id: &str, case_id: u32) -> PipelineResult<i64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM case_note WHERE run_id = ?1 AND case_id = ?2",
            params![run_id, case_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}
