use super::{format_date, parse_stored_date, CaseStore};
use crate::{
    error::PipelineResult,
    model::{Case, CaseStatus, CaseType, Complexity},
};
use rusqlite::params;

struct CaseRow {
    case_id: u32,
    client_id: u32,
    case_type: String,
    open_date: String,
    close_date: Option<String>,
    resolution_days: Option<i64>,
    status: String,
    complexity: String,
    assignee: String,
    escalated: bool,
}

impl CaseStore {
    // ── Case ──────────────────────────────────────────────────────

    pub fn insert_case(&self, run_id: &str, c: &Case) -> PipelineResult<()> {
        self.conn.execute(
            "INSERT INTO legal_case (
                run_id, case_id, client_id, case_type, open_date, close_date,
                resolution_days, status, complexity, assignee, escalated
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                run_id,
                c.case_id,
                c.client_id,
                c.case_type.label(),
                format_date(c.open_date),
                c.close_date.map(format_date),
                c.resolution_days,
                c.status.label(),
                c.complexity.label(),
                &c.assignee,
                if c.escalated { 1 } else { 0 },
            ],
        )?;
        Ok(())
    }

    /// Cases of a run in id order.
    pub fn cases(&self, run_id: &str) -> PipelineResult<Vec<Case>> {
        let mut stmt = self.conn.prepare(
            "SELECT case_id, client_id, case_type, open_date, close_date, resolution_days,
                    status, complexity, assignee, escalated
             FROM legal_case WHERE run_id = ?1 ORDER BY case_id ASC",
        )?;
        let rows = stmt
            .query_map(params![run_id], |row| {
                Ok(CaseRow {
                    case_id: row.get(0)?,
                    client_id: row.get(1)?,
                    case_type: row.get(2)?,
                    open_date: row.get(3)?,
                    close_date: row.get(4)?,
                    resolution_days: row.get(5)?,
                    status: row.get(6)?,
                    complexity: row.get(7)?,
                    assignee: row.get(8)?,
                    escalated: row.get::<_, i32>(9)? != 0,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .enumerate()
            .map(|(i, r)| -> PipelineResult<Case> {
                Ok(Case {
                    case_id: r.case_id,
                    client_id: r.client_id,
                    case_type: CaseType::from_label(&r.case_type)?,
                    open_date: parse_stored_date("open_date", i, &r.open_date)?,
                    close_date: r
                        .close_date
                        .as_deref()
                        .map(|d| parse_stored_date("close_date", i, d))
                        .transpose()?,
                    resolution_days: r.resolution_days,
                    status: CaseStatus::from_label(&r.status)?,
                    complexity: Complexity::from_label(&r.complexity)?,
                    assignee: r.assignee,
                    escalated: r.escalated,
                })
            })
            .collect()
    }

    /// Cases per status label, most frequent first.
    pub fn status_counts(&self, run_id: &str) -> PipelineResult<Vec<(String, i64)>> {
        let mut stmt = self.conn.prepare(
            "SELECT status, COUNT(*) AS n FROM legal_case WHERE run_id = ?1
             GROUP BY status ORDER BY n DESC, status ASC",
        )?;
        let rows = stmt.query_map(params![run_id], |row| Ok((row.get(0)?, row.get(1)?)))?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}
