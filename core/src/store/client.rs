use super::{format_date, parse_stored_date, CaseStore};
use crate::{
    error::PipelineResult,
    model::{Client, IncomeLevel},
};
use rusqlite::params;

impl CaseStore {
    // ── Client ────────────────────────────────────────────────────

    pub fn insert_client(&self, run_id: &str, c: &Client) -> PipelineResult<()> {
        self.conn.execute(
            "INSERT INTO client (
                run_id, client_id, name, age, income_level, location, join_date
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                run_id,
                c.client_id,
                &c.name,
                c.age,
                c.income_level.label(),
                &c.location,
                format_date(c.join_date),
            ],
        )?;
        Ok(())
    }

    /// Clients of a run in id order.
    pub fn clients(&self, run_id: &str) -> PipelineResult<Vec<Client>> {
        let mut stmt = self.conn.prepare(
            "SELECT client_id, name, age, income_level, location, join_date
             FROM client WHERE run_id = ?1 ORDER BY client_id ASC",
        )?;
        let rows = stmt
            .query_map(params![run_id], |row| {
                Ok((
                    row.get::<_, u32>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, u32>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, String>(5)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .enumerate()
            .map(|(i, (client_id, name, age, income, location, joined))| -> PipelineResult<Client> {
                Ok(Client {
                    client_id,
                    name,
                    age,
                    income_level: IncomeLevel::from_label(&income)?,
                    location,
                    join_date: parse_stored_date("join_date", i, &joined)?,
                })
            })
            .collect()
    }
}
