//! Case → client left join and per-case note aggregation.

use crate::{
    error::PipelineResult,
    table::{ColumnData, Table},
};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Suffix for client columns whose name is already taken by a case column.
const CLIENT_SUFFIX: &str = "_client";

/// Left join: every case row survives; client columns are null for cases
/// whose `client_id` has no match. Join keys compare by their text form.
pub fn merge_clients(cases: &Table, clients: &Table) -> PipelineResult<Table> {
    cases.require(&["case_id", "client_id"])?;
    clients.require(&["client_id"])?;

    let client_keys = clients.expect_column("client_id")?;
    let mut by_key: HashMap<String, usize> = HashMap::with_capacity(client_keys.len());
    for row in 0..client_keys.len() {
        if let Some(key) = client_keys.label(row) {
            // First occurrence wins on duplicate keys.
            by_key.entry(key).or_insert(row);
        }
    }

    let case_keys = cases.expect_column("client_id")?;
    let matches: Vec<Option<usize>> = (0..case_keys.len())
        .map(|row| case_keys.label(row).and_then(|k| by_key.get(&k).copied()))
        .collect();
    let unmatched = matches.iter().filter(|m| m.is_none()).count();
    if unmatched > 0 {
        log::warn!("merge: {unmatched} cases reference unknown clients");
    }

    let mut merged = cases.clone();
    for column in clients.columns() {
        if column.name == "client_id" {
            continue;
        }
        let name = if merged.has_column(&column.name) {
            format!("{}{CLIENT_SUFFIX}", column.name)
        } else {
            column.name.clone()
        };
        merged.set_column(name, column.data.take_optional(&matches))?;
    }
    Ok(merged)
}

#[derive(Default)]
struct NoteGroup {
    count: i64,
    types: BTreeMap<String, usize>,
    texts: Vec<String>,
    authors: BTreeSet<String>,
}

impl NoteGroup {
    /// Highest count wins; ties go to the lexicographically smallest type.
    fn most_common_type(&self) -> Option<String> {
        self.types
            .iter()
            .max_by(|a, b| a.1.cmp(b.1).then_with(|| b.0.cmp(a.0)))
            .map(|(t, _)| t.clone())
    }
}

/// Attach per-case note summaries: `total_notes`, `most_common_note_type`,
/// `combined_notes` and `unique_creators`. Cases without notes get zero
/// counts, an empty text and a null note type.
pub fn attach_note_summaries(merged: &Table, notes: &Table) -> PipelineResult<Table> {
    notes.require(&["case_id"])?;
    let note_case = notes.expect_column("case_id")?;
    let note_type = notes.column("note_type");
    let note_text = notes.column("note_text");
    let created_by = notes.column("created_by");

    let mut groups: HashMap<String, NoteGroup> = HashMap::new();
    for row in 0..note_case.len() {
        let Some(key) = note_case.label(row) else {
            continue;
        };
        let group = groups.entry(key).or_default();
        group.count += 1;
        if let Some(t) = note_type.and_then(|c| c.label(row)) {
            *group.types.entry(t).or_default() += 1;
        }
        if let Some(text) = note_text.and_then(|c| c.label(row)) {
            group.texts.push(text);
        }
        if let Some(author) = created_by.and_then(|c| c.label(row)) {
            group.authors.insert(author);
        }
    }

    let case_keys = merged.expect_column("case_id")?;
    let per_case: Vec<Option<&NoteGroup>> = (0..case_keys.len())
        .map(|row| case_keys.label(row).and_then(|k| groups.get(&k)))
        .collect();

    let mut out = merged.clone();
    out.set_column(
        "total_notes",
        ColumnData::Int(per_case.iter().map(|g| Some(g.map_or(0, |g| g.count))).collect()),
    )?;
    if note_type.is_some() {
        out.set_column(
            "most_common_note_type",
            ColumnData::Text(per_case.iter().map(|g| g.and_then(NoteGroup::most_common_type)).collect()),
        )?;
    }
    if note_text.is_some() {
        out.set_column(
            "combined_notes",
            ColumnData::Text(
                per_case
                    .iter()
                    .map(|g| Some(g.map_or_else(String::new, |g| g.texts.join(" "))))
                    .collect(),
            ),
        )?;
    }
    if created_by.is_some() {
        out.set_column(
            "unique_creators",
            ColumnData::Int(
                per_case
                    .iter()
                    .map(|g| Some(g.map_or(0, |g| g.authors.len() as i64)))
                    .collect(),
            ),
        )?;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ints(v: &[i64]) -> ColumnData {
        ColumnData::Int(v.iter().map(|x| Some(*x)).collect())
    }

    fn texts(v: &[&str]) -> ColumnData {
        ColumnData::Text(v.iter().map(|x| Some(x.to_string())).collect())
    }

    #[test]
    fn left_join_keeps_unmatched_cases() {
        let cases = Table::new()
            .with_column("case_id", ints(&[0, 1, 2]))
            .unwrap()
            .with_column("client_id", ints(&[10, 99, 10]))
            .unwrap();
        let clients = Table::new()
            .with_column("client_id", ints(&[10]))
            .unwrap()
            .with_column("age", ints(&[40]))
            .unwrap();
        let merged = merge_clients(&cases, &clients).unwrap();
        assert_eq!(merged.shape(), (3, 3));
        assert_eq!(merged.column("age"), Some(&ColumnData::Int(vec![Some(40), None, Some(40)])));
    }

    #[test]
    fn note_summaries_cover_cases_without_notes() {
        let merged = Table::new().with_column("case_id", ints(&[0, 1])).unwrap();
        let notes = Table::new()
            .with_column("case_id", ints(&[0, 0, 0]))
            .unwrap()
            .with_column("note_type", texts(&["Research", "Court Appearance", "Research"]))
            .unwrap()
            .with_column("note_text", texts(&["a", "b", "c"]))
            .unwrap()
            .with_column("created_by", texts(&["Attorney_1", "Staff_2", "Attorney_1"]))
            .unwrap();
        let out = attach_note_summaries(&merged, &notes).unwrap();
        assert_eq!(out.column("total_notes"), Some(&ints(&[3, 0])));
        assert_eq!(
            out.column("most_common_note_type"),
            Some(&ColumnData::Text(vec![Some("Research".into()), None]))
        );
        assert_eq!(out.column("combined_notes"), Some(&texts(&["a b c", ""])));
        assert_eq!(out.column("unique_creators"), Some(&ints(&[2, 0])));
    }

    #[test]
    fn most_common_type_ties_break_alphabetically() {
        let merged = Table::new().with_column("case_id", ints(&[5])).unwrap();
        let notes = Table::new()
            .with_column("case_id", ints(&[5, 5]))
            .unwrap()
            .with_column("note_type", texts(&["Research", "Document Review"]))
            .unwrap();
        let out = attach_note_summaries(&merged, &notes).unwrap();
        assert_eq!(
            out.column("most_common_note_type"),
            Some(&ColumnData::Text(vec![Some("Document Review".into())]))
        );
    }
}
