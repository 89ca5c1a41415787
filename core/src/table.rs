//! A small typed columnar table.
//!
//! Every stage of the pipeline consumes tables by reference and returns new
//! ones. Columns are nullable and all columns of a table have the same length.

use crate::{
    error::{PipelineError, PipelineResult},
    types::DATE_FORMAT,
};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Int,
    Float,
    Bool,
    Text,
    Date,
}

impl ColumnKind {
    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Int | Self::Float)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "values", rename_all = "snake_case")]
pub enum ColumnData {
    Int(Vec<Option<i64>>),
    Float(Vec<Option<f64>>),
    Bool(Vec<Option<bool>>),
    Text(Vec<Option<String>>),
    Date(Vec<Option<NaiveDate>>),
}

/// One cell of a column read as a date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateCell {
    Valid(NaiveDate),
    Missing,
    Invalid(String),
}

impl ColumnData {
    pub fn len(&self) -> usize {
        match self {
            Self::Int(v) => v.len(),
            Self::Float(v) => v.len(),
            Self::Bool(v) => v.len(),
            Self::Text(v) => v.len(),
            Self::Date(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn kind(&self) -> ColumnKind {
        match self {
            Self::Int(_) => ColumnKind::Int,
            Self::Float(_) => ColumnKind::Float,
            Self::Bool(_) => ColumnKind::Bool,
            Self::Text(_) => ColumnKind::Text,
            Self::Date(_) => ColumnKind::Date,
        }
    }

    pub fn is_null(&self, row: usize) -> bool {
        match self {
            Self::Int(v) => v[row].is_none(),
            Self::Float(v) => v[row].map_or(true, f64::is_nan),
            Self::Bool(v) => v[row].is_none(),
            Self::Text(v) => v[row].is_none(),
            Self::Date(v) => v[row].is_none(),
        }
    }

    pub fn null_count(&self) -> usize {
        (0..self.len()).filter(|&row| self.is_null(row)).count()
    }

    /// Numeric view of a cell. Booleans read as 0/1; text and dates as None.
    pub fn as_f64(&self, row: usize) -> Option<f64> {
        match self {
            Self::Int(v) => v[row].map(|x| x as f64),
            Self::Float(v) => v[row].filter(|x| !x.is_nan()),
            Self::Bool(v) => v[row].map(|b| if b { 1.0 } else { 0.0 }),
            Self::Text(_) | Self::Date(_) => None,
        }
    }

    /// Categorical view of a cell: the level as a string.
    pub fn label(&self, row: usize) -> Option<String> {
        match self {
            Self::Int(v) => v[row].map(|x| x.to_string()),
            Self::Float(v) => v[row].filter(|x| !x.is_nan()).map(|x| x.to_string()),
            Self::Bool(v) => v[row].map(|b| if b { "true".into() } else { "false".into() }),
            Self::Text(v) => v[row].clone(),
            Self::Date(v) => v[row].map(|d| d.format(DATE_FORMAT).to_string()),
        }
    }

    pub fn date_at(&self, row: usize) -> DateCell {
        match self {
            Self::Date(v) => v[row].map_or(DateCell::Missing, DateCell::Valid),
            Self::Text(v) => match v[row].as_deref().map(str::trim) {
                None | Some("") => DateCell::Missing,
                Some(raw) => parse_date(raw).map_or_else(|| DateCell::Invalid(raw.into()), DateCell::Valid),
            },
            other => other
                .label(row)
                .map_or(DateCell::Missing, DateCell::Invalid),
        }
    }

    /// Rows in `rows` order, duplicates allowed.
    pub fn take(&self, rows: &[usize]) -> ColumnData {
        match self {
            Self::Int(v) => Self::Int(rows.iter().map(|&r| v[r]).collect()),
            Self::Float(v) => Self::Float(rows.iter().map(|&r| v[r]).collect()),
            Self::Bool(v) => Self::Bool(rows.iter().map(|&r| v[r]).collect()),
            Self::Text(v) => Self::Text(rows.iter().map(|&r| v[r].clone()).collect()),
            Self::Date(v) => Self::Date(rows.iter().map(|&r| v[r]).collect()),
        }
    }

    /// Like `take`, with `None` producing a null cell (left-join semantics).
    pub fn take_optional(&self, rows: &[Option<usize>]) -> ColumnData {
        match self {
            Self::Int(v) => Self::Int(rows.iter().map(|r| r.and_then(|r| v[r])).collect()),
            Self::Float(v) => Self::Float(rows.iter().map(|r| r.and_then(|r| v[r])).collect()),
            Self::Bool(v) => Self::Bool(rows.iter().map(|r| r.and_then(|r| v[r])).collect()),
            Self::Text(v) => Self::Text(rows.iter().map(|r| r.and_then(|r| v[r].clone())).collect()),
            Self::Date(v) => Self::Date(rows.iter().map(|r| r.and_then(|r| v[r])).collect()),
        }
    }
}

/// Parse a textual date. Accepts `YYYY-MM-DD`, `YYYY-MM-DD HH:MM:SS`
/// and RFC 3339 timestamps; time-of-day is discarded.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, DATE_FORMAT)
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
                .ok()
                .map(|dt| dt.date())
        })
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Column {
    pub name: String,
    pub data: ColumnData,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Table {
    columns: Vec<Column>,
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn n_rows(&self) -> usize {
        self.columns.first().map_or(0, |c| c.data.len())
    }

    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    /// (rows, columns)
    pub fn shape(&self) -> (usize, usize) {
        (self.n_rows(), self.n_cols())
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }

    pub fn column(&self, name: &str) -> Option<&ColumnData> {
        self.columns.iter().find(|c| c.name == name).map(|c| &c.data)
    }

    /// Column or `MissingColumn` naming it.
    pub fn expect_column(&self, name: &str) -> PipelineResult<&ColumnData> {
        self.column(name).ok_or_else(|| PipelineError::missing([name]))
    }

    /// Fails with every absent name at once.
    pub fn require(&self, names: &[&str]) -> PipelineResult<()> {
        let missing: Vec<&str> = names
            .iter()
            .copied()
            .filter(|n| !self.has_column(n))
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(PipelineError::missing(missing))
        }
    }

    /// Append a column, or replace the one with the same name in place.
    pub fn set_column(&mut self, name: impl Into<String>, data: ColumnData) -> PipelineResult<()> {
        let name = name.into();
        let existing = self.columns.iter().position(|c| c.name == name);
        let others = self.columns.len() - usize::from(existing.is_some());
        if others > 0 && data.len() != self.n_rows() {
            return Err(PipelineError::ShapeMismatch {
                column: name,
                expected: self.n_rows(),
                actual: data.len(),
            });
        }
        match existing {
            Some(idx) => self.columns[idx].data = data,
            None => self.columns.push(Column { name, data }),
        }
        Ok(())
    }

    pub fn with_column(mut self, name: impl Into<String>, data: ColumnData) -> PipelineResult<Self> {
        self.set_column(name, data)?;
        Ok(self)
    }

    pub fn remove_column(&mut self, name: &str) -> Option<ColumnData> {
        let idx = self.columns.iter().position(|c| c.name == name)?;
        Some(self.columns.remove(idx).data)
    }

    pub fn take_rows(&self, rows: &[usize]) -> Table {
        Table {
            columns: self
                .columns
                .iter()
                .map(|c| Column {
                    name: c.name.clone(),
                    data: c.data.take(rows),
                })
                .collect(),
        }
    }

    /// Strictly parsed dates of `name`; the first unparseable cell fails.
    pub fn dates(&self, name: &str) -> PipelineResult<Vec<Option<NaiveDate>>> {
        let data = self.expect_column(name)?;
        (0..data.len())
            .map(|row| match data.date_at(row) {
                DateCell::Valid(d) => Ok(Some(d)),
                DateCell::Missing => Ok(None),
                DateCell::Invalid(value) => Err(PipelineError::InvalidDateFormat {
                    column: name.to_string(),
                    row,
                    value,
                }),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Table {
        Table::new()
            .with_column("id", ColumnData::Int(vec![Some(1), Some(2), Some(3)]))
            .unwrap()
            .with_column(
                "when",
                ColumnData::Text(vec![
                    Some("2023-01-05".into()),
                    Some("2023-02-01 10:30:00".into()),
                    None,
                ]),
            )
            .unwrap()
    }

    #[test]
    fn rejects_ragged_columns() {
        let err = sample()
            .with_column("short", ColumnData::Bool(vec![Some(true)]))
            .unwrap_err();
        assert!(matches!(err, PipelineError::ShapeMismatch { expected: 3, actual: 1, .. }));
    }

    #[test]
    fn require_lists_every_missing_column() {
        let err = sample().require(&["id", "a", "b"]).unwrap_err();
        match err {
            PipelineError::MissingColumn { columns } => assert_eq!(columns, vec!["a", "b"]),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn text_dates_parse_with_time_component() {
        let dates = sample().dates("when").unwrap();
        assert_eq!(dates[0], NaiveDate::from_ymd_opt(2023, 1, 5));
        assert_eq!(dates[1], NaiveDate::from_ymd_opt(2023, 2, 1));
        assert_eq!(dates[2], None);
    }

    #[test]
    fn garbage_dates_fail_with_position() {
        let table = Table::new()
            .with_column("d", ColumnData::Text(vec![Some("2023-01-01".into()), Some("soon".into())]))
            .unwrap();
        match table.dates("d").unwrap_err() {
            PipelineError::InvalidDateFormat { column, row, value } => {
                assert_eq!((column.as_str(), row, value.as_str()), ("d", 1, "soon"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn take_rows_reorders_every_column() {
        let t = sample().take_rows(&[2, 0]);
        assert_eq!(t.shape(), (2, 2));
        assert_eq!(t.column("id"), Some(&ColumnData::Int(vec![Some(3), Some(1)])));
    }
}
