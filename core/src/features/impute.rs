//! Missing-value imputation: medians for numbers, modes for categories.
//!
//! Statistics are fit on the table being imputed. Dates and free text are
//! left untouched; a null close date is meaningful.

use crate::{
    error::PipelineResult,
    table::{ColumnData, ColumnKind, Table},
};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "strategy", content = "value", rename_all = "snake_case")]
pub enum FillValue {
    Median(f64),
    MostFrequent(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnFill {
    pub column: String,
    pub value: FillValue,
    pub filled: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ImputationReport {
    pub fills: Vec<ColumnFill>,
    /// Numeric or boolean columns with no observed value, removed from the
    /// table since no statistic can be fit on them.
    pub dropped: Vec<String>,
}

impl ImputationReport {
    pub fn fill_for(&self, column: &str) -> Option<&FillValue> {
        self.fills.iter().find(|f| f.column == column).map(|f| &f.value)
    }
}

/// Median of the values; mean of the middle pair for even counts.
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    Some(if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    })
}

/// Most frequent value; ties go to the smallest.
pub fn mode<'a>(values: impl IntoIterator<Item = &'a str>) -> Option<String> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for v in values {
        *counts.entry(v).or_default() += 1;
    }
    counts
        .into_iter()
        .fold(None, |best: Option<(&str, usize)>, (v, n)| match best {
            Some((_, m)) if m >= n => best,
            _ => Some((v, n)),
        })
        .map(|(v, _)| v.to_string())
}

/// Fill nulls. Integer columns with gaps become float columns holding the
/// median. Text columns are imputed only when listed in `categorical`.
/// Numeric and boolean columns that are entirely null are dropped.
pub fn impute_missing(
    table: &Table,
    categorical: &[String],
) -> PipelineResult<(Table, ImputationReport)> {
    let mut out = table.clone();
    let mut report = ImputationReport::default();

    for column in table.columns() {
        let nulls = column.data.null_count();
        if nulls == 0 {
            continue;
        }
        let filled = match &column.data {
            ColumnData::Int(_) | ColumnData::Float(_) => {
                let present: Vec<f64> = (0..column.data.len())
                    .filter_map(|row| column.data.as_f64(row))
                    .collect();
                median(&present).map(|m| {
                    let data = ColumnData::Float(
                        (0..column.data.len())
                            .map(|row| Some(column.data.as_f64(row).unwrap_or(m)))
                            .collect(),
                    );
                    (data, FillValue::Median(m))
                })
            }
            ColumnData::Bool(values) => {
                let trues = values.iter().filter(|v| **v == Some(true)).count();
                let falses = values.iter().filter(|v| **v == Some(false)).count();
                (trues + falses > 0).then(|| {
                    let fill = trues > falses;
                    let data = ColumnData::Bool(values.iter().map(|v| Some(v.unwrap_or(fill)))
                        .collect());
                    (data, FillValue::MostFrequent(fill.to_string()))
                })
            }
            ColumnData::Text(values) if categorical.contains(&column.name) => {
                mode(values.iter().flatten().map(String::as_str)).map(|m| {
                    let data = ColumnData::Text(
                        values
                            .iter()
                            .map(|v| Some(v.clone().unwrap_or_else(|| m.clone())))
                            .collect(),
                    );
                    (data, FillValue::MostFrequent(m))
                })
            }
            _ => None,
        };

        match filled {
            None if matches!(
                column.data.kind(),
                ColumnKind::Int | ColumnKind::Float | ColumnKind::Bool
            ) =>
            {
                log::warn!("impute: {} has no observed values, dropped", column.name);
                out.remove_column(&column.name);
                report.dropped.push(column.name.clone());
            }
            Some((data, value)) => {
                log::debug!("impute: {} <- {:?} ({nulls} cells)", column.name, value);
                out.set_column(column.name.clone(), data)?;
                report.fills.push(ColumnFill {
                    column: column.name.clone(),
                    value,
                    filled: nulls,
                });
            }
            None => log::debug!("impute: {} left with {nulls} nulls", column.name),
        }
    }
    Ok((out, report))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn median_of_even_count_averages_middle() {
        assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]), Some(2.5));
        assert_eq!(median(&[]), None);
    }

    #[test]
    fn mode_breaks_ties_to_smallest() {
        assert_eq!(mode(["b", "a", "b", "a"]), Some("a".into()));
        assert_eq!(mode(["c", "b", "c"]), Some("c".into()));
    }

    #[test]
    fn integer_gaps_become_float_medians() {
        let t = Table::new()
            .with_column("resolution_days", ColumnData::Int(vec![Some(10), None, Some(30), Some(20)]))
            .unwrap();
        let (out, report) = impute_missing(&t, &[]).unwrap();
        assert_eq!(
            out.column("resolution_days"),
            Some(&ColumnData::Float(vec![Some(10.0), Some(20.0), Some(30.0), Some(20.0)]))
        );
        assert_eq!(report.fill_for("resolution_days"), Some(&FillValue::Median(20.0)));
    }

    #[test]
    fn free_text_is_not_imputed() {
        let t = Table::new()
            .with_column("note", ColumnData::Text(vec![Some("x".into()), None]))
            .unwrap()
            .with_column("status", ColumnData::Text(vec![Some("Pending".into()), None]))
            .unwrap();
        let (out, _) = impute_missing(&t, &["status".to_string()]).unwrap();
        assert_eq!(out.column("note").unwrap().null_count(), 1);
        assert_eq!(
            out.column("status"),
            Some(&ColumnData::Text(vec![Some("Pending".into()), Some("Pending".into())]))
        );
    }

    #[test]
    fn all_null_numeric_columns_are_dropped() {
        let t = Table::new()
            .with_column("resolution_days", ColumnData::Int(vec![None, None]))
            .unwrap()
            .with_column("escalated", ColumnData::Bool(vec![None, None]))
            .unwrap()
            .with_column("age", ColumnData::Int(vec![Some(40), None]))
            .unwrap()
            .with_column("note", ColumnData::Text(vec![None, None]))
            .unwrap();
        let (out, report) = impute_missing(&t, &[]).unwrap();
        assert_eq!(out.column_names(), vec!["age", "note"]);
        assert_eq!(report.dropped, vec!["resolution_days", "escalated"]);
        assert_eq!(report.fill_for("age"), Some(&FillValue::Median(40.0)));
    }

    #[test]
    fn imputation_is_deterministic() {
        let t = Table::new()
            .with_column("level", ColumnData::Text(vec![Some("High".into()), None, Some("Low".into())]))
            .unwrap();
        let cats = vec!["level".to_string()];
        assert_eq!(impute_missing(&t, &cats).unwrap().0, impute_missing(&t, &cats).unwrap().0);
    }
}
