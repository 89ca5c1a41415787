//! Calendar, tenure, duration, complexity and age-group features.

use crate::{
    clock::ReferenceClock,
    error::PipelineResult,
    model::Complexity,
    table::{ColumnData, Table},
};
use chrono::{Datelike, NaiveDate};

/// Date columns normalised to typed dates before derivation.
pub const DATE_COLUMNS: &[&str] = &["open_date", "close_date", "join_date"];

/// Upper bounds (inclusive) and labels of the client age groups.
const AGE_GROUPS: &[(i64, &str)] = &[
    (25, "Young"),
    (35, "Young Adult"),
    (50, "Adult"),
    (65, "Senior"),
    (100, "Elderly"),
];

pub fn age_group(age: i64) -> Option<&'static str> {
    if age <= 0 {
        return None;
    }
    AGE_GROUPS
        .iter()
        .find(|(upper, _)| age <= *upper)
        .map(|(_, label)| *label)
}

/// Add derived columns. Text date columns are parsed strictly; a value that
/// does not parse fails the whole stage with `InvalidDateFormat`.
pub fn derive_features(table: &Table, clock: &ReferenceClock) -> PipelineResult<Table> {
    table.require(&["open_date"])?;
    let mut out = table.clone();

    for name in DATE_COLUMNS {
        if out.has_column(name) {
            let parsed = out.dates(name)?;
            out.set_column(*name, ColumnData::Date(parsed))?;
        }
    }

    let open = out.dates("open_date")?;
    let per_open = |f: &dyn Fn(NaiveDate) -> i64| -> ColumnData {
        ColumnData::Int(open.iter().map(|d| d.map(f)).collect())
    };
    out.set_column("month_opened", per_open(&|d| d.month().into()))?;
    out.set_column("year_opened", per_open(&|d| d.year().into()))?;
    out.set_column(
        "day_of_week_opened",
        per_open(&|d| d.weekday().num_days_from_monday().into()),
    )?;
    out.set_column(
        "is_weekend",
        per_open(&|d| i64::from(d.weekday().num_days_from_monday() >= 5)),
    )?;

    if out.has_column("join_date") {
        let joined = out.dates("join_date")?;
        let tenure = open
            .iter()
            .zip(&joined)
            .map(|(o, j)| Some(((*o)? - (*j)?).num_days()))
            .collect();
        out.set_column("client_tenure_days", ColumnData::Int(tenure))?;
    }

    let closed = if out.has_column("close_date") {
        out.dates("close_date")?
    } else {
        vec![None; open.len()]
    };
    let duration = open
        .iter()
        .zip(&closed)
        .map(|(o, c)| {
            let o = (*o)?;
            Some(match c {
                Some(c) => (*c - o).num_days(),
                None => clock.days_since(o),
            })
        })
        .collect();
    out.set_column("case_duration", ColumnData::Int(duration))?;

    if !out.has_column("complexity_score") {
        if let Some(levels) = out.column("complexity") {
            let scores = (0..levels.len())
                .map(|row| {
                    levels
                        .label(row)
                        .and_then(|l| Complexity::from_label(&l).ok())
                        .map(|c| c.score())
                })
                .collect();
            out.set_column("complexity_score", ColumnData::Int(scores))?;
        }
    }

    if let Some(ages) = out.column("age") {
        let groups = (0..ages.len())
            .map(|row| {
                ages.as_f64(row)
                    .and_then(|a| age_group(a.round() as i64))
                    .map(String::from)
            })
            .collect();
        out.set_column("age_group", ColumnData::Text(groups))?;
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;

    fn date(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(y, m, d)
    }

    fn base() -> Table {
        Table::new()
            .with_column("open_date", ColumnData::Date(vec![date(2024, 6, 1), date(2024, 6, 3)]))
            .unwrap()
            .with_column("close_date", ColumnData::Date(vec![date(2024, 6, 11), None]))
            .unwrap()
            .with_column("join_date", ColumnData::Date(vec![date(2024, 5, 1), date(2024, 6, 3)]))
            .unwrap()
            .with_column(
                "complexity",
                ColumnData::Text(vec![Some("High".into()), Some("Low".into())]),
            )
            .unwrap()
            .with_column("age", ColumnData::Int(vec![Some(25), Some(66)]))
            .unwrap()
    }

    #[test]
    fn calendar_breakdown_and_weekend_flag() {
        // 2024-06-01 is a Saturday, 2024-06-03 a Monday.
        let out = derive_features(&base(), &ReferenceClock::default()).unwrap();
        assert_eq!(out.column("day_of_week_opened"), Some(&ColumnData::Int(vec![Some(5), Some(0)])));
        assert_eq!(out.column("is_weekend"), Some(&ColumnData::Int(vec![Some(1), Some(0)])));
        assert_eq!(out.column("month_opened"), Some(&ColumnData::Int(vec![Some(6), Some(6)])));
    }

    #[test]
    fn duration_uses_as_of_for_open_cases() {
        let clock = ReferenceClock::new(NaiveDate::from_ymd_opt(2024, 6, 30).unwrap());
        let out = derive_features(&base(), &clock).unwrap();
        assert_eq!(out.column("case_duration"), Some(&ColumnData::Int(vec![Some(10), Some(27)])));
        assert_eq!(out.column("client_tenure_days"), Some(&ColumnData::Int(vec![Some(31), Some(0)])));
    }

    #[test]
    fn complexity_and_age_groups() {
        let out = derive_features(&base(), &ReferenceClock::default()).unwrap();
        assert_eq!(out.column("complexity_score"), Some(&ColumnData::Int(vec![Some(3), Some(1)])));
        assert_eq!(
            out.column("age_group"),
            Some(&ColumnData::Text(vec![Some("Young".into()), Some("Elderly".into())]))
        );
    }

    #[test]
    fn unparseable_text_dates_fail() {
        let t = Table::new()
            .with_column("open_date", ColumnData::Text(vec![Some("2024-13-45".into())]))
            .unwrap();
        let err = derive_features(&t, &ReferenceClock::default()).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidDateFormat { row: 0, .. }));
    }
}
