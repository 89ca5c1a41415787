//! Time-based train/test partitioning.
//!
//! The split instant is the `train_ratio` quantile of the parsed dates
//! (linear interpolation between order statistics). Rows dated strictly
//! before the instant train; the rest test. Both partitions keep input order.
//!
//! A partition smaller than the configured floors is reported as a
//! `SplitWarning`, never an error. Falling back to a random split is the
//! caller's decision; see `random_split`.

use crate::{
    config::{DatePolicy, SplitConfig},
    error::{PipelineError, PipelineResult},
    rng::RandomSource,
    table::{DateCell, Table},
};
use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Partition {
    Train,
    Test,
}

impl std::fmt::Display for Partition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Train => "train",
            Self::Test => "test",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SplitWarning {
    DegenerateSplit {
        partition: Partition,
        fraction: f64,
        minimum: f64,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SplitReport {
    pub train_rows: usize,
    pub test_rows: usize,
    pub train_fraction: f64,
    pub test_fraction: f64,
    pub warnings: Vec<SplitWarning>,
}

impl SplitReport {
    pub fn is_degenerate(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// A row the splitter could not place. `value` is None for a null cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RejectedRow {
    pub row: usize,
    pub value: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeDistribution {
    pub min_date: NaiveDate,
    pub max_date: NaiveDate,
    pub range_days: i64,
    pub total_records: usize,
    pub unique_dates: usize,
    pub records_per_day: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TemporalSplit {
    pub train: Table,
    pub test: Table,
    /// Input row indices of each partition, ascending.
    pub train_rows: Vec<usize>,
    pub test_rows: Vec<usize>,
    pub split_instant: NaiveDateTime,
    pub report: SplitReport,
    pub rejected: Vec<RejectedRow>,
    pub distribution: TimeDistribution,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RandomSplit {
    pub train: Table,
    pub test: Table,
    pub train_rows: Vec<usize>,
    pub test_rows: Vec<usize>,
}

pub struct TemporalSplitter {
    config: SplitConfig,
}

impl TemporalSplitter {
    pub fn new(config: SplitConfig) -> PipelineResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &SplitConfig {
        &self.config
    }

    pub fn split(&self, table: &Table, date_column: &str) -> PipelineResult<TemporalSplit> {
        if table.n_rows() == 0 {
            return Err(PipelineError::InvalidArgument(
                "cannot split an empty table".into(),
            ));
        }
        let column = table.expect_column(date_column)?;

        let mut dated: Vec<(usize, NaiveDate)> = Vec::with_capacity(column.len());
        let mut rejected = Vec::new();
        for row in 0..column.len() {
            let value = match column.date_at(row) {
                DateCell::Valid(d) => {
                    dated.push((row, d));
                    continue;
                }
                DateCell::Missing => None,
                DateCell::Invalid(raw) => Some(raw),
            };
            match self.config.date_policy {
                DatePolicy::Strict => {
                    return Err(PipelineError::InvalidDateFormat {
                        column: date_column.to_string(),
                        row,
                        value: value.unwrap_or_default(),
                    })
                }
                DatePolicy::RejectUnparseable => rejected.push(RejectedRow { row, value }),
            }
        }
        if !rejected.is_empty() {
            log::warn!(
                "split: {} rows of {date_column} rejected as unparseable (first at row {})",
                rejected.len(),
                rejected[0].row
            );
        }

        let dates: Vec<NaiveDate> = dated.iter().map(|(_, d)| *d).collect();
        let (Some(distribution), Some(split_instant)) = (
            analyze_time_distribution(&dates),
            quantile_instant(&dates, self.config.train_ratio),
        ) else {
            return Err(PipelineError::InvalidArgument(format!(
                "no parseable dates in {date_column}"
            )));
        };
        log::info!(
            "split: {} .. {} ({} days, {} records, {} unique dates, {:.2} per day)",
            distribution.min_date,
            distribution.max_date,
            distribution.range_days,
            distribution.total_records,
            distribution.unique_dates,
            distribution.records_per_day
        );

        let (train_rows, test_rows): (Vec<_>, Vec<_>) = dated
            .iter()
            .partition(|(_, d)| d.and_time(NaiveTime::MIN) < split_instant);
        let train_rows: Vec<usize> = train_rows.into_iter().map(|&(r, _)| r).collect();
        let test_rows: Vec<usize> = test_rows.into_iter().map(|&(r, _)| r).collect();

        let report = self.validate_split(train_rows.len(), test_rows.len());
        log::info!(
            "split: at {split_instant}: train {} ({:.1}%), test {} ({:.1}%)",
            report.train_rows,
            report.train_fraction * 100.0,
            report.test_rows,
            report.test_fraction * 100.0
        );

        Ok(TemporalSplit {
            train: table.take_rows(&train_rows),
            test: table.take_rows(&test_rows),
            train_rows,
            test_rows,
            split_instant,
            report,
            rejected,
            distribution,
        })
    }

    fn validate_split(&self, train_rows: usize, test_rows: usize) -> SplitReport {
        let total = (train_rows + test_rows).max(1) as f64;
        let train_fraction = train_rows as f64 / total;
        let test_fraction = test_rows as f64 / total;

        let mut warnings = Vec::new();
        for (partition, fraction, minimum) in [
            (Partition::Train, train_fraction, self.config.min_train_fraction),
            (Partition::Test, test_fraction, self.config.min_test_fraction),
        ] {
            if fraction < minimum {
                log::warn!(
                    "split: {partition} set too small: {:.1}% < {:.1}%",
                    fraction * 100.0,
                    minimum * 100.0
                );
                warnings.push(SplitWarning::DegenerateSplit {
                    partition,
                    fraction,
                    minimum,
                });
            }
        }
        SplitReport {
            train_rows,
            test_rows,
            train_fraction,
            test_fraction,
            warnings,
        }
    }
}

/// Linear-interpolation quantile of `dates` as an instant. None if empty.
pub fn quantile_instant(dates: &[NaiveDate], q: f64) -> Option<NaiveDateTime> {
    let mut sorted = dates.to_vec();
    sorted.sort_unstable();
    let first = *sorted.first()?;
    let q = q.clamp(0.0, 1.0);

    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let offset = |d: NaiveDate| (d - first).num_seconds() as f64;
    let lo_s = offset(sorted[lo]);
    let hi_s = offset(sorted[hi]);
    let seconds = lo_s + (hi_s - lo_s) * (pos - lo as f64);

    Some(first.and_time(NaiveTime::MIN) + Duration::seconds(seconds.round() as i64))
}

pub fn analyze_time_distribution(dates: &[NaiveDate]) -> Option<TimeDistribution> {
    let min_date = *dates.iter().min()?;
    let max_date = *dates.iter().max()?;
    let unique_dates = dates.iter().collect::<BTreeSet<_>>().len();
    Some(TimeDistribution {
        min_date,
        max_date,
        range_days: (max_date - min_date).num_days(),
        total_records: dates.len(),
        unique_dates,
        records_per_day: dates.len() as f64 / unique_dates as f64,
    })
}

/// Shuffle row indices and hold out `ceil(n * test_fraction)` of them.
/// Both partitions keep input row order.
pub fn random_split(
    table: &Table,
    test_fraction: f64,
    rng: &mut RandomSource,
) -> PipelineResult<RandomSplit> {
    if !(test_fraction > 0.0 && test_fraction < 1.0) {
        return Err(PipelineError::InvalidArgument(format!(
            "test_fraction must lie in (0, 1), got {test_fraction}"
        )));
    }
    let n = table.n_rows();
    if n == 0 {
        return Err(PipelineError::InvalidArgument(
            "cannot split an empty table".into(),
        ));
    }

    let mut order: Vec<usize> = (0..n).collect();
    rng.shuffle(&mut order);
    let test_n = ((n as f64 * test_fraction).ceil() as usize).min(n);
    let (test_part, train_part) = order.split_at(test_n);
    let mut test_rows = test_part.to_vec();
    let mut train_rows = train_part.to_vec();
    test_rows.sort_unstable();
    train_rows.sort_unstable();

    log::info!(
        "split: random {}/{} rows (test fraction {test_fraction})",
        train_rows.len(),
        test_rows.len()
    );
    Ok(RandomSplit {
        train: table.take_rows(&train_rows),
        test: table.take_rows(&test_rows),
        train_rows,
        test_rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::ColumnData;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn quantile_interpolates_between_order_statistics() {
        let dates = [d(2024, 1, 1), d(2024, 1, 11)];
        let q = quantile_instant(&dates, 0.8).unwrap();
        assert_eq!(q, d(2024, 1, 9).and_time(NaiveTime::MIN));

        let q = quantile_instant(&[d(2024, 1, 1), d(2024, 1, 2)], 0.25).unwrap();
        assert_eq!(q, d(2024, 1, 1).and_hms_opt(6, 0, 0).unwrap());
        assert_eq!(quantile_instant(&[], 0.5), None);
    }

    #[test]
    fn distribution_counts_unique_days() {
        let stats =
            analyze_time_distribution(&[d(2024, 1, 1), d(2024, 1, 1), d(2024, 1, 5)]).unwrap();
        assert_eq!(stats.range_days, 4);
        assert_eq!(stats.unique_dates, 2);
        assert_eq!(stats.records_per_day, 1.5);
    }

    #[test]
    fn invalid_ratio_is_rejected() {
        let config = SplitConfig {
            train_ratio: 0.0,
            ..SplitConfig::default()
        };
        assert!(matches!(
            TemporalSplitter::new(config),
            Err(PipelineError::InvalidArgument(_))
        ));
    }

    #[test]
    fn empty_table_is_rejected() {
        let table = Table::new()
            .with_column("open_date", ColumnData::Date(vec![]))
            .unwrap();
        let splitter = TemporalSplitter::new(SplitConfig::default()).unwrap();
        assert!(splitter.split(&table, "open_date").is_err());
    }

    #[test]
    fn strict_policy_fails_on_null_dates() {
        let table = Table::new()
            .with_column("open_date", ColumnData::Date(vec![Some(d(2024, 1, 1)), None]))
            .unwrap();
        let splitter = TemporalSplitter::new(SplitConfig::default()).unwrap();
        let err = splitter.split(&table, "open_date").unwrap_err();
        assert!(matches!(err, PipelineError::InvalidDateFormat { row: 1, .. }));
    }

    #[test]
    fn random_split_uses_ceiling_and_keeps_order() {
        let table = Table::new()
            .with_column("id", ColumnData::Int((0..11).map(Some).collect()))
            .unwrap();
        let mut rng = RandomSource::new(9);
        let split = random_split(&table, 0.2, &mut rng).unwrap();
        assert_eq!(split.test_rows.len(), 3);
        assert_eq!(split.train_rows.len(), 8);
        assert!(split.test_rows.windows(2).all(|w| w[0] < w[1]));
        assert!(split.train_rows.windows(2).all(|w| w[0] < w[1]));
    }
}
