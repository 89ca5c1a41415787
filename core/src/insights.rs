//! Descriptive analytics over an engineered (or raw) case table.
//!
//! Fields are looked up through the `FeatureSchema`: a raw column wins, an
//! encoded field is decoded from its indicators otherwise. Hard-required
//! inputs fail with `MissingColumn`; optional ones drop their slice.

use crate::{
    error::{PipelineError, PipelineResult},
    features::{encode::IDENTIFIER_COLUMNS, FeatureSchema, FieldRole, TARGET_COLUMN},
    features::impute::median,
    model::{CaseStatus, Complexity},
    table::Table,
};
use chrono::Datelike;
use serde::Serialize;
use std::collections::BTreeMap;

/// Group label used when no assignee information exists.
pub const OVERALL: &str = "Overall";

/// Nominal fields whose levels are compared on duration.
const IMPACT_FIELDS: &[&str] = &["complexity", "case_type", "assignee"];

const AGE_BUCKETS: &[(f64, &str)] = &[(30.0, "<30"), (45.0, "30-45"), (60.0, "45-60"), (100.0, "60+")];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Correlation {
    pub feature: String,
    pub coefficient: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaseTypeResolution {
    pub case_type: String,
    pub cases: usize,
    pub resolved: usize,
    pub resolution_rate: f64,
}

/// Duration statistics of one level of a nominal field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DurationStats {
    pub level: String,
    pub count: usize,
    pub mean: f64,
    pub median: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoricalImpact {
    pub field: String,
    pub levels: Vec<DurationStats>,
}

/// Case volume and resolution rate of one calendar month of openings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyTrend {
    /// `YYYY-MM`
    pub month: String,
    pub cases: usize,
    pub resolved: usize,
    pub resolution_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssigneePerformance {
    pub assignee: String,
    pub cases: usize,
    pub resolved: usize,
    pub resolution_rate: f64,
    pub avg_resolution_days: Option<f64>,
    pub median_resolution_days: Option<f64>,
    pub avg_complexity: Option<f64>,
    pub escalation_rate: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EscalationRow {
    pub group: String,
    pub cases: usize,
    pub escalated_share: f64,
    pub not_escalated_share: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EscalationPatterns {
    pub by_case_type: Vec<EscalationRow>,
    /// None when the table carries no client age.
    pub by_age_group: Option<Vec<EscalationRow>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InsightSummary {
    pub total_cases: usize,
    pub resolved_cases: usize,
    pub resolution_rate: f64,
    pub escalated_cases: Option<usize>,
    pub escalation_rate: Option<f64>,
    /// Case type and its share of all cases.
    pub most_common_case_type: Option<(String, f64)>,
    /// Assignee and their case count.
    pub busiest_assignee: Option<(String, usize)>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InsightsReport {
    pub summary: InsightSummary,
    pub case_types: Vec<(String, usize)>,
    pub case_type_resolution: Vec<CaseTypeResolution>,
    pub resolution_factors: Vec<Correlation>,
    pub duration_by_category: Vec<CategoricalImpact>,
    pub assignees: Vec<AssigneePerformance>,
    pub escalation: EscalationPatterns,
    pub trends: Vec<MonthlyTrend>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightTopic {
    CaseTypes,
    ResolutionFactors,
    AssigneePerformance,
    EscalationPatterns,
    Trends,
    Summary,
}

impl InsightTopic {
    /// Route a free-form question to a topic by keyword.
    pub fn from_question(question: &str) -> Option<Self> {
        let q = question.to_lowercase();
        let has = |w: &str| q.contains(w);
        if has("common") && (has("case") || has("type")) {
            Some(Self::CaseTypes)
        } else if has("resolution") && has("factor") {
            Some(Self::ResolutionFactors)
        } else if has("assignee") || has("performance") {
            Some(Self::AssigneePerformance)
        } else if has("escalat") {
            Some(Self::EscalationPatterns)
        } else if has("trend") || has("over time") {
            Some(Self::Trends)
        } else if has("summary") || has("overview") {
            Some(Self::Summary)
        } else {
            None
        }
    }
}

pub struct InsightsAggregator<'a> {
    table: &'a Table,
    schema: &'a FeatureSchema,
    duration_column: String,
}

impl<'a> InsightsAggregator<'a> {
    pub fn new(table: &'a Table, schema: &'a FeatureSchema) -> Self {
        Self {
            table,
            schema,
            duration_column: "resolution_days".into(),
        }
    }

    pub fn with_duration_column(mut self, column: impl Into<String>) -> Self {
        self.duration_column = column.into();
        self
    }

    /// Per-row level of a nominal field: raw column first, then the
    /// schema's encoding. None if neither exists.
    fn field_levels(&self, field: &str) -> Option<Vec<Option<String>>> {
        let n = self.table.n_rows();
        if let Some(raw) = self.table.column(field) {
            return Some((0..n).map(|r| raw.label(r)).collect());
        }
        let encoded = self.schema.encoded(field)?;
        Some((0..n).map(|r| encoded.decode(self.table, r)).collect())
    }

    fn resolved_flags(&self) -> PipelineResult<Vec<bool>> {
        let n = self.table.n_rows();
        if let Some(target) = self.table.column(TARGET_COLUMN) {
            return Ok((0..n).map(|r| target.as_f64(r).is_some_and(|v| v >= 0.5)).collect());
        }
        let status = self
            .field_levels("status")
            .ok_or_else(|| PipelineError::missing([TARGET_COLUMN]))?;
        Ok(status
            .iter()
            .map(|s| s.as_deref().is_some_and(CaseStatus::label_is_resolved))
            .collect())
    }

    fn flag_column(&self, name: &str) -> Option<Vec<Option<bool>>> {
        let column = self.table.column(name)?;
        Some((0..column.len()).map(|r| column.as_f64(r).map(|v| v >= 0.5)).collect())
    }

    fn complexity_scores(&self) -> Option<Vec<Option<f64>>> {
        let n = self.table.n_rows();
        if let Some(scores) = self.table.column("complexity_score") {
            return Some((0..n).map(|r| scores.as_f64(r)).collect());
        }
        let levels = self.field_levels("complexity")?;
        Some(
            levels
                .iter()
                .map(|l| {
                    l.as_deref()
                        .and_then(|l| Complexity::from_label(l).ok())
                        .map(|c| c.score() as f64)
                })
                .collect(),
        )
    }

    /// Case counts per type, most frequent first (ties by name).
    pub fn case_type_distribution(&self) -> PipelineResult<Vec<(String, usize)>> {
        let types = self
            .field_levels("case_type")
            .ok_or_else(|| PipelineError::missing(["case_type"]))?;
        let mut counts: BTreeMap<String, usize> = BTreeMap::new();
        for t in types.into_iter().flatten() {
            *counts.entry(t).or_default() += 1;
        }
        let mut out: Vec<(String, usize)> = counts.into_iter().collect();
        out.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        Ok(out)
    }

    /// Share of resolved cases per case type, highest first.
    pub fn case_type_resolution_rates(&self) -> PipelineResult<Vec<CaseTypeResolution>> {
        let types = self
            .field_levels("case_type")
            .ok_or_else(|| PipelineError::missing(["case_type"]))?;
        let resolved = self.resolved_flags()?;
        let mut tally: BTreeMap<String, (usize, usize)> = BTreeMap::new();
        for (case_type, done) in types.into_iter().zip(resolved) {
            if let Some(case_type) = case_type {
                let entry = tally.entry(case_type).or_default();
                entry.0 += 1;
                entry.1 += usize::from(done);
            }
        }
        let mut out: Vec<CaseTypeResolution> = tally
            .into_iter()
            .map(|(case_type, (cases, resolved))| CaseTypeResolution {
                case_type,
                cases,
                resolved,
                resolution_rate: resolved as f64 / cases as f64,
            })
            .collect();
        out.sort_by(|a, b| {
            b.resolution_rate
                .total_cmp(&a.resolution_rate)
                .then_with(|| a.case_type.cmp(&b.case_type))
        });
        Ok(out)
    }

    /// Duration mean/median/count per level of complexity, case type and
    /// assignee. Fields absent from the table are skipped; rows without a
    /// duration are not counted.
    pub fn categorical_impact(&self) -> PipelineResult<Vec<CategoricalImpact>> {
        let duration = self
            .table
            .column(&self.duration_column)
            .ok_or_else(|| PipelineError::missing([self.duration_column.as_str()]))?;

        let mut out = Vec::new();
        for field in IMPACT_FIELDS {
            let Some(levels) = self.field_levels(field) else {
                continue;
            };
            let mut days_by_level: BTreeMap<String, Vec<f64>> = BTreeMap::new();
            for (row, level) in levels.into_iter().enumerate() {
                if let (Some(level), Some(days)) = (level, duration.as_f64(row)) {
                    days_by_level.entry(level).or_default().push(days);
                }
            }
            let levels = days_by_level
                .into_iter()
                .filter_map(|(level, days)| {
                    Some(DurationStats {
                        level,
                        count: days.len(),
                        mean: mean(&days)?,
                        median: median(&days)?,
                    })
                })
                .collect();
            out.push(CategoricalImpact {
                field: field.to_string(),
                levels,
            });
        }
        Ok(out)
    }

    /// Cases opened and resolution rate per calendar month, oldest first.
    pub fn monthly_trends(&self) -> PipelineResult<Vec<MonthlyTrend>> {
        if !self.table.has_column("open_date") {
            return Err(PipelineError::missing(["open_date"]));
        }
        let opened = self.table.dates("open_date")?;
        let resolved = self.resolved_flags()?;
        let mut tally: BTreeMap<(i32, u32), (usize, usize)> = BTreeMap::new();
        for (date, done) in opened.into_iter().zip(resolved) {
            if let Some(date) = date {
                let entry = tally.entry((date.year(), date.month())).or_default();
                entry.0 += 1;
                entry.1 += usize::from(done);
            }
        }
        Ok(tally
            .into_iter()
            .map(|((year, month), (cases, resolved))| MonthlyTrend {
                month: format!("{year:04}-{month:02}"),
                cases,
                resolved,
                resolution_rate: resolved as f64 / cases as f64,
            })
            .collect())
    }

    /// Pearson correlation of each numeric column with the duration column
    /// over resolved cases, highest first.
    pub fn resolution_factors(&self) -> PipelineResult<Vec<Correlation>> {
        let duration = self
            .table
            .column(&self.duration_column)
            .ok_or_else(|| PipelineError::missing([self.duration_column.as_str()]))?;
        let rows: Vec<usize> = match self.resolved_flags() {
            Ok(flags) => (0..flags.len()).filter(|&r| flags[r]).collect(),
            Err(_) => (0..duration.len()).filter(|&r| !duration.is_null(r)).collect(),
        };

        let mut out = Vec::new();
        for column in self.table.columns() {
            let name = column.name.as_str();
            if name == self.duration_column
                || name == TARGET_COLUMN
                || IDENTIFIER_COLUMNS.contains(&name)
                || !column.data.kind().is_numeric()
            {
                continue;
            }
            if let Some(field) = self.schema.field_of_column(name) {
                if matches!(field.role, FieldRole::Identifier | FieldRole::Target) {
                    continue;
                }
            }
            let (xs, ys): (Vec<f64>, Vec<f64>) = rows
                .iter()
                .filter_map(|&r| Some((column.data.as_f64(r)?, duration.as_f64(r)?)))
                .unzip();
            if let Some(coefficient) = pearson(&xs, &ys) {
                out.push(Correlation {
                    feature: name.to_string(),
                    coefficient,
                });
            }
        }
        out.sort_by(|a, b| b.coefficient.total_cmp(&a.coefficient));
        Ok(out)
    }

    pub fn assignee_performance(&self) -> PipelineResult<Vec<AssigneePerformance>> {
        let resolved = self.resolved_flags()?;
        let n = resolved.len();
        let groups = self
            .field_levels("assignee")
            .unwrap_or_else(|| vec![Some(OVERALL.to_string()); n]);
        let duration = self.table.column(&self.duration_column);
        let complexity = self.complexity_scores();
        let escalated = self.flag_column("escalated");

        let mut rows_by_group: BTreeMap<String, Vec<usize>> = BTreeMap::new();
        for (row, group) in groups.into_iter().enumerate() {
            if let Some(group) = group {
                rows_by_group.entry(group).or_default().push(row);
            }
        }

        let mut out: Vec<AssigneePerformance> = rows_by_group
            .into_iter()
            .map(|(assignee, rows)| {
                let cases = rows.len();
                let resolved_rows: Vec<usize> = rows.iter().copied().filter(|&r| resolved[r]).collect();
                let days: Vec<f64> = duration
                    .map(|d| resolved_rows.iter().filter_map(|&r| d.as_f64(r)).collect())
                    .unwrap_or_default();
                AssigneePerformance {
                    assignee,
                    cases,
                    resolved: resolved_rows.len(),
                    resolution_rate: resolved_rows.len() as f64 / cases as f64,
                    avg_resolution_days: mean(&days),
                    median_resolution_days: median(&days),
                    avg_complexity: complexity.as_ref().and_then(|c| {
                        mean(&rows.iter().filter_map(|&r| c[r]).collect::<Vec<_>>())
                    }),
                    escalation_rate: escalated.as_ref().and_then(|e| {
                        let flags: Vec<f64> =
                            rows.iter().filter_map(|&r| e[r]).map(|f| f64::from(u8::from(f))).collect();
                        mean(&flags)
                    }),
                }
            })
            .collect();
        out.sort_by(|a, b| {
            b.resolution_rate
                .total_cmp(&a.resolution_rate)
                .then_with(|| a.assignee.cmp(&b.assignee))
        });
        Ok(out)
    }

    pub fn escalation_patterns(&self) -> PipelineResult<EscalationPatterns> {
        let escalated = self.flag_column("escalated");
        let types = self.field_levels("case_type");
        let (escalated, types) = match (escalated, types) {
            (Some(e), Some(t)) => (e, t),
            (e, t) => {
                let mut missing = Vec::new();
                if e.is_none() {
                    missing.push("escalated");
                }
                if t.is_none() {
                    missing.push("case_type");
                }
                return Err(PipelineError::missing(missing));
            }
        };

        let by_case_type = cross_tab(&escalated, &types);
        let by_age_group = self.table.column("age").map(|ages| {
            let buckets: Vec<Option<String>> = (0..ages.len())
                .map(|r| ages.as_f64(r).and_then(age_bucket).map(String::from))
                .collect();
            cross_tab(&escalated, &buckets)
        });
        Ok(EscalationPatterns {
            by_case_type,
            by_age_group,
        })
    }

    pub fn summary(&self) -> PipelineResult<InsightSummary> {
        let resolved = self.resolved_flags()?;
        let total_cases = resolved.len();
        let resolved_cases = resolved.iter().filter(|r| **r).count();
        let share = |k: usize| if total_cases == 0 { 0.0 } else { k as f64 / total_cases as f64 };

        let escalated_cases = self
            .flag_column("escalated")
            .map(|e| e.iter().filter(|v| **v == Some(true)).count());
        let most_common_case_type = self
            .case_type_distribution()
            .ok()
            .and_then(|d| d.into_iter().next())
            .map(|(t, k)| (t, share(k)));
        let busiest_assignee = self.field_levels("assignee").and_then(|levels| {
            let mut counts: BTreeMap<String, usize> = BTreeMap::new();
            for l in levels.into_iter().flatten() {
                *counts.entry(l).or_default() += 1;
            }
            counts
                .into_iter()
                .max_by(|a, b| a.1.cmp(&b.1).then_with(|| b.0.cmp(&a.0)))
        });

        Ok(InsightSummary {
            total_cases,
            resolved_cases,
            resolution_rate: share(resolved_cases),
            escalated_cases,
            escalation_rate: escalated_cases.map(share),
            most_common_case_type,
            busiest_assignee,
        })
    }

    /// Every insight at once; fails on the first missing hard input.
    pub fn report(&self) -> PipelineResult<InsightsReport> {
        Ok(InsightsReport {
            summary: self.summary()?,
            case_types: self.case_type_distribution()?,
            case_type_resolution: self.case_type_resolution_rates()?,
            resolution_factors: self.resolution_factors()?,
            duration_by_category: self.categorical_impact()?,
            assignees: self.assignee_performance()?,
            escalation: self.escalation_patterns()?,
            trends: self.monthly_trends()?,
        })
    }
}

/// Right-closed age buckets; None outside (0, 100].
pub fn age_bucket(age: f64) -> Option<&'static str> {
    if age <= 0.0 {
        return None;
    }
    AGE_BUCKETS
        .iter()
        .find(|(upper, _)| age <= *upper)
        .map(|(_, label)| *label)
}

fn cross_tab(escalated: &[Option<bool>], groups: &[Option<String>]) -> Vec<EscalationRow> {
    let mut tally: BTreeMap<&str, (usize, usize)> = BTreeMap::new();
    for (flag, group) in escalated.iter().zip(groups) {
        if let (Some(flag), Some(group)) = (flag, group) {
            let entry = tally.entry(group.as_str()).or_default();
            entry.0 += 1;
            if *flag {
                entry.1 += 1;
            }
        }
    }
    let mut rows: Vec<EscalationRow> = tally
        .into_iter()
        .map(|(group, (cases, up))| {
            let escalated_share = up as f64 / cases as f64;
            EscalationRow {
                group: group.to_string(),
                cases,
                escalated_share,
                not_escalated_share: 1.0 - escalated_share,
            }
        })
        .collect();
    rows.sort_by(|a, b| {
        b.escalated_share
            .total_cmp(&a.escalated_share)
            .then_with(|| a.group.cmp(&b.group))
    });
    rows
}

fn mean(values: &[f64]) -> Option<f64> {
    (!values.is_empty()).then(|| values.iter().sum::<f64>() / values.len() as f64)
}

fn pearson(xs: &[f64], ys: &[f64]) -> Option<f64> {
    let mx = mean(xs)?;
    let my = mean(ys)?;
    let (mut cov, mut vx, mut vy) = (0.0, 0.0, 0.0);
    for (x, y) in xs.iter().zip(ys) {
        cov += (x - mx) * (y - my);
        vx += (x - mx).powi(2);
        vy += (y - my).powi(2);
    }
    let r = cov / (vx * vy).sqrt();
    r.is_finite().then_some(r)
}
