use crate::{
    clock::{default_as_of, ReferenceClock},
    error::{PipelineError, PipelineResult},
    model::{CaseStatus, CaseType, Complexity, IncomeLevel},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Generation policy for the synthetic clients, cases and notes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub num_clients: usize,
    pub num_cases: usize,
    pub num_notes: usize,
    pub client_age_min: u32,
    pub client_age_max: u32,
    /// Clients joined within this many days before `as_of`.
    pub join_window_days: i64,
    /// Cases opened within this many days before `as_of`.
    pub open_window_days: i64,
    pub income_weights: Vec<(IncomeLevel, f64)>,
    pub case_type_weights: Vec<(CaseType, f64)>,
    pub complexity_weights: Vec<(Complexity, f64)>,
    /// First-stage Bernoulli draw: is the case resolved at all.
    pub resolved_probability: f64,
    pub resolution_days_min: i64,
    pub resolution_days_max: i64,
    /// Status mix given the case was resolved.
    pub resolved_status_weights: Vec<(CaseStatus, f64)>,
    /// Status mix given the case is still open.
    pub open_status_weights: Vec<(CaseStatus, f64)>,
    pub litigation_escalation_probability: f64,
    pub baseline_escalation_probability: f64,
    pub attorney_pool: u32,
    pub staff_pool: u32,
    /// Probability a note is authored by the case's assignee rather than staff.
    pub note_by_assignee_probability: f64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            num_clients: 1_000,
            num_cases: 5_000,
            num_notes: 10_000,
            client_age_min: 18,
            client_age_max: 79,
            join_window_days: 5 * 365,
            open_window_days: 2 * 365,
            income_weights: vec![
                (IncomeLevel::Low, 0.3),
                (IncomeLevel::Medium, 0.5),
                (IncomeLevel::High, 0.2),
            ],
            case_type_weights: vec![
                (CaseType::FamilyLaw, 0.25),
                (CaseType::CriminalDefense, 0.30),
                (CaseType::CivilLitigation, 0.20),
                (CaseType::Corporate, 0.10),
                (CaseType::IntellectualProperty, 0.10),
                (CaseType::EstatePlanning, 0.05),
            ],
            complexity_weights: vec![
                (Complexity::Low, 0.3),
                (Complexity::Medium, 0.5),
                (Complexity::High, 0.2),
            ],
            resolved_probability: 0.7,
            resolution_days_min: 1,
            resolution_days_max: 364,
            resolved_status_weights: vec![(CaseStatus::Resolved, 0.9), (CaseStatus::Appealed, 0.1)],
            open_status_weights: vec![(CaseStatus::Pending, 0.9), (CaseStatus::Abandoned, 0.1)],
            litigation_escalation_probability: 0.3,
            baseline_escalation_probability: 0.1,
            attorney_pool: 19,
            staff_pool: 9,
            note_by_assignee_probability: 0.8,
        }
    }
}

impl GeneratorConfig {
    pub fn with_counts(mut self, num_clients: usize, num_cases: usize, num_notes: usize) -> Self {
        self.num_clients = num_clients;
        self.num_cases = num_cases;
        self.num_notes = num_notes;
        self
    }

    /// Reject parameters that would produce empty or inconsistent tables.
    pub fn validate(&self) -> PipelineResult<()> {
        for (name, count) in [
            ("num_clients", self.num_clients),
            ("num_cases", self.num_cases),
            ("num_notes", self.num_notes),
        ] {
            if count == 0 {
                return Err(invalid(format!("{name} must be > 0")));
            }
        }
        if self.client_age_min > self.client_age_max {
            return Err(invalid("client_age_min exceeds client_age_max"));
        }
        if self.join_window_days < 0 || self.open_window_days < 0 {
            return Err(invalid("date windows must be non-negative"));
        }
        if self.resolution_days_min < 0 || self.resolution_days_min > self.resolution_days_max {
            return Err(invalid("resolution day range must be non-negative and ordered"));
        }
        if self.attorney_pool == 0 || self.staff_pool == 0 {
            return Err(invalid("attorney and staff pools must be > 0"));
        }
        for (name, p) in [
            ("resolved_probability", self.resolved_probability),
            ("litigation_escalation_probability", self.litigation_escalation_probability),
            ("baseline_escalation_probability", self.baseline_escalation_probability),
            ("note_by_assignee_probability", self.note_by_assignee_probability),
        ] {
            check_probability(name, p)?;
        }
        check_weights("income_weights", &self.income_weights)?;
        check_weights("case_type_weights", &self.case_type_weights)?;
        check_weights("complexity_weights", &self.complexity_weights)?;
        check_weights("resolved_status_weights", &self.resolved_status_weights)?;
        check_weights("open_status_weights", &self.open_status_weights)?;
        Ok(())
    }
}

/// Feature engineering knobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureConfig {
    /// Fields one-hot encoded when present.
    pub nominal_fields: Vec<String>,
    /// Aggregate case notes into per-case columns when notes are supplied.
    pub aggregate_notes: bool,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            nominal_fields: [
                "case_type",
                "status",
                "complexity",
                "assignee",
                "income_level",
                "location",
                "age_group",
                "most_common_note_type",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            aggregate_notes: true,
        }
    }
}

/// How the splitter treats dates it cannot parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatePolicy {
    /// Fail the split with `InvalidDateFormat`.
    Strict,
    /// Keep going and report the offending rows.
    RejectUnparseable,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitConfig {
    pub date_column: String,
    pub train_ratio: f64,
    pub min_train_fraction: f64,
    pub min_test_fraction: f64,
    /// Below this many rows in either partition the caller falls back to a random split.
    pub min_partition_rows: usize,
    pub date_policy: DatePolicy,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            date_column: "open_date".into(),
            train_ratio: 0.8,
            min_train_fraction: 0.1,
            min_test_fraction: 0.1,
            min_partition_rows: 10,
            date_policy: DatePolicy::Strict,
        }
    }
}

impl SplitConfig {
    pub fn validate(&self) -> PipelineResult<()> {
        for (name, v) in [
            ("train_ratio", self.train_ratio),
            ("min_train_fraction", self.min_train_fraction),
            ("min_test_fraction", self.min_test_fraction),
        ] {
            if !(v > 0.0 && v < 1.0) {
                return Err(invalid(format!("{name} must lie in (0, 1), got {v}")));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub seed: u64,
    pub as_of: NaiveDate,
    pub generator: GeneratorConfig,
    pub features: FeatureConfig,
    pub split: SplitConfig,
    /// Standardise continuous feature columns using training statistics.
    pub standardize: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            as_of: default_as_of(),
            generator: GeneratorConfig::default(),
            features: FeatureConfig::default(),
            split: SplitConfig::default(),
            standardize: true,
        }
    }
}

impl PipelineConfig {
    /// Load from a JSON file. Missing keys take their defaults.
    /// In tests, use PipelineConfig::default_test().
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let config: PipelineConfig = serde_json::from_str(&content)?;
        config.generator.validate()?;
        config.split.validate()?;
        Ok(config)
    }

    /// Small, fast configuration for unit and integration tests.
    pub fn default_test() -> Self {
        Self {
            generator: GeneratorConfig::default().with_counts(50, 200, 400),
            ..Self::default()
        }
    }

    pub fn clock(&self) -> ReferenceClock {
        ReferenceClock::new(self.as_of)
    }
}

fn invalid(message: impl Into<String>) -> PipelineError {
    PipelineError::InvalidArgument(message.into())
}

fn check_probability(name: &str, p: f64) -> PipelineResult<()> {
    if (0.0..=1.0).contains(&p) {
        Ok(())
    } else {
        Err(invalid(format!("{name} must lie in [0, 1], got {p}")))
    }
}

fn check_weights<T>(name: &str, weights: &[(T, f64)]) -> PipelineResult<()> {
    if weights.is_empty() {
        return Err(invalid(format!("{name} is empty")));
    }
    if weights.iter().any(|(_, w)| !(*w >= 0.0)) {
        return Err(invalid(format!("{name} has a negative weight")));
    }
    let total: f64 = weights.iter().map(|(_, w)| w).sum();
    if (total - 1.0).abs() > 1e-6 {
        return Err(invalid(format!("{name} sums to {total}, expected 1")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        GeneratorConfig::default().validate().unwrap();
        SplitConfig::default().validate().unwrap();
    }

    #[test]
    fn zero_counts_are_rejected() {
        let err = GeneratorConfig::default().with_counts(10, 0, 5).validate().unwrap_err();
        assert!(matches!(err, PipelineError::InvalidArgument(m) if m.contains("num_cases")));
    }

    #[test]
    fn weights_must_sum_to_one() {
        let mut cfg = GeneratorConfig::default();
        cfg.complexity_weights[0].1 = 0.9;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn split_ratio_bounds() {
        let cfg = SplitConfig {
            train_ratio: 1.0,
            ..SplitConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn partial_json_takes_defaults() {
        let cfg: PipelineConfig =
            serde_json::from_str(r#"{ "seed": 7, "generator": { "num_cases": 12 } }"#).unwrap();
        assert_eq!(cfg.seed, 7);
        assert_eq!(cfg.generator.num_cases, 12);
        assert_eq!(cfg.generator.num_clients, 1_000);
        assert_eq!(cfg.split.train_ratio, 0.8);
    }
}
