//! End-to-end batch: generate → engineer → split → matrices.

use crate::{
    config::PipelineConfig,
    error::PipelineResult,
    features::{EngineeredTable, FeatureEngineer, FeatureIndex, FeatureMatrix, ScalerParams, StandardScaler},
    generator::SyntheticGenerator,
    insights::{InsightsAggregator, InsightsReport},
    model::RawTables,
    rng::{RandomSource, StreamSlot},
    split::{random_split, SplitReport, TemporalSplit, TemporalSplitter},
    table::Table,
};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitStrategy {
    Temporal,
    /// The temporal split left a partition below `min_partition_rows`.
    Random,
}

pub struct PipelineOutput {
    pub raw: RawTables,
    pub engineered: EngineeredTable,
    pub strategy: SplitStrategy,
    /// The temporal attempt, kept even when it was discarded.
    pub temporal: TemporalSplit,
    pub train_table: Table,
    pub test_table: Table,
    pub train: FeatureMatrix,
    pub test: FeatureMatrix,
    pub feature_index: FeatureIndex,
    pub scaler: Option<ScalerParams>,
}

impl PipelineOutput {
    pub fn split_report(&self) -> &SplitReport {
        &self.temporal.report
    }

    pub fn insights(&self) -> PipelineResult<InsightsReport> {
        InsightsAggregator::new(&self.engineered.table, &self.engineered.schema).report()
    }
}

pub struct CasePipeline {
    config: PipelineConfig,
}

impl CasePipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Generate from the configured seed, then run every stage.
    pub fn run(&self) -> PipelineResult<PipelineOutput> {
        let source = RandomSource::new(self.config.seed);
        let raw = SyntheticGenerator::new(self.config.generator.clone(), self.config.clock())
            .generate(&source)?;
        self.run_on(raw)
    }

    /// Run the downstream stages on already-materialised tables.
    pub fn run_on(&self, raw: RawTables) -> PipelineResult<PipelineOutput> {
        let cfg = &self.config;
        let engineered =
            FeatureEngineer::new(cfg.features.clone(), cfg.clock()).engineer(&raw)?;

        let splitter = TemporalSplitter::new(cfg.split.clone())?;
        let temporal = splitter.split(&engineered.table, &cfg.split.date_column)?;

        let too_small = temporal.train.n_rows() < cfg.split.min_partition_rows
            || temporal.test.n_rows() < cfg.split.min_partition_rows;
        let (strategy, train_table, test_table) = if too_small {
            log::warn!(
                "pipeline: temporal split gave {}/{} rows (minimum {}), falling back to a random split",
                temporal.train.n_rows(),
                temporal.test.n_rows(),
                cfg.split.min_partition_rows
            );
            // Rows the temporal pass rejected stay out of both partitions.
            let mut kept: Vec<usize> = temporal
                .train_rows
                .iter()
                .chain(&temporal.test_rows)
                .copied()
                .collect();
            kept.sort_unstable();
            let pool = engineered.table.take_rows(&kept);
            let mut rng = RandomSource::new(cfg.seed).fork(StreamSlot::Split);
            let random = random_split(&pool, 1.0 - cfg.split.train_ratio, &mut rng)?;
            (SplitStrategy::Random, random.train, random.test)
        } else {
            (
                SplitStrategy::Temporal,
                temporal.train.clone(),
                temporal.test.clone(),
            )
        };

        let mut train = engineered.feature_matrix_for(&train_table)?;
        let mut test = engineered.feature_matrix_for(&test_table)?;

        let scaler = if cfg.standardize && train.n_rows() > 0 {
            let columns: Vec<String> = engineered
                .schema
                .continuous_columns()
                .into_iter()
                .filter(|c| train.column_index(c).is_some())
                .collect();
            let params = StandardScaler::fit(&train, &columns)?;
            train = params.transform(&train)?;
            test = params.transform(&test)?;
            Some(params)
        } else {
            None
        };

        let feature_index = train.feature_index();
        log::info!(
            "pipeline: {:?} split, train {:?}, test {:?}, {} features",
            strategy,
            train.shape(),
            test.shape(),
            feature_index.len()
        );
        Ok(PipelineOutput {
            raw,
            engineered,
            strategy,
            temporal,
            train_table,
            test_table,
            train,
            test,
            feature_index,
            scaler,
        })
    }
}
