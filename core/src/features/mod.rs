//! Feature engineering: raw client/case/note tables in, one model-ready
//! table plus its schema out.
//!
//! Stage order: merge → note aggregates → derived features → imputation →
//! target → encoding. Every stage takes its input by reference and returns a
//! new table.

pub mod derive;
pub mod encode;
pub mod impute;
pub mod matrix;
pub mod merge;
pub mod schema;

pub use encode::TARGET_COLUMN;
pub use impute::ImputationReport;
pub use matrix::{FeatureIndex, FeatureMatrix, ScalerParams, StandardScaler, Vectorized};
pub use schema::{EncodedField, FeatureSchema, FieldRole, FieldSpec, Indicator};

use crate::{
    clock::ReferenceClock,
    config::FeatureConfig,
    error::{PipelineError, PipelineResult},
    model::RawTables,
    table::Table,
};

/// Fields never fed to the model even though they are encoded.
pub const MATRIX_EXCLUDED_FIELDS: &[&str] = &["status"];

pub struct FeatureEngineer {
    config: FeatureConfig,
    clock: ReferenceClock,
}

/// Output of one feature-engineering pass.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineeredTable {
    pub table: Table,
    pub schema: FeatureSchema,
    pub imputation: ImputationReport,
}

impl FeatureEngineer {
    pub fn new(config: FeatureConfig, clock: ReferenceClock) -> Self {
        Self { config, clock }
    }

    pub fn config(&self) -> &FeatureConfig {
        &self.config
    }

    pub fn engineer(&self, raw: &RawTables) -> PipelineResult<EngineeredTable> {
        let tables = raw.to_tables()?;
        self.engineer_tables(&tables.clients, &tables.cases, Some(&tables.notes))
    }

    pub fn engineer_tables(
        &self,
        clients: &Table,
        cases: &Table,
        notes: Option<&Table>,
    ) -> PipelineResult<EngineeredTable> {
        let mut table = merge::merge_clients(cases, clients)?;
        if let (true, Some(notes)) = (self.config.aggregate_notes, notes) {
            table = merge::attach_note_summaries(&table, notes)?;
        }
        let table = derive::derive_features(&table, &self.clock)?;
        let (table, imputation) = impute::impute_missing(&table, &self.config.nominal_fields)?;
        let table = encode::attach_target(&table)?;
        let (table, schema) = encode::encode(&table, &self.config.nominal_fields)?;

        let (rows, cols) = table.shape();
        log::info!(
            "features: engineered {rows} rows x {cols} columns ({} imputed columns)",
            imputation.fills.len()
        );
        Ok(EngineeredTable {
            table,
            schema,
            imputation,
        })
    }
}

impl EngineeredTable {
    /// Model columns of this table, in table order.
    pub fn model_columns(&self) -> Vec<String> {
        self.schema.model_columns(MATRIX_EXCLUDED_FIELDS)
    }

    pub fn feature_matrix(&self) -> PipelineResult<FeatureMatrix> {
        self.feature_matrix_for(&self.table)
    }

    /// Build a matrix from any table laid out by this schema, e.g. one
    /// partition of a split.
    pub fn feature_matrix_for(&self, table: &Table) -> PipelineResult<FeatureMatrix> {
        let columns = self.model_columns();
        let target = self
            .schema
            .target_column()
            .ok_or(PipelineError::MissingTargetSource)?;

        let mut names: Vec<&str> = columns.iter().map(String::as_str).collect();
        names.push(target);
        table.require(&names)?;

        let data: Vec<_> = columns
            .iter()
            .map(|c| table.expect_column(c))
            .collect::<PipelineResult<_>>()?;
        let target_data = table.expect_column(target)?;

        let mut rows = Vec::with_capacity(table.n_rows());
        let mut labels = Vec::with_capacity(table.n_rows());
        for row in 0..table.n_rows() {
            let mut values = Vec::with_capacity(columns.len());
            for (name, column) in columns.iter().zip(&data) {
                let value = column.as_f64(row).ok_or_else(|| {
                    PipelineError::InvalidArgument(format!(
                        "feature {name} is null or non-numeric at row {row}"
                    ))
                })?;
                values.push(value);
            }
            rows.push(values);
            labels.push(u8::from(target_data.as_f64(row).is_some_and(|v| v >= 0.5)));
        }
        Ok(FeatureMatrix {
            columns,
            rows,
            labels,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::ColumnData;

    fn ints(v: &[i64]) -> ColumnData {
        ColumnData::Int(v.iter().map(|x| Some(*x)).collect())
    }

    fn texts(v: &[&str]) -> ColumnData {
        ColumnData::Text(v.iter().map(|x| Some(x.to_string())).collect())
    }

    fn sources() -> (Table, Table) {
        let clients = Table::new()
            .with_column("client_id", ints(&[1, 2]))
            .unwrap()
            .with_column("name", texts(&["Ada Park", "Ben Cole"]))
            .unwrap()
            .with_column("age", ints(&[30, 70]))
            .unwrap()
            .with_column("join_date", texts(&["2022-01-01", "2023-01-01"]))
            .unwrap();
        let cases = Table::new()
            .with_column("case_id", ints(&[0, 1, 2]))
            .unwrap()
            .with_column("client_id", ints(&[1, 2, 1]))
            .unwrap()
            .with_column("case_type", texts(&["Corporate", "Family Law", "Corporate"]))
            .unwrap()
            .with_column("open_date", texts(&["2024-01-02", "2024-02-03", "2024-03-04"]))
            .unwrap()
            .with_column("status", texts(&["Resolved", "Pending", "Closed"]))
            .unwrap()
            .with_column("escalated", ColumnData::Bool(vec![Some(false), Some(true), None]))
            .unwrap();
        (clients, cases)
    }

    #[test]
    fn engineers_without_notes() {
        let (clients, cases) = sources();
        let engineer = FeatureEngineer::new(FeatureConfig::default(), ReferenceClock::default());
        let out = engineer.engineer_tables(&clients, &cases, None).unwrap();
        assert_eq!(out.table.n_rows(), 3);
        assert!(out.table.has_column("case_type_Family Law"));
        assert!(!out.table.has_column("total_notes"));

        let matrix = out.feature_matrix().unwrap();
        assert_eq!(matrix.labels, vec![1, 0, 1]);
        assert!(matrix.columns.iter().all(|c| !c.starts_with("status")));
        for excluded in ["case_id", "client_id", "name", "open_date", TARGET_COLUMN] {
            assert!(matrix.column_index(excluded).is_none(), "{excluded} leaked");
        }
    }

    #[test]
    fn missing_open_date_is_reported() {
        let (clients, mut cases) = sources();
        cases.remove_column("open_date");
        let engineer = FeatureEngineer::new(FeatureConfig::default(), ReferenceClock::default());
        let err = engineer.engineer_tables(&clients, &cases, None).unwrap_err();
        assert!(matches!(err, PipelineError::MissingColumn { ref columns } if columns == &["open_date"]));
    }
}
