//! Target construction and one-hot encoding.

use super::schema::{EncodedField, FeatureSchema, FieldRole, Indicator};
use crate::{
    error::{PipelineError, PipelineResult},
    model::CaseStatus,
    table::{ColumnData, ColumnKind, Table},
};
use std::collections::BTreeSet;

pub const TARGET_COLUMN: &str = "is_resolved";

/// Columns that identify rows rather than describe them.
pub const IDENTIFIER_COLUMNS: &[&str] = &["case_id", "client_id", "note_id", "name"];

/// Numeric columns that only hold 0/1.
const FLAG_COLUMNS: &[&str] = &["is_weekend"];

/// `is_resolved = 1` iff status is a resolved/closed state.
pub fn attach_target(table: &Table) -> PipelineResult<Table> {
    let status = table
        .column("status")
        .ok_or(PipelineError::MissingTargetSource)?;
    let labels = (0..status.len())
        .map(|row| {
            Some(i64::from(
                status
                    .label(row)
                    .is_some_and(|s| CaseStatus::label_is_resolved(&s)),
            ))
        })
        .collect();
    table.clone().with_column(TARGET_COLUMN, ColumnData::Int(labels))
}

/// Indicator column name for a level.
pub fn indicator_name(field: &str, level: &str) -> String {
    format!("{field}_{level}")
}

/// One-hot encode `nominal` fields (levels sorted, first level dropped),
/// coerce booleans to 0/1 and describe every resulting column in a schema.
pub fn encode(table: &Table, nominal: &[String]) -> PipelineResult<(Table, FeatureSchema)> {
    let mut out = Table::new();
    let mut schema = FeatureSchema::new();

    for column in table.columns() {
        let name = column.name.as_str();
        let data = &column.data;

        if nominal.iter().any(|n| n == name) && data.kind() != ColumnKind::Date {
            let levels: BTreeSet<String> = (0..data.len()).filter_map(|r| data.label(r)).collect();
            let mut levels = levels.into_iter();
            let Some(reference) = levels.next() else {
                log::debug!("encode: {name} has no levels, dropped");
                continue;
            };
            let mut indicators = Vec::new();
            for level in levels {
                let column_name = indicator_name(name, &level);
                let values = (0..data.len())
                    .map(|r| data.label(r).map(|l| i64::from(l == level)))
                    .collect();
                out.set_column(column_name.clone(), ColumnData::Int(values))?;
                indicators.push(Indicator {
                    level,
                    column: column_name,
                });
            }
            log::debug!(
                "encode: {name} -> {} indicators (reference {reference:?})",
                indicators.len()
            );
            schema.push(name, FieldRole::Encoded(EncodedField { reference, indicators }));
            continue;
        }

        let role = if IDENTIFIER_COLUMNS.contains(&name) {
            FieldRole::Identifier
        } else if name == TARGET_COLUMN {
            FieldRole::Target
        } else {
            match data.kind() {
                ColumnKind::Date => FieldRole::Date,
                ColumnKind::Text => FieldRole::Text,
                ColumnKind::Bool => FieldRole::Flag,
                _ if FLAG_COLUMNS.contains(&name) => FieldRole::Flag,
                _ => FieldRole::Numeric,
            }
        };

        let data = match data {
            ColumnData::Bool(values) => {
                ColumnData::Int(values.iter().map(|v| v.map(i64::from)).collect())
            }
            other => other.clone(),
        };
        out.set_column(name, data)?;
        schema.push(name, role);
    }
    Ok((out, schema))
}
