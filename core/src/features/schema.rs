//! Schema descriptor of an engineered table.
//!
//! Maps each logical field to its role and the physical columns that carry
//! it. Downstream consumers look fields up here instead of guessing from
//! column-name prefixes.

use crate::table::Table;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Indicator {
    pub level: String,
    pub column: String,
}

/// One-hot layout of a nominal field. The reference level has no column;
/// a row with every indicator at 0 carries the reference level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedField {
    pub reference: String,
    pub indicators: Vec<Indicator>,
}

impl EncodedField {
    /// Every level, reference first.
    pub fn levels(&self) -> Vec<&str> {
        std::iter::once(self.reference.as_str())
            .chain(self.indicators.iter().map(|i| i.level.as_str()))
            .collect()
    }

    pub fn columns(&self) -> Vec<&str> {
        self.indicators.iter().map(|i| i.column.as_str()).collect()
    }

    /// Level of `row`, or None if an indicator is null or missing from `table`.
    pub fn decode(&self, table: &Table, row: usize) -> Option<String> {
        let mut hit = None;
        for indicator in &self.indicators {
            let value = table.column(&indicator.column)?.as_f64(row)?;
            if value >= 0.5 && hit.is_none() {
                hit = Some(indicator.level.clone());
            }
        }
        Some(hit.unwrap_or_else(|| self.reference.clone()))
    }

    /// Per-level row counts, reference included, in `levels()` order.
    pub fn level_counts(&self, table: &Table) -> Vec<(String, usize)> {
        let mut counts: Vec<(String, usize)> =
            self.levels().into_iter().map(|l| (l.to_string(), 0)).collect();
        for row in 0..table.n_rows() {
            if let Some(level) = self.decode(table, row) {
                if let Some(slot) = counts.iter_mut().find(|(l, _)| *l == level) {
                    slot.1 += 1;
                }
            }
        }
        counts
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum FieldRole {
    Identifier,
    Date,
    Text,
    /// Continuous or count-valued number.
    Numeric,
    /// 0/1 column.
    Flag,
    Target,
    Encoded(EncodedField),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    pub role: FieldRole,
}

impl FieldSpec {
    /// Physical columns backing this field.
    pub fn columns(&self) -> Vec<&str> {
        match &self.role {
            FieldRole::Encoded(enc) => enc.columns(),
            _ => vec![self.name.as_str()],
        }
    }

    pub fn is_model_input(&self) -> bool {
        matches!(
            self.role,
            FieldRole::Numeric | FieldRole::Flag | FieldRole::Encoded(_)
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureSchema {
    fields: Vec<FieldSpec>,
}

impl FeatureSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: impl Into<String>, role: FieldRole) {
        self.fields.push(FieldSpec {
            name: name.into(),
            role,
        });
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn encoded(&self, name: &str) -> Option<&EncodedField> {
        match &self.field(name)?.role {
            FieldRole::Encoded(enc) => Some(enc),
            _ => None,
        }
    }

    /// Logical field owning a physical column.
    pub fn field_of_column(&self, column: &str) -> Option<&FieldSpec> {
        self.fields
            .iter()
            .find(|f| f.columns().iter().any(|c| *c == column))
    }

    /// Model-eligible columns in schema order, skipping `excluded` fields.
    pub fn model_columns(&self, excluded: &[&str]) -> Vec<String> {
        self.fields
            .iter()
            .filter(|f| f.is_model_input() && !excluded.contains(&f.name.as_str()))
            .flat_map(|f| f.columns().into_iter().map(String::from))
            .collect()
    }

    /// Columns eligible for standardisation.
    pub fn continuous_columns(&self) -> Vec<String> {
        self.fields
            .iter()
            .filter(|f| f.role == FieldRole::Numeric)
            .map(|f| f.name.clone())
            .collect()
    }

    pub fn target_column(&self) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.role == FieldRole::Target)
            .map(|f| f.name.as_str())
    }
}
