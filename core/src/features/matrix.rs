//! Dense feature matrices, standardisation and the name → index contract
//! handed to the serving layer.

use crate::error::{PipelineError, PipelineResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Row-major numeric features plus the binary target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureMatrix {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<f64>>,
    pub labels: Vec<u8>,
}

impl FeatureMatrix {
    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn n_features(&self) -> usize {
        self.columns.len()
    }

    /// (rows, features)
    pub fn shape(&self) -> (usize, usize) {
        (self.n_rows(), self.n_features())
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn column_values(&self, name: &str) -> Option<Vec<f64>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(|r| r[idx]).collect())
    }

    /// Share of positive labels; None for an empty matrix.
    pub fn positive_rate(&self) -> Option<f64> {
        if self.labels.is_empty() {
            return None;
        }
        let positives = self.labels.iter().filter(|l| **l == 1).count();
        Some(positives as f64 / self.labels.len() as f64)
    }

    pub fn feature_index(&self) -> FeatureIndex {
        FeatureIndex::from_columns(&self.columns)
    }
}

/// Fitted per-column mean and scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalerParams {
    pub columns: Vec<String>,
    pub means: Vec<f64>,
    pub scales: Vec<f64>,
}

pub struct StandardScaler;

impl StandardScaler {
    /// Fit on `columns` of `matrix` (population standard deviation; a
    /// constant column gets scale 1 so it maps to 0).
    pub fn fit(matrix: &FeatureMatrix, columns: &[String]) -> PipelineResult<ScalerParams> {
        let missing: Vec<&String> = columns
            .iter()
            .filter(|c| matrix.column_index(c).is_none())
            .collect();
        if !missing.is_empty() {
            return Err(PipelineError::missing(missing.into_iter().cloned()));
        }
        if matrix.n_rows() == 0 {
            return Err(PipelineError::InvalidArgument(
                "cannot fit a scaler on an empty matrix".into(),
            ));
        }

        let n = matrix.n_rows() as f64;
        let mut means = Vec::with_capacity(columns.len());
        let mut scales = Vec::with_capacity(columns.len());
        for column in columns {
            let values = matrix.column_values(column).unwrap_or_default();
            let mean = values.iter().sum::<f64>() / n;
            let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
            let std = var.sqrt();
            means.push(mean);
            scales.push(if std > 0.0 { std } else { 1.0 });
        }
        Ok(ScalerParams {
            columns: columns.to_vec(),
            means,
            scales,
        })
    }
}

impl ScalerParams {
    /// Standardise the fitted columns of `matrix`; other columns pass through.
    pub fn transform(&self, matrix: &FeatureMatrix) -> PipelineResult<FeatureMatrix> {
        let mut positions = Vec::with_capacity(self.columns.len());
        for column in &self.columns {
            let idx = matrix
                .column_index(column)
                .ok_or_else(|| PipelineError::missing([column.as_str()]))?;
            positions.push(idx);
        }
        let mut out = matrix.clone();
        for row in &mut out.rows {
            for (k, &idx) in positions.iter().enumerate() {
                row[idx] = (row[idx] - self.means[k]) / self.scales[k];
            }
        }
        Ok(out)
    }
}

/// Feature name → column position at training time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureIndex {
    pub features: BTreeMap<String, usize>,
}

/// A request translated into training column order.
#[derive(Debug, Clone, PartialEq)]
pub struct Vectorized {
    pub vector: Vec<f64>,
    /// Request keys the model never saw.
    pub unknown: Vec<String>,
}

impl FeatureIndex {
    pub fn from_columns(columns: &[String]) -> Self {
        Self {
            features: columns
                .iter()
                .enumerate()
                .map(|(i, c)| (c.clone(), i))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Look values up by name; absent features read as 0.
    pub fn vectorize(&self, values: &BTreeMap<String, f64>) -> Vectorized {
        let mut vector = vec![0.0; self.len()];
        let mut unknown = Vec::new();
        for (name, value) in values {
            match self.features.get(name) {
                Some(&idx) if idx < vector.len() => vector[idx] = *value,
                _ => unknown.push(name.clone()),
            }
        }
        Vectorized { vector, unknown }
    }

    pub fn to_json(&self) -> PipelineResult<String> {
        Ok(serde_json::to_string_pretty(&self.features)?)
    }

    pub fn from_json(json: &str) -> PipelineResult<Self> {
        Ok(Self {
            features: serde_json::from_str(json)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matrix() -> FeatureMatrix {
        FeatureMatrix {
            columns: vec!["age".into(), "case_type_Corporate".into()],
            rows: vec![vec![20.0, 1.0], vec![40.0, 0.0], vec![60.0, 1.0]],
            labels: vec![1, 0, 1],
        }
    }

    #[test]
    fn scaler_centres_selected_columns_only() {
        let m = matrix();
        let params = StandardScaler::fit(&m, &["age".to_string()]).unwrap();
        let scaled = params.transform(&m).unwrap();
        let ages = scaled.column_values("age").unwrap();
        assert!(ages.iter().sum::<f64>().abs() < 1e-12);
        assert!((ages[2] - 1.224_744_871).abs() < 1e-6);
        assert_eq!(scaled.column_values("case_type_Corporate"), m.column_values("case_type_Corporate"));
    }

    #[test]
    fn constant_columns_scale_to_zero() {
        let m = FeatureMatrix {
            columns: vec!["x".into()],
            rows: vec![vec![5.0], vec![5.0]],
            labels: vec![0, 1],
        };
        let params = StandardScaler::fit(&m, &["x".to_string()]).unwrap();
        assert_eq!(params.transform(&m).unwrap().rows, vec![vec![0.0], vec![0.0]]);
    }

    #[test]
    fn index_translates_by_name_not_position() {
        let index = matrix().feature_index();
        let request: BTreeMap<String, f64> = [
            ("case_type_Corporate".to_string(), 1.0),
            ("favourite_colour".to_string(), 3.0),
        ]
        .into();
        let v = index.vectorize(&request);
        assert_eq!(v.vector, vec![0.0, 1.0]);
        assert_eq!(v.unknown, vec!["favourite_colour".to_string()]);
    }

    #[test]
    fn index_json_round_trip() {
        let index = matrix().feature_index();
        let json = index.to_json().unwrap();
        assert_eq!(FeatureIndex::from_json(&json).unwrap(), index);
    }
}
