use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid date format in column '{column}' at row {row}: {value:?}")]
    InvalidDateFormat {
        column: String,
        row: usize,
        value: String,
    },

    #[error("Missing required columns: {}", columns.join(", "))]
    MissingColumn { columns: Vec<String> },

    #[error("No status column available to build the resolution target")]
    MissingTargetSource,

    #[error("Unknown {field} label: {value:?}")]
    UnknownLabel { field: &'static str, value: String },

    #[error("Column '{column}' has {actual} rows, table has {expected}")]
    ShapeMismatch {
        column: String,
        expected: usize,
        actual: usize,
    },

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PipelineError {
    pub fn missing<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::MissingColumn {
            columns: columns.into_iter().map(Into::into).collect(),
        }
    }
}

pub type PipelineResult<T> = Result<T, PipelineError>;
