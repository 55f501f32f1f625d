use arrow_schema::{ArrowError, DataType};
use thiserror::Error;

/// Failure while loading a [`crate::ParquetRecording`].
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ParquetRecordingError {
    #[error("Parquet schema has no columns to read")]
    NoColumns,
    #[error("column `{column}` not found in Parquet schema")]
    ColumnNotFound { column: String },
    #[error("column `{column}` must be Float32 or Float64 but found {actual:?}")]
    InvalidColumnType { column: String, actual: DataType },
    #[error("column `{column}` contains a null at row {row}")]
    NullValue { column: String, row: usize },
    #[error("arrow error: {0}")]
    Arrow(#[from] ArrowError),
    #[error("parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}
