//! Helpers for appending Arrow float columns to channel buffers.
use arrow_array::{Array, ArrayRef, Float32Array, Float64Array, RecordBatch};
use arrow_schema::{DataType, Field, Schema};

use crate::errors::ParquetRecordingError;

/// Resolves `columns` (or every column when `None`) to schema indices and
/// checks that each holds floats.
pub(crate) fn resolve_columns(
    schema: &Schema,
    columns: Option<&[&str]>,
) -> Result<Vec<usize>, ParquetRecordingError> {
    let indices = match columns {
        Some(names) => names
            .iter()
            .map(|name| {
                schema
                    .index_of(name)
                    .map_err(|_| ParquetRecordingError::ColumnNotFound {
                        column: (*name).to_owned(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?,
        None => (0..schema.fields().len()).collect(),
    };
    if indices.is_empty() {
        return Err(ParquetRecordingError::NoColumns);
    }
    for &index in &indices {
        validate_float_field(schema.field(index))?;
    }
    Ok(indices)
}

pub(crate) fn validate_float_field(field: &Field) -> Result<(), ParquetRecordingError> {
    match field.data_type() {
        DataType::Float32 | DataType::Float64 => Ok(()),
        other => Err(ParquetRecordingError::InvalidColumnType {
            column: field.name().clone(),
            actual: other.clone(),
        }),
    }
}

/// Appends the selected columns of `batch` to `channels`, one buffer per
/// column. `start_row` is the absolute row of the batch's first row.
pub(crate) fn append_batch(
    batch: &RecordBatch,
    indices: &[usize],
    start_row: usize,
    channels: &mut [Vec<f64>],
) -> Result<(), ParquetRecordingError> {
    let schema = batch.schema();
    for (&index, channel) in indices.iter().zip(channels.iter_mut()) {
        let name = schema.field(index).name();
        append_column(batch.column(index), name, start_row, channel)?;
    }
    Ok(())
}

pub(crate) fn append_column(
    array: &ArrayRef,
    name: &str,
    start_row: usize,
    out: &mut Vec<f64>,
) -> Result<(), ParquetRecordingError> {
    if array.null_count() > 0 {
        let row = (0..array.len()).find(|&row| array.is_null(row)).unwrap_or(0);
        return Err(ParquetRecordingError::NullValue {
            column: name.to_owned(),
            row: start_row + row,
        });
    }
    out.reserve(array.len());
    if let Some(values) = array.as_any().downcast_ref::<Float64Array>() {
        out.extend_from_slice(values.values());
    } else if let Some(values) = array.as_any().downcast_ref::<Float32Array>() {
        out.extend(values.values().iter().map(|&v| f64::from(v)));
    } else {
        return Err(ParquetRecordingError::InvalidColumnType {
            column: name.to_owned(),
            actual: array.data_type().clone(),
        });
    }
    Ok(())
}
