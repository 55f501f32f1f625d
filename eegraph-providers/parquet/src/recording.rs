//! Recording implementation and Parquet ingestion.
use std::{fs::File, path::Path};

use arrow_array::{RecordBatch, RecordBatchReader};
use eegraph_core::{Recording, SubjectId};
use parquet::arrow::{ProjectionMask, arrow_reader::ParquetRecordBatchReaderBuilder};
use parquet::file::reader::ChunkReader;

use crate::errors::ParquetRecordingError;
use crate::ingest::{append_batch, resolve_columns};

/// Multichannel recording loaded from Parquet float columns.
///
/// Columns keep the order in which they were requested, or schema order when
/// every column is read.
#[derive(Debug, Clone)]
pub struct ParquetRecording {
    subject: SubjectId,
    sampling_rate: f64,
    labels: Vec<String>,
    channels: Vec<Vec<f64>>,
}

impl ParquetRecording {
    /// Loads every column of the file at `path`.
    ///
    /// # Errors
    /// Returns [`ParquetRecordingError`] when the file cannot be read, a
    /// column is not `Float32`/`Float64`, or a value is null.
    pub fn try_from_parquet_path(
        subject: impl Into<SubjectId>,
        sampling_rate: f64,
        path: impl AsRef<Path>,
        columns: Option<&[&str]>,
    ) -> Result<Self, ParquetRecordingError> {
        let file = File::open(path)?;
        Self::try_from_parquet_reader(subject, sampling_rate, file, columns)
    }

    /// Loads the selected columns (all when `columns` is `None`) from a
    /// Parquet reader.
    ///
    /// # Errors
    /// Returns [`ParquetRecordingError::ColumnNotFound`] for an unknown
    /// column and the other variants as for
    /// [`ParquetRecording::try_from_parquet_path`].
    pub fn try_from_parquet_reader<R>(
        subject: impl Into<SubjectId>,
        sampling_rate: f64,
        reader: R,
        columns: Option<&[&str]>,
    ) -> Result<Self, ParquetRecordingError>
    where
        R: ChunkReader + 'static,
    {
        let mut builder = ParquetRecordBatchReaderBuilder::try_new(reader)?;
        if let Some(names) = columns {
            let mask = ProjectionMask::columns(builder.parquet_schema(), names.iter().copied());
            builder = builder.with_projection(mask);
        }
        let reader = builder.build()?;
        let schema = reader.schema();
        let indices = resolve_columns(&schema, columns)?;
        let labels = indices
            .iter()
            .map(|&index| schema.field(index).name().clone())
            .collect();
        let mut channels = vec![Vec::new(); indices.len()];
        let mut rows = 0_usize;
        for batch in reader {
            let batch = batch?;
            append_batch(&batch, &indices, rows, &mut channels)?;
            rows += batch.num_rows();
        }
        Ok(Self::from_parts(subject, sampling_rate, labels, channels))
    }

    /// Builds a recording from in-memory record batches sharing one schema.
    ///
    /// # Errors
    /// Returns [`ParquetRecordingError::NoColumns`] without batches and the
    /// column errors of [`ParquetRecording::try_from_parquet_reader`].
    pub fn try_from_record_batches(
        subject: impl Into<SubjectId>,
        sampling_rate: f64,
        batches: &[RecordBatch],
        columns: Option<&[&str]>,
    ) -> Result<Self, ParquetRecordingError> {
        let first = batches.first().ok_or(ParquetRecordingError::NoColumns)?;
        let schema = first.schema();
        let indices = resolve_columns(&schema, columns)?;
        let labels = indices
            .iter()
            .map(|&index| schema.field(index).name().clone())
            .collect();
        let mut channels = vec![Vec::new(); indices.len()];
        let mut rows = 0_usize;
        for batch in batches {
            append_batch(batch, &indices, rows, &mut channels)?;
            rows += batch.num_rows();
        }
        Ok(Self::from_parts(subject, sampling_rate, labels, channels))
    }

    fn from_parts(
        subject: impl Into<SubjectId>,
        sampling_rate: f64,
        labels: Vec<String>,
        channels: Vec<Vec<f64>>,
    ) -> Self {
        Self {
            subject: subject.into(),
            sampling_rate,
            labels,
            channels,
        }
    }

    /// Number of rows read.
    #[must_use]
    pub fn sample_count(&self) -> usize {
        self.channels.first().map_or(0, Vec::len)
    }
}

impl Recording for ParquetRecording {
    fn subject_id(&self) -> &SubjectId {
        &self.subject
    }

    fn sampling_rate(&self) -> f64 {
        self.sampling_rate
    }

    fn channel_count(&self) -> usize {
        self.channels.len()
    }

    fn channel_label(&self, channel: usize) -> Option<&str> {
        self.labels.get(channel).map(String::as_str)
    }

    fn samples(&self, channel: usize) -> Option<&[f64]> {
        self.channels.get(channel).map(Vec::as_slice)
    }
}
