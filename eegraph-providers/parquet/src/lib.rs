//! Parquet-backed EEG recordings.
//!
//! Each selected column holds one channel; the column name becomes the
//! channel label and every row is one sample. `Float32` and `Float64`
//! columns are accepted and nulls are rejected.

mod errors;
mod ingest;
mod recording;

pub use errors::ParquetRecordingError;
pub use recording::ParquetRecording;
