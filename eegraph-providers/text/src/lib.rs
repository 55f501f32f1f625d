//! Delimited-text provider for EEG recordings.
//!
//! The first row holds the channel labels; every following row holds one
//! sample per channel. A channel ends at its first empty cell, so trailing
//! empty cells (or short rows) shorten a channel. Unequal channel lengths
//! are left for the pipeline to reject.
use std::{
    fs::File,
    io::{self, BufRead, BufReader},
    num::ParseFloatError,
    path::Path,
};

use eegraph_core::{Recording, SubjectId};
use thiserror::Error;

/// Failure while reading a [`DelimitedRecording`].
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DelimitedRecordingError {
    /// The input contained no header row.
    #[error("input contains no header row")]
    EmptyInput,
    /// A header cell was blank.
    #[error("header column {column} has an empty label")]
    EmptyLabel {
        /// Zero-based column index.
        column: usize,
    },
    /// A cell did not parse as a floating-point number.
    #[error("line {line}, column {column}: invalid number `{value}`")]
    ParseFloat {
        /// One-based line number.
        line: usize,
        /// Zero-based column index.
        column: usize,
        /// Offending cell.
        value: String,
        /// Parser failure.
        #[source]
        source: ParseFloatError,
    },
    /// A value followed an empty cell in the same column.
    #[error("line {line}, column {column}: value after the channel ended")]
    ValueAfterGap {
        /// One-based line number.
        line: usize,
        /// Zero-based column index.
        column: usize,
    },
    /// A row had more cells than the header.
    #[error("line {line} has {actual} cells but the header has {expected}")]
    ExtraColumn {
        /// One-based line number.
        line: usize,
        /// Header width.
        expected: usize,
        /// Cells found.
        actual: usize,
    },
    /// Reading the input failed.
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
}

/// Recording read from comma-, tab-, or otherwise delimited text.
///
/// # Examples
/// ```
/// use std::io::Cursor;
///
/// use eegraph_core::Recording;
/// use eegraph_providers_text::DelimitedRecording;
///
/// let rec = DelimitedRecording::try_from_reader(
///     "s1",
///     128.0,
///     Cursor::new("Fz,Cz\n1.0,2.0\n3.0,\n"),
/// )
/// .expect("valid input");
/// assert_eq!(rec.channel_label(1), Some("Cz"));
/// assert_eq!(rec.samples(0), Some(&[1.0, 3.0][..]));
/// assert_eq!(rec.samples(1), Some(&[2.0][..]));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct DelimitedRecording {
    subject: SubjectId,
    sampling_rate: f64,
    labels: Vec<String>,
    channels: Vec<Vec<f64>>,
}

impl DelimitedRecording {
    /// Reads comma-separated input.
    ///
    /// # Errors
    /// See [`DelimitedRecording::try_from_reader_with_delimiter`].
    pub fn try_from_reader(
        subject: impl Into<SubjectId>,
        sampling_rate: f64,
        reader: impl BufRead,
    ) -> Result<Self, DelimitedRecordingError> {
        Self::try_from_reader_with_delimiter(subject, sampling_rate, reader, ',')
    }

    /// Reads input separated by `delimiter`. Blank lines are skipped and
    /// carriage returns are trimmed.
    ///
    /// # Errors
    /// Returns [`DelimitedRecordingError`] when the header is missing or
    /// blank, a cell is not a number, a channel resumes after an empty cell,
    /// a row is wider than the header, or reading fails.
    pub fn try_from_reader_with_delimiter(
        subject: impl Into<SubjectId>,
        sampling_rate: f64,
        reader: impl BufRead,
        delimiter: char,
    ) -> Result<Self, DelimitedRecordingError> {
        let mut lines = reader.lines().enumerate();
        let labels = loop {
            let Some((_, line)) = lines.next() else {
                return Err(DelimitedRecordingError::EmptyInput);
            };
            let line = line?;
            if !line.trim().is_empty() {
                break parse_header(&line, delimiter)?;
            }
        };

        let mut channels = vec![Vec::new(); labels.len()];
        let mut ended = vec![false; labels.len()];
        for (index, line) in lines {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let number = index + 1;
            let cells: Vec<&str> = line.split(delimiter).map(str::trim).collect();
            if cells.len() > labels.len() {
                return Err(DelimitedRecordingError::ExtraColumn {
                    line: number,
                    expected: labels.len(),
                    actual: cells.len(),
                });
            }
            for (column, (channel, done)) in channels.iter_mut().zip(ended.iter_mut()).enumerate()
            {
                match cells.get(column).copied().filter(|cell| !cell.is_empty()) {
                    None => *done = true,
                    Some(_) if *done => {
                        return Err(DelimitedRecordingError::ValueAfterGap {
                            line: number,
                            column,
                        });
                    }
                    Some(cell) => {
                        let value = cell.parse::<f64>().map_err(|source| {
                            DelimitedRecordingError::ParseFloat {
                                line: number,
                                column,
                                value: cell.to_owned(),
                                source,
                            }
                        })?;
                        channel.push(value);
                    }
                }
            }
        }

        Ok(Self {
            subject: subject.into(),
            sampling_rate,
            labels,
            channels,
        })
    }

    /// Reads the file at `path`; `.tsv` files are tab-separated and
    /// everything else is comma-separated.
    ///
    /// # Errors
    /// Returns [`DelimitedRecordingError::Io`] when the file cannot be
    /// opened and the parse errors of
    /// [`DelimitedRecording::try_from_reader_with_delimiter`].
    pub fn try_from_path(
        subject: impl Into<SubjectId>,
        sampling_rate: f64,
        path: impl AsRef<Path>,
    ) -> Result<Self, DelimitedRecordingError> {
        let path = path.as_ref();
        let delimiter = if path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("tsv"))
        {
            '\t'
        } else {
            ','
        };
        let file = File::open(path)?;
        Self::try_from_reader_with_delimiter(subject, sampling_rate, BufReader::new(file), delimiter)
    }

    /// Channel labels in column order.
    #[must_use]
    #[rustfmt::skip]
    pub fn labels(&self) -> &[String] { &self.labels }
}

fn parse_header(line: &str, delimiter: char) -> Result<Vec<String>, DelimitedRecordingError> {
    line.split(delimiter)
        .map(str::trim)
        .enumerate()
        .map(|(column, label)| {
            if label.is_empty() {
                Err(DelimitedRecordingError::EmptyLabel { column })
            } else {
                Ok(label.to_owned())
            }
        })
        .collect()
}

impl Recording for DelimitedRecording {
    fn subject_id(&self) -> &SubjectId {
        &self.subject
    }

    fn sampling_rate(&self) -> f64 {
        self.sampling_rate
    }

    fn channel_count(&self) -> usize {
        self.labels.len()
    }

    fn channel_label(&self, channel: usize) -> Option<&str> {
        self.labels.get(channel).map(String::as_str)
    }

    fn samples(&self, channel: usize) -> Option<&[f64]> {
        self.channels.get(channel).map(Vec::as_slice)
    }
}
