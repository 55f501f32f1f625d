//! Small helpers shared across CLI tests.
//!
//! The CLI unit tests write temporary recordings in both supported formats
//! and assert error handling behaviour.

use std::f64::consts::TAU;
use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

use arrow_array::{ArrayRef, Float64Array, RecordBatch};
use arrow_schema::{DataType, Field, Schema};
use clap::Parser;
use parquet::arrow::arrow_writer::ArrowWriter;
use tempfile::TempDir;

use super::{Cli, CliError, run_cli};

pub(super) type TestResult = Result<(), Box<dyn std::error::Error>>;

pub(super) const SAMPLING_RATE: f64 = 64.0;

pub(super) fn temp_dir() -> TempDir {
    match TempDir::new() {
        Ok(dir) => dir,
        Err(err) => panic!("failed to create temp dir: {err}"),
    }
}

/// Two groups of channels: `A*` follow a 5 Hz tone and `B*` an 11 Hz tone,
/// each with its own faint 20+ Hz component.
pub(super) fn planted_channels() -> Vec<(String, Vec<f64>)> {
    let tone = |freq: f64, amp: f64, n: usize| amp * (TAU * freq * n as f64 / SAMPLING_RATE).sin();
    ["A0", "A1", "A2", "B0", "B1", "B2"]
        .iter()
        .enumerate()
        .map(|(index, label)| {
            let base = if label.starts_with('A') { 5.0 } else { 11.0 };
            let own = 20.0 + index as f64;
            let samples = (0..256)
                .map(|n| tone(base, 1.0, n) + tone(own, 0.2, n))
                .collect();
            ((*label).to_owned(), samples)
        })
        .collect()
}

pub(super) fn write_text(dir: &TempDir, name: &str, contents: &str) -> io::Result<PathBuf> {
    let path = dir.path().join(name);
    let mut file = File::create(&path)?;
    file.write_all(contents.as_bytes())?;
    Ok(path)
}

pub(super) fn write_planted_csv(dir: &TempDir, name: &str) -> io::Result<PathBuf> {
    let channels = planted_channels();
    let mut contents = channels
        .iter()
        .map(|(label, _)| label.as_str())
        .collect::<Vec<_>>()
        .join(",");
    contents.push('\n');
    let rows = channels.first().map_or(0, |(_, samples)| samples.len());
    for row in 0..rows {
        let cells: Vec<String> = channels
            .iter()
            .map(|(_, samples)| samples[row].to_string())
            .collect();
        contents.push_str(&cells.join(","));
        contents.push('\n');
    }
    write_text(dir, name, &contents)
}

pub(super) fn write_planted_parquet(
    dir: &TempDir,
    name: &str,
) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let channels = planted_channels();
    let fields: Vec<Field> = channels
        .iter()
        .map(|(label, _)| Field::new(label, DataType::Float64, false))
        .collect();
    let schema = Arc::new(Schema::new(fields));
    let arrays: Vec<ArrayRef> = channels
        .into_iter()
        .map(|(_, samples)| Arc::new(Float64Array::from(samples)) as ArrayRef)
        .collect();
    let batch = RecordBatch::try_new(schema.clone(), arrays)?;
    let path = dir.path().join(name);
    let file = File::create(&path)?;
    let mut writer = ArrowWriter::try_new(file, schema, None)?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(path)
}

pub(super) fn parse(args: &[&str]) -> Cli {
    let argv = std::iter::once("eegraph").chain(args.iter().copied());
    match Cli::try_parse_from(argv) {
        Ok(cli) => cli,
        Err(err) => panic!("arguments must parse: {err}"),
    }
}

pub(super) fn run_expecting_error(cli: Cli, panic_msg: &str) -> CliError {
    match run_cli(cli) {
        Ok(_) => panic!("{panic_msg}"),
        Err(err) => err,
    }
}
