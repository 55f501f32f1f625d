//! Command-line interface orchestration for eegraph.
//!
//! `graph` prints the channel graph of one recording, `communities` the
//! partitions every configured run produces for it, and `benchmark` the
//! records aggregated over many recordings.

mod commands;
mod output;

pub use commands::{
    AlgorithmArg, BenchmarkCommand, Cli, CliError, Command, ExecutionSummary, InputArgs,
    LoadedRecording, MeasureArg, PipelineArgs, SingleCommand, SourceFormat, run_cli,
};
pub use output::{
    BenchmarkSummary, CommandOutput, CommunitiesSummary, GraphSummary, OutputFormat, RunSummary,
    UnreadableRecording, render_summary,
};

#[cfg(test)]
mod test_helpers;
