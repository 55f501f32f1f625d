//! Command implementations and argument parsing for the eegraph CLI.

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand, ValueEnum};
use eegraph_core::{
    Algorithm, BenchmarkReport, ConfigError, ConnectivityMeasure, DEFAULT_BAND_POWER_SCALE,
    DEFAULT_INCLUSION_THRESHOLD, DEFAULT_ITERATION_CAP, DEFAULT_RESOLUTION, Eegraph,
    EegraphBuilder, ExecutionStrategy, InclusionPolicy, Recording, SubjectError,
};
use eegraph_providers_parquet::{ParquetRecording, ParquetRecordingError};
use eegraph_providers_text::{DelimitedRecording, DelimitedRecordingError};
use thiserror::Error;
use tracing::{Span, field, info, instrument, warn};

use super::output::{
    BenchmarkSummary, CommandOutput, CommunitiesSummary, GraphSummary, OutputFormat,
    UnreadableRecording,
};

/// Top-level CLI options parsed by [`clap`].
#[derive(Debug, Parser, Clone)]
#[command(
    name = "eegraph",
    about = "Build EEG channel graphs and benchmark community detection."
)]
pub struct Cli {
    /// Command to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Supported CLI commands.
#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Build the channel graph of one recording.
    Graph(SingleCommand),
    /// Partition the channel graph of one recording with every configured
    /// algorithm and flag state.
    Communities(SingleCommand),
    /// Aggregate detection runs over many recordings.
    Benchmark(BenchmarkCommand),
}

impl Command {
    const fn name(&self) -> &'static str {
        match self {
            Self::Graph(_) => "graph",
            Self::Communities(_) => "communities",
            Self::Benchmark(_) => "benchmark",
        }
    }
}

/// Options of the `graph` and `communities` commands.
#[derive(Debug, Args, Clone)]
pub struct SingleCommand {
    /// Recording file (`.parquet`, `.csv`, or `.tsv`).
    pub path: PathBuf,

    /// Subject identifier (defaults to the file stem).
    #[arg(long)]
    pub subject: Option<String>,

    /// Input options.
    #[command(flatten)]
    pub input: InputArgs,

    /// Pipeline options.
    #[command(flatten)]
    pub pipeline: PipelineArgs,

    /// Output format written to stdout.
    #[arg(long, value_enum, default_value_t = OutputFormat::Csv)]
    pub output: OutputFormat,
}

/// Options of the `benchmark` command.
#[derive(Debug, Args, Clone)]
pub struct BenchmarkCommand {
    /// Recording files, one subject each, named by file stem.
    #[arg(required = true, num_args = 1..)]
    pub paths: Vec<PathBuf>,

    /// Input options.
    #[command(flatten)]
    pub input: InputArgs,

    /// Pipeline options.
    #[command(flatten)]
    pub pipeline: PipelineArgs,

    /// Output format written to stdout.
    #[arg(long, value_enum, default_value_t = OutputFormat::Csv)]
    pub output: OutputFormat,
}

/// How recordings are read.
#[derive(Debug, Args, Clone)]
pub struct InputArgs {
    /// Sampling rate of the recordings in hertz.
    #[arg(long = "sampling-rate")]
    pub sampling_rate: f64,

    /// File format; `auto` decides by extension.
    #[arg(long, value_enum, default_value_t = SourceFormat::Auto)]
    pub format: SourceFormat,

    /// Parquet columns to read as channels, in order (default: all).
    #[arg(long, value_delimiter = ',')]
    pub columns: Vec<String>,
}

/// Recording file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SourceFormat {
    /// `.parquet` is Parquet, anything else is delimited text.
    Auto,
    /// One float column per channel.
    Parquet,
    /// Comma-separated text with a header row (tab-separated for `.tsv`).
    Text,
}

/// Connectivity measures selectable on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MeasureArg {
    /// Absolute Pearson correlation.
    Pearson,
    /// Magnitude-squared coherence over 0.5-45 Hz.
    Coherence,
    /// Similarity of theta and alpha relative powers.
    BandPower,
}

/// Community-detection algorithms selectable on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AlgorithmArg {
    /// Multilevel modularity optimisation.
    Louvain,
    /// Weighted asynchronous label propagation.
    LabelPropagation,
}

impl From<AlgorithmArg> for Algorithm {
    fn from(value: AlgorithmArg) -> Self {
        match value {
            AlgorithmArg::Louvain => Self::Louvain,
            AlgorithmArg::LabelPropagation => Self::LabelPropagation,
        }
    }
}

/// Options mapped onto [`EegraphBuilder`].
#[derive(Debug, Args, Clone)]
pub struct PipelineArgs {
    /// Connectivity measure weighting each channel pair.
    #[arg(long, value_enum, default_value_t = MeasureArg::Pearson)]
    pub measure: MeasureArg,

    /// Distance multiplier of the band-power measure.
    #[arg(long = "band-power-scale", default_value_t = DEFAULT_BAND_POWER_SCALE)]
    pub band_power_scale: f64,

    /// Keep pairs whose weight reaches this threshold.
    #[arg(long, conflicts_with_all = ["top_k", "all_edges"])]
    pub threshold: Option<f64>,

    /// Keep each channel's `k` strongest pairs.
    #[arg(long = "top-k", conflicts_with = "all_edges")]
    pub top_k: Option<usize>,

    /// Keep every pair.
    #[arg(long = "all-edges")]
    pub all_edges: bool,

    /// Also run every algorithm on the graph without edges below this
    /// weight.
    #[arg(long = "flag-threshold")]
    pub flag_threshold: Option<f64>,

    /// Algorithm to run; repeat for several.
    #[arg(
        long = "algorithm",
        value_enum,
        default_values_t = [AlgorithmArg::Louvain],
    )]
    pub algorithms: Vec<AlgorithmArg>,

    /// Modularity resolution.
    #[arg(long, default_value_t = DEFAULT_RESOLUTION)]
    pub resolution: f64,

    /// Cap on optimisation passes per run.
    #[arg(long = "iteration-cap", default_value_t = DEFAULT_ITERATION_CAP)]
    pub iteration_cap: usize,

    /// Runs of every (algorithm, flag) combination per subject.
    #[arg(long, default_value_t = 1)]
    pub repetitions: usize,

    /// Process subjects one after another instead of in parallel.
    #[arg(long)]
    pub sequential: bool,
}

impl PipelineArgs {
    fn inclusion(&self) -> InclusionPolicy {
        if self.all_edges {
            InclusionPolicy::All
        } else if let Some(k) = self.top_k {
            InclusionPolicy::TopK(k)
        } else {
            InclusionPolicy::Threshold(self.threshold.unwrap_or(DEFAULT_INCLUSION_THRESHOLD))
        }
    }

    fn measure(&self) -> ConnectivityMeasure {
        match self.measure {
            MeasureArg::Pearson => ConnectivityMeasure::Pearson,
            MeasureArg::Coherence => ConnectivityMeasure::coherence(),
            MeasureArg::BandPower => ConnectivityMeasure::BandPower {
                scale: self.band_power_scale,
            },
        }
    }

    pub(super) fn builder(&self) -> EegraphBuilder {
        EegraphBuilder::new()
            .with_measure(self.measure())
            .with_inclusion(self.inclusion())
            .with_flag_threshold(self.flag_threshold)
            .with_algorithms(self.algorithms.iter().copied().map(Algorithm::from))
            .with_resolution(self.resolution)
            .with_iteration_cap(self.iteration_cap)
            .with_repetitions(self.repetitions)
            .with_execution_strategy(if self.sequential {
                ExecutionStrategy::Sequential
            } else {
                ExecutionStrategy::Parallel
            })
    }
}

/// Errors surfaced while executing CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    /// `--columns` was given for a text recording.
    #[error("`--columns` applies only to Parquet input, not `{path}`")]
    ColumnsRequireParquet {
        /// Text recording the columns were given for.
        path: PathBuf,
    },
    /// Parquet ingestion failed.
    #[error("failed to read `{path}`: {source}")]
    Parquet {
        /// File being read.
        path: PathBuf,
        /// Provider failure.
        #[source]
        source: ParquetRecordingError,
    },
    /// Text ingestion failed.
    #[error("failed to read `{path}`: {source}")]
    Text {
        /// File being read.
        path: PathBuf,
        /// Provider failure.
        #[source]
        source: DelimitedRecordingError,
    },
    /// The pipeline configuration was rejected.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// The recording could not be turned into a graph.
    #[error(transparent)]
    Subject(#[from] SubjectError),
}

impl CliError {
    /// Stable code of the core error underneath, if any.
    #[must_use]
    pub fn code(&self) -> Option<&'static str> {
        match self {
            Self::Config(err) => Some(err.code().as_str()),
            Self::Subject(err) => Some(err.code().as_str()),
            _ => None,
        }
    }

    /// Code of the stage error wrapped by a subject failure.
    #[must_use]
    pub fn detail_code(&self) -> Option<&'static str> {
        match self {
            Self::Subject(err) => Some(err.detail_code()),
            _ => None,
        }
    }
}

/// A recording loaded by either provider.
#[derive(Debug, Clone)]
pub enum LoadedRecording {
    /// Read from Parquet.
    Parquet(ParquetRecording),
    /// Read from delimited text.
    Text(DelimitedRecording),
}

impl LoadedRecording {
    fn inner(&self) -> &dyn Recording {
        match self {
            Self::Parquet(recording) => recording,
            Self::Text(recording) => recording,
        }
    }
}

impl Recording for LoadedRecording {
    fn subject_id(&self) -> &eegraph_core::SubjectId {
        self.inner().subject_id()
    }

    fn sampling_rate(&self) -> f64 {
        self.inner().sampling_rate()
    }

    fn channel_count(&self) -> usize {
        self.inner().channel_count()
    }

    fn channel_label(&self, channel: usize) -> Option<&str> {
        self.inner().channel_label(channel)
    }

    fn samples(&self, channel: usize) -> Option<&[f64]> {
        self.inner().samples(channel)
    }
}

/// Summarises the outcome of executing a CLI command.
#[derive(Debug, Clone)]
pub struct ExecutionSummary {
    /// Requested output format.
    pub format: OutputFormat,
    /// Command result.
    pub output: CommandOutput,
}

/// Executes the CLI command represented by `cli`.
///
/// # Errors
/// Returns [`CliError`] when a recording cannot be read, the configuration
/// is invalid, or a single-recording command cannot build its graph.
/// `benchmark` skips such subjects instead and reports them.
///
/// # Examples
/// ```
/// # use std::error::Error;
/// # use clap::Parser;
/// # use eegraph_cli::cli::{Cli, CommandOutput, run_cli};
/// #
/// # fn main() -> Result<(), Box<dyn Error>> {
/// let file = tempfile::Builder::new().suffix(".csv").tempfile()?;
/// std::fs::write(file.path(), "Fz,Cz,Pz\n1,2,1\n2,4,0\n3,6,2\n4,8,1\n")?;
/// let path = file.path().to_string_lossy().into_owned();
/// let cli = Cli::try_parse_from([
///     "eegraph", "graph", path.as_str(), "--sampling-rate", "128", "--all-edges",
/// ])?;
/// let summary = run_cli(cli)?;
/// let CommandOutput::Graph(graph) = summary.output else { unreachable!() };
/// assert_eq!(graph.nodes.len(), 3);
/// assert_eq!(graph.edges.len(), 3);
/// # Ok(())
/// # }
/// ```
#[instrument(
    name = "cli.run",
    err,
    skip(cli),
    fields(command = cli.command.name(), subjects = field::Empty),
)]
pub fn run_cli(cli: Cli) -> Result<ExecutionSummary, CliError> {
    let summary = match cli.command {
        Command::Graph(command) => run_graph(command)?,
        Command::Communities(command) => run_communities(command)?,
        Command::Benchmark(command) => run_benchmark(command)?,
    };
    info!(format = summary.format.as_str(), "command completed");
    Ok(summary)
}

fn single_subject(command: &SingleCommand) -> Result<(Eegraph, LoadedRecording), CliError> {
    let eegraph = command.pipeline.builder().build()?;
    let subject = derive_subject_id(&command.path, command.subject.as_deref());
    let recording = load_recording(&command.path, subject, &command.input)?;
    Span::current().record("subjects", 1);
    Ok((eegraph, recording))
}

pub(super) fn run_graph(command: SingleCommand) -> Result<ExecutionSummary, CliError> {
    let (eegraph, recording) = single_subject(&command)?;
    let graph = eegraph.build_graph(&recording)?;
    Ok(ExecutionSummary {
        format: command.output,
        output: CommandOutput::Graph(GraphSummary::from(&graph)),
    })
}

pub(super) fn run_communities(command: SingleCommand) -> Result<ExecutionSummary, CliError> {
    let (eegraph, recording) = single_subject(&command)?;
    let analysis = eegraph.analyse(&recording)?;
    Ok(ExecutionSummary {
        format: command.output,
        output: CommandOutput::Communities(CommunitiesSummary::from(&analysis)),
    })
}

pub(super) fn run_benchmark(command: BenchmarkCommand) -> Result<ExecutionSummary, CliError> {
    let eegraph = command.pipeline.builder().build()?;
    let mut recordings = Vec::with_capacity(command.paths.len());
    let mut unreadable = Vec::new();
    for path in &command.paths {
        let subject = derive_subject_id(path, None);
        match load_recording(path, subject.clone(), &command.input) {
            Ok(recording) => recordings.push(recording),
            Err(err @ CliError::ColumnsRequireParquet { .. }) => return Err(err),
            Err(err) => {
                warn!(subject = %subject, error = %err, "recording unreadable; subject skipped");
                unreadable.push(UnreadableRecording {
                    subject,
                    path: path.display().to_string(),
                    message: err.to_string(),
                });
            }
        }
    }
    Span::current().record("subjects", recordings.len());
    let report: BenchmarkReport = eegraph.benchmark(&recordings);
    Ok(ExecutionSummary {
        format: command.output,
        output: CommandOutput::Benchmark(BenchmarkSummary { report, unreadable }),
    })
}

/// Reads the recording at `path` with the provider its format selects.
#[instrument(
    name = "cli.load_recording",
    err,
    skip(input),
    fields(path = %path.display(), format = field::Empty, channels = field::Empty),
)]
pub(super) fn load_recording(
    path: &Path,
    subject: String,
    input: &InputArgs,
) -> Result<LoadedRecording, CliError> {
    let span = Span::current();
    let recording = if resolve_format(path, input.format) == SourceFormat::Parquet {
        span.record("format", "parquet");
        let columns: Vec<&str> = input.columns.iter().map(String::as_str).collect();
        let selected = (!columns.is_empty()).then_some(columns.as_slice());
        ParquetRecording::try_from_parquet_path(subject, input.sampling_rate, path, selected)
            .map(LoadedRecording::Parquet)
            .map_err(|source| CliError::Parquet {
                path: path.to_path_buf(),
                source,
            })?
    } else {
        span.record("format", "text");
        if !input.columns.is_empty() {
            return Err(CliError::ColumnsRequireParquet {
                path: path.to_path_buf(),
            });
        }
        DelimitedRecording::try_from_path(subject, input.sampling_rate, path)
            .map(LoadedRecording::Text)
            .map_err(|source| CliError::Text {
                path: path.to_path_buf(),
                source,
            })?
    };
    span.record("channels", recording.channel_count());
    Ok(recording)
}

pub(super) fn resolve_format(path: &Path, requested: SourceFormat) -> SourceFormat {
    match requested {
        SourceFormat::Auto
            if path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("parquet")) =>
        {
            SourceFormat::Parquet
        }
        SourceFormat::Auto => SourceFormat::Text,
        other => other,
    }
}

pub(super) fn derive_subject_id(path: &Path, override_id: Option<&str>) -> String {
    if let Some(id) = override_id {
        return id.to_owned();
    }

    path.file_stem()
        .and_then(|value| value.to_str())
        .map_or_else(|| "subject".to_owned(), ToOwned::to_owned)
}
