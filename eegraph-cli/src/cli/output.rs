//! Rendering of command results as CSV or JSON.

use std::io::{self, Write};

use clap::ValueEnum;
use eegraph_core::{
    Algorithm, BenchmarkReport, Edge, Graph, Node, Partition, SubjectAnalysis, SubjectId,
};
use serde::Serialize;

/// Format written to stdout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Comma-separated rows with a header.
    #[default]
    Csv,
    /// A single pretty-printed JSON document.
    Json,
}

impl OutputFormat {
    /// Stable name of the format.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
        }
    }
}

/// Nodes and edges of one subject's graph.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphSummary {
    /// Subject the graph belongs to.
    pub subject: SubjectId,
    /// Nodes in channel order.
    pub nodes: Vec<Node>,
    /// Edges in `(source, target)` order.
    pub edges: Vec<Edge>,
}

impl From<&Graph> for GraphSummary {
    fn from(graph: &Graph) -> Self {
        Self {
            subject: graph.subject_id().clone(),
            nodes: graph.nodes().to_vec(),
            edges: graph.edges().to_vec(),
        }
    }
}

/// One detection run of [`CommunitiesSummary`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    /// Algorithm used.
    pub algorithm: Algorithm,
    /// Whether flag mode filtered the graph first.
    pub flag: bool,
    /// Zero-based repetition number.
    pub repetition: usize,
    /// Converged or partial partition.
    pub partition: Partition,
}

/// Detection runs of one subject.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommunitiesSummary {
    /// Subject the runs belong to.
    pub subject: SubjectId,
    /// Channel labels in node order.
    pub channels: Vec<String>,
    /// Runs in algorithm, flag, and repetition order.
    pub runs: Vec<RunSummary>,
}

impl From<&SubjectAnalysis> for CommunitiesSummary {
    fn from(analysis: &SubjectAnalysis) -> Self {
        let graph = analysis.graph();
        Self {
            subject: graph.subject_id().clone(),
            channels: graph.nodes().iter().map(|n| n.channel().to_owned()).collect(),
            runs: analysis
                .runs()
                .iter()
                .map(|run| RunSummary {
                    algorithm: run.algorithm,
                    flag: run.flagged,
                    repetition: run.repetition,
                    partition: match &run.outcome {
                        Ok(partition) => partition.clone(),
                        Err(err) => err.partial().clone(),
                    },
                })
                .collect(),
        }
    }
}

/// A `benchmark` input that no provider could read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnreadableRecording {
    /// Subject id derived from the file name.
    pub subject: String,
    /// File that failed to load.
    pub path: String,
    /// Provider failure.
    pub message: String,
}

/// Output of `benchmark`: the aggregated report plus the inputs skipped
/// before analysis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BenchmarkSummary {
    /// Report over the readable recordings.
    #[serde(flatten)]
    pub report: BenchmarkReport,
    /// Files skipped because they could not be read, in input order.
    pub unreadable: Vec<UnreadableRecording>,
}

/// Result of a CLI command.
#[derive(Debug, Clone)]
pub enum CommandOutput {
    /// Output of `graph`.
    Graph(GraphSummary),
    /// Output of `communities`.
    Communities(CommunitiesSummary),
    /// Output of `benchmark`.
    Benchmark(BenchmarkSummary),
}

/// Renders `summary` to `writer` in its requested format.
///
/// CSV output is one table per command: the edge list for `graph`, one row
/// per (run, channel) for `communities`, and one row per benchmark record
/// for `benchmark`. JSON output carries every field, including nodes,
/// skipped subjects and unreadable files.
///
/// # Errors
/// Returns [`io::Error`] if writing to the supplied writer fails.
pub fn render_summary(summary: &super::ExecutionSummary, mut writer: impl Write) -> io::Result<()> {
    match summary.format {
        OutputFormat::Json => {
            match &summary.output {
                CommandOutput::Graph(graph) => serde_json::to_writer_pretty(&mut writer, graph)?,
                CommandOutput::Communities(runs) => {
                    serde_json::to_writer_pretty(&mut writer, runs)?;
                }
                CommandOutput::Benchmark(benchmark) => {
                    serde_json::to_writer_pretty(&mut writer, benchmark)?;
                }
            }
            writeln!(writer)
        }
        OutputFormat::Csv => match &summary.output {
            CommandOutput::Graph(graph) => render_graph_csv(graph, writer),
            CommandOutput::Communities(runs) => render_communities_csv(runs, writer),
            CommandOutput::Benchmark(benchmark) => render_benchmark_csv(&benchmark.report, writer),
        },
    }
}

fn render_graph_csv(graph: &GraphSummary, mut writer: impl Write) -> io::Result<()> {
    writeln!(writer, "subject,source,target,source_channel,target_channel,weight")?;
    let label = |index: usize| graph.nodes.get(index).map_or("", |node| node.channel());
    for edge in &graph.edges {
        writeln!(
            writer,
            "{},{},{},{},{},{}",
            csv_field(graph.subject.as_str()),
            edge.source(),
            edge.target(),
            csv_field(label(edge.source())),
            csv_field(label(edge.target())),
            edge.weight(),
        )?;
    }
    Ok(())
}

fn render_communities_csv(summary: &CommunitiesSummary, mut writer: impl Write) -> io::Result<()> {
    writeln!(
        writer,
        "subject,algorithm,flag,repetition,channel,community,modularity,convergence"
    )?;
    for run in &summary.runs {
        let convergence = if run.partition.is_partial() {
            "partial"
        } else {
            "converged"
        };
        for (channel, community) in summary.channels.iter().zip(run.partition.assignments()) {
            writeln!(
                writer,
                "{},{},{},{},{},{},{},{}",
                csv_field(summary.subject.as_str()),
                run.algorithm,
                run.flag,
                run.repetition,
                csv_field(channel),
                community.get(),
                run.partition.modularity(),
                convergence,
            )?;
        }
    }
    Ok(())
}

fn render_benchmark_csv(report: &BenchmarkReport, mut writer: impl Write) -> io::Result<()> {
    writeln!(
        writer,
        "order,algorithm,flag,mean_modularity,mean_runtime,sample_count,partial_count,failure_count,mean_community_count"
    )?;
    for record in report.records() {
        writeln!(
            writer,
            "{},{},{},{},{},{},{},{},{}",
            record.order(),
            record.algorithm(),
            record.flagged(),
            optional(record.mean_modularity()),
            optional(record.mean_runtime().map(|runtime| runtime.as_secs_f64())),
            record.sample_count(),
            record.partial_count(),
            record.failure_count(),
            optional(record.mean_community_count()),
        )?;
    }
    Ok(())
}

fn optional(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Quotes `value` when it holds CSV metacharacters.
pub(super) fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_owned()
    }
}
