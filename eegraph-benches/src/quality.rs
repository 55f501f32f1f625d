//! Partition quality against planted channel groups.
//!
//! Scores detected communities with the Adjusted Rand Index (ARI) and
//! Normalised Mutual Information (NMI), and writes per-configuration rows to
//! a CSV report for benchmark harnesses.

use std::{
    collections::HashMap,
    fs,
    hash::Hash,
    path::{Path, PathBuf},
};

use eegraph_core::{Algorithm, EegraphBuilder, ExecutionStrategy, InclusionPolicy};

use crate::{
    error::BenchSetupError,
    source::{PlantedConfig, PlantedRecording},
};

/// ARI and NMI of one labelling against the planted groups.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct QualityScore {
    /// Adjusted Rand Index in `[-1.0, 1.0]`.
    pub ari: f64,
    /// Normalised Mutual Information in `[0.0, 1.0]`.
    pub nmi: f64,
}

/// Errors raised while scoring a labelling.
#[derive(Debug, thiserror::Error, Eq, PartialEq)]
pub enum QualityError {
    /// The two labellings cover a different number of channels.
    #[error("label length mismatch: planted={planted}, detected={detected}")]
    LabelLengthMismatch {
        /// Number of planted labels.
        planted: usize,
        /// Number of detected labels.
        detected: usize,
    },
}

/// One row of the quality report.
#[derive(Clone, Debug, PartialEq)]
pub struct QualityMeasurement {
    /// Channels in the planted recording.
    pub channel_count: usize,
    /// Planted groups in the recording.
    pub group_count: usize,
    /// Detection algorithm.
    pub algorithm: Algorithm,
    /// Whether flag mode filtered the graph first.
    pub flagged: bool,
    /// ARI against the planted groups.
    pub ari: f64,
    /// NMI against the planted groups.
    pub nmi: f64,
    /// Modularity of the detected partition.
    pub modularity: f64,
    /// Detection wall-clock time in microseconds.
    pub runtime_micros: u128,
}

impl QualityMeasurement {
    const fn csv_header() -> &'static str {
        "channel_count,group_count,algorithm,flag,ari,nmi,modularity,runtime_us\n"
    }

    fn to_csv_row(&self) -> String {
        format!(
            "{},{},{},{},{:.6},{:.6},{:.6},{}\n",
            self.channel_count,
            self.group_count,
            self.algorithm,
            self.flagged,
            self.ari,
            self.nmi,
            self.modularity,
            self.runtime_micros,
        )
    }
}

/// Marginal and joint label counts of two labellings.
struct Contingency {
    left: Vec<usize>,
    right: Vec<usize>,
    joint: HashMap<(usize, usize), usize>,
    total: usize,
}

impl Contingency {
    fn build<L, R>(left: &[L], right: &[R]) -> Result<Self, QualityError>
    where
        L: Eq + Hash,
        R: Eq + Hash,
    {
        if left.len() != right.len() {
            return Err(QualityError::LabelLengthMismatch {
                planted: left.len(),
                detected: right.len(),
            });
        }
        let mut left_ids = HashMap::new();
        let mut right_ids = HashMap::new();
        let mut table = Self {
            left: Vec::new(),
            right: Vec::new(),
            joint: HashMap::new(),
            total: left.len(),
        };
        for (l, r) in left.iter().zip(right) {
            let li = dense_id(&mut left_ids, &mut table.left, l);
            let ri = dense_id(&mut right_ids, &mut table.right, r);
            *table.joint.entry((li, ri)).or_insert(0) += 1;
        }
        Ok(table)
    }
}

/// Maps `label` to a dense index and bumps its count.
fn dense_id<'a, T: Eq + Hash>(
    ids: &mut HashMap<&'a T, usize>,
    counts: &mut Vec<usize>,
    label: &'a T,
) -> usize {
    let id = *ids.entry(label).or_insert_with(|| {
        counts.push(0);
        counts.len() - 1
    });
    if let Some(count) = counts.get_mut(id) {
        *count += 1;
    }
    id
}

#[expect(
    clippy::cast_precision_loss,
    clippy::float_arithmetic,
    reason = "pair counts are defined over floating-point combinatorics"
)]
fn pairs(count: usize) -> f64 {
    let n = count as f64;
    n * (n - 1.0) / 2.0
}

/// Adjusted Rand Index of `detected` against `planted`.
///
/// Fewer than two channels score `1.0`.
///
/// # Errors
/// Returns [`QualityError::LabelLengthMismatch`] when the labellings differ
/// in length.
#[expect(
    clippy::float_arithmetic,
    reason = "ARI is a ratio of pair-count differences"
)]
pub fn adjusted_rand_index<L, R>(planted: &[L], detected: &[R]) -> Result<f64, QualityError>
where
    L: Eq + Hash,
    R: Eq + Hash,
{
    let table = Contingency::build(planted, detected)?;
    let total = pairs(table.total);
    if total == 0.0 {
        return Ok(1.0);
    }
    let joint: f64 = table.joint.values().copied().map(pairs).sum();
    let left: f64 = table.left.iter().copied().map(pairs).sum();
    let right: f64 = table.right.iter().copied().map(pairs).sum();
    let expected = left * right / total;
    let denominator = 0.5 * (left + right) - expected;
    if denominator == 0.0 {
        Ok(0.0)
    } else {
        Ok((joint - expected) / denominator)
    }
}

/// Normalised Mutual Information of `detected` against `planted`, using the
/// geometric mean of the two entropies.
///
/// Empty labellings and two single-group labellings score `1.0`.
///
/// # Errors
/// Returns [`QualityError::LabelLengthMismatch`] when the labellings differ
/// in length.
#[expect(
    clippy::float_arithmetic,
    clippy::cast_precision_loss,
    reason = "mutual information is a sum of log-ratios"
)]
pub fn normalised_mutual_information<L, R>(
    planted: &[L],
    detected: &[R],
) -> Result<f64, QualityError>
where
    L: Eq + Hash,
    R: Eq + Hash,
{
    let table = Contingency::build(planted, detected)?;
    if table.total == 0 {
        return Ok(1.0);
    }
    let n = table.total as f64;
    let mut mutual = 0.0_f64;
    for (&(li, ri), &count) in &table.joint {
        let (Some(&left), Some(&right)) = (table.left.get(li), table.right.get(ri)) else {
            continue;
        };
        let joint = count as f64;
        mutual += (joint / n) * ((joint * n) / (left as f64 * right as f64)).ln();
    }
    let left_entropy = entropy(&table.left, n);
    let right_entropy = entropy(&table.right, n);
    match (left_entropy == 0.0, right_entropy == 0.0) {
        (true, true) => Ok(1.0),
        (true, false) | (false, true) => Ok(0.0),
        (false, false) => Ok(mutual / (left_entropy * right_entropy).sqrt()),
    }
}

#[expect(
    clippy::float_arithmetic,
    clippy::cast_precision_loss,
    reason = "entropy is a sum of p ln p terms"
)]
fn entropy(counts: &[usize], total: f64) -> f64 {
    counts
        .iter()
        .map(|&count| {
            let p = count as f64 / total;
            -p * p.ln()
        })
        .sum()
}

/// ARI and NMI in one call.
///
/// # Errors
/// Returns [`QualityError::LabelLengthMismatch`] when the labellings differ
/// in length.
pub fn quality_score<L, R>(planted: &[L], detected: &[R]) -> Result<QualityScore, QualityError>
where
    L: Eq + Hash,
    R: Eq + Hash,
{
    Ok(QualityScore {
        ari: adjusted_rand_index(planted, detected)?,
        nmi: normalised_mutual_information(planted, detected)?,
    })
}

/// Generates a planted recording, runs every algorithm and flag state on it
/// once, and scores each partition against the planted groups.
///
/// Non-converged runs are scored on their partial partition.
///
/// # Errors
/// Returns [`BenchSetupError`] when generation, configuration, graph
/// construction, or scoring fails.
pub fn measure_planted_quality(
    config: &PlantedConfig,
    algorithms: &[Algorithm],
    flag_threshold: Option<f64>,
) -> Result<Vec<QualityMeasurement>, BenchSetupError> {
    let planted = PlantedRecording::generate("planted", config)?;
    let eegraph = EegraphBuilder::new()
        .with_inclusion(InclusionPolicy::All)
        .with_algorithms(algorithms.iter().copied())
        .with_flag_threshold(flag_threshold)
        .with_execution_strategy(ExecutionStrategy::Sequential)
        .build()?;
    let analysis = eegraph.analyse(planted.recording())?;

    let mut rows = Vec::with_capacity(analysis.runs().len());
    for run in analysis.runs() {
        let partition = match &run.outcome {
            Ok(partition) => partition,
            Err(err) => err.partial(),
        };
        let score = quality_score(planted.labels(), partition.assignments())?;
        rows.push(QualityMeasurement {
            channel_count: planted.labels().len(),
            group_count: config.group_sizes.len(),
            algorithm: run.algorithm,
            flagged: run.flagged,
            ari: score.ari,
            nmi: score.nmi,
            modularity: partition.modularity(),
            runtime_micros: partition.runtime().as_micros(),
        });
    }
    Ok(rows)
}

/// Writes `rows` to a CSV report at `path`, creating parent directories.
///
/// # Errors
/// Returns [`std::io::Error`] when the directory or file cannot be written.
pub fn write_quality_report(
    path: impl AsRef<Path>,
    rows: &[QualityMeasurement],
) -> Result<PathBuf, std::io::Error> {
    let path = path.as_ref().to_path_buf();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut output = String::from(QualityMeasurement::csv_header());
    for row in rows {
        output.push_str(&row.to_csv_row());
    }
    fs::write(&path, output)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::identity(vec![0, 0, 1, 1], vec![0, 0, 1, 1])]
    #[case::relabelled(vec![0, 0, 1, 1], vec![7, 7, 3, 3])]
    fn matching_groups_score_perfectly(#[case] planted: Vec<usize>, #[case] detected: Vec<u64>) {
        let score = quality_score(&planted, &detected).expect("lengths match");
        assert_eq!(score.ari.to_bits(), 1.0_f64.to_bits());
        assert_eq!(score.nmi.to_bits(), 1.0_f64.to_bits());
    }

    #[rstest]
    #[case::empty(vec![], vec![], 1.0, 1.0)]
    #[case::singleton(vec![0], vec![4], 1.0, 1.0)]
    #[case::everything_merged(vec![0, 0, 1, 1], vec![0, 0, 0, 0], 0.0, 0.0)]
    fn degenerate_labellings_have_fixed_scores(
        #[case] planted: Vec<usize>,
        #[case] detected: Vec<usize>,
        #[case] ari: f64,
        #[case] nmi: f64,
    ) {
        let score = quality_score(&planted, &detected).expect("lengths match");
        assert_eq!(score.ari.to_bits(), ari.to_bits());
        assert_eq!(score.nmi.to_bits(), nmi.to_bits());
    }

    #[rstest]
    fn mixed_labellings_stay_in_range() {
        let score = quality_score(&[0, 0, 1, 1, 2, 2], &[0, 1, 0, 1, 2, 2]).expect("lengths match");
        assert!((-1.0..=1.0).contains(&score.ari));
        assert!(score.ari < 1.0);
        assert!((0.0..=1.0).contains(&score.nmi));
        assert!(score.nmi < 1.0);
    }

    #[rstest]
    fn length_mismatch_is_rejected() {
        let err = quality_score(&[0, 1], &[0]).expect_err("lengths differ");
        assert_eq!(
            err,
            QualityError::LabelLengthMismatch {
                planted: 2,
                detected: 1,
            }
        );
    }

    #[rstest]
    fn louvain_recovers_planted_groups() {
        let config = PlantedConfig {
            group_sizes: vec![4, 4, 4],
            ..PlantedConfig::default()
        };
        let rows = measure_planted_quality(&config, &[Algorithm::Louvain], None)
            .expect("planted configuration is valid");

        assert_eq!(rows.len(), 1);
        let row = rows.first().expect("one run");
        assert_eq!(row.channel_count, 12);
        assert_eq!(row.group_count, 3);
        assert!(!row.flagged);
        assert!((row.ari - 1.0).abs() < 1e-12, "ari was {}", row.ari);
        assert!((row.nmi - 1.0).abs() < 1e-12, "nmi was {}", row.nmi);
        assert!(row.modularity > 0.0);
    }

    #[rstest]
    fn flag_threshold_adds_flagged_runs() {
        let rows = measure_planted_quality(
            &PlantedConfig::default(),
            &Algorithm::ALL,
            Some(eegraph_core::DEFAULT_FLAG_THRESHOLD),
        )
        .expect("planted configuration is valid");

        let keys: Vec<_> = rows.iter().map(|row| (row.algorithm, row.flagged)).collect();
        assert_eq!(
            keys,
            [
                (Algorithm::Louvain, false),
                (Algorithm::Louvain, true),
                (Algorithm::LabelPropagation, false),
                (Algorithm::LabelPropagation, true),
            ]
        );
    }

    #[rstest]
    fn report_has_header_and_rows() {
        let dir = tempfile::tempdir().expect("tempdir");
        let rows = [QualityMeasurement {
            channel_count: 8,
            group_count: 2,
            algorithm: Algorithm::LabelPropagation,
            flagged: true,
            ari: 0.5,
            nmi: 0.25,
            modularity: 0.375,
            runtime_micros: 42,
        }];

        let path = write_quality_report(dir.path().join("nested/quality.csv"), &rows)
            .expect("report is written");
        let written = std::fs::read_to_string(path).expect("report is readable");

        assert_eq!(
            written,
            "channel_count,group_count,algorithm,flag,ari,nmi,modularity,runtime_us\n\
             8,2,label-propagation,true,0.500000,0.250000,0.375000,42\n"
        );
    }
}
