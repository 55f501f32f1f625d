//! Connectivity estimation and graph assembly benchmarks.
//!
//! Weights every channel pair of a planted recording under each
//! connectivity measure, then times the full graph build.
#![expect(missing_docs, reason = "Criterion macros generate undocumented items")]

use criterion::{BenchmarkGroup, BenchmarkId, Criterion, criterion_main, measurement::WallTime};

use eegraph_benches::{
    error::BenchSetupError,
    params::RecordingBenchParams,
    source::{PlantedConfig, PlantedRecording},
};
use eegraph_core::{ConnectivityMeasure, EegraphBuilder, InclusionPolicy};

/// Seed used for all synthetic recordings in this benchmark.
const SEED: u64 = 42;

/// Channels per planted group.
const GROUP_SIZE: usize = 4;

/// Planted group counts to benchmark.
const GROUP_COUNTS: &[usize] = &[2, 4, 8];

/// Samples per channel.
const SAMPLES: usize = 1_024;

fn make_recording(groups: usize) -> Result<PlantedRecording, BenchSetupError> {
    Ok(PlantedRecording::generate(
        "bench",
        &PlantedConfig {
            group_sizes: vec![GROUP_SIZE; groups],
            samples: SAMPLES,
            seed: SEED,
            ..PlantedConfig::default()
        },
    )?)
}

#[expect(
    clippy::excessive_nesting,
    reason = "Criterion bench_with_input + b.iter pattern requires deep nesting"
)]
fn bench_measure(
    group: &mut BenchmarkGroup<'_, WallTime>,
    measure: ConnectivityMeasure,
) -> Result<(), BenchSetupError> {
    let name = measure.as_str();
    let eegraph = EegraphBuilder::new()
        .with_measure(measure)
        .with_inclusion(InclusionPolicy::All)
        .build()?;
    for &groups in GROUP_COUNTS {
        let planted = make_recording(groups)?;
        let nodes = eegraph.extract_nodes(planted.recording())?;
        let params = RecordingBenchParams {
            channel_count: nodes.len(),
            samples: SAMPLES,
        };
        group.bench_with_input(
            BenchmarkId::new(name, &params),
            &(planted.recording(), nodes.as_slice()),
            |b, &(recording, input_nodes)| {
                b.iter(|| {
                    if let Err(err) = eegraph.estimator().estimate(recording, input_nodes) {
                        panic!("{name} estimation failed: {err}");
                    }
                });
            },
        );
    }
    Ok(())
}

fn connectivity_estimation_impl(c: &mut Criterion) -> Result<(), BenchSetupError> {
    let mut group = c.benchmark_group("connectivity_estimation");
    group.sample_size(10);
    for measure in [
        ConnectivityMeasure::Pearson,
        ConnectivityMeasure::coherence(),
        ConnectivityMeasure::band_power(),
    ] {
        bench_measure(&mut group, measure)?;
    }
    group.finish();
    Ok(())
}

fn connectivity_estimation(c: &mut Criterion) {
    if let Err(err) = connectivity_estimation_impl(c) {
        panic!("connectivity_estimation benchmark setup failed: {err}");
    }
}

#[expect(
    clippy::excessive_nesting,
    reason = "Criterion bench_with_input + b.iter pattern requires deep nesting"
)]
fn graph_build_impl(c: &mut Criterion) -> Result<(), BenchSetupError> {
    let eegraph = EegraphBuilder::new().build()?;
    let mut group = c.benchmark_group("graph_build");
    group.sample_size(10);
    for &groups in GROUP_COUNTS {
        let planted = make_recording(groups)?;
        let params = RecordingBenchParams {
            channel_count: planted.labels().len(),
            samples: SAMPLES,
        };
        group.bench_with_input(
            BenchmarkId::from_parameter(&params),
            planted.recording(),
            |b, recording| {
                b.iter(|| {
                    if let Err(err) = eegraph.build_graph(recording) {
                        panic!("graph build failed: {err}");
                    }
                });
            },
        );
    }
    group.finish();
    Ok(())
}

fn graph_build(c: &mut Criterion) {
    if let Err(err) = graph_build_impl(c) {
        panic!("graph_build benchmark setup failed: {err}");
    }
}

mod bench_harness {
    use super::{connectivity_estimation, graph_build};
    use criterion::criterion_group;

    criterion_group!(benches, connectivity_estimation, graph_build);
}
criterion_main!(bench_harness::benches);
