//! The statistics reduction must not depend on how the voxel domain was
//! partitioned across workers.

use demonsreg::{StatsAccumulator, StatsBlock};

/// Deterministic per-voxel contributions standing in for a sweep.
fn contributions(n: usize) -> Vec<(f64, f64)> {
    (0..n)
        .map(|i| {
            let d = ((i * 37 + 11) % 101) as f64 * 0.25;
            let c = ((i * 17 + 5) % 53) as f64 * 0.0625;
            (d * d, c * c)
        })
        .collect()
}

fn reduce_with_partitions(samples: &[(f64, f64)], workers: usize) -> demonsreg::IterationSummary {
    let accumulator = StatsAccumulator::new();
    let mut blocks = vec![StatsBlock::new(); workers];
    for (i, &(d2, c2)) in samples.iter().enumerate() {
        blocks[i % workers].record(d2, c2);
    }
    for block in blocks {
        accumulator.merge(block);
    }
    accumulator.finalize()
}

#[test]
fn summary_is_invariant_across_worker_counts() {
    let samples = contributions(1000);
    let reference = reduce_with_partitions(&samples, 1);
    assert_eq!(reference.pixels_processed, 1000);

    for workers in [2, 3, 7, 16] {
        let summary = reduce_with_partitions(&samples, workers);
        assert_eq!(summary.pixels_processed, reference.pixels_processed);
        assert!((summary.metric - reference.metric).abs() < 1e-9);
        assert!((summary.rms_change - reference.rms_change).abs() < 1e-9);
    }
}

#[test]
fn summary_matches_direct_sums() {
    let samples = contributions(257);
    let summary = reduce_with_partitions(&samples, 5);

    let ssd: f64 = samples.iter().map(|&(d2, _)| d2).sum();
    let ssc: f64 = samples.iter().map(|&(_, c2)| c2).sum();
    let n = samples.len() as f64;
    assert!((summary.metric - ssd / n).abs() < 1e-9);
    assert!((summary.rms_change - (ssc / n).sqrt()).abs() < 1e-9);
}

#[test]
fn finalize_before_all_merges_undercounts_without_failing() {
    let samples = contributions(100);
    let accumulator = StatsAccumulator::new();
    let mut first = StatsBlock::new();
    for &(d2, c2) in &samples[..60] {
        first.record(d2, c2);
    }
    accumulator.merge(first);

    let early = accumulator.finalize();
    assert_eq!(early.pixels_processed, 60);

    let mut second = StatsBlock::new();
    for &(d2, c2) in &samples[60..] {
        second.record(d2, c2);
    }
    accumulator.merge(second);
    assert_eq!(accumulator.finalize().pixels_processed, 100);
}
