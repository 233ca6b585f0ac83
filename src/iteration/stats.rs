//! Iteration statistics: per-worker partial sums and their reduction.
//!
//! Each worker owns one [`StatsBlock`] for its voxel partition and hands
//! it to [`StatsAccumulator::merge`] exactly once, when the partition is
//! done. The accumulator's mutex is therefore contended once per worker,
//! not once per voxel. The caller is responsible for the barrier: calling
//! [`StatsAccumulator::finalize`] before every worker has merged yields an
//! under-counted but well-formed result.

use std::sync::Mutex;

/// Worker-local partial sums for one voxel partition.
#[derive(Clone, Copy, Debug, Default)]
pub struct StatsBlock {
    sum_squared_difference: f64,
    pixels_processed: u64,
    sum_squared_change: f64,
}

impl StatsBlock {
    /// A fresh, empty block.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one non-excluded voxel's contributions.
    #[inline]
    pub fn record(&mut self, squared_difference: f64, squared_change: f64) {
        self.sum_squared_difference += squared_difference;
        self.pixels_processed += 1;
        self.sum_squared_change += squared_change;
    }

    /// Number of voxels recorded so far.
    pub fn pixels_processed(&self) -> u64 {
        self.pixels_processed
    }
}

/// Converged-or-not summary of one full iteration pass.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct IterationSummary {
    /// Mean squared intensity difference over the non-excluded voxels.
    pub metric: f64,
    /// Root-mean-square update magnitude over the non-excluded voxels.
    pub rms_change: f64,
    /// Number of non-excluded voxels.
    pub pixels_processed: u64,
}

/// Process-wide, mutex-guarded iteration totals.
///
/// Lifecycle per iteration: [`reset`](Self::reset), one
/// [`merge`](Self::merge) per worker, then
/// [`finalize`](Self::finalize) (or the [`metric`](Self::metric) /
/// [`rms_change`](Self::rms_change) accessors the solver polls).
#[derive(Debug, Default)]
pub struct StatsAccumulator {
    totals: Mutex<StatsBlock>,
}

impl StatsAccumulator {
    /// Creates an empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears the totals at the start of an iteration.
    pub fn reset(&self) {
        *self.lock() = StatsBlock::new();
    }

    /// Folds one worker's partial sums into the totals. The block is
    /// consumed; a worker cannot merge the same partition twice.
    pub fn merge(&self, block: StatsBlock) {
        let mut totals = self.lock();
        totals.sum_squared_difference += block.sum_squared_difference;
        totals.pixels_processed += block.pixels_processed;
        totals.sum_squared_change += block.sum_squared_change;
    }

    /// Computes the iteration summary from the merged totals.
    pub fn finalize(&self) -> IterationSummary {
        let totals = *self.lock();
        let count = totals.pixels_processed.max(1) as f64;
        IterationSummary {
            metric: totals.sum_squared_difference / count,
            rms_change: (totals.sum_squared_change / count).sqrt(),
            pixels_processed: totals.pixels_processed,
        }
    }

    /// Mean squared intensity difference of the merged totals.
    pub fn metric(&self) -> f64 {
        self.finalize().metric
    }

    /// RMS update magnitude of the merged totals.
    pub fn rms_change(&self) -> f64 {
        self.finalize().rms_change
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, StatsBlock> {
        self.totals.lock().expect("iteration statistics lock poisoned")
    }
}

#[cfg(test)]
mod tests {
    use super::{StatsAccumulator, StatsBlock};

    #[test]
    fn empty_accumulator_finalizes_to_zero() {
        let acc = StatsAccumulator::new();
        let summary = acc.finalize();
        assert_eq!(summary.metric, 0.0);
        assert_eq!(summary.rms_change, 0.0);
        assert_eq!(summary.pixels_processed, 0);
    }

    #[test]
    fn merge_accumulates_across_blocks() {
        let acc = StatsAccumulator::new();
        let mut a = StatsBlock::new();
        a.record(4.0, 1.0);
        a.record(16.0, 9.0);
        let mut b = StatsBlock::new();
        b.record(0.0, 0.0);
        acc.merge(a);
        acc.merge(b);

        let summary = acc.finalize();
        assert_eq!(summary.pixels_processed, 3);
        assert!((summary.metric - 20.0 / 3.0).abs() < 1e-12);
        assert!((summary.rms_change - (10.0f64 / 3.0).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn reset_clears_previous_iteration() {
        let acc = StatsAccumulator::new();
        let mut block = StatsBlock::new();
        block.record(1.0, 1.0);
        acc.merge(block);
        acc.reset();
        assert_eq!(acc.finalize().pixels_processed, 0);
    }

    #[test]
    fn merges_from_threads_are_all_counted() {
        let acc = std::sync::Arc::new(StatsAccumulator::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let acc = acc.clone();
                std::thread::spawn(move || {
                    let mut block = StatsBlock::new();
                    for _ in 0..100 {
                        block.record(1.0, 4.0);
                    }
                    acc.merge(block);
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        let summary = acc.finalize();
        assert_eq!(summary.pixels_processed, 800);
        assert!((summary.metric - 1.0).abs() < 1e-12);
        assert!((summary.rms_change - 2.0).abs() < 1e-12);
    }
}
