//! Slab-parallel sweep (feature-gated).
//!
//! Partitions the voxel domain into outermost-axis slabs, one rayon task
//! per slab. Each task owns its output span and a worker-local
//! [`StatsBlock`]; blocks are merged into the shared accumulator once per
//! slab, so lock contention is bounded by the slab count, never by the
//! voxel count.

use rayon::prelude::*;

use crate::iteration::{IterationContext, StatsAccumulator, StatsBlock};
use crate::trace::{trace_event, trace_span};
use crate::volume::VectorField;

impl<const D: usize> IterationContext<'_, D> {
    /// Parallel full pass. Produces the same field and statistics as
    /// [`sweep`](IterationContext::sweep), modulo floating-point summation
    /// order inside the merged totals.
    pub fn sweep_par(&self, accumulator: &StatsAccumulator) -> VectorField<D> {
        let geom = *self.fixed.geometry();
        let size = geom.size();
        let slab_count = size[D - 1];
        let slab_len = geom.num_voxels() / slab_count;

        let _span = trace_span!("sweep", voxels = geom.num_voxels(), parallel = true).entered();

        let mut out = VectorField::zeros(geom);
        out.data_mut()
            .par_chunks_mut(slab_len)
            .enumerate()
            .for_each(|(slab, span)| {
                let base = slab * slab_len;
                let mut block = StatsBlock::new();
                for (offset, slot) in span.iter_mut().enumerate() {
                    let update = self.compute_update(geom.index_at(base + offset));
                    let mut v = [0.0f32; D];
                    for axis in 0..D {
                        v[axis] = update.update[axis] as f32;
                    }
                    *slot = v;
                    if update.included {
                        block.record(update.squared_difference, update.squared_change);
                    }
                }
                accumulator.merge(block);
            });

        trace_event!("sweep_done", slabs = slab_count);
        out
    }
}
