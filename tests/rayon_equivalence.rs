#![cfg(feature = "rayon")]

//! The slab-parallel sweep must reproduce the sequential sweep.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use demonsreg::{
    begin_iteration, AuxFields, DemonsParams, Geometry, StatsAccumulator, VectorField, Volume,
};

fn noisy_volume(geom: Geometry<3>, seed: u64) -> Volume<3> {
    let mut rng = StdRng::seed_from_u64(seed);
    let data = (0..geom.num_voxels())
        .map(|_| rng.random_range(0.0f32..100.0))
        .collect();
    Volume::new(geom, data).unwrap()
}

fn smooth_field(geom: Geometry<3>) -> VectorField<3> {
    let data = (0..geom.num_voxels())
        .map(|i| {
            let [x, y, z] = geom.index_at(i);
            [
                0.5 * (x as f32 * 0.3).sin(),
                0.5 * (y as f32 * 0.2).cos(),
                0.25 * (z as f32 * 0.4).sin(),
            ]
        })
        .collect();
    VectorField::new(geom, data).unwrap()
}

#[test]
fn parallel_sweep_matches_sequential() {
    let geom = Geometry::isotropic([12, 10, 8]).unwrap();
    let fixed = noisy_volume(geom, 1);
    let moving = noisy_volume(geom, 2);
    let field = smooth_field(geom);

    let ctx = begin_iteration(
        &fixed,
        &moving,
        &field,
        None,
        AuxFields::default(),
        DemonsParams::default(),
    )
    .unwrap();

    let seq_stats = StatsAccumulator::new();
    let seq = ctx.sweep(&seq_stats);
    let par_stats = StatsAccumulator::new();
    let par = ctx.sweep_par(&par_stats);

    // Per-voxel evaluations are identical computations; the fields must
    // agree exactly.
    assert_eq!(seq.data(), par.data());

    let a = seq_stats.finalize();
    let b = par_stats.finalize();
    assert_eq!(a.pixels_processed, b.pixels_processed);
    // Totals may differ only by floating-point summation order.
    assert!((a.metric - b.metric).abs() < 1e-9);
    assert!((a.rms_change - b.rms_change).abs() < 1e-9);
}
