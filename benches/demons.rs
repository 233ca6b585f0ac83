use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};

use demonsreg::{
    begin_iteration, AuxFields, DemonsParams, Geometry, StatsAccumulator, VectorField, Volume,
};

fn blob(geom: Geometry<3>, cx: f64, cy: f64, cz: f64) -> Volume<3> {
    let data = (0..geom.num_voxels())
        .map(|i| {
            let [x, y, z] = geom.index_at(i);
            let dx = x as f64 - cx;
            let dy = y as f64 - cy;
            let dz = z as f64 - cz;
            (200.0 * (-(dx * dx + dy * dy + dz * dz) / 50.0).exp()) as f32
        })
        .collect();
    Volume::new(geom, data).unwrap()
}

fn bench_sweep(c: &mut Criterion) {
    let geom = Geometry::isotropic([32, 32, 32]).unwrap();
    let fixed = blob(geom, 16.0, 16.0, 16.0);
    let moving = blob(geom, 18.0, 16.0, 16.0);
    let field = VectorField::zeros(geom);

    c.bench_function("sweep_32cube", |b| {
        b.iter(|| {
            let ctx = begin_iteration(
                black_box(&fixed),
                black_box(&moving),
                &field,
                None,
                AuxFields::default(),
                DemonsParams::default(),
            )
            .unwrap();
            let stats = StatsAccumulator::new();
            let out = ctx.sweep(&stats);
            black_box((out, stats.finalize()))
        })
    });

    c.bench_function("compute_update_single", |b| {
        let ctx = begin_iteration(
            &fixed,
            &moving,
            &field,
            None,
            AuxFields::default(),
            DemonsParams::default(),
        )
        .unwrap();
        b.iter(|| black_box(ctx.compute_update(black_box([14, 16, 16]))))
    });
}

criterion_group!(benches, bench_sweep);
criterion_main!(benches);
