use criterion::{criterion_group, criterion_main, Criterion};
use macebox_mace::{MaceConfig, MaceSurrogate};
use ndarray::{array, Array1, Axis};

fn criterion_mace(c: &mut Criterion) {
    let x = Array1::linspace(0., 1., 10).insert_axis(Axis(1));
    let y = x
        .column(0)
        .mapv(|v| (6. * v - 2.).powi(2) * (12. * v - 4.).sin());

    let mut group = c.benchmark_group("mace");
    group.sample_size(10);
    group.bench_function("mace fit map", |b| {
        b.iter(|| {
            std::hint::black_box(
                MaceSurrogate::fit(&x, &y, MaceConfig::new(10, 20).mcmc(false))
                    .expect("MACE surrogate"),
            )
        })
    });
    group.bench_function("mace fit mcmc", |b| {
        b.iter(|| {
            std::hint::black_box(
                MaceSurrogate::fit(&x, &y, MaceConfig::new(10, 20).seed(42))
                    .expect("MACE surrogate"),
            )
        })
    });

    let mace = MaceSurrogate::fit(&x, &y, MaceConfig::new(10, 20).seed(42)).expect("MACE surrogate");
    group.bench_function("mace acq", |b| {
        b.iter(|| std::hint::black_box(mace.mace_acq(&array![0.75]).expect("acquisition")))
    });
    group.finish();
}

criterion_group!(benches, criterion_mace);
criterion_main!(benches);
