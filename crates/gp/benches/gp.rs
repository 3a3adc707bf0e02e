use criterion::{criterion_group, criterion_main, Criterion};
use linfa::prelude::{Dataset, Fit};
use macebox_gp::{GaussianProcess, Hmc, Matern52Kernel, Prior};
use ndarray::{Array1, Array2, Zip};
use ndarray_rand::rand::SeedableRng;
use ndarray_rand::rand_distr::Uniform;
use ndarray_rand::RandomExt;
use rand_xoshiro::Xoshiro256Plus;

fn griewank(x: &Array2<f64>) -> Array1<f64> {
    let dim = x.ncols();
    let d = Array1::linspace(1., dim as f64, dim).mapv(|v| v.sqrt());
    let mut y = Array1::zeros(x.nrows());
    Zip::from(&mut y).and(x.rows()).for_each(|y, x| {
        *y = x.mapv(|v| v * v).sum() / 4000.
            - (&x / &d).mapv(|v| v.cos()).fold(1., |acc, x| acc * x)
            + 1.0;
    });
    y
}

fn criterion_gp(c: &mut Criterion) {
    let dims = [2, 5];
    let nts = [20, 50];

    let mut group = c.benchmark_group("gp");
    group.sample_size(10);
    for (dim, nt) in dims.into_iter().zip(nts) {
        let mut rng = Xoshiro256Plus::seed_from_u64(42);
        let xt = Array2::random_using((nt, dim), Uniform::new(-10., 10.), &mut rng);
        let yt = griewank(&xt);
        let yt = (&yt - yt.mean().unwrap_or(0.)) / yt.std(0.);
        let params = GaussianProcess::params(Matern52Kernel())
            .variance_prior(Prior::log_gaussian(0., 1.))
            .lengthscale_prior(Prior::log_gaussian(0., 10.))
            .noise_prior(Prior::gamma_from_ev(0.02, 4.))
            .noise_bounds(1e-20, 1e10);

        group.bench_function(format!("gp map {dim}"), |b| {
            b.iter(|| {
                std::hint::black_box(
                    params
                        .clone()
                        .fit(&Dataset::new(xt.clone(), yt.clone()))
                        .expect("GP fit error"),
                )
            })
        });

        let gp = params
            .fit(&Dataset::new(xt.clone(), yt.clone()))
            .expect("GP fit error");
        group.bench_function(format!("gp hmc {dim}"), |b| {
            b.iter(|| {
                let mut model = gp.clone();
                let mut hmc = Hmc::new(&mut model, 0.05, 20, Xoshiro256Plus::seed_from_u64(0));
                std::hint::black_box(hmc.sample(10).expect("HMC samples"))
            })
        });
    }
    group.finish();
}

criterion_group!(benches, criterion_gp);
criterion_main!(benches);
