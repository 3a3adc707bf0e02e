use linfa::prelude::*;
use macebox_gp::{GaussianProcess, Hmc, Matern52Kernel, Prior};
use ndarray::{arr2, concatenate, Array, Array1, Array2, Axis};
use rand_xoshiro::{rand_core::SeedableRng, Xoshiro256Plus};

fn xsinx(x: &Array2<f64>) -> Array1<f64> {
    ((x - 3.5) * ((x - 3.5) / std::f64::consts::PI).mapv(|v| v.sin())).remove_axis(Axis(1))
}

fn main() {
    let xt = arr2(&[[0.0], [5.0], [10.0], [15.0], [18.0], [20.0], [25.0]]);
    let yt = xsinx(&xt);

    println!("Train GP surrogate of 'xsinx' at {}", xt.column(0));
    let mut gp = GaussianProcess::params(Matern52Kernel())
        .variance_prior(Prior::log_gaussian(0., 1.))
        .noise_prior(Prior::gamma_from_ev(0.02, 4.))
        .noise_bounds(1e-20, 1e10)
        .fit(&Dataset::new(xt, yt))
        .expect("GP fitting");
    println!("MAP {}", gp.hyperparameters());

    let xtest = Array::linspace(0., 25., 26).insert_axis(Axis(1));
    let ytest = xsinx(&xtest);
    let (ypred, yvar) = gp.predict_valvar(&xtest).expect("GP prediction");

    println!("Compute prediction errors (x, err(x), sigma(x))");
    println!(
        "{}",
        concatenate![
            Axis(1),
            xtest,
            (ypred - ytest).insert_axis(Axis(1)),
            yvar.mapv(f64::sqrt).insert_axis(Axis(1))
        ]
    );

    let mut hmc = Hmc::new(&mut gp, 0.05, 20, Xoshiro256Plus::seed_from_u64(42));
    hmc.sample(100).expect("HMC burn-in");
    let samples = hmc.sample(50).expect("HMC samples");
    println!(
        "Posterior mean of hyperparameters {} (acceptance rate {:.2})",
        samples.mean_axis(Axis(0)).expect("non empty samples"),
        hmc.acceptance_rate()
    );
}
