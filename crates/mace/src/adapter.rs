//! GP models over standardized targets with the MACE hyperparameter setup.
//!
//! Matern 5/2 ARD kernel with:
//! * log-normal(0, 1) prior on kernel variance,
//! * log-normal(0, 10) prior on each lengthscale,
//! * gamma prior of mean 0.02 and variance 4 on noise variance, bounded to [1e-20, 1e10],
//! * when inputs are warped, Kumaraswamy parameters starting at identity without prior.
use crate::config::ValidMaceConfig;
use crate::errors::Result;
use linfa::prelude::{Dataset, Fit};
use log::info;
use macebox_gp::{
    column_std, GaussianProcess, GpParams, Hyperparameters, Matern52Kernel, Prior,
};
use ndarray::{ArrayBase, Data, Ix1, Ix2};

/// GP model used by the MACE surrogate
pub type MaceGp = GaussianProcess<Matern52Kernel>;

/// Noise variance bounds
pub const NOISE_BOUNDS: (f64, f64) = (1e-20, 1e10);
/// Lowest initial noise variance
pub const MIN_INIT_NOISE: f64 = 2e-20;
/// Initial noise variance relative to targets variance
pub const INIT_NOISE_RATIO: f64 = 1e-2;

/// Prior on kernel variance
pub fn variance_prior() -> Prior {
    Prior::log_gaussian(0., 1.)
}

/// Prior on each lengthscale
pub fn lengthscale_prior() -> Prior {
    Prior::log_gaussian(0., 10.)
}

/// Prior on noise variance
pub fn noise_prior() -> Prior {
    Prior::gamma_from_ev(0.02, 4.)
}

/// Initial hyperparameters given training inputs and standardized targets.
///
/// Lengthscales start at the standard deviation of raw inputs, warped or not.
pub fn initial_hyperparameters(
    x: &ArrayBase<impl Data<Elem = f64>, Ix2>,
    y_norm: &ArrayBase<impl Data<Elem = f64>, Ix1>,
    warp: bool,
) -> Hyperparameters {
    let variance = y_norm.var(0.);
    let noise = (INIT_NOISE_RATIO * variance).max(MIN_INIT_NOISE);
    let hyp = Hyperparameters::new(variance, column_std(x), noise);
    if warp {
        hyp.with_identity_warping()
    } else {
        hyp
    }
}

/// GP parameters (kernel, priors, bounds and initial values) for given training data
pub fn gp_params(
    x: &ArrayBase<impl Data<Elem = f64>, Ix2>,
    y_norm: &ArrayBase<impl Data<Elem = f64>, Ix1>,
    warp: bool,
    max_eval: usize,
) -> GpParams<Matern52Kernel> {
    let (lower, upper) = NOISE_BOUNDS;
    GaussianProcess::params(Matern52Kernel())
        .input_warping(warp)
        .init(initial_hyperparameters(x, y_norm, warp))
        .variance_prior(variance_prior())
        .lengthscale_prior(lengthscale_prior())
        .noise_prior(noise_prior())
        .noise_bounds(lower, upper)
        .max_eval(max_eval)
}

/// Fit a GP on standardized targets with hyperparameters at their maximum a posteriori
pub fn fit_map(
    x: &ArrayBase<impl Data<Elem = f64>, Ix2>,
    y_norm: &ArrayBase<impl Data<Elem = f64>, Ix1>,
    config: &ValidMaceConfig,
) -> Result<MaceGp> {
    let dataset = Dataset::new(x.to_owned(), y_norm.to_owned());
    let gp = gp_params(x, y_norm, config.warp(), config.max_eval()).fit(&dataset)?;
    info!("GP MAP hyperparameters: {}", gp.hyperparameters());
    Ok(gp)
}
