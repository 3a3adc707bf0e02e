use crate::errors::{GpError, Result};
use crate::hyperparameters::Hyperparameters;
use crate::kernels::{Kernel, Matern52Kernel};
use crate::optimization::{optimize_params, CobylaParams};
use crate::parameters::{GpParams, GpValidParams, HyperTuning, WARPING_BOUNDS};
use crate::posterior::LogPosterior;
use crate::priors::Prior;
use crate::transforms::Transform;
use crate::utils::pairwise_differences;
use crate::warping::KumarWarping;

use finitediff::FiniteDiff;
use linfa::prelude::{DatasetBase, Fit};
use linfa_linalg::{cholesky::*, triangular::*};
use log::{debug, warn};
use ndarray::{Array1, Array2, ArrayBase, Axis, Data, Ix1, Ix2};
#[cfg(feature = "serializable")]
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt;

/// Default max number of log posterior evaluations during MAP optimization
pub const GP_MAP_MAX_EVAL: usize = 200;
/// Bound of unconstrained hyperparameters during MAP optimization
pub const GP_OPTIM_BOUND: f64 = 50.;
/// Number of increasing jitters tried when covariance matrix is not positive definite
const GP_JITTER_TRIES: usize = 5;

/// Internal parameters computed during training
/// used later on in prediction computations
#[derive(Default, Debug, Clone)]
#[cfg_attr(feature = "serializable", derive(Serialize, Deserialize))]
pub(crate) struct GpInnerParams {
    /// Training inputs as seen by the kernel (warped when input warping is on)
    xt_kernel: Array2<f64>,
    /// Lower Cholesky factor of K + noise * I
    l_chol: Array2<f64>,
    /// Gaussian Process weights (K + noise * I)^-1 y
    alpha: Array1<f64>,
}

/// A GP regression model with zero mean function and a stationary ARD kernel
///
/// `y = f(x) + e` where:
/// * `f ~ GP(0, k(x, x'))` with `k` a kernel of variance `sigma^2` and lengthscales `l_1..l_nx`,
/// * `e ~ Normal(0, noise)` the observation noise.
///
/// Hyperparameters are either fixed, or set at the maximum of the log posterior
/// (log marginal likelihood plus log priors) computed in an unconstrained space
/// given by per-parameter [`Transform`]s. The same log posterior is exposed through
/// the [`LogPosterior`] trait so that hyperparameters can be sampled with [`crate::Hmc`].
///
/// Inputs can optionally be warped with Kumaraswamy CDFs (see [`KumarWarping`]),
/// warping parameters are then part of the hyperparameters.
///
/// # Example
///
/// ```no_run
/// use macebox_gp::{GaussianProcess, Matern52Kernel};
/// use linfa::prelude::*;
/// use ndarray::{arr1, arr2};
///
/// let xt = arr2(&[[0.0], [1.0], [2.0], [3.0], [4.0]]);
/// let yt = arr1(&[0.0, 1.0, 1.5, 0.9, 1.0]);
///
/// let gp = GaussianProcess::params(Matern52Kernel())
///     .fit(&Dataset::new(xt, yt))
///     .expect("GP fitted");
///
/// let (mean, var) = gp.predict_valvar(&arr2(&[[0.5], [3.5]])).expect("GP prediction");
/// ```
#[derive(Debug, Clone)]
#[cfg_attr(
    feature = "serializable",
    derive(Serialize, Deserialize),
    serde(bound(serialize = "K: Serialize", deserialize = "K: Deserialize<'de>"))
)]
pub struct GaussianProcess<K: Kernel> {
    /// Current hyperparameters
    hyperparameters: Hyperparameters,
    /// Log marginal likelihood at current hyperparameters
    log_likelihood: f64,
    /// Gaussian process internal fitted params
    inner_params: GpInnerParams,
    /// Input warping bounds when warping is on
    warping: Option<KumarWarping>,
    /// Training dataset (input, output)
    pub(crate) training_data: (Array2<f64>, Array1<f64>),
    /// Parameters used to fit this model
    pub(crate) params: GpValidParams<K>,
}

/// GP with Matern 5/2 kernel
pub type Matern52Gp = GaussianProcess<Matern52Kernel>;

impl<K: Kernel> fmt::Display for GaussianProcess<K> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "GP(kernel={}, {}, log_likelihood={})",
            self.params.kernel, self.hyperparameters, self.log_likelihood,
        )
    }
}

/// Inputs as seen by the kernel
fn kernel_inputs(
    warping: Option<&KumarWarping>,
    hyp: &Hyperparameters,
    x: &ArrayBase<impl Data<Elem = f64>, Ix2>,
) -> Array2<f64> {
    match (warping, &hyp.warping) {
        (Some(w), Some((a, b))) => w.warp(x, a, b),
        _ => x.to_owned(),
    }
}

/// Kernel matrix between rows of `xa` and rows of `xb`
fn cross_kernel<K: Kernel>(
    kernel: &K,
    xa: &ArrayBase<impl Data<Elem = f64>, Ix2>,
    xb: &ArrayBase<impl Data<Elem = f64>, Ix2>,
    variance: f64,
    lengthscales: &Array1<f64>,
) -> Array2<f64> {
    let nb = xb.nrows();
    let d = pairwise_differences(xa, xb);
    let k = kernel.value(&d, variance, lengthscales);
    Array2::from_shape_fn((xa.nrows(), nb), |(i, j)| k[i * nb + j])
}

/// Cholesky decomposition adding increasing jitter on the diagonal when it fails
fn jitchol(k: &Array2<f64>) -> Result<Array2<f64>> {
    if let Ok(l) = k.cholesky() {
        return Ok(l);
    }
    let mut jitter = k.diag().mean().map_or(1., f64::abs) * 1e-6;
    for _ in 0..GP_JITTER_TRIES {
        let mut kj = k.to_owned();
        kj.diag_mut().mapv_inplace(|v| v + jitter);
        if let Ok(l) = kj.cholesky() {
            debug!("Cholesky decomposition needed jitter={jitter:e}");
            return Ok(l);
        }
        jitter *= 10.;
    }
    Err(GpError::LikelihoodComputationError(
        "covariance matrix not positive definite, even with jitter".to_string(),
    ))
}

/// Compute log marginal likelihood and inner parameters given kernel inputs `xk`,
/// outputs `y` and hyperparameters
fn likelihood_terms<K: Kernel>(
    kernel: &K,
    xk: Array2<f64>,
    y: &Array1<f64>,
    hyp: &Hyperparameters,
) -> Result<(f64, GpInnerParams)> {
    let n_obs = xk.nrows();
    let mut k = cross_kernel(kernel, &xk, &xk, hyp.variance, &hyp.lengthscales);
    k.diag_mut().mapv_inplace(|v| v + hyp.noise_variance);
    let l_chol = jitchol(&k)?;

    let yt = l_chol.solve_triangular(&y.to_owned().insert_axis(Axis(1)), UPLO::Lower)?;
    let data_fit = yt.mapv(|v| v * v).sum();
    let alpha = l_chol
        .t()
        .solve_triangular_into(yt, UPLO::Upper)?
        .remove_axis(Axis(1));
    // log det(K) is twice the sum of logs of the Cholesky factor diagonal
    let half_logdet = l_chol.diag().mapv(f64::ln).sum();

    let log_likelihood = -0.5 * data_fit - half_logdet - 0.5 * n_obs as f64 * (2. * PI).ln();
    if !log_likelihood.is_finite() {
        return Err(GpError::LikelihoodComputationError(format!(
            "non finite log likelihood with {hyp}"
        )));
    }
    Ok((
        log_likelihood,
        GpInnerParams {
            xt_kernel: xk,
            l_chol,
            alpha,
        },
    ))
}

/// Per-component transforms of the flattened hyperparameters
fn param_transforms<K: Kernel>(params: &GpValidParams<K>, dim: usize) -> Vec<Transform> {
    let mut transforms = vec![Transform::Log; dim + 1];
    transforms.push(match params.noise_bounds() {
        Some((lower, upper)) => Transform::logistic(lower, upper),
        None => Transform::Log,
    });
    if params.input_warping() {
        let (lower, upper) = WARPING_BOUNDS;
        transforms.extend(vec![Transform::logistic(lower, upper); 2 * dim]);
    }
    transforms
}

/// Per-component priors of the flattened hyperparameters
fn param_priors<K: Kernel>(params: &GpValidParams<K>, dim: usize) -> Vec<Option<Prior>> {
    let mut priors = vec![params.variance_prior().copied()];
    priors.extend(vec![params.lengthscale_prior().copied(); dim]);
    priors.push(params.noise_prior().copied());
    if params.input_warping() {
        priors.extend(vec![None; 2 * dim]);
    }
    priors
}

impl<K: Kernel> GaussianProcess<K> {
    /// Gp parameters contructor
    pub fn params(kernel: K) -> GpParams<K> {
        GpParams::new(kernel)
    }

    /// Predict output values at n given `x` points of nx components specified as a (n, nx) matrix.
    /// Returns n scalar output values as a vector (n,).
    pub fn predict(&self, x: &ArrayBase<impl Data<Elem = f64>, Ix2>) -> Result<Array1<f64>> {
        self.predict_valvar(x).map(|(mean, _)| mean)
    }

    /// Predict variance values at n given `x` points of nx components specified as a (n, nx) matrix.
    /// Returns n variance values as (n,) column vector.
    pub fn predict_var(&self, x: &ArrayBase<impl Data<Elem = f64>, Ix2>) -> Result<Array1<f64>> {
        self.predict_valvar(x).map(|(_, var)| var)
    }

    /// Predict both output values and variances at n given `x` points of nx components.
    ///
    /// Variances are the ones of noisy observations (latent variance plus noise variance).
    pub fn predict_valvar(
        &self,
        x: &ArrayBase<impl Data<Elem = f64>, Ix2>,
    ) -> Result<(Array1<f64>, Array1<f64>)> {
        if x.ncols() != self.dim() {
            return Err(GpError::InvalidValueError(format!(
                "Expected points of dimension {}, got {}",
                self.dim(),
                x.ncols()
            )));
        }
        let hyp = &self.hyperparameters;
        let xk = kernel_inputs(self.warping.as_ref(), hyp, x);
        let kx = cross_kernel(
            &self.params.kernel,
            &xk,
            &self.inner_params.xt_kernel,
            hyp.variance,
            &hyp.lengthscales,
        );
        let mean = kx.dot(&self.inner_params.alpha);

        let v = self
            .inner_params
            .l_chol
            .solve_triangular(&kx.t().to_owned(), UPLO::Lower)?;
        let var = v
            .mapv(|e| e * e)
            .sum_axis(Axis(0))
            .mapv(|s| hyp.variance + hyp.noise_variance - s);

        // Variance might be slightly negative depending on
        // machine precision: set to zero in that case
        Ok((mean, var.mapv(|v| v.max(0.))))
    }

    /// Input dimension
    pub fn dim(&self) -> usize {
        self.training_data.0.ncols()
    }

    /// Returns input/output dims
    pub fn dims(&self) -> (usize, usize) {
        (self.dim(), 1)
    }

    /// Current hyperparameters
    pub fn hyperparameters(&self) -> &Hyperparameters {
        &self.hyperparameters
    }

    /// Log marginal likelihood at current hyperparameters
    pub fn log_likelihood(&self) -> f64 {
        self.log_likelihood
    }

    /// Log prior (including log jacobians of transforms of priored components)
    /// at current hyperparameters
    pub fn log_prior(&self) -> f64 {
        let values = self.param_array();
        let f = self.to_optimizer_space(&values);
        self.log_prior_at(&f, &values)
    }

    /// Training dataset
    pub fn training_data(&self) -> &(Array2<f64>, Array1<f64>) {
        &self.training_data
    }

    /// Parameters used to fit this model
    pub fn params_used(&self) -> &GpValidParams<K> {
        &self.params
    }

    /// Whether inputs are warped
    pub fn is_warped(&self) -> bool {
        self.warping.is_some()
    }

    /// Set hyperparameters from a flattened vector (see [`Hyperparameters`] layout)
    /// and recompute internal parameters accordingly.
    pub fn set_param_array(&mut self, values: &[f64]) -> Result<()> {
        let hyp = Hyperparameters::from_slice(self.dim(), self.is_warped(), values)?;
        hyp.check()?;
        if let Some((lower, upper)) = self.params.noise_bounds() {
            if hyp.noise_variance < lower || hyp.noise_variance > upper {
                return Err(GpError::InvalidValueError(format!(
                    "Noise variance {} out of bounds ({lower}, {upper})",
                    hyp.noise_variance
                )));
            }
        }
        let xk = kernel_inputs(self.warping.as_ref(), &hyp, &self.training_data.0);
        let (log_likelihood, inner_params) =
            likelihood_terms(&self.params.kernel, xk, &self.training_data.1, &hyp)?;
        self.hyperparameters = hyp;
        self.log_likelihood = log_likelihood;
        self.inner_params = inner_params;
        Ok(())
    }

    /// Returns an independent copy of this GP trained on the same data, with the same kernel,
    /// hyperparameters fixed to the given flattened vector
    pub fn with_param_array(&self, values: &[f64]) -> Result<Self> {
        let mut gp = self.clone();
        gp.set_param_array(values)?;
        gp.params.tuning = HyperTuning::Fixed;
        gp.params.init = Some(gp.hyperparameters.clone());
        Ok(gp)
    }

    /// Set hyperparameters at the maximum of the log posterior starting from current values
    /// using at most `max_eval` evaluations. Non convergence is not an error: the best
    /// state reached within the budget is kept.
    pub fn optimize(&mut self, max_eval: usize) -> Result<()> {
        let f0 = self
            .optimizer_array()
            .mapv(|v| v.clamp(-GP_OPTIM_BOUND, GP_OPTIM_BOUND));
        let obj0 = self.objective_at(f0.as_slice().unwrap_or(&f0.to_vec()));
        let bounds = vec![(-GP_OPTIM_BOUND, GP_OPTIM_BOUND); f0.len()];

        let (fval, fopt) = optimize_params(
            |f: &[f64]| self.objective_at(f),
            &f0,
            &bounds,
            CobylaParams {
                maxeval: max_eval,
                ..CobylaParams::default()
            },
        );
        let fopt = fopt.to_vec();
        let fval = if fval.is_finite() {
            fval
        } else {
            self.objective_at(&fopt)
        };
        debug!("MAP optimization objective {obj0} -> {fval}");
        if fval.is_finite() && fval <= obj0 {
            self.set_optimizer_array(&fopt)
        } else if obj0.is_finite() {
            warn!("MAP optimization did not improve objective ({fval} vs {obj0}), keep initial hyperparameters");
            self.set_optimizer_array(&f0.to_vec())
        } else {
            Err(GpError::LikelihoodComputationError(
                "no valid hyperparameters found by MAP optimization".to_string(),
            ))
        }
    }

    fn transforms(&self) -> Vec<Transform> {
        param_transforms(&self.params, self.dim())
    }

    fn priors(&self) -> Vec<Option<Prior>> {
        param_priors(&self.params, self.dim())
    }

    fn to_optimizer_space(&self, values: &Array1<f64>) -> Array1<f64> {
        let transforms = self.transforms();
        Array1::from_iter(values.iter().zip(transforms).map(|(x, t)| t.inverse(*x)))
    }

    fn log_prior_at(&self, f: &Array1<f64>, values: &Array1<f64>) -> f64 {
        let transforms = self.transforms();
        self.priors()
            .into_iter()
            .zip(transforms)
            .zip(f.iter().zip(values))
            .filter_map(|((prior, t), (fi, xi))| {
                prior.map(|p| p.ln_pdf(*xi) + t.ln_jacobian(*fi))
            })
            .sum()
    }

    /// Negative log posterior at unconstrained hyperparameters `f`, infinite when not computable
    pub fn objective_at(&self, f: &[f64]) -> f64 {
        let transforms = self.transforms();
        if f.len() != transforms.len() || f.iter().any(|v| !v.is_finite()) {
            return f64::INFINITY;
        }
        let values = Array1::from_iter(f.iter().zip(&transforms).map(|(fi, t)| t.value(*fi)));
        let hyp = match Hyperparameters::from_slice(
            self.dim(),
            self.is_warped(),
            values.as_slice().unwrap_or(&values.to_vec()),
        ) {
            Ok(hyp) if hyp.check().is_ok() => hyp,
            _ => return f64::INFINITY,
        };
        let xk = kernel_inputs(self.warping.as_ref(), &hyp, &self.training_data.0);
        match likelihood_terms(&self.params.kernel, xk, &self.training_data.1, &hyp) {
            Ok((log_likelihood, _)) => {
                let obj = -(log_likelihood + self.log_prior_at(&Array1::from(f.to_vec()), &values));
                if obj.is_nan() {
                    f64::INFINITY
                } else {
                    obj
                }
            }
            Err(_) => f64::INFINITY,
        }
    }

    /// Gradient of the log marginal likelihood wrt kernel variance, lengthscales
    /// and noise variance (i.e. the first nx + 2 flattened components)
    pub fn log_likelihood_gradient(&self) -> Result<Array1<f64>> {
        let dim = self.dim();
        let hyp = &self.hyperparameters;
        let inners = &self.inner_params;
        let n_obs = inners.xt_kernel.nrows();

        let l_inv = inners
            .l_chol
            .solve_triangular(&Array2::<f64>::eye(n_obs), UPLO::Lower)?;
        let k_inv = l_inv.t().dot(&l_inv);
        let alpha = inners.alpha.view().insert_axis(Axis(1));
        // dlogL/dp = 1/2 tr((alpha alpha^T - K^-1) dK/dp)
        let w = alpha.dot(&alpha.t()) - k_inv;
        let w_flat = Array1::from_iter(w.iter().copied());

        let d = pairwise_differences(&inners.xt_kernel, &inners.xt_kernel);
        let dk_dvariance = self.params.kernel.value(&d, 1., &hyp.lengthscales);
        let dk_dls = self
            .params
            .kernel
            .lengthscale_gradients(&d, hyp.variance, &hyp.lengthscales);

        let mut grad = Array1::zeros(dim + 2);
        grad[0] = 0.5 * w_flat.dot(&dk_dvariance);
        grad.slice_mut(ndarray::s![1..dim + 1])
            .assign(&(w_flat.dot(&dk_dls) * 0.5));
        grad[dim + 1] = 0.5 * w.diag().sum();
        Ok(grad)
    }
}

impl<K: Kernel> LogPosterior for GaussianProcess<K> {
    fn n_params(&self) -> usize {
        Hyperparameters::flat_len(self.dim(), self.is_warped())
    }

    fn param_array(&self) -> Array1<f64> {
        self.hyperparameters.to_array()
    }

    fn optimizer_array(&self) -> Array1<f64> {
        self.to_optimizer_space(&self.param_array())
    }

    fn set_optimizer_array(&mut self, f: &[f64]) -> Result<()> {
        let values = f
            .iter()
            .zip(self.transforms())
            .map(|(fi, t)| t.value(*fi))
            .collect::<Vec<_>>();
        self.set_param_array(&values)
    }

    fn objective(&self) -> f64 {
        let obj = -(self.log_likelihood + self.log_prior());
        if obj.is_nan() {
            f64::INFINITY
        } else {
            obj
        }
    }

    fn objective_grad(&self) -> Result<Array1<f64>> {
        let f = self.optimizer_array();
        if self.is_warped() {
            // warping parameters gradients are not available in closed form
            let fobj = |fv: &Vec<f64>| self.objective_at(fv);
            return Ok(Array1::from(f.to_vec().central_diff(&fobj)));
        }
        let values = self.param_array();
        let dlik = self.log_likelihood_gradient()?;
        let grad = self
            .transforms()
            .iter()
            .zip(self.priors())
            .enumerate()
            .map(|(i, (t, prior))| {
                let gradfactor = t.gradfactor(f[i]);
                let dprior = prior.map_or(0., |p| {
                    p.d_ln_pdf(values[i]) * gradfactor + t.d_ln_jacobian(f[i])
                });
                -(dlik[i] * gradfactor + dprior)
            })
            .collect::<Array1<_>>();
        Ok(grad)
    }
}

#[cfg(feature = "persistent")]
impl<K: Kernel + Serialize + serde::de::DeserializeOwned> GaussianProcess<K> {
    /// Save the fitted GP as a json file
    pub fn save(&self, path: &str) -> Result<()> {
        let json = serde_json::to_string(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load a GP from a json file
    pub fn load(path: &str) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }
}

impl<K: Kernel, D: Data<Elem = f64>> Fit<ArrayBase<D, Ix2>, ArrayBase<D, Ix1>, GpError>
    for GpValidParams<K>
{
    type Object = GaussianProcess<K>;

    /// Fit GP hyperparameters
    fn fit(
        &self,
        dataset: &DatasetBase<ArrayBase<D, Ix2>, ArrayBase<D, Ix1>>,
    ) -> Result<Self::Object> {
        let x = dataset.records();
        let y = dataset.targets();
        if x.nrows() == 0 || x.nrows() != y.len() {
            return Err(GpError::InvalidValueError(format!(
                "Training data should have the same non zero number of inputs and outputs, got {} and {}",
                x.nrows(),
                y.len()
            )));
        }
        let dim = x.ncols();

        let init = match self.init() {
            Some(init) => {
                if init.dim() != dim {
                    return Err(GpError::InvalidValueError(format!(
                        "Initial hyperparameters of dimension {} while training inputs are of dimension {}",
                        init.dim(),
                        dim
                    )));
                }
                init.clone()
            }
            None => {
                let noise = match self.noise_bounds() {
                    Some((lower, upper)) if !(lower < 1. && 1. < upper) => 0.5 * (lower + upper),
                    _ => 1.,
                };
                let init = Hyperparameters::new(1., Array1::ones(dim), noise);
                if self.input_warping() {
                    init.with_identity_warping()
                } else {
                    init
                }
            }
        };

        let warping = self.input_warping().then(|| KumarWarping::new(x));
        let xk = kernel_inputs(warping.as_ref(), &init, x);
        let y = y.to_owned();
        let (log_likelihood, inner_params) = likelihood_terms(&self.kernel, xk, &y, &init)?;

        let mut gp = GaussianProcess {
            hyperparameters: init,
            log_likelihood,
            inner_params,
            warping,
            training_data: (x.to_owned(), y),
            params: self.clone(),
        };
        if self.tuning() == HyperTuning::Optimized {
            gp.optimize(self.max_eval())?;
            debug!("Fitted {gp}");
        }
        Ok(gp)
    }
}
