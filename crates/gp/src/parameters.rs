use crate::errors::{GpError, Result};
use crate::hyperparameters::Hyperparameters;
use crate::kernels::Kernel;
use crate::priors::Prior;
use crate::GP_MAP_MAX_EVAL;
use linfa::ParamGuard;

#[cfg(feature = "serializable")]
use serde::{Deserialize, Serialize};

/// Default bounds of Kumaraswamy warping parameters
pub const WARPING_BOUNDS: (f64, f64) = (0., 10.);

/// Hyperparameters handling when fitting a GP
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serializable", derive(Serialize, Deserialize))]
pub enum HyperTuning {
    /// Hyperparameters kept at their initial values
    Fixed,
    /// Hyperparameters set to the maximum of the log posterior
    #[default]
    Optimized,
}

/// A set of validated GP parameters.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(
    feature = "serializable",
    derive(Serialize, Deserialize),
    serde(bound(
        serialize = "K: Serialize",
        deserialize = "K: Deserialize<'de>"
    ))
)]
pub struct GpValidParams<K: Kernel> {
    /// Covariance kernel
    pub(crate) kernel: K,
    /// Kumaraswamy input warping activation
    pub(crate) input_warping: bool,
    /// Initial hyperparameters, GP defaults (all ones) when not given
    pub(crate) init: Option<Hyperparameters>,
    /// Fixed or optimized hyperparameters
    pub(crate) tuning: HyperTuning,
    /// Prior on kernel variance
    pub(crate) variance_prior: Option<Prior>,
    /// Prior on each lengthscale
    pub(crate) lengthscale_prior: Option<Prior>,
    /// Prior on noise variance
    pub(crate) noise_prior: Option<Prior>,
    /// Optional bounds (lower, upper) of noise variance
    pub(crate) noise_bounds: Option<(f64, f64)>,
    /// Max number of internal log posterior evaluations during optimization
    pub(crate) max_eval: usize,
}

impl<K: Kernel> Default for GpValidParams<K> {
    fn default() -> GpValidParams<K> {
        GpValidParams {
            kernel: K::default(),
            input_warping: false,
            init: None,
            tuning: HyperTuning::default(),
            variance_prior: None,
            lengthscale_prior: None,
            noise_prior: None,
            noise_bounds: None,
            max_eval: GP_MAP_MAX_EVAL,
        }
    }
}

impl<K: Kernel> GpValidParams<K> {
    /// Get kernel
    pub fn kernel(&self) -> &K {
        &self.kernel
    }

    /// Whether inputs are warped
    pub fn input_warping(&self) -> bool {
        self.input_warping
    }

    /// Get initial hyperparameters if any
    pub fn init(&self) -> Option<&Hyperparameters> {
        self.init.as_ref()
    }

    /// Get hyperparameters tuning
    pub fn tuning(&self) -> HyperTuning {
        self.tuning
    }

    /// Get kernel variance prior
    pub fn variance_prior(&self) -> Option<&Prior> {
        self.variance_prior.as_ref()
    }

    /// Get lengthscale prior
    pub fn lengthscale_prior(&self) -> Option<&Prior> {
        self.lengthscale_prior.as_ref()
    }

    /// Get noise variance prior
    pub fn noise_prior(&self) -> Option<&Prior> {
        self.noise_prior.as_ref()
    }

    /// Get noise variance bounds
    pub fn noise_bounds(&self) -> Option<(f64, f64)> {
        self.noise_bounds
    }

    /// Get the max number of log posterior evaluations during one optimization
    pub fn max_eval(&self) -> usize {
        self.max_eval
    }
}

#[derive(Clone, Debug)]
/// The set of hyperparameters that can be specified for the execution of
/// the [GP algorithm](crate::GaussianProcess).
pub struct GpParams<K: Kernel>(GpValidParams<K>);

impl<K: Kernel> GpParams<K> {
    /// A constructor for GP parameters given a kernel
    pub fn new(kernel: K) -> GpParams<K> {
        Self(GpValidParams {
            kernel,
            ..Default::default()
        })
    }

    /// A constructor for GP parameters from validated parameters
    pub fn new_from_valid(params: &GpValidParams<K>) -> Self {
        Self(params.clone())
    }

    /// Set kernel.
    pub fn kernel(mut self, kernel: K) -> Self {
        self.0.kernel = kernel;
        self
    }

    /// Activate Kumaraswamy input warping
    pub fn input_warping(mut self, input_warping: bool) -> Self {
        self.0.input_warping = input_warping;
        self
    }

    /// Set initial hyperparameters.
    ///
    /// When hyperparameters are optimized, the internal optimization is started from `init`.
    /// When hyperparameters are fixed, this set their constant values.
    pub fn init(mut self, init: Hyperparameters) -> Self {
        self.0.init = Some(init);
        self
    }

    /// Set hyperparameters tuning
    pub fn tuning(mut self, tuning: HyperTuning) -> Self {
        self.0.tuning = tuning;
        self
    }

    /// Set kernel variance prior
    pub fn variance_prior(mut self, prior: Prior) -> Self {
        self.0.variance_prior = Some(prior);
        self
    }

    /// Set prior on each lengthscale
    pub fn lengthscale_prior(mut self, prior: Prior) -> Self {
        self.0.lengthscale_prior = Some(prior);
        self
    }

    /// Set noise variance prior
    pub fn noise_prior(mut self, prior: Prior) -> Self {
        self.0.noise_prior = Some(prior);
        self
    }

    /// Constrain noise variance within (lower, upper)
    pub fn noise_bounds(mut self, lower: f64, upper: f64) -> Self {
        self.0.noise_bounds = Some((lower, upper));
        self
    }

    /// Set the max number of internal log posterior evaluations during one optimization
    pub fn max_eval(mut self, max_eval: usize) -> Self {
        self.0.max_eval = max_eval;
        self
    }
}

impl<K: Kernel> From<GpValidParams<K>> for GpParams<K> {
    fn from(valid: GpValidParams<K>) -> Self {
        GpParams(valid)
    }
}

fn check_prior(name: &str, prior: Option<&Prior>) -> Result<()> {
    let valid = match prior {
        None => true,
        Some(Prior::LogGaussian { mu, sigma }) => mu.is_finite() && *sigma > 0.,
        Some(Prior::Gamma { a, b }) => *a > 0. && *b > 0.,
    };
    if valid {
        Ok(())
    } else {
        Err(GpError::InvalidValueError(format!(
            "Bad {name} prior parameters: {}",
            prior.map(|p| p.to_string()).unwrap_or_default()
        )))
    }
}

impl<K: Kernel> ParamGuard for GpParams<K> {
    type Checked = GpValidParams<K>;
    type Error = GpError;

    fn check_ref(&self) -> Result<&Self::Checked> {
        check_prior("variance", self.0.variance_prior())?;
        check_prior("lengthscale", self.0.lengthscale_prior())?;
        check_prior("noise", self.0.noise_prior())?;
        if let Some((lower, upper)) = self.0.noise_bounds {
            if !(lower >= 0. && lower < upper && upper.is_finite()) {
                return Err(GpError::InvalidValueError(format!(
                    "Noise bounds should verify 0 <= lower < upper, got ({lower}, {upper})"
                )));
            }
        }
        if let Some(init) = self.0.init() {
            init.check()?;
            if init.is_warped() != self.0.input_warping {
                return Err(GpError::InvalidValueError(
                    "Initial hyperparameters warping parameters should be given iff input warping is on"
                        .to_string(),
                ));
            }
            if let Some((lower, upper)) = self.0.noise_bounds {
                if init.noise_variance <= lower || init.noise_variance >= upper {
                    return Err(GpError::InvalidValueError(format!(
                        "Initial noise variance {} should be within ({lower}, {upper})",
                        init.noise_variance
                    )));
                }
            }
        }
        if self.0.tuning == HyperTuning::Optimized && self.0.max_eval == 0 {
            return Err(GpError::InvalidValueError(
                "`max_eval` cannot be 0 when hyperparameters are optimized".to_string(),
            ));
        }
        Ok(&self.0)
    }

    fn check(self) -> Result<Self::Checked> {
        self.check_ref()?;
        Ok(self.0)
    }
}
