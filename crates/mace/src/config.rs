//! MACE surrogate configuration.
use crate::errors::{MaceError, Result};
use linfa::ParamGuard;
use macebox_gp::GP_MAP_MAX_EVAL;
use serde::{Deserialize, Serialize};

/// Default exploration offset of EI and PI criteria
pub const DEFAULT_EPS: f64 = 1e-3;
/// Default `upsilon` of the LCB kappa schedule
pub const DEFAULT_UPSILON: f64 = 0.5;
/// Default `delta` of the LCB kappa schedule
pub const DEFAULT_DELTA: f64 = 0.05;
/// Default number of discarded HMC draws
pub const DEFAULT_BURNIN: usize = 200;
/// Default number of retained posterior samples
pub const DEFAULT_N_SAMPLES: usize = 10;
/// Default interval between two retained HMC draws
pub const DEFAULT_SUBSAMPLE_INTERVAL: usize = 10;
/// Default HMC leapfrog step size
pub const DEFAULT_STEPSIZE: f64 = 0.05;
/// Default number of leapfrog steps per HMC draw
pub const DEFAULT_LEAPFROG_STEPS: usize = 20;

/// A validated MACE surrogate configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ValidMaceConfig {
    /// Number of points of the initial design
    pub(crate) num_init: usize,
    /// Total evaluation budget, used to normalize the LCB round index
    pub(crate) budget: usize,
    /// Kumaraswamy input warping activation
    pub(crate) warp: bool,
    /// Posterior sampling with HMC when true, MAP point estimate otherwise
    pub(crate) mcmc: bool,
    /// Exploration offset of EI and PI criteria
    pub(crate) eps: f64,
    /// LCB kappa schedule `upsilon` constant
    pub(crate) upsilon: f64,
    /// LCB kappa schedule confidence `delta`
    pub(crate) delta: f64,
    /// Number of HMC draws discarded before retaining samples
    pub(crate) burnin: usize,
    /// Number of retained posterior samples
    pub(crate) n_samples: usize,
    /// One draw retained every `subsample_interval` HMC draws
    pub(crate) subsample_interval: usize,
    /// HMC leapfrog step size
    pub(crate) stepsize: f64,
    /// Number of leapfrog steps per HMC draw
    pub(crate) leapfrog_steps: usize,
    /// Max number of log posterior evaluations of the MAP optimization
    pub(crate) max_eval: usize,
    /// A random generator seed used to get reproducible HMC draws
    pub(crate) seed: Option<u64>,
}

impl ValidMaceConfig {
    /// Number of points of the initial design
    pub fn num_init(&self) -> usize {
        self.num_init
    }

    /// Total evaluation budget
    pub fn budget(&self) -> usize {
        self.budget
    }

    /// Whether inputs are warped
    pub fn warp(&self) -> bool {
        self.warp
    }

    /// Whether hyperparameters posterior is sampled
    pub fn mcmc(&self) -> bool {
        self.mcmc
    }

    /// Exploration offset of EI and PI criteria
    pub fn eps(&self) -> f64 {
        self.eps
    }

    /// LCB kappa schedule `upsilon` constant
    pub fn upsilon(&self) -> f64 {
        self.upsilon
    }

    /// LCB kappa schedule confidence `delta`
    pub fn delta(&self) -> f64 {
        self.delta
    }

    /// Number of discarded HMC draws
    pub fn burnin(&self) -> usize {
        self.burnin
    }

    /// Number of retained posterior samples
    pub fn n_samples(&self) -> usize {
        self.n_samples
    }

    /// Interval between two retained HMC draws
    pub fn subsample_interval(&self) -> usize {
        self.subsample_interval
    }

    /// HMC leapfrog step size
    pub fn stepsize(&self) -> f64 {
        self.stepsize
    }

    /// Number of leapfrog steps per HMC draw
    pub fn leapfrog_steps(&self) -> usize {
        self.leapfrog_steps
    }

    /// Max number of log posterior evaluations of the MAP optimization
    pub fn max_eval(&self) -> usize {
        self.max_eval
    }

    /// Random generator seed
    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    /// Json representation of the configuration
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// MACE surrogate configuration builder
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MaceConfig(ValidMaceConfig);

impl MaceConfig {
    /// Configuration given the initial design size and the total evaluation budget,
    /// other settings take their default values (no warping, MCMC sampling)
    pub fn new(num_init: usize, budget: usize) -> Self {
        MaceConfig(ValidMaceConfig {
            num_init,
            budget,
            warp: false,
            mcmc: true,
            eps: DEFAULT_EPS,
            upsilon: DEFAULT_UPSILON,
            delta: DEFAULT_DELTA,
            burnin: DEFAULT_BURNIN,
            n_samples: DEFAULT_N_SAMPLES,
            subsample_interval: DEFAULT_SUBSAMPLE_INTERVAL,
            stepsize: DEFAULT_STEPSIZE,
            leapfrog_steps: DEFAULT_LEAPFROG_STEPS,
            max_eval: GP_MAP_MAX_EVAL,
            seed: None,
        })
    }

    /// Configuration from its json representation (validated afterwards with `check()`)
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(MaceConfig(serde_json::from_str(json)?))
    }

    /// Sets the number of points of the initial design
    pub fn num_init(mut self, num_init: usize) -> Self {
        self.0.num_init = num_init;
        self
    }

    /// Sets the total evaluation budget
    pub fn budget(mut self, budget: usize) -> Self {
        self.0.budget = budget;
        self
    }

    /// Activates Kumaraswamy input warping
    pub fn warp(mut self, warp: bool) -> Self {
        self.0.warp = warp;
        self
    }

    /// Chooses between HMC posterior sampling (true) and MAP point estimate (false)
    pub fn mcmc(mut self, mcmc: bool) -> Self {
        self.0.mcmc = mcmc;
        self
    }

    /// Sets the exploration offset of EI and PI criteria
    pub fn eps(mut self, eps: f64) -> Self {
        self.0.eps = eps;
        self
    }

    /// Sets the `upsilon` constant of the kappa schedule
    pub fn upsilon(mut self, upsilon: f64) -> Self {
        self.0.upsilon = upsilon;
        self
    }

    /// Sets the `delta` confidence of the kappa schedule
    pub fn delta(mut self, delta: f64) -> Self {
        self.0.delta = delta;
        self
    }

    /// Sets the number of discarded HMC draws
    pub fn burnin(mut self, burnin: usize) -> Self {
        self.0.burnin = burnin;
        self
    }

    /// Sets the number of retained posterior samples
    pub fn n_samples(mut self, n_samples: usize) -> Self {
        self.0.n_samples = n_samples;
        self
    }

    /// Sets the interval between two retained HMC draws
    pub fn subsample_interval(mut self, subsample_interval: usize) -> Self {
        self.0.subsample_interval = subsample_interval;
        self
    }

    /// Sets the HMC leapfrog step size
    pub fn stepsize(mut self, stepsize: f64) -> Self {
        self.0.stepsize = stepsize;
        self
    }

    /// Sets the number of leapfrog steps per HMC draw
    pub fn leapfrog_steps(mut self, leapfrog_steps: usize) -> Self {
        self.0.leapfrog_steps = leapfrog_steps;
        self
    }

    /// Sets the max number of log posterior evaluations of the MAP optimization
    pub fn max_eval(mut self, max_eval: usize) -> Self {
        self.0.max_eval = max_eval;
        self
    }

    /// Allows to specify a seed to get reproducible HMC draws
    pub fn seed(mut self, seed: u64) -> Self {
        self.0.seed = Some(seed);
        self
    }
}

impl From<ValidMaceConfig> for MaceConfig {
    fn from(valid: ValidMaceConfig) -> Self {
        MaceConfig(valid)
    }
}

impl ParamGuard for MaceConfig {
    type Checked = ValidMaceConfig;
    type Error = MaceError;

    fn check_ref(&self) -> Result<&Self::Checked> {
        let c = &self.0;
        let checks = [
            (c.budget >= 1, "budget should be >= 1".to_string()),
            (c.n_samples >= 1, "n_samples should be >= 1".to_string()),
            (
                c.subsample_interval >= 1,
                "subsample_interval should be >= 1".to_string(),
            ),
            (
                c.stepsize > 0. && c.stepsize.is_finite(),
                format!("stepsize should be positive and finite, got {}", c.stepsize),
            ),
            (
                c.leapfrog_steps >= 1,
                "leapfrog_steps should be >= 1".to_string(),
            ),
            (
                c.eps >= 0. && c.eps.is_finite(),
                format!("eps should be non negative, got {}", c.eps),
            ),
            (
                c.upsilon > 0. && c.upsilon.is_finite(),
                format!("upsilon should be positive, got {}", c.upsilon),
            ),
            (
                c.delta > 0. && c.delta < 1.,
                format!("delta should be in (0, 1), got {}", c.delta),
            ),
            (c.max_eval >= 1, "max_eval should be >= 1".to_string()),
        ];
        match checks.into_iter().find(|(valid, _)| !valid) {
            Some((_, msg)) => Err(MaceError::InvalidConfigError(msg)),
            None => Ok(&self.0),
        }
    }

    fn check(self) -> Result<Self::Checked> {
        self.check_ref()?;
        Ok(self.0)
    }
}
