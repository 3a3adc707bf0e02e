use crate::acquisition::{self, AcquisitionTriple};
use crate::adapter::{fit_map, MaceGp};
use crate::config::{MaceConfig, ValidMaceConfig};
use crate::errors::{MaceError, Result};
use crate::predictor::{EnsemblePredictor, PredictionBundle};
use crate::sampler::PosteriorSampleSet;
use crate::standardizer::Standardizer;

use env_logger::{Builder, Env};
use linfa::ParamGuard;
use log::info;
use macebox_gp::LogPosterior;
use ndarray::{s, Array1, Array2, ArrayBase, Axis, Data, Ix1, Ix2};
use ndarray_stats::QuantileExt;
use std::fmt;

/// Environment variable used to set the log level
pub const MACEBOX_LOG: &str = "MACEBOX_LOG";

/// A GP surrogate whose hyperparameters posterior is sampled, giving
/// LCB, EI and PI acquisition values averaged over posterior samples.
///
/// Targets are standardized before fitting, predictions and acquisitions are
/// given back in the original target scale.
#[derive(Debug, Clone)]
pub struct MaceSurrogate {
    config: ValidMaceConfig,
    xtrain: Array2<f64>,
    ytrain: Array1<f64>,
    standardizer: Standardizer,
    tau: f64,
    map_model: MaceGp,
    posterior: PosteriorSampleSet,
}

impl MaceSurrogate {
    /// Build the surrogate from training inputs `x` (n, nx) and targets `y` (n,).
    ///
    /// Targets are standardized, a GP is fitted at its maximum a posteriori then
    /// its hyperparameters posterior is sampled (or reduced to the MAP when `mcmc` is off).
    pub fn fit(
        x: &ArrayBase<impl Data<Elem = f64>, Ix2>,
        y: &ArrayBase<impl Data<Elem = f64>, Ix1>,
        config: MaceConfig,
    ) -> Result<Self> {
        let env = Env::new().filter_or(MACEBOX_LOG, "info");
        let mut builder = Builder::from_env(env);
        let builder = builder.target(env_logger::Target::Stdout);
        builder.try_init().ok();

        let config = config.check()?;
        Self::fit_with_config(x, y, config)
    }

    fn fit_with_config(
        x: &ArrayBase<impl Data<Elem = f64>, Ix2>,
        y: &ArrayBase<impl Data<Elem = f64>, Ix1>,
        config: ValidMaceConfig,
    ) -> Result<Self> {
        if x.nrows() == 0 || x.ncols() == 0 || x.nrows() != y.len() {
            return Err(MaceError::InvalidValue(format!(
                "Training inputs {:?} and targets ({},) mismatch",
                x.dim(),
                y.len()
            )));
        }
        if x.iter().any(|v| !v.is_finite()) {
            return Err(MaceError::InvalidValue(
                "Training inputs should be finite".to_string(),
            ));
        }
        let standardizer = Standardizer::fit(y)?;
        let tau = *y
            .min()
            .map_err(|err| MaceError::InvalidValue(format!("Cannot get targets minimum: {err}")))?;
        let y_norm = standardizer.normalize(y);

        let map_model = fit_map(x, &y_norm, &config)?;
        let posterior = PosteriorSampleSet::sample(&map_model, &config)?;
        info!(
            "MACE surrogate built on {} points with {} posterior sample(s)",
            x.nrows(),
            posterior.len()
        );
        Ok(MaceSurrogate {
            config,
            xtrain: x.to_owned(),
            ytrain: y.to_owned(),
            standardizer,
            tau,
            map_model,
            posterior,
        })
    }

    /// Rebuild the surrogate on a new training set with the same configuration
    pub fn refit(
        &mut self,
        x: &ArrayBase<impl Data<Elem = f64>, Ix2>,
        y: &ArrayBase<impl Data<Elem = f64>, Ix1>,
    ) -> Result<()> {
        *self = Self::fit_with_config(x, y, self.config.clone())?;
        Ok(())
    }

    /// Input dimension
    pub fn dim(&self) -> usize {
        self.xtrain.ncols()
    }

    /// Number of training points
    pub fn num_train(&self) -> usize {
        self.xtrain.nrows()
    }

    /// Training data (inputs, targets in original scale)
    pub fn training_data(&self) -> (&Array2<f64>, &Array1<f64>) {
        (&self.xtrain, &self.ytrain)
    }

    /// Improvement threshold used by EI and PI: the best observed target
    pub fn tau(&self) -> f64 {
        self.tau
    }

    /// Exploration weight of LCB at the current round
    pub fn kappa(&self) -> Result<f64> {
        let t = acquisition::round_index(
            self.num_train(),
            self.config.num_init(),
            self.config.budget(),
        );
        acquisition::kappa(t, self.dim(), self.config.upsilon(), self.config.delta())
    }

    /// Targets standardization
    pub fn standardizer(&self) -> &Standardizer {
        &self.standardizer
    }

    /// Posterior samples and their models
    pub fn posterior(&self) -> &PosteriorSampleSet {
        &self.posterior
    }

    /// The GP with MAP hyperparameters
    pub fn map_model(&self) -> &MaceGp {
        &self.map_model
    }

    /// Configuration
    pub fn config(&self) -> &ValidMaceConfig {
        &self.config
    }

    /// Per-sample predicted means and variances at point `x` (nx,)
    pub fn predict(&self, x: &ArrayBase<impl Data<Elem = f64>, Ix1>) -> Result<PredictionBundle> {
        EnsemblePredictor::new(&self.posterior, &self.standardizer).predict(x)
    }

    /// Predicted mean and variance at point `x` (nx,) with the MAP model where
    /// `[variance, lengthscales, noise]` hyperparameters are replaced by `hyp` (nx + 2,).
    /// Other hyperparameters (warping) keep their MAP values.
    pub fn predict_sample(
        &self,
        x: &ArrayBase<impl Data<Elem = f64>, Ix1>,
        hyp: &ArrayBase<impl Data<Elem = f64>, Ix1>,
    ) -> Result<(f64, f64)> {
        let dim = self.dim();
        if x.len() != dim || hyp.len() != dim + 2 {
            return Err(MaceError::InvalidValue(format!(
                "Expected point of dimension {dim} and {} hyperparameters, got {} and {}",
                dim + 2,
                x.len(),
                hyp.len()
            )));
        }
        let mut params = self.map_model.param_array();
        params.slice_mut(s![..dim + 2]).assign(hyp);
        let gp = self.map_model.with_param_array(&params.to_vec())?;
        let (mean, var) = gp.predict_valvar(&x.view().insert_axis(Axis(0)))?;
        Ok((
            self.standardizer.denormalize_value(mean[0]),
            self.standardizer.denormalize_variance_value(var[0]),
        ))
    }

    /// Lower confidence bound at point `x` averaged over samples
    pub fn lcb(&self, x: &ArrayBase<impl Data<Elem = f64>, Ix1>) -> Result<f64> {
        let bundle = self.predict(x)?;
        acquisition::lcb(&bundle, self.kappa()?)
    }

    /// Expected improvement at point `x` averaged over samples
    pub fn ei(&self, x: &ArrayBase<impl Data<Elem = f64>, Ix1>) -> Result<f64> {
        let bundle = self.predict(x)?;
        acquisition::ei(&bundle, self.config.eps(), self.tau)
    }

    /// Probability of improvement at point `x` averaged over samples
    pub fn pi(&self, x: &ArrayBase<impl Data<Elem = f64>, Ix1>) -> Result<f64> {
        let bundle = self.predict(x)?;
        acquisition::pi(&bundle, self.config.eps(), self.tau)
    }

    /// LCB, EI and PI at point `x` from a single ensemble prediction
    pub fn mace_acq(&self, x: &ArrayBase<impl Data<Elem = f64>, Ix1>) -> Result<AcquisitionTriple> {
        let bundle = self.predict(x)?;
        self.acquisition_from_bundle(&bundle)
    }

    /// LCB, EI and PI from already computed predictions
    pub fn acquisition_from_bundle(&self, bundle: &PredictionBundle) -> Result<AcquisitionTriple> {
        acquisition::acquisition_from_bundle(bundle, self.kappa()?, self.config.eps(), self.tau)
    }
}

impl fmt::Display for MaceSurrogate {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "MaceSurrogate(mode={}, warp={}, samples={}, MAP {})",
            if self.config.mcmc() { "MCMC" } else { "MAP" },
            self.config.warp(),
            self.posterior.len(),
            self.map_model.hyperparameters()
        )
    }
}
