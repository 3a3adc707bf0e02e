use crate::errors::{MaceError, Result};
use crate::sampler::PosteriorSampleSet;
use crate::standardizer::Standardizer;
use macebox_gp::GpError;
use ndarray::{Array1, ArrayBase, Axis, Data, Ix1};
use rayon::prelude::*;

/// Per-sample predictions at a single point in original target scale, in samples order
#[derive(Clone, Debug, PartialEq)]
pub struct PredictionBundle {
    /// Predicted means, one per sample
    pub means: Array1<f64>,
    /// Predicted variances (>= 0), one per sample
    pub variances: Array1<f64>,
}

impl PredictionBundle {
    /// Number of samples
    pub fn len(&self) -> usize {
        self.means.len()
    }

    /// Whether the bundle is empty
    pub fn is_empty(&self) -> bool {
        self.means.is_empty()
    }

    /// Predicted standard deviations
    pub fn std_devs(&self) -> Array1<f64> {
        self.variances.mapv(|v| v.max(0.).sqrt())
    }
}

/// Prediction with every GP of a posterior sample set
pub struct EnsemblePredictor<'a> {
    posterior: &'a PosteriorSampleSet,
    standardizer: &'a Standardizer,
}

impl<'a> EnsemblePredictor<'a> {
    /// Constructor
    pub fn new(posterior: &'a PosteriorSampleSet, standardizer: &'a Standardizer) -> Self {
        EnsemblePredictor {
            posterior,
            standardizer,
        }
    }

    /// Predict mean and variance at point `x` (nx,) with every model,
    /// results are given back in original target scale
    pub fn predict(&self, x: &ArrayBase<impl Data<Elem = f64>, Ix1>) -> Result<PredictionBundle> {
        let dim = self.posterior.models().first().map_or(0, |gp| gp.dim());
        if x.len() != dim {
            return Err(MaceError::InvalidValue(format!(
                "Expected a point of dimension {dim}, got {}",
                x.len()
            )));
        }
        let xq = x.view().insert_axis(Axis(0));
        let preds = self
            .posterior
            .models()
            .par_iter()
            .map(|gp| gp.predict_valvar(&xq).map(|(mean, var)| (mean[0], var[0])))
            .collect::<std::result::Result<Vec<_>, GpError>>()?;

        let (means, variances): (Vec<f64>, Vec<f64>) = preds.into_iter().unzip();
        Ok(PredictionBundle {
            means: self.standardizer.denormalize(&Array1::from(means)),
            variances: self
                .standardizer
                .denormalize_variance(&Array1::from(variances))
                .mapv(|v| v.max(0.)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::fit_map;
    use crate::config::MaceConfig;
    use approx::assert_abs_diff_eq;
    use linfa::ParamGuard;
    use ndarray::array;

    #[test]
    fn test_predictions_follow_samples_order() {
        let x = array![[0.], [1.], [2.], [3.]];
        let y = array![10., 12., 11., 9.];
        let standardizer = Standardizer::fit(&y).unwrap();
        let config = MaceConfig::new(4, 10)
            .burnin(5)
            .n_samples(3)
            .subsample_interval(2)
            .seed(0)
            .check()
            .unwrap();
        let map = fit_map(&x, &standardizer.normalize(&y), &config).unwrap();
        let posterior = PosteriorSampleSet::sample(&map, &config).unwrap();

        let bundle = EnsemblePredictor::new(&posterior, &standardizer)
            .predict(&array![1.5])
            .unwrap();
        assert_eq!(bundle.len(), 3);
        for (i, gp) in posterior.models().iter().enumerate() {
            let (m, v) = gp.predict_valvar(&array![[1.5]]).unwrap();
            assert_abs_diff_eq!(
                bundle.means[i],
                standardizer.denormalize_value(m[0]),
                epsilon = 1e-10
            );
            assert_abs_diff_eq!(
                bundle.variances[i],
                standardizer.denormalize_variance_value(v[0]),
                epsilon = 1e-10
            );
        }
    }

    #[test]
    fn test_bad_point_dimension() {
        let x = array![[0.], [1.], [2.]];
        let y = array![0., 1., 0.];
        let standardizer = Standardizer::fit(&y).unwrap();
        let config = MaceConfig::new(3, 5).mcmc(false).check().unwrap();
        let map = fit_map(&x, &standardizer.normalize(&y), &config).unwrap();
        let posterior = PosteriorSampleSet::sample(&map, &config).unwrap();
        let res = EnsemblePredictor::new(&posterior, &standardizer).predict(&array![0.5, 0.5]);
        assert!(matches!(res, Err(MaceError::InvalidValue(_))));
    }
}
