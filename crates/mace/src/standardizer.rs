//! Affine standardization of training targets.
use crate::errors::{MaceError, Result};
use ndarray::{Array1, ArrayBase, Data, Ix1};
use serde::{Deserialize, Serialize};

/// Relative threshold under which target standard deviation is considered null
const DEGENERATE_STD_RTOL: f64 = 1e-12;

/// Mean and (population) standard deviation of training targets
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Standardizer {
    mean: f64,
    std: f64,
}

impl Standardizer {
    /// Compute standardization statistics of `y`.
    ///
    /// Fails with [`MaceError::DegenerateData`] when `y` is empty, contains non finite values
    /// or has a (numerically) null standard deviation.
    pub fn fit(y: &ArrayBase<impl Data<Elem = f64>, Ix1>) -> Result<Self> {
        if y.iter().any(|v| !v.is_finite()) {
            return Err(MaceError::DegenerateData(
                "training targets should be finite".to_string(),
            ));
        }
        let mean = y.mean().ok_or_else(|| {
            MaceError::DegenerateData("no training targets to standardize".to_string())
        })?;
        let std = y.std(0.);
        if !std.is_finite() || std <= DEGENERATE_STD_RTOL * mean.abs().max(1.) {
            return Err(MaceError::DegenerateData(format!(
                "training targets have a null standard deviation (mean={mean}, std={std})"
            )));
        }
        Ok(Standardizer { mean, std })
    }

    /// Mean of training targets
    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// Standard deviation of training targets
    pub fn std(&self) -> f64 {
        self.std
    }

    /// `(y - mean) / std`
    pub fn normalize_value(&self, y: f64) -> f64 {
        (y - self.mean) / self.std
    }

    /// `mean + y * std`
    pub fn denormalize_value(&self, y: f64) -> f64 {
        self.mean + y * self.std
    }

    /// `v * std^2`
    pub fn denormalize_variance_value(&self, v: f64) -> f64 {
        v * self.std * self.std
    }

    /// Standardize targets
    pub fn normalize(&self, y: &ArrayBase<impl Data<Elem = f64>, Ix1>) -> Array1<f64> {
        y.mapv(|v| self.normalize_value(v))
    }

    /// Back to original target scale
    pub fn denormalize(&self, y: &ArrayBase<impl Data<Elem = f64>, Ix1>) -> Array1<f64> {
        y.mapv(|v| self.denormalize_value(v))
    }

    /// Variances back to original target scale
    pub fn denormalize_variance(&self, v: &ArrayBase<impl Data<Elem = f64>, Ix1>) -> Array1<f64> {
        v.mapv(|v| self.denormalize_variance_value(v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn test_population_statistics() {
        let st = Standardizer::fit(&array![0., 1., 0.]).unwrap();
        assert_abs_diff_eq!(st.mean(), 1. / 3., epsilon = 1e-15);
        assert_abs_diff_eq!(st.std(), (2f64 / 9.).sqrt(), epsilon = 1e-15);
    }

    #[test]
    fn test_round_trip() {
        let y = array![3.2, -1.5, 1e3, 0.25, -7.75];
        let st = Standardizer::fit(&y).unwrap();
        let yn = st.normalize(&y);
        assert_abs_diff_eq!(yn.mean().unwrap(), 0., epsilon = 1e-12);
        assert_abs_diff_eq!(yn.std(0.), 1., epsilon = 1e-12);
        assert_abs_diff_eq!(st.denormalize(&yn), y, epsilon = 1e-12);
    }

    #[test]
    fn test_variance_scaling() {
        let st = Standardizer::fit(&array![0., 4.]).unwrap();
        assert_eq!(st.std(), 2.);
        assert_eq!(st.denormalize_variance(&array![0.5, 0.]), array![2., 0.]);
    }

    #[test]
    fn test_degenerate_targets() {
        for y in [Array1::zeros(0), array![1., 1., 1.], array![0., f64::NAN], array![1e20, 1e20]] {
            assert!(matches!(
                Standardizer::fit(&y),
                Err(MaceError::DegenerateData(_))
            ));
        }
    }
}
