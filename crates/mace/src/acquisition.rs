//! LCB, EI and PI acquisition criteria averaged over posterior samples.
use crate::errors::{MaceError, Result};
use crate::predictor::PredictionBundle;
use libm::erfc;
use serde::{Deserialize, Serialize};
use std::f64::consts::{PI, SQRT_2};

const SQRT_2PI: f64 = 2.5066282746310007;

/// Lowest standard deviation used to compute quantiles
pub const MIN_QUANTILE_STD: f64 = 1e-10;

/// Cumulative distribution function of the standard normal distribution
pub fn norm_cdf(x: f64) -> f64 {
    0.5 * erfc(-x / SQRT_2)
}

/// Probability density function of the standard normal distribution
pub fn norm_pdf(x: f64) -> f64 {
    (-0.5 * x * x).exp() / SQRT_2PI
}

/// Normalized improvement `u = (tau - mean - eps) / std` with its standard normal
/// pdf and cdf values returned as `(pdf(u), cdf(u), u)`.
///
/// `std` is raised to 1e-10 when lower.
pub fn get_quantiles(eps: f64, tau: f64, mean: f64, std: f64) -> (f64, f64, f64) {
    let std = std.max(MIN_QUANTILE_STD);
    let u = (tau - mean - eps) / std;
    (norm_pdf(u), norm_cdf(u), u)
}

/// Round index `t = 1 + (num_train - num_init) / budget` with integer division truncated toward zero
pub fn round_index(num_train: usize, num_init: usize, budget: usize) -> i64 {
    1 + (num_train as i64 - num_init as i64) / budget.max(1) as i64
}

/// GP-UCB exploration weight
/// `kappa = sqrt(2 upsilon ln(t^(2 + dim/2) 3 pi^2 / (3 delta)))`
///
/// Fails when round index `t` is lower than 1 (i.e. fewer training points than the initial design
/// minus one budget).
pub fn kappa(t: i64, dim: usize, upsilon: f64, delta: f64) -> Result<f64> {
    if t < 1 {
        return Err(MaceError::InvalidValue(format!(
            "Round index should be >= 1, got {t}"
        )));
    }
    let exponent = 2. + dim as f64 / 2.;
    let arg = (t as f64).powf(exponent) * 3. * PI * PI / (3. * delta);
    Ok((2. * upsilon * arg.ln()).sqrt())
}

fn check_not_empty(bundle: &PredictionBundle) -> Result<()> {
    if bundle.is_empty() {
        return Err(MaceError::InvalidValue(
            "Cannot compute acquisition without predictions".to_string(),
        ));
    }
    Ok(())
}

/// Lower confidence bound averaged over samples
pub fn lcb(bundle: &PredictionBundle, kappa: f64) -> Result<f64> {
    check_not_empty(bundle)?;
    let std = bundle.std_devs();
    Ok((&bundle.means - &(std * kappa)).sum() / bundle.len() as f64)
}

/// Expected improvement under `tau` averaged over samples
pub fn ei(bundle: &PredictionBundle, eps: f64, tau: f64) -> Result<f64> {
    check_not_empty(bundle)?;
    let acq = bundle
        .means
        .iter()
        .zip(bundle.std_devs())
        .map(|(&mean, std)| {
            if std == 0. {
                0.
            } else {
                let (phi, cdf, u) = get_quantiles(eps, tau, mean, std);
                std * (u * cdf + phi)
            }
        })
        .sum::<f64>()
        / bundle.len() as f64;
    Ok(acq.max(0.))
}

/// Probability of improvement under `tau` averaged over samples
pub fn pi(bundle: &PredictionBundle, eps: f64, tau: f64) -> Result<f64> {
    check_not_empty(bundle)?;
    let acq = bundle
        .means
        .iter()
        .zip(bundle.std_devs())
        .map(|(&mean, std)| {
            if std == 0. {
                0.
            } else {
                get_quantiles(eps, tau, mean, std).1
            }
        })
        .sum::<f64>()
        / bundle.len() as f64;
    Ok(acq)
}

/// The three acquisition values at a given point
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AcquisitionTriple {
    /// Lower confidence bound (to be minimized)
    pub lcb: f64,
    /// Expected improvement (to be maximized)
    pub ei: f64,
    /// Probability of improvement (to be maximized)
    pub pi: f64,
}

/// Compute the acquisition triple from already computed predictions
pub fn acquisition_from_bundle(
    bundle: &PredictionBundle,
    kappa: f64,
    eps: f64,
    tau: f64,
) -> Result<AcquisitionTriple> {
    Ok(AcquisitionTriple {
        lcb: lcb(bundle, kappa)?,
        ei: ei(bundle, eps, tau)?,
        pi: pi(bundle, eps, tau)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    fn bundle(means: &[f64], variances: &[f64]) -> PredictionBundle {
        PredictionBundle {
            means: means.iter().copied().collect(),
            variances: variances.iter().copied().collect(),
        }
    }

    #[test]
    fn test_norm_functions() {
        assert_abs_diff_eq!(norm_cdf(0.), 0.5, epsilon = 1e-15);
        assert_abs_diff_eq!(norm_cdf(1.96), 0.9750021048517795, epsilon = 1e-12);
        assert_abs_diff_eq!(norm_pdf(0.), 0.3989422804014327, epsilon = 1e-15);
        assert_abs_diff_eq!(norm_pdf(1.), 0.24197072451914337, epsilon = 1e-15);
    }

    #[test]
    fn test_get_quantiles() {
        let (phi, cdf, u) = get_quantiles(1e-3, 0., 1., 2.);
        assert_abs_diff_eq!(u, -1.001 / 2., epsilon = 1e-15);
        assert_abs_diff_eq!(cdf, norm_cdf(u), epsilon = 1e-15);
        assert_abs_diff_eq!(phi, norm_pdf(u), epsilon = 1e-15);
        let (_, _, u) = get_quantiles(0., 1., 0., 0.);
        assert_abs_diff_eq!(u, 1e10, epsilon = 1.);
    }

    #[test]
    fn test_round_index() {
        assert_eq!(round_index(3, 3, 5), 1);
        assert_eq!(round_index(7, 3, 5), 1);
        assert_eq!(round_index(8, 3, 5), 2);
        assert_eq!(round_index(13, 3, 5), 3);
        // truncation toward zero
        assert_eq!(round_index(1, 3, 5), 1);
        assert_eq!(round_index(0, 10, 5), -1);
    }

    #[test]
    fn test_kappa_value() {
        // t = 1, dim = 1: sqrt(ln(pi^2 / 0.05))
        let expected = (PI * PI / 0.05f64).ln().sqrt();
        assert_abs_diff_eq!(kappa(1, 1, 0.5, 0.05).unwrap(), expected, epsilon = 1e-12);
        assert!(kappa(0, 1, 0.5, 0.05).is_err());
    }

    #[test]
    fn test_kappa_monotonicity() {
        let mut prev = 0.;
        for t in 1..20 {
            let k = kappa(t, 3, 0.5, 0.05).unwrap();
            assert!(k >= prev);
            prev = k;
        }
        let mut prev = 0.;
        for dim in 1..20 {
            let k = kappa(4, dim, 0.5, 0.05).unwrap();
            assert!(k >= prev);
            prev = k;
        }
    }

    #[test]
    fn test_zero_variance() {
        let b = bundle(&[1., 3.], &[0., 0.]);
        let acq = acquisition_from_bundle(&b, 2.5, 1e-3, 0.).unwrap();
        assert_eq!(acq.lcb, 2.);
        assert_eq!(acq.ei, 0.);
        assert_eq!(acq.pi, 0.);
    }

    #[test]
    fn test_acquisition_averages() {
        let b = bundle(&[0.5, -0.2, 1.0], &[0.25, 1., 0.04]);
        let (kappa, eps, tau) = (1.5, 1e-3, 0.);
        let acq = acquisition_from_bundle(&b, kappa, eps, tau).unwrap();

        let mut expected = (0., 0., 0.);
        for (m, s) in [(0.5, 0.5), (-0.2, 1.), (1.0, 0.2)] {
            let (phi, cdf, u) = get_quantiles(eps, tau, m, s);
            expected.0 += (m - kappa * s) / 3.;
            expected.1 += s * (u * cdf + phi) / 3.;
            expected.2 += cdf / 3.;
        }
        assert_abs_diff_eq!(acq.lcb, expected.0, epsilon = 1e-12);
        assert_abs_diff_eq!(acq.ei, expected.1, epsilon = 1e-12);
        assert_abs_diff_eq!(acq.pi, expected.2, epsilon = 1e-12);
        assert!(acq.ei >= 0.);
        assert!((0. ..=1.).contains(&acq.pi));
    }

    #[test]
    fn test_single_sample_ei_closed_form() {
        // mean = tau + eps: u = 0, EI = std * pdf(0)
        let b = bundle(&[-1e-3], &[4.]);
        assert_abs_diff_eq!(ei(&b, 1e-3, 0.).unwrap(), 2. * norm_pdf(0.), epsilon = 1e-12);
        assert_abs_diff_eq!(pi(&b, 1e-3, 0.).unwrap(), 0.5, epsilon = 1e-12);
        assert_eq!(b.std_devs(), array![2.]);
    }

    #[test]
    fn test_empty_bundle() {
        let empty = bundle(&[], &[]);
        assert!(acquisition_from_bundle(&empty, 1., 1e-3, 0.).is_err());
        assert!(matches!(lcb(&empty, 1.), Err(MaceError::InvalidValue(_))));
        assert!(matches!(ei(&empty, 1e-3, 0.), Err(MaceError::InvalidValue(_))));
        assert!(matches!(pi(&empty, 1e-3, 0.), Err(MaceError::InvalidValue(_))));
    }
}
