use crate::errors::{GpError, Result};
use ndarray::{Array1, ArrayView1};
#[cfg(feature = "serializable")]
use serde::{Deserialize, Serialize};
use std::fmt;

/// GP hyperparameters.
///
/// Flattened layout is `[variance, lengthscale_1..nx, noise_variance]` (length nx + 2),
/// followed by `[a_1, b_1, .., a_nx, b_nx]` Kumaraswamy parameters when inputs are warped.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serializable", derive(Serialize, Deserialize))]
pub struct Hyperparameters {
    /// Kernel variance
    pub variance: f64,
    /// ARD lengthscales (nx,)
    pub lengthscales: Array1<f64>,
    /// Observation noise variance
    pub noise_variance: f64,
    /// Kumaraswamy warping parameters (a, b), each (nx,)
    pub warping: Option<(Array1<f64>, Array1<f64>)>,
}

impl Hyperparameters {
    /// Constructor of hyperparameters of a GP without input warping
    pub fn new(variance: f64, lengthscales: Array1<f64>, noise_variance: f64) -> Self {
        Hyperparameters {
            variance,
            lengthscales,
            noise_variance,
            warping: None,
        }
    }

    /// Set Kumaraswamy warping parameters
    pub fn with_warping(mut self, a: Array1<f64>, b: Array1<f64>) -> Self {
        self.warping = Some((a, b));
        self
    }

    /// Identity warping (a = b = 1) for every input dimension
    pub fn with_identity_warping(self) -> Self {
        let dim = self.dim();
        self.with_warping(Array1::ones(dim), Array1::ones(dim))
    }

    /// Input dimension
    pub fn dim(&self) -> usize {
        self.lengthscales.len()
    }

    /// Whether warping parameters are present
    pub fn is_warped(&self) -> bool {
        self.warping.is_some()
    }

    /// Length of the flattened vector for given input dimension
    pub fn flat_len(dim: usize, warped: bool) -> usize {
        if warped {
            3 * dim + 2
        } else {
            dim + 2
        }
    }

    /// Flattened hyperparameters
    pub fn to_array(&self) -> Array1<f64> {
        let dim = self.dim();
        let mut flat = Vec::with_capacity(Self::flat_len(dim, self.is_warped()));
        flat.push(self.variance);
        flat.extend(self.lengthscales.iter());
        flat.push(self.noise_variance);
        if let Some((a, b)) = &self.warping {
            for (ai, bi) in a.iter().zip(b.iter()) {
                flat.push(*ai);
                flat.push(*bi);
            }
        }
        Array1::from_vec(flat)
    }

    /// Rebuild hyperparameters from a flattened vector
    pub fn from_slice(dim: usize, warped: bool, values: &[f64]) -> Result<Self> {
        let expected = Self::flat_len(dim, warped);
        if values.len() != expected {
            return Err(GpError::InvalidValueError(format!(
                "Hyperparameter vector should have {} components (dim={}, warped={}), got {}",
                expected,
                dim,
                warped,
                values.len()
            )));
        }
        let hyp = Hyperparameters::new(
            values[0],
            ArrayView1::from(&values[1..dim + 1]).to_owned(),
            values[dim + 1],
        );
        if warped {
            let ab = &values[dim + 2..];
            let a = ab.iter().step_by(2).copied().collect::<Array1<_>>();
            let b = ab.iter().skip(1).step_by(2).copied().collect::<Array1<_>>();
            Ok(hyp.with_warping(a, b))
        } else {
            Ok(hyp)
        }
    }

    /// Check all values are finite and strictly positive
    pub fn check(&self) -> Result<()> {
        if self.to_array().iter().all(|v| v.is_finite() && *v > 0.) {
            Ok(())
        } else {
            Err(GpError::InvalidValueError(format!(
                "Hyperparameters should be finite and positive, got {self}"
            )))
        }
    }
}

impl fmt::Display for Hyperparameters {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "variance={}, lengthscales={}, noise_variance={}",
            self.variance, self.lengthscales, self.noise_variance
        )?;
        if let Some((a, b)) = &self.warping {
            write!(f, ", warping_a={a}, warping_b={b}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_flat_layout() {
        let hyp = Hyperparameters::new(1.5, array![0.1, 0.2], 1e-3);
        assert_eq!(hyp.to_array(), array![1.5, 0.1, 0.2, 1e-3]);
        let back = Hyperparameters::from_slice(2, false, &[1.5, 0.1, 0.2, 1e-3]).unwrap();
        assert_eq!(back, hyp);
    }

    #[test]
    fn test_warped_flat_layout() {
        let hyp = Hyperparameters::new(1.5, array![0.1, 0.2], 1e-3)
            .with_warping(array![2., 3.], array![4., 5.]);
        let flat = hyp.to_array();
        assert_eq!(flat, array![1.5, 0.1, 0.2, 1e-3, 2., 4., 3., 5.]);
        let back = Hyperparameters::from_slice(2, true, flat.as_slice().unwrap()).unwrap();
        assert_eq!(back, hyp);
    }

    #[test]
    fn test_bad_length() {
        assert!(Hyperparameters::from_slice(2, false, &[1., 2., 3.]).is_err());
        assert!(Hyperparameters::from_slice(1, true, &[1., 2., 3.]).is_err());
    }

    #[test]
    fn test_check() {
        assert!(Hyperparameters::new(1., array![1.], 0.1).check().is_ok());
        assert!(Hyperparameters::new(-1., array![1.], 0.1).check().is_err());
        assert!(Hyperparameters::new(1., array![f64::NAN], 0.1).check().is_err());
    }
}
