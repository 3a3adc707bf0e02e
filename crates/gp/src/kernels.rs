//! A module for stationary covariance kernels with automatic relevance determination,
//! i.e. one lengthscale per input dimension.
//!
//! The following kernels are implemented:
//! * matern 5/2.

use ndarray::{Array1, Array2, ArrayBase, Axis, Data, Ix1, Ix2, Zip};
#[cfg(feature = "serializable")]
use serde::{Deserialize, Serialize};
use std::convert::TryFrom;
use std::fmt;

const SQRT5: f64 = 2.23606797749979;

/// A trait for using a covariance kernel in GP regression
pub trait Kernel: Clone + Copy + Default + fmt::Display + Sync + Send {
    /// Compute covariance values k(x, x') given componentwise differences `d` between x and x', where:
    /// `d`           : differences (n, nx)
    /// `variance`    : kernel variance (signal amplitude)
    /// `lengthscales`: ARD lengthscales (nx,)
    /// Returns a (n,) vector
    fn value(
        &self,
        d: &ArrayBase<impl Data<Elem = f64>, Ix2>,
        variance: f64,
        lengthscales: &ArrayBase<impl Data<Elem = f64>, Ix1>,
    ) -> Array1<f64>;

    /// Compute derivatives of k(x, x') wrt each lengthscale component given
    /// componentwise differences `d` (n, nx). Returns a (n, nx) matrix.
    fn lengthscale_gradients(
        &self,
        d: &ArrayBase<impl Data<Elem = f64>, Ix2>,
        variance: f64,
        lengthscales: &ArrayBase<impl Data<Elem = f64>, Ix1>,
    ) -> Array2<f64>;
}

/// Matern 5/2 kernel
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(
    feature = "serializable",
    derive(Serialize, Deserialize),
    serde(into = "String"),
    serde(try_from = "String")
)]
pub struct Matern52Kernel();

impl From<Matern52Kernel> for String {
    fn from(_item: Matern52Kernel) -> String {
        "Matern52".to_string()
    }
}

impl TryFrom<String> for Matern52Kernel {
    type Error = &'static str;
    fn try_from(s: String) -> Result<Self, Self::Error> {
        if s == "Matern52" {
            Ok(Self::default())
        } else {
            Err("Bad string value for Matern52Kernel, should be \'Matern52\'")
        }
    }
}

impl Matern52Kernel {
    /// Scaled distances r = sqrt(sum_j (d_j / l_j)^2) for each row of `d`
    fn scaled_distances(
        d: &ArrayBase<impl Data<Elem = f64>, Ix2>,
        lengthscales: &ArrayBase<impl Data<Elem = f64>, Ix1>,
    ) -> Array1<f64> {
        (d / lengthscales)
            .mapv(|v| v * v)
            .sum_axis(Axis(1))
            .mapv(f64::sqrt)
    }
}

impl Kernel for Matern52Kernel {
    ///  variance * (1 + sqrt(5) * r + 5/3 * r^2) * exp(-sqrt(5) * r)
    ///  with r^2 = sum_j (d_j / l_j)^2
    fn value(
        &self,
        d: &ArrayBase<impl Data<Elem = f64>, Ix2>,
        variance: f64,
        lengthscales: &ArrayBase<impl Data<Elem = f64>, Ix1>,
    ) -> Array1<f64> {
        Self::scaled_distances(d, lengthscales)
            .mapv(|r| variance * (1. + SQRT5 * r + 5. / 3. * r * r) * (-SQRT5 * r).exp())
    }

    ///  dk/dl_j = variance * 5/3 * (1 + sqrt(5) * r) * exp(-sqrt(5) * r) * d_j^2 / l_j^3
    fn lengthscale_gradients(
        &self,
        d: &ArrayBase<impl Data<Elem = f64>, Ix2>,
        variance: f64,
        lengthscales: &ArrayBase<impl Data<Elem = f64>, Ix1>,
    ) -> Array2<f64> {
        let r = Self::scaled_distances(d, lengthscales);
        let l3 = lengthscales.mapv(|l| l * l * l);
        let mut grads = d.mapv(|v| v * v) / &l3;
        Zip::from(grads.rows_mut()).and(&r).for_each(|mut row, &ri| {
            let factor = variance * 5. / 3. * (1. + SQRT5 * ri) * (-SQRT5 * ri).exp();
            row.mapv_inplace(|v| v * factor);
        });
        grads
    }
}

impl fmt::Display for Matern52Kernel {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Matern52")
    }
}
