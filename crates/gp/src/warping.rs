//! Input warping with Kumaraswamy cumulative distribution functions.
//!
//! Each input dimension is first mapped to the unit interval using training bounds
//! then warped with `w(x) = 1 - (1 - x^a)^b`, one pair `(a, b)` per dimension.
//! `a = b = 1` is the identity warp.
use ndarray::{Array1, Array2, ArrayBase, Axis, Data, Ix1, Ix2, Zip};
#[cfg(feature = "serializable")]
use serde::{Deserialize, Serialize};

/// Default margin added around training bounds
pub const KUMAR_EPSILON: f64 = 1e-6;

/// Kumaraswamy warping of inputs
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serializable", derive(Serialize, Deserialize))]
pub struct KumarWarping {
    /// lower bounds of inputs (training minimum minus epsilon)
    xmin: Array1<f64>,
    /// upper bounds of inputs (training maximum plus epsilon)
    xmax: Array1<f64>,
}

impl KumarWarping {
    /// Build warping bounds from training inputs (n, nx)
    pub fn new(x: &ArrayBase<impl Data<Elem = f64>, Ix2>) -> Self {
        let xmin = x.fold_axis(Axis(0), f64::INFINITY, |m, &v| m.min(v)) - KUMAR_EPSILON;
        let xmax = x.fold_axis(Axis(0), f64::NEG_INFINITY, |m, &v| m.max(v)) + KUMAR_EPSILON;
        KumarWarping { xmin, xmax }
    }

    /// Input dimension
    pub fn dim(&self) -> usize {
        self.xmin.len()
    }

    /// Map inputs to the unit cube, points outside training bounds are clipped
    pub fn normalize(&self, x: &ArrayBase<impl Data<Elem = f64>, Ix2>) -> Array2<f64> {
        let xnorm = (x - &self.xmin) / (&self.xmax - &self.xmin);
        xnorm.mapv(|v| v.clamp(0., 1.))
    }

    /// Warp inputs given `a` and `b` parameter vectors (nx,)
    pub fn warp(
        &self,
        x: &ArrayBase<impl Data<Elem = f64>, Ix2>,
        a: &ArrayBase<impl Data<Elem = f64>, Ix1>,
        b: &ArrayBase<impl Data<Elem = f64>, Ix1>,
    ) -> Array2<f64> {
        let mut xw = self.normalize(x);
        Zip::from(xw.columns_mut())
            .and(a)
            .and(b)
            .for_each(|mut col, &ai, &bi| {
                col.mapv_inplace(|v| 1. - (1. - v.powf(ai)).powf(bi));
            });
        xw
    }
}
