//! Constraint transforms between hyperparameter values and the unconstrained
//! space where optimization and HMC sampling take place.
#[cfg(feature = "serializable")]
use serde::{Deserialize, Serialize};

/// Largest exponent handled without overflow when mapping back to values
const MAX_EXP: f64 = 700.;

/// A bijection from an unconstrained real `f` to a constrained value `x`
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serializable", derive(Serialize, Deserialize))]
pub enum Transform {
    /// x = exp(f), x in (0, inf)
    Log,
    /// x = lower + (upper - lower) / (1 + exp(-f)), x in (lower, upper)
    Logistic {
        /// lower bound
        lower: f64,
        /// upper bound
        upper: f64,
    },
}

fn sigmoid(f: f64) -> f64 {
    if f >= 0. {
        1. / (1. + (-f).exp())
    } else {
        let e = f.exp();
        e / (1. + e)
    }
}

/// log(sigmoid(f)) computed without underflow
fn ln_sigmoid(f: f64) -> f64 {
    if f >= 0. {
        -(-f).exp().ln_1p()
    } else {
        f - f.exp().ln_1p()
    }
}

impl Transform {
    /// Bounded transform constructor
    pub fn logistic(lower: f64, upper: f64) -> Self {
        Transform::Logistic { lower, upper }
    }

    /// Unconstrained value `f` to constrained value `x`
    pub fn value(&self, f: f64) -> f64 {
        match *self {
            Transform::Log => f.min(MAX_EXP).exp(),
            Transform::Logistic { lower, upper } => lower + (upper - lower) * sigmoid(f),
        }
    }

    /// Constrained value `x` to unconstrained value `f`
    pub fn inverse(&self, x: f64) -> f64 {
        match *self {
            Transform::Log => x.ln(),
            Transform::Logistic { lower, upper } => {
                let p = (x - lower) / (upper - lower);
                p.ln() - (-p).ln_1p()
            }
        }
    }

    /// Derivative dx/df
    pub fn gradfactor(&self, f: f64) -> f64 {
        match *self {
            Transform::Log => self.value(f),
            Transform::Logistic { lower, upper } => {
                let s = sigmoid(f);
                (upper - lower) * s * (1. - s)
            }
        }
    }

    /// log |dx/df|, the log jacobian added to the log density in the unconstrained space
    pub fn ln_jacobian(&self, f: f64) -> f64 {
        match *self {
            Transform::Log => f.min(MAX_EXP),
            Transform::Logistic { lower, upper } => {
                (upper - lower).ln() + ln_sigmoid(f) + ln_sigmoid(-f)
            }
        }
    }

    /// Derivative of log |dx/df| wrt f
    pub fn d_ln_jacobian(&self, f: f64) -> f64 {
        match *self {
            Transform::Log => 1.,
            Transform::Logistic { .. } => 1. - 2. * sigmoid(f),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_log_transform_roundtrip() {
        let t = Transform::Log;
        for x in [1e-8, 0.3, 1., 42.] {
            assert_abs_diff_eq!(t.value(t.inverse(x)), x, epsilon = 1e-12 * x.max(1.));
        }
    }

    #[test]
    fn test_logistic_transform_stays_within_bounds() {
        let t = Transform::logistic(1e-20, 1e10);
        for f in [-80., -30., 0., 30., 80.] {
            let x = t.value(f);
            assert!(x >= 1e-20 && x <= 1e10, "x={x} out of bounds for f={f}");
        }
        let x = 0.01;
        assert_abs_diff_eq!(t.value(t.inverse(x)), x, epsilon = 1e-9);
    }

    #[test]
    fn test_jacobians() {
        let h = 1e-6;
        for t in [Transform::Log, Transform::logistic(0., 10.)] {
            for f in [-2., 0.1, 1.5] {
                let fd = (t.value(f + h) - t.value(f - h)) / (2. * h);
                assert_abs_diff_eq!(t.gradfactor(f), fd, epsilon = 1e-5);
                assert_abs_diff_eq!(t.ln_jacobian(f), t.gradfactor(f).ln(), epsilon = 1e-10);
                let fd = (t.ln_jacobian(f + h) - t.ln_jacobian(f - h)) / (2. * h);
                assert_abs_diff_eq!(t.d_ln_jacobian(f), fd, epsilon = 1e-5);
            }
        }
    }
}
