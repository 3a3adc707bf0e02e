//! Prior distributions attached to GP hyperparameters.
//!
//! Priors regularize both the MAP optimization and the posterior sampling
//! of hyperparameters against degenerate solutions.
use libm::lgamma;
#[cfg(feature = "serializable")]
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt;

/// A prior over a strictly positive scalar hyperparameter
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serializable", derive(Serialize, Deserialize))]
pub enum Prior {
    /// Log-normal distribution: log(x) ~ Normal(mu, sigma^2)
    LogGaussian {
        /// mean of log(x)
        mu: f64,
        /// standard deviation of log(x)
        sigma: f64,
    },
    /// Gamma distribution with shape `a` and rate `b`
    Gamma {
        /// shape
        a: f64,
        /// rate
        b: f64,
    },
}

impl Prior {
    /// Log-normal prior constructor
    pub fn log_gaussian(mu: f64, sigma: f64) -> Self {
        Prior::LogGaussian { mu, sigma }
    }

    /// Gamma prior constructor given shape and rate
    pub fn gamma(a: f64, b: f64) -> Self {
        Prior::Gamma { a, b }
    }

    /// Gamma prior matching the given expected value `e` and variance `v`
    pub fn gamma_from_ev(e: f64, v: f64) -> Self {
        Prior::Gamma {
            a: e * e / v,
            b: e / v,
        }
    }

    /// Log density at `x`, -inf outside the support
    pub fn ln_pdf(&self, x: f64) -> f64 {
        if x <= 0. {
            return f64::NEG_INFINITY;
        }
        match *self {
            Prior::LogGaussian { mu, sigma } => {
                let lx = x.ln();
                -lx - 0.5 * (2. * PI * sigma * sigma).ln() - (lx - mu).powi(2) / (2. * sigma * sigma)
            }
            Prior::Gamma { a, b } => a * b.ln() - lgamma(a) + (a - 1.) * x.ln() - b * x,
        }
    }

    /// Derivative of the log density wrt `x`
    pub fn d_ln_pdf(&self, x: f64) -> f64 {
        match *self {
            Prior::LogGaussian { mu, sigma } => -(1. + (x.ln() - mu) / (sigma * sigma)) / x,
            Prior::Gamma { a, b } => (a - 1.) / x - b,
        }
    }
}

impl fmt::Display for Prior {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Prior::LogGaussian { mu, sigma } => write!(f, "LogGaussian({mu}, {sigma})"),
            Prior::Gamma { a, b } => write!(f, "Gamma({a}, {b})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_gamma_from_ev() {
        let prior = Prior::gamma_from_ev(0.02, 4.);
        match prior {
            Prior::Gamma { a, b } => {
                assert_abs_diff_eq!(a, 1e-4, epsilon = 1e-15);
                assert_abs_diff_eq!(b, 5e-3, epsilon = 1e-15);
                // moments are recovered
                assert_abs_diff_eq!(a / b, 0.02, epsilon = 1e-12);
                assert_abs_diff_eq!(a / (b * b), 4., epsilon = 1e-9);
            }
            _ => panic!("Gamma prior expected"),
        }
    }

    #[test]
    fn test_log_gaussian_ln_pdf() {
        // log-normal(0, 1) density at 1 is 1/sqrt(2pi)
        let prior = Prior::log_gaussian(0., 1.);
        assert_abs_diff_eq!(
            prior.ln_pdf(1.),
            -0.5 * (2. * PI).ln(),
            epsilon = 1e-12
        );
        assert_eq!(prior.ln_pdf(0.), f64::NEG_INFINITY);
        assert_eq!(prior.ln_pdf(-1.), f64::NEG_INFINITY);
    }

    #[test]
    fn test_gamma_ln_pdf() {
        // Gamma(1, 2) is exponential with rate 2
        let prior = Prior::gamma(1., 2.);
        assert_abs_diff_eq!(prior.ln_pdf(0.5), 2f64.ln() - 1., epsilon = 1e-12);
    }

    #[test]
    fn test_d_ln_pdf() {
        let h = 1e-6;
        for prior in [Prior::log_gaussian(0.3, 1.5), Prior::gamma(2.5, 0.7)] {
            for x in [0.1, 0.8, 3.] {
                let fd = (prior.ln_pdf(x + h) - prior.ln_pdf(x - h)) / (2. * h);
                assert_abs_diff_eq!(prior.d_ln_pdf(x), fd, epsilon = 1e-5);
            }
        }
    }
}
