//! This library implements [Gaussian Process](https://en.wikipedia.org/wiki/Gaussian_process) regression
//! with a zero mean function and a stationary ARD kernel (Matern 5/2), built to be used within
//! Bayesian optimization loops where hyperparameters are either set at their maximum a posteriori
//! or sampled from their posterior distribution.
//!
//! GP models are implemented by [GaussianProcess] parameterized by [GpParams]:
//! * per-hyperparameter priors ([Prior]) and bounded transforms ([Transform]),
//! * optional Kumaraswamy input warping ([KumarWarping]),
//! * MAP fit with the COBYLA optimizer.
//!
//! Hyperparameters posterior is exposed through the [LogPosterior] trait and
//! can be sampled with the [Hmc] sampler.
//!
//! # Example
//!
//! ```no_run
//! use macebox_gp::{GaussianProcess, Hmc, LogPosterior, Matern52Kernel, Prior};
//! use linfa::prelude::*;
//! use ndarray::{arr1, arr2};
//! use rand_xoshiro::{rand_core::SeedableRng, Xoshiro256Plus};
//!
//! let xt = arr2(&[[0.0], [1.0], [2.0], [3.0], [4.0]]);
//! let yt = arr1(&[0.0, 1.0, 1.5, 0.9, 1.0]);
//!
//! let mut gp = GaussianProcess::params(Matern52Kernel())
//!     .noise_prior(Prior::gamma_from_ev(0.02, 4.))
//!     .fit(&Dataset::new(xt, yt))
//!     .expect("GP fitted");
//!
//! let mut hmc = Hmc::new(&mut gp, 0.05, 20, Xoshiro256Plus::seed_from_u64(42));
//! let samples = hmc.sample(100).expect("HMC samples");
//! ```
#![warn(missing_docs)]
#![warn(rustdoc::broken_intra_doc_links)]
mod algorithm;
mod errors;
mod hmc;
mod hyperparameters;
pub mod kernels;
mod optimization;
mod parameters;
mod posterior;
mod priors;
mod transforms;
mod utils;
mod warping;

pub use algorithm::*;
pub use errors::*;
pub use hmc::*;
pub use hyperparameters::*;
pub use kernels::{Kernel, Matern52Kernel};
pub use parameters::*;
pub use posterior::*;
pub use priors::*;
pub use transforms::*;
pub use utils::{column_std, pairwise_differences};
pub use warping::*;
