//! This library implements a GP surrogate for batch Bayesian optimization where
//! several acquisition functions are evaluated jointly at each candidate point,
//! as needed by multi-objective acquisition ensemble (MACE) strategies.
//!
//! A [MaceSurrogate] is built from training data and a [MaceConfig]:
//! * targets are standardized ([Standardizer]),
//! * a Matern 5/2 ARD GP (optionally with Kumaraswamy input warping) is fitted at its
//!   maximum a posteriori given log-normal priors on kernel variance and lengthscales
//!   and a gamma prior on noise variance ([adapter]),
//! * hyperparameters posterior is sampled with Hamiltonian Monte Carlo giving one GP
//!   per retained sample ([PosteriorSampleSet]), or reduced to the MAP estimate,
//! * at a query point every sample GP predicts ([EnsemblePredictor]) and
//!   lower confidence bound, expected improvement and probability of improvement
//!   are averaged over samples ([acquisition]).
//!
//! # Example
//!
//! ```no_run
//! use macebox_mace::{MaceConfig, MaceSurrogate};
//! use ndarray::{array, Array1, Axis};
//!
//! let x = Array1::linspace(0., 1., 6).insert_axis(Axis(1));
//! let y = x.column(0).mapv(|v: f64| (6. * v - 2.).powi(2) * (12. * v - 4.).sin());
//!
//! let config = MaceConfig::new(6, 20).seed(42);
//! let mace = MaceSurrogate::fit(&x, &y, config).expect("MACE surrogate");
//!
//! let acq = mace.mace_acq(&array![0.75]).expect("acquisition");
//! println!("LCB={} EI={} PI={}", acq.lcb, acq.ei, acq.pi);
//! ```
//!
//! Logging is done with the `log` crate, `MaceSurrogate::fit` sets up `env_logger`
//! with the log level given by the `MACEBOX_LOG` environment variable (default `info`).
#![warn(missing_docs)]
#![warn(rustdoc::broken_intra_doc_links)]
pub mod acquisition;
pub mod adapter;
mod config;
mod errors;
mod predictor;
mod sampler;
mod standardizer;
mod surrogate;

pub use acquisition::{get_quantiles, AcquisitionTriple};
pub use config::*;
pub use errors::*;
pub use predictor::*;
pub use sampler::*;
pub use standardizer::*;
pub use surrogate::*;
