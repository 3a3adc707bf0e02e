use thiserror::Error;

/// A result type for GP regression algorithm
pub type Result<T> = std::result::Result<T, GpError>;

/// An error when using [`GaussianProcess`](crate::GaussianProcess) or the [`Hmc`](crate::Hmc) sampler
#[derive(Error, Debug)]
pub enum GpError {
    /// When likelihood computation fails
    #[error("LikelihoodComputation computation error: {0}")]
    LikelihoodComputationError(String),
    /// When linear algebra computation fails
    #[error(transparent)]
    LinalgError(#[from] linfa_linalg::LinalgError),
    /// When a linfa error occurs
    #[error(transparent)]
    LinfaError(#[from] linfa::error::Error),
    /// When error due to a bad value
    #[error("InvalidValue error: {0}")]
    InvalidValueError(String),
    /// When the hamiltonian monte carlo chain hits a non finite state
    #[error("Sampler error: {0}")]
    SamplerError(String),
    /// When saving fails
    #[cfg(feature = "persistent")]
    #[error("Save error: {0}")]
    SaveError(#[from] serde_json::Error),
    /// When error during loading
    #[cfg(feature = "persistent")]
    #[error("Load IO error")]
    LoadIoError(#[from] std::io::Error),
}
