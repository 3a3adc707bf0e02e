use thiserror::Error;

/// A result type for MACE surrogate errors
pub type Result<T> = std::result::Result<T, MaceError>;

/// An error when building or querying a [`MaceSurrogate`](crate::MaceSurrogate)
#[derive(Error, Debug)]
pub enum MaceError {
    /// When configuration is invalid
    #[error("Invalid configuration: {0}")]
    InvalidConfigError(String),
    /// When training targets cannot be standardized
    #[error("Degenerate data: {0}")]
    DegenerateData(String),
    /// When an invalid value is encountered
    #[error("Value error: {0}")]
    InvalidValue(String),
    /// When GP fitting, sampling or prediction fails
    #[error("GP error: {0}")]
    GpError(#[from] macebox_gp::GpError),
    /// When configuration (de)serialization fails
    #[error("Json error: {0}")]
    JsonError(#[from] serde_json::Error),
}
