use crate::errors::Result;
use ndarray::Array1;

/// A model whose hyperparameters follow a posterior distribution
/// known up to a constant, exposed in an unconstrained space.
///
/// The objective is the negative log posterior: samplers and optimizers minimize it.
pub trait LogPosterior {
    /// Number of hyperparameters
    fn n_params(&self) -> usize;

    /// Current hyperparameters in their natural (constrained) space
    fn param_array(&self) -> Array1<f64>;

    /// Current hyperparameters in the unconstrained space
    fn optimizer_array(&self) -> Array1<f64>;

    /// Move the model to the given unconstrained hyperparameters
    fn set_optimizer_array(&mut self, f: &[f64]) -> Result<()>;

    /// Negative log posterior at current hyperparameters
    fn objective(&self) -> f64;

    /// Gradient of [`LogPosterior::objective`] wrt unconstrained hyperparameters
    fn objective_grad(&self) -> Result<Array1<f64>>;
}
