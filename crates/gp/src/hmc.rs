use crate::errors::{GpError, Result};
use crate::posterior::LogPosterior;

use log::{debug, trace};
use ndarray::{Array1, Array2};
use ndarray_rand::rand::Rng;
use ndarray_rand::rand_distr::StandardNormal;
use ndarray_rand::RandomExt;
use rand_xoshiro::Xoshiro256Plus;

/// Hamiltonian Monte Carlo sampler of a model hyperparameters
///
/// Plain HMC with unit mass matrix and fixed step size: for each draw a momentum
/// `p ~ N(0, I)` is drawn, the Hamiltonian `H = objective + p.p / 2` is integrated with
/// `n_steps` leapfrog steps then the proposal is accepted with probability `exp(H_old - H_new)`.
/// On rejection the model is moved back to its previous state.
///
/// The model is left at the last state of the chain, so that successive calls
/// to [`Hmc::sample`] continue the same chain.
pub struct Hmc<'a, M: LogPosterior> {
    model: &'a mut M,
    stepsize: f64,
    n_steps: usize,
    rng: Xoshiro256Plus,
    proposed: usize,
    accepted: usize,
}

impl<'a, M: LogPosterior> Hmc<'a, M> {
    /// Constructor given the model to sample, leapfrog step size and number of steps
    pub fn new(model: &'a mut M, stepsize: f64, n_steps: usize, rng: Xoshiro256Plus) -> Self {
        Hmc {
            model,
            stepsize,
            n_steps,
            rng,
            proposed: 0,
            accepted: 0,
        }
    }

    /// Draw `num_samples` successive states of the chain.
    ///
    /// Returns a (num_samples, n_params) matrix of hyperparameters in their natural space.
    pub fn sample(&mut self, num_samples: usize) -> Result<Array2<f64>> {
        let n_params = self.model.n_params();
        let mut samples = Array2::zeros((num_samples, n_params));

        for mut row in samples.rows_mut() {
            let mut p = Array1::<f64>::random_using(n_params, StandardNormal, &mut self.rng);
            let h_old = self.hamiltonian(&p)?;
            let theta_old = self.model.optimizer_array();

            self.leapfrog(&mut p)?;
            let h_new = self.hamiltonian(&p)?;
            let k = if h_old > h_new {
                1.
            } else {
                (h_old - h_new).exp()
            };
            self.proposed += 1;
            if self.rng.gen::<f64>() < k {
                self.accepted += 1;
                trace!("HMC accepted proposal H={h_new}");
            } else {
                self.model.set_optimizer_array(&theta_old.to_vec()).map_err(|err| {
                    GpError::SamplerError(format!("cannot restore previous state: {err}"))
                })?;
            }
            row.assign(&self.model.param_array());
        }
        debug!(
            "HMC drew {} samples, acceptance rate={:.3}",
            num_samples,
            self.acceptance_rate()
        );
        Ok(samples)
    }

    /// Ratio of accepted proposals since the sampler creation
    pub fn acceptance_rate(&self) -> f64 {
        if self.proposed == 0 {
            0.
        } else {
            self.accepted as f64 / self.proposed as f64
        }
    }

    fn hamiltonian(&self, p: &Array1<f64>) -> Result<f64> {
        let h = self.model.objective() + 0.5 * p.dot(p);
        if h.is_finite() {
            Ok(h)
        } else {
            Err(GpError::SamplerError(format!("non finite Hamiltonian H={h}")))
        }
    }

    fn gradient(&self) -> Result<Array1<f64>> {
        let grad = self
            .model
            .objective_grad()
            .map_err(|err| GpError::SamplerError(format!("gradient failure: {err}")))?;
        if grad.iter().all(|g| g.is_finite()) {
            Ok(grad)
        } else {
            Err(GpError::SamplerError(format!(
                "non finite objective gradient {grad}"
            )))
        }
    }

    fn leapfrog(&mut self, p: &mut Array1<f64>) -> Result<()> {
        for _ in 0..self.n_steps {
            p.scaled_add(-0.5 * self.stepsize, &self.gradient()?);
            let theta = self.model.optimizer_array() + &(&*p * self.stepsize);
            self.model
                .set_optimizer_array(&theta.to_vec())
                .map_err(|err| GpError::SamplerError(format!("leapfrog step failure: {err}")))?;
            p.scaled_add(-0.5 * self.stepsize, &self.gradient()?);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::{array, Axis};
    use rand_xoshiro::rand_core::SeedableRng;

    /// Independent gaussian N(mu, 1) in every component with identity transform
    struct Gaussian {
        mu: Array1<f64>,
        theta: Array1<f64>,
    }

    impl LogPosterior for Gaussian {
        fn n_params(&self) -> usize {
            self.mu.len()
        }
        fn param_array(&self) -> Array1<f64> {
            self.theta.clone()
        }
        fn optimizer_array(&self) -> Array1<f64> {
            self.theta.clone()
        }
        fn set_optimizer_array(&mut self, f: &[f64]) -> Result<()> {
            self.theta = Array1::from(f.to_vec());
            Ok(())
        }
        fn objective(&self) -> f64 {
            0.5 * (&self.theta - &self.mu).mapv(|v| v * v).sum()
        }
        fn objective_grad(&self) -> Result<Array1<f64>> {
            Ok(&self.theta - &self.mu)
        }
    }

    fn gaussian() -> Gaussian {
        Gaussian {
            mu: array![1., -2.],
            theta: array![0., 0.],
        }
    }

    #[test]
    fn test_hmc_samples_shape() {
        let mut model = gaussian();
        let mut hmc = Hmc::new(&mut model, 0.1, 10, Xoshiro256Plus::seed_from_u64(42));
        let samples = hmc.sample(7).unwrap();
        assert_eq!(samples.dim(), (7, 2));
        assert!(hmc.acceptance_rate() > 0.);
    }

    #[test]
    fn test_hmc_is_reproducible() {
        let mut model1 = gaussian();
        let s1 = Hmc::new(&mut model1, 0.1, 10, Xoshiro256Plus::seed_from_u64(0))
            .sample(20)
            .unwrap();
        let mut model2 = gaussian();
        let s2 = Hmc::new(&mut model2, 0.1, 10, Xoshiro256Plus::seed_from_u64(0))
            .sample(20)
            .unwrap();
        assert_eq!(s1, s2);
        assert_eq!(model1.theta, model2.theta);
    }

    #[test]
    fn test_hmc_gaussian_moments() {
        let mut model = gaussian();
        let mut hmc = Hmc::new(&mut model, 0.2, 10, Xoshiro256Plus::seed_from_u64(7));
        hmc.sample(100).unwrap();
        let samples = hmc.sample(2000).unwrap();
        let mean = samples.mean_axis(Axis(0)).unwrap();
        assert_abs_diff_eq!(mean, array![1., -2.], epsilon = 0.15);
        let var = samples.var_axis(Axis(0), 0.);
        assert_abs_diff_eq!(var, array![1., 1.], epsilon = 0.25);
        // leapfrog with small steps is nearly exact
        assert!(hmc.acceptance_rate() > 0.9);
    }

    struct Broken;

    impl LogPosterior for Broken {
        fn n_params(&self) -> usize {
            1
        }
        fn param_array(&self) -> Array1<f64> {
            array![0.]
        }
        fn optimizer_array(&self) -> Array1<f64> {
            array![0.]
        }
        fn set_optimizer_array(&mut self, _f: &[f64]) -> Result<()> {
            Ok(())
        }
        fn objective(&self) -> f64 {
            f64::NAN
        }
        fn objective_grad(&self) -> Result<Array1<f64>> {
            Ok(array![0.])
        }
    }

    #[test]
    fn test_hmc_non_finite_hamiltonian() {
        let mut model = Broken;
        let res = Hmc::new(&mut model, 0.1, 5, Xoshiro256Plus::seed_from_u64(0)).sample(3);
        assert!(matches!(res, Err(GpError::SamplerError(_))));
    }
}
