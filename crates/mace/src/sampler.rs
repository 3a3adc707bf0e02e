//! Hyperparameters posterior samples and their fitted GP models.
use crate::adapter::MaceGp;
use crate::config::ValidMaceConfig;
use crate::errors::Result;
use log::{debug, info};
use macebox_gp::{Hmc, LogPosterior};
use ndarray::{s, Array2, Axis};
use ndarray_rand::rand::SeedableRng;
use rand_xoshiro::Xoshiro256Plus;

/// Hyperparameters samples (M, P) and one GP per sample
#[derive(Debug, Clone)]
pub struct PosteriorSampleSet {
    samples: Array2<f64>,
    models: Vec<MaceGp>,
}

impl PosteriorSampleSet {
    /// Sample hyperparameters posterior starting from the MAP model.
    ///
    /// With `mcmc` on, an HMC chain is run from the MAP state: `burnin` draws are discarded
    /// then one of every `subsample_interval` draws is kept until `n_samples` are retained.
    /// Otherwise the MAP hyperparameters are the only sample.
    /// The MAP model is left untouched.
    pub fn sample(map_model: &MaceGp, config: &ValidMaceConfig) -> Result<Self> {
        let samples = if config.mcmc() {
            let rng = match config.seed() {
                Some(seed) => Xoshiro256Plus::seed_from_u64(seed),
                None => Xoshiro256Plus::from_entropy(),
            };
            let mut chain = map_model.clone();
            let mut hmc = Hmc::new(&mut chain, config.stepsize(), config.leapfrog_steps(), rng);
            hmc.sample(config.burnin())?;
            debug!("HMC burn-in done ({} draws)", config.burnin());
            let interval = config.subsample_interval();
            let draws = hmc.sample(config.n_samples() * interval)?;
            info!(
                "HMC sampling done, acceptance rate={:.3}",
                hmc.acceptance_rate()
            );
            draws.slice(s![..;interval, ..]).to_owned()
        } else {
            map_model.param_array().insert_axis(Axis(0))
        };
        let models = samples
            .rows()
            .into_iter()
            .map(|hyp| map_model.with_param_array(&hyp.to_vec()))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(PosteriorSampleSet { samples, models })
    }

    /// Hyperparameters samples, one row per sample
    pub fn samples(&self) -> &Array2<f64> {
        &self.samples
    }

    /// GP models, one per sample in samples order
    pub fn models(&self) -> &[MaceGp] {
        &self.models
    }

    /// Number of samples
    pub fn len(&self) -> usize {
        self.models.len()
    }

    /// Whether there is no sample
    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::fit_map;
    use crate::config::MaceConfig;
    use approx::assert_abs_diff_eq;
    use linfa::ParamGuard;
    use ndarray::array;

    fn map_model(config: &ValidMaceConfig) -> MaceGp {
        let x = array![[0.], [0.5], [1.], [2.], [3.]];
        let y = array![-1., -0.2, 1., 0.5, -0.3];
        fit_map(&x, &y, config).unwrap()
    }

    #[test]
    fn test_map_mode_single_sample() {
        let config = MaceConfig::new(5, 10).mcmc(false).check().unwrap();
        let map = map_model(&config);
        let set = PosteriorSampleSet::sample(&map, &config).unwrap();
        assert_eq!(set.len(), 1);
        assert_eq!(set.samples().row(0), map.param_array());
        assert_eq!(set.models()[0].param_array(), map.param_array());
    }

    #[test]
    fn test_mcmc_mode_sample_count() {
        let config = MaceConfig::new(5, 10)
            .burnin(10)
            .n_samples(4)
            .subsample_interval(3)
            .seed(42)
            .check()
            .unwrap();
        let map = map_model(&config);
        let map_params = map.param_array();
        let set = PosteriorSampleSet::sample(&map, &config).unwrap();
        assert_eq!(set.samples().dim(), (4, 3));
        assert_eq!(set.len(), 4);
        for (hyp, model) in set.samples().rows().into_iter().zip(set.models()) {
            let model_params = model.param_array();
            assert_abs_diff_eq!(hyp, model_params.view(), epsilon = 1e-12);
            assert!(hyp.iter().all(|v| v.is_finite() && *v > 0.));
        }
        assert_eq!(map.param_array(), map_params);
    }

    #[test]
    fn test_mcmc_seeded_reproducibility() {
        let config = MaceConfig::new(5, 10)
            .burnin(5)
            .n_samples(3)
            .subsample_interval(2)
            .seed(7)
            .check()
            .unwrap();
        let map = map_model(&config);
        let s1 = PosteriorSampleSet::sample(&map, &config).unwrap();
        let s2 = PosteriorSampleSet::sample(&map, &config).unwrap();
        assert_eq!(s1.samples(), s2.samples());
    }
}
