//! Gibbs sampler for the Sharpe ratio under a Student-t likelihood.
//!
//! The Student-t likelihood is represented as a scale mixture of normals:
//!
//! ```text
//! r_i | mu, sigma², λ_i ~ N(mu, sigma² / λ_i)
//! λ_i                   ~ Gamma(ν/2, rate = ν/2)
//! mu                    ~ N(mu0, tau2)
//! sigma²                ~ InvGamma(a0, b0)
//! ```
//!
//! Each iteration draws, in this order:
//! 1. λ_i | mu, sigma²   ~ Gamma((ν+1)/2, rate = (ν + (r_i - mu)²/sigma²)/2)
//! 2. mu | λ, sigma²     ~ N(mu_n, tau2_n)
//! 3. sigma² | λ, mu     ~ InvGamma(a0 + n/2, b0 + ½ Σ λ_i (r_i - mu)²)
//!
//! and records `mu / sqrt(sigma²)` as the Sharpe draw. One iteration consumes
//! exactly n gamma draws, one normal draw and one gamma draw (the inverse-gamma
//! is taken as the reciprocal of a gamma), independent of burn-in.

use crate::error::AnalyticsError;
use crate::stats;
use core_types::{Hyperparameters, PosteriorDraw, PosteriorSamples};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Gamma, Normal};

/// Runs single-chain Gibbs sampling for validated hyperparameters.
#[derive(Debug, Clone)]
pub struct GibbsSampler {
    hyperparameters: Hyperparameters,
}

/// The current position of the Markov chain.
#[derive(Debug, Clone)]
struct ChainState {
    mu: f64,
    sigma2: f64,
    /// One mixing weight per observation.
    latent: Vec<f64>,
}

impl GibbsSampler {
    /// Validates the hyperparameters and builds a sampler.
    pub fn new(hyperparameters: Hyperparameters) -> Result<Self, AnalyticsError> {
        hyperparameters.validate()?;
        Ok(Self { hyperparameters })
    }

    pub fn hyperparameters(&self) -> &Hyperparameters {
        &self.hyperparameters
    }

    /// Runs the chain on a fresh generator seeded from `hyperparameters.seed`.
    pub fn sample(&self, returns: &[f64]) -> Result<PosteriorSamples, AnalyticsError> {
        let mut rng = StdRng::seed_from_u64(self.hyperparameters.seed);
        self.sample_with_rng(returns, &mut rng)
    }

    /// Runs the chain on a caller-owned generator.
    ///
    /// The seed in the hyperparameters is ignored. The generator is advanced by
    /// `n_iter * (returns.len() + 2)` distribution draws.
    #[tracing::instrument(
        name = "gibbs_sample",
        skip_all,
        fields(
            n = returns.len(),
            n_iter = self.hyperparameters.n_iter,
            burn_in = self.hyperparameters.burn_in
        )
    )]
    pub fn sample_with_rng<R: Rng + ?Sized>(
        &self,
        returns: &[f64],
        rng: &mut R,
    ) -> Result<PosteriorSamples, AnalyticsError> {
        let h = &self.hyperparameters;
        let mut state = ChainState::initialize(returns)?;

        tracing::info!(
            initial_mu = state.mu,
            initial_sigma2 = state.sigma2,
            nu = h.nu,
            seed = h.seed,
            "Starting Gibbs sampler."
        );

        let mut samples = PosteriorSamples::with_capacity(h.kept_samples());

        for iteration in 0..h.n_iter {
            // The order matters: steps 2 and 3 read the latent vector drawn in step 1,
            // and step 3 reads the mean drawn in step 2.
            state.update_latent(returns, h.nu, rng, iteration)?;
            state.update_mu(returns, h.mu0, h.tau2, rng, iteration)?;
            state.update_sigma2(returns, h.a0, h.b0, rng, iteration)?;

            tracing::trace!(iteration, mu = state.mu, sigma2 = state.sigma2);

            if iteration >= h.burn_in {
                samples.push(PosteriorDraw {
                    mu: state.mu,
                    sigma2: state.sigma2,
                    sharpe: state.mu / state.sigma2.sqrt(),
                });
            }
        }

        tracing::info!(kept = samples.len(), "Gibbs sampler finished.");

        Ok(samples)
    }
}

/// Validates `hyperparameters` and samples the posterior of `returns` in one call.
pub fn estimate_sharpe(
    returns: &[f64],
    hyperparameters: &Hyperparameters,
) -> Result<PosteriorSamples, AnalyticsError> {
    GibbsSampler::new(hyperparameters.clone())?.sample(returns)
}

impl ChainState {
    /// Starts the chain at the sample mean and unbiased sample variance, with unit weights.
    fn initialize(returns: &[f64]) -> Result<Self, AnalyticsError> {
        if let Some(bad) = returns.iter().find(|r| !r.is_finite()) {
            return Err(AnalyticsError::InvalidData(format!(
                "returns must be finite, found {}",
                bad
            )));
        }

        let (Some(mu), Some(sigma2)) = (stats::mean(returns), stats::sample_variance(returns))
        else {
            return Err(AnalyticsError::NotEnoughData(format!(
                "at least 2 returns are required, got {}",
                returns.len()
            )));
        };

        if !sigma2.is_finite() {
            return Err(AnalyticsError::InvalidData(format!(
                "sample variance of returns overflows ({})",
                sigma2
            )));
        }

        // A constant series can still leave a tiny variance from rounding in the mean.
        // Anything within that noise floor counts as zero.
        let max_abs = returns.iter().fold(0.0_f64, |acc, r| acc.max(r.abs()));
        let noise_floor = returns.len() as f64 * f64::EPSILON * max_abs;
        if !(sigma2 > noise_floor * noise_floor) {
            return Err(AnalyticsError::InvalidData(format!(
                "returns have zero sample variance ({:e})",
                sigma2
            )));
        }

        Ok(Self {
            mu,
            sigma2,
            latent: vec![1.0; returns.len()],
        })
    }

    fn update_latent<R: Rng + ?Sized>(
        &mut self,
        returns: &[f64],
        nu: f64,
        rng: &mut R,
        iteration: usize,
    ) -> Result<(), AnalyticsError> {
        let shape = (nu + 1.0) / 2.0;

        for (weight, &r) in self.latent.iter_mut().zip(returns) {
            let residual = r - self.mu;
            // rate = (ν + r²/σ²)/2, so scale = 2 / (ν + r²/σ²)
            let scale = 2.0 / (nu + residual * residual / self.sigma2);
            let gamma = Gamma::new(shape, scale).map_err(|e| {
                degeneracy(
                    iteration,
                    format!("latent gamma(shape={}, scale={}): {}", shape, scale, e),
                )
            })?;
            *weight = gamma.sample(rng);
            if !(*weight > 0.0 && weight.is_finite()) {
                return Err(degeneracy(iteration, format!("latent weight drawn as {}", weight)));
            }
        }

        Ok(())
    }

    fn update_mu<R: Rng + ?Sized>(
        &mut self,
        returns: &[f64],
        mu0: f64,
        tau2: f64,
        rng: &mut R,
        iteration: usize,
    ) -> Result<(), AnalyticsError> {
        let latent_sum: f64 = self.latent.iter().sum();
        let weighted_sum: f64 = self.latent.iter().zip(returns).map(|(w, r)| w * r).sum();

        let tau2_n = 1.0 / (1.0 / tau2 + latent_sum / self.sigma2);
        let mu_n = tau2_n * (mu0 / tau2 + weighted_sum / self.sigma2);

        let normal = Normal::new(mu_n, tau2_n.sqrt()).map_err(|e| {
            degeneracy(
                iteration,
                format!("mean normal(mean={}, var={}): {}", mu_n, tau2_n, e),
            )
        })?;
        self.mu = normal.sample(rng);
        if !self.mu.is_finite() {
            return Err(degeneracy(iteration, format!("mu drawn as {}", self.mu)));
        }

        Ok(())
    }

    fn update_sigma2<R: Rng + ?Sized>(
        &mut self,
        returns: &[f64],
        a0: f64,
        b0: f64,
        rng: &mut R,
        iteration: usize,
    ) -> Result<(), AnalyticsError> {
        let a_n = a0 + returns.len() as f64 / 2.0;
        let b_n = b0
            + 0.5
                * self
                    .latent
                    .iter()
                    .zip(returns)
                    .map(|(w, r)| w * (r - self.mu) * (r - self.mu))
                    .sum::<f64>();

        // InvGamma(a, b) is the reciprocal of Gamma(a, scale = 1/b).
        let gamma = Gamma::new(a_n, 1.0 / b_n).map_err(|e| {
            degeneracy(
                iteration,
                format!("variance gamma(shape={}, rate={}): {}", a_n, b_n, e),
            )
        })?;
        self.sigma2 = 1.0 / gamma.sample(rng);
        if !(self.sigma2 > 0.0 && self.sigma2.is_finite()) {
            return Err(degeneracy(iteration, format!("sigma2 drawn as {}", self.sigma2)));
        }

        Ok(())
    }
}

fn degeneracy(iteration: usize, detail: String) -> AnalyticsError {
    AnalyticsError::NumericalDegeneracy { iteration, detail }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    const RETURNS: [f64; 5] = [0.01, 0.02, -0.01, 0.03, 0.00];

    fn short_run(seed: u64) -> Hyperparameters {
        Hyperparameters {
            n_iter: 200,
            burn_in: 20,
            seed,
            ..Default::default()
        }
    }

    #[test]
    fn chain_starts_at_sample_moments() {
        let state = ChainState::initialize(&RETURNS).unwrap();
        assert_abs_diff_eq!(state.mu, 0.01, epsilon = 1e-15);
        assert_abs_diff_eq!(state.sigma2, 2.5e-4, epsilon = 1e-15);
        assert_eq!(state.latent, vec![1.0; RETURNS.len()]);
    }

    #[test]
    fn single_return_is_not_enough() {
        let sampler = GibbsSampler::new(short_run(1)).unwrap();
        assert!(matches!(sampler.sample(&[0.01]), Err(AnalyticsError::NotEnoughData(_))));
        assert!(matches!(sampler.sample(&[]), Err(AnalyticsError::NotEnoughData(_))));
    }

    #[test]
    fn constant_or_non_finite_returns_are_rejected() {
        let sampler = GibbsSampler::new(short_run(1)).unwrap();
        for returns in [vec![0.01, 0.01, 0.01], vec![0.01, f64::NAN], vec![0.01, f64::INFINITY]] {
            assert!(
                matches!(sampler.sample(&returns), Err(AnalyticsError::InvalidData(_))),
                "{:?} should be rejected",
                returns
            );
        }
    }

    #[test]
    fn constant_series_with_rounding_noise_is_rejected() {
        // 0.1 is not exactly representable, so the mean of seven copies differs from
        // each element by one ulp and the computed variance is tiny but positive.
        for value in [0.1, 0.03, 1.0 / 3.0, -0.07] {
            let returns = [value; 7];
            assert!(
                matches!(ChainState::initialize(&returns), Err(AnalyticsError::InvalidData(_))),
                "constant series of {} should be rejected",
                value
            );
        }
    }

    #[test]
    fn small_but_real_spread_is_accepted() {
        let state = ChainState::initialize(&[1.0, 1.0 + 1e-9]).unwrap();
        assert!(state.sigma2 > 0.0);
    }

    #[test]
    fn overflowing_variance_is_rejected_before_sampling() {
        let h = short_run(1);
        assert!(matches!(
            estimate_sharpe(&[1e200, -1e200], &h),
            Err(AnalyticsError::InvalidData(_))
        ));
    }

    #[test]
    fn latent_update_reports_degenerate_variance() {
        let returns = [0.01, -0.01];
        let mut state = ChainState { mu: 0.0, sigma2: 0.0, latent: vec![1.0; 2] };
        let mut rng = StdRng::seed_from_u64(1);

        match state.update_latent(&returns, 3.0, &mut rng, 3) {
            Err(AnalyticsError::NumericalDegeneracy { iteration, detail }) => {
                assert_eq!(iteration, 3);
                assert!(detail.contains("latent gamma"), "unexpected detail: {}", detail);
            }
            other => panic!("expected a numerical degeneracy, got {:?}", other),
        }
    }

    #[test]
    fn variance_update_reports_overflowing_scale() {
        let returns = [1e200, -1e200];
        let mut state = ChainState { mu: 0.0, sigma2: 1.0, latent: vec![1.0; 2] };
        let mut rng = StdRng::seed_from_u64(1);

        match state.update_sigma2(&returns, 2.0, 2.0, &mut rng, 0) {
            Err(AnalyticsError::NumericalDegeneracy { iteration, detail }) => {
                assert_eq!(iteration, 0);
                assert!(detail.contains("variance gamma"), "unexpected detail: {}", detail);
            }
            other => panic!("expected a numerical degeneracy, got {:?}", other),
        }
    }

    #[test]
    fn invalid_hyperparameters_fail_before_sampling() {
        let h = Hyperparameters { tau2: -1.0, ..Default::default() };
        assert!(matches!(GibbsSampler::new(h), Err(AnalyticsError::InvalidInput(_))));

        let h = Hyperparameters { n_iter: 10, burn_in: 10, ..Default::default() };
        assert!(matches!(estimate_sharpe(&RETURNS, &h), Err(AnalyticsError::InvalidInput(_))));
    }

    #[test]
    fn latent_weights_stay_positive() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut state = ChainState::initialize(&RETURNS).unwrap();
        for iteration in 0..50 {
            state.update_latent(&RETURNS, 3.0, &mut rng, iteration).unwrap();
            assert_eq!(state.latent.len(), RETURNS.len());
            assert!(state.latent.iter().all(|&w| w > 0.0));
        }
    }

    #[test]
    fn seeded_run_matches_run_on_equally_seeded_generator() {
        let sampler = GibbsSampler::new(short_run(11)).unwrap();
        let seeded = sampler.sample(&RETURNS).unwrap();

        let mut rng = StdRng::seed_from_u64(11);
        let borrowed = sampler.sample_with_rng(&RETURNS, &mut rng).unwrap();
        assert_eq!(seeded, borrowed);
    }

    #[test]
    fn borrowed_generator_continues_between_runs() {
        let sampler = GibbsSampler::new(short_run(0)).unwrap();
        let mut rng = StdRng::seed_from_u64(5);
        let first = sampler.sample_with_rng(&RETURNS, &mut rng).unwrap();
        let second = sampler.sample_with_rng(&RETURNS, &mut rng).unwrap();
        assert_ne!(first, second);
    }
}
