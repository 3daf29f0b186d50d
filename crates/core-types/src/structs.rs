use crate::error::CoreError;
use serde::{Deserialize, Serialize};

/// The fixed, read-only settings of a single sampler run.
///
/// Every field has a default, so a configuration file only needs to name the
/// values it wants to change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Hyperparameters {
    /// Degrees of freedom of the Student-t likelihood. Values between 2 and 10
    /// give fat tails; larger values approach a normal likelihood.
    pub nu: f64,
    /// Total number of Gibbs iterations, burn-in included.
    pub n_iter: usize,
    /// Number of leading iterations to discard.
    pub burn_in: usize,
    /// Prior mean of the location parameter.
    pub mu0: f64,
    /// Prior variance of the location parameter.
    pub tau2: f64,
    /// Inverse-gamma shape of the variance prior.
    pub a0: f64,
    /// Inverse-gamma scale of the variance prior.
    pub b0: f64,
    /// Seed for the run's random number generator.
    pub seed: u64,
}

impl Default for Hyperparameters {
    fn default() -> Self {
        Self {
            nu: 3.0,
            n_iter: 5000,
            burn_in: 500,
            mu0: 0.0,
            tau2: 1000.0,
            a0: 2.0,
            b0: 2.0,
            seed: 42,
        }
    }
}

impl Hyperparameters {
    /// Number of samples a run with these settings returns.
    pub fn kept_samples(&self) -> usize {
        self.n_iter.saturating_sub(self.burn_in)
    }

    /// Checks the preconditions the sampler relies on.
    ///
    /// The priors must be proper (`tau2`, `a0`, `b0` strictly positive), `nu` must be
    /// positive, and at least one iteration must survive burn-in.
    pub fn validate(&self) -> Result<(), CoreError> {
        require_positive("nu", self.nu)?;
        require_positive("tau2", self.tau2)?;
        require_positive("a0", self.a0)?;
        require_positive("b0", self.b0)?;

        if !self.mu0.is_finite() {
            return Err(CoreError::invalid("mu0", format!("must be finite, got {}", self.mu0)));
        }
        if self.n_iter == 0 {
            return Err(CoreError::invalid("n_iter", "must be at least 1"));
        }
        if self.burn_in >= self.n_iter {
            return Err(CoreError::invalid(
                "burn_in",
                format!("must be smaller than n_iter ({}), got {}", self.n_iter, self.burn_in),
            ));
        }

        Ok(())
    }
}

fn require_positive(field: &str, value: f64) -> Result<(), CoreError> {
    // NaN fails the comparison as well.
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(CoreError::invalid(field, format!("must be a positive finite number, got {}", value)))
    }
}

/// One retained iteration of the chain.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PosteriorDraw {
    pub mu: f64,
    pub sigma2: f64,
    pub sharpe: f64,
}

/// Post-burn-in draws of the mean, the variance and the derived Sharpe ratio.
///
/// The three sequences are index-aligned: position `i` of each comes from the
/// same iteration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PosteriorSamples {
    pub mu: Vec<f64>,
    pub sigma2: Vec<f64>,
    pub sharpe: Vec<f64>,
}

impl PosteriorSamples {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            mu: Vec::with_capacity(capacity),
            sigma2: Vec::with_capacity(capacity),
            sharpe: Vec::with_capacity(capacity),
        }
    }

    /// Appends one draw to all three sequences.
    pub fn push(&mut self, draw: PosteriorDraw) {
        self.mu.push(draw.mu);
        self.sigma2.push(draw.sigma2);
        self.sharpe.push(draw.sharpe);
    }

    pub fn len(&self) -> usize {
        self.mu.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mu.is_empty()
    }

    /// Returns the draw recorded at `index`, if any.
    pub fn get(&self, index: usize) -> Option<PosteriorDraw> {
        Some(PosteriorDraw {
            mu: *self.mu.get(index)?,
            sigma2: *self.sigma2.get(index)?,
            sharpe: *self.sharpe.get(index)?,
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = PosteriorDraw> + '_ {
        self.mu
            .iter()
            .zip(&self.sigma2)
            .zip(&self.sharpe)
            .map(|((&mu, &sigma2), &sharpe)| PosteriorDraw { mu, sigma2, sharpe })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let h = Hyperparameters::default();
        assert_eq!(h.nu, 3.0);
        assert_eq!(h.n_iter, 5000);
        assert_eq!(h.burn_in, 500);
        assert_eq!(h.mu0, 0.0);
        assert_eq!(h.tau2, 1000.0);
        assert_eq!(h.a0, 2.0);
        assert_eq!(h.b0, 2.0);
        assert_eq!(h.seed, 42);
        assert_eq!(h.kept_samples(), 4500);
        assert!(h.validate().is_ok());
    }

    #[test]
    fn rejects_improper_priors() {
        for field in ["tau2", "a0", "b0", "nu"] {
            let mut h = Hyperparameters::default();
            match field {
                "tau2" => h.tau2 = 0.0,
                "a0" => h.a0 = -1.0,
                "b0" => h.b0 = f64::NAN,
                _ => h.nu = 0.0,
            }
            match h.validate() {
                Err(CoreError::InvalidInput(name, _)) => assert_eq!(name, field),
                other => panic!("expected {} to be rejected, got {:?}", field, other),
            }
        }
    }

    #[test]
    fn rejects_burn_in_not_below_n_iter() {
        let h = Hyperparameters { n_iter: 100, burn_in: 100, ..Default::default() };
        assert!(matches!(h.validate(), Err(CoreError::InvalidInput(f, _)) if f == "burn_in"));

        let h = Hyperparameters { n_iter: 0, burn_in: 0, ..Default::default() };
        assert!(matches!(h.validate(), Err(CoreError::InvalidInput(f, _)) if f == "n_iter"));

        let h = Hyperparameters { n_iter: 1, burn_in: 0, ..Default::default() };
        assert!(h.validate().is_ok());
    }

    #[test]
    fn partial_settings_fill_in_defaults() {
        let h: Hyperparameters = serde_json::from_str(r#"{ "nu": 5.0, "seed": 7 }"#).unwrap();
        assert_eq!(h.nu, 5.0);
        assert_eq!(h.seed, 7);
        assert_eq!(h.n_iter, 5000);
    }

    #[test]
    fn samples_stay_index_aligned() {
        let mut samples = PosteriorSamples::with_capacity(2);
        samples.push(PosteriorDraw { mu: 1.0, sigma2: 4.0, sharpe: 0.5 });
        samples.push(PosteriorDraw { mu: -1.0, sigma2: 1.0, sharpe: -1.0 });

        assert_eq!(samples.len(), 2);
        assert_eq!(samples.get(1), Some(PosteriorDraw { mu: -1.0, sigma2: 1.0, sharpe: -1.0 }));
        assert_eq!(samples.get(2), None);
        let sharpes: Vec<f64> = samples.iter().map(|d| d.sharpe).collect();
        assert_eq!(sharpes, vec![0.5, -1.0]);
    }
}
