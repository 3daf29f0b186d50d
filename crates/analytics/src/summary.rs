use crate::error::AnalyticsError;
use crate::stats;
use core_types::PosteriorSamples;
use serde::{Deserialize, Serialize};

/// Mean and standard deviation of one posterior quantity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MomentSummary {
    pub mean: f64,
    pub std_dev: f64,
}

/// Equal-tailed credible interval.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CredibleInterval {
    pub level: f64,
    pub lower: f64,
    pub upper: f64,
}

/// Descriptive statistics of a finished chain.
///
/// This is the report the command line prints, and the natural thing to
/// serialize when a caller wants the result without the raw draws.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PosteriorSummary {
    pub n_samples: usize,
    pub mu: MomentSummary,
    pub sigma2: MomentSummary,
    pub sharpe: MomentSummary,
    pub sharpe_interval: CredibleInterval,
    /// Posterior probability that the Sharpe ratio is positive.
    pub prob_sharpe_positive: f64,
    /// Posterior mean Sharpe scaled by `sqrt(periods_per_year)`, when a period count is known.
    pub annualized_sharpe_mean: Option<f64>,
}

impl PosteriorSummary {
    /// Summarizes `samples`.
    ///
    /// # Arguments
    ///
    /// * `samples` - The post-burn-in draws of a run.
    /// * `credible_level` - Mass of the Sharpe credible interval, strictly between 0 and 1.
    /// * `periods_per_year` - Return periods per year (e.g. 252 for daily returns),
    ///   used only for the annualized Sharpe.
    pub fn from_samples(
        samples: &PosteriorSamples,
        credible_level: f64,
        periods_per_year: Option<f64>,
    ) -> Result<Self, AnalyticsError> {
        if samples.len() < 2 {
            return Err(AnalyticsError::NotEnoughData(format!(
                "a summary needs at least 2 samples, got {}",
                samples.len()
            )));
        }
        if !(credible_level > 0.0 && credible_level < 1.0) {
            return Err(AnalyticsError::InvalidArgument(format!(
                "credible level must lie in (0, 1), got {}",
                credible_level
            )));
        }

        let tail = (1.0 - credible_level) / 2.0;
        let sharpe = moments(&samples.sharpe)?;
        let sharpe_interval = CredibleInterval {
            level: credible_level,
            lower: stats::quantile(&samples.sharpe, tail).ok_or_else(too_short)?,
            upper: stats::quantile(&samples.sharpe, 1.0 - tail).ok_or_else(too_short)?,
        };

        Ok(Self {
            n_samples: samples.len(),
            mu: moments(&samples.mu)?,
            sigma2: moments(&samples.sigma2)?,
            sharpe,
            sharpe_interval,
            prob_sharpe_positive: stats::fraction_above(&samples.sharpe, 0.0)
                .ok_or_else(too_short)?,
            annualized_sharpe_mean: periods_per_year.map(|periods| sharpe.mean * periods.sqrt()),
        })
    }
}

fn moments(values: &[f64]) -> Result<MomentSummary, AnalyticsError> {
    Ok(MomentSummary {
        mean: stats::mean(values).ok_or_else(too_short)?,
        std_dev: stats::std_dev(values).ok_or_else(too_short)?,
    })
}

fn too_short() -> AnalyticsError {
    AnalyticsError::NotEnoughData("sample sequence is too short".to_string())
}
