use crate::error::ConfigError;
use core_types::Hyperparameters;
use serde::Deserialize;
use std::path::PathBuf;

/// The root configuration structure for the entire application.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Hyperparameters of the Gibbs sampler. Omitted keys take their defaults.
    #[serde(default)]
    pub sampler: Hyperparameters,
    pub data: DataSettings,
    #[serde(default)]
    pub report: ReportSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// The return series to analyse.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DataSettings {
    /// Periodic simple returns, oldest first (e.g. 0.01 for +1%).
    pub returns: Vec<f64>,
}

/// How the posterior summary is computed and printed.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ReportSettings {
    /// Mass of the Sharpe credible interval.
    pub credible_level: f64,
    /// Return periods per year, for the annualized Sharpe (252 for daily equity returns).
    pub periods_per_year: Option<f64>,
    pub format: OutputFormat,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            credible_level: 0.95,
            periods_per_year: None,
            format: OutputFormat::Table,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

/// Settings for the `tracing` subscriber.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// An `EnvFilter` directive. `RUST_LOG` takes precedence when set.
    pub level: String,
    /// When set, logs go to a daily-rolling file in this directory instead of stderr.
    pub directory: Option<PathBuf>,
    pub file_prefix: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            directory: None,
            file_prefix: "sharpe-gibbs.log".to_string(),
        }
    }
}

impl Config {
    /// Checks the cross-field rules that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.sampler
            .validate()
            .map_err(|e| ConfigError::ValidationError(e.to_string()))?;

        if self.data.returns.len() < 2 {
            return Err(ConfigError::ValidationError(format!(
                "data.returns needs at least 2 values, got {}",
                self.data.returns.len()
            )));
        }
        if let Some(bad) = self.data.returns.iter().find(|r| !r.is_finite()) {
            return Err(ConfigError::ValidationError(format!(
                "data.returns must be finite, found {}",
                bad
            )));
        }

        let level = self.report.credible_level;
        if !(level > 0.0 && level < 1.0) {
            return Err(ConfigError::ValidationError(format!(
                "report.credible_level must lie in (0, 1), got {}",
                level
            )));
        }
        if let Some(periods) = self.report.periods_per_year {
            if !(periods > 0.0 && periods.is_finite()) {
                return Err(ConfigError::ValidationError(format!(
                    "report.periods_per_year must be positive, got {}",
                    periods
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_returns(returns: Vec<f64>) -> Config {
        Config {
            sampler: Hyperparameters::default(),
            data: DataSettings { returns },
            report: ReportSettings::default(),
            logging: LoggingSettings::default(),
        }
    }

    #[test]
    fn accepts_defaults_with_data() {
        assert!(config_with_returns(vec![0.01, -0.01]).validate().is_ok());
    }

    #[test]
    fn rejects_short_or_non_finite_returns() {
        assert!(config_with_returns(vec![0.01]).validate().is_err());
        assert!(config_with_returns(vec![0.01, f64::NAN]).validate().is_err());
    }

    #[test]
    fn rejects_bad_report_settings() {
        let mut config = config_with_returns(vec![0.01, -0.01]);
        config.report.credible_level = 1.0;
        assert!(config.validate().is_err());

        let mut config = config_with_returns(vec![0.01, -0.01]);
        config.report.periods_per_year = Some(0.0);
        assert!(config.validate().is_err());
    }
}
