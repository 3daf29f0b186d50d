use crate::error::ConfigError;
use std::path::Path;

// Declare the modules that make up this crate.
pub mod error;
pub mod logging;
pub mod settings;

// Re-export the core types to provide a clean public API.
pub use logging::init_tracing;
pub use settings::{Config, DataSettings, LoggingSettings, OutputFormat, ReportSettings};

/// The file read when no explicit path is given. It may be absent, in which case
/// everything must come from the environment.
pub const DEFAULT_CONFIG_FILE: &str = "config.toml";

/// Prefix of environment overrides, e.g. `SHARPE__SAMPLER__SEED=7`.
pub const ENV_PREFIX: &str = "SHARPE";

/// Loads the application configuration.
///
/// Sources are layered in this order, later ones winning:
/// 1. serde defaults on every section except `[data]`,
/// 2. the TOML file at `path` (required) or `config.toml` (optional),
/// 3. `SHARPE__<SECTION>__<KEY>` environment variables. `SHARPE__DATA__RETURNS`
///    takes a comma-separated list.
///
/// The merged result is validated before it is returned.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let file = match path {
        Some(path) => config::File::from(path).required(true),
        None => config::File::with_name(DEFAULT_CONFIG_FILE).required(false),
    };

    let builder = config::Config::builder()
        .add_source(file)
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("data.returns"),
        )
        .build()?;

    // Attempt to deserialize the entire configuration into our `Config` struct
    let config = builder.try_deserialize::<Config>()?;
    config.validate()?;

    Ok(config)
}
