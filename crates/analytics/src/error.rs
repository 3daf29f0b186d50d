use core_types::CoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalyticsError {
    #[error("Invalid sampler settings: {0}")]
    InvalidInput(#[from] CoreError),

    #[error("Not enough data to perform calculation: {0}")]
    NotEnoughData(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid return series: {0}")]
    InvalidData(String),

    #[error("Numerical degeneracy at iteration {iteration}: {detail}")]
    NumericalDegeneracy { iteration: usize, detail: String },
}
