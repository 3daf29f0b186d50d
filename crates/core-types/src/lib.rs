//! # Core Types
//!
//! The shared vocabulary of the workspace: the sampler's hyperparameters and the
//! posterior sample container it produces.
//!
//! As a Layer 0 crate it depends on nothing else in the workspace.

pub mod error;
pub mod structs;

// Re-export the core types to provide a clean public API.
pub use error::CoreError;
pub use structs::{Hyperparameters, PosteriorDraw, PosteriorSamples};
