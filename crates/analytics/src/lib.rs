//! # Bayesian Sharpe Analytics
//!
//! This crate estimates the Sharpe ratio of a return series under a fat-tailed
//! Student-t likelihood. The likelihood is written as a scale mixture of normals,
//! which turns every conditional posterior into a standard distribution and lets
//! a three-step Gibbs sampler explore the joint posterior of the mean and variance.
//!
//! ## Architectural Principles
//!
//! - **Layer 1 Logic:** This is a pure logic crate. It has no knowledge of files,
//!   the command line or logging sinks. It depends only on `core-types` (Layer 0).
//! - **Owned randomness:** There is no global generator. A run either seeds its own
//!   `StdRng` from the hyperparameters or borrows one from the caller.
//!
//! ## Public API
//!
//! - `GibbsSampler`: validates hyperparameters once and runs chains over return series.
//! - `estimate_sharpe`: one-call convenience wrapper.
//! - `PosteriorSummary`: descriptive statistics of a finished chain.
//! - `AnalyticsError`: the specific error types that can be returned from this crate.

// Declare the modules that constitute this crate.
pub mod error;
pub mod gibbs;
pub mod stats;
pub mod summary;

// Re-export the key components to create a clean, public-facing API.
pub use error::AnalyticsError;
pub use gibbs::{GibbsSampler, estimate_sharpe};
pub use summary::{CredibleInterval, MomentSummary, PosteriorSummary};
