//! Prediction logic
//!
//! The explainer only sees the [`Predictor`] capability; the tree ensemble
//! is one backend for it.

pub mod predictor;
pub mod explainer;
pub mod forest;
pub mod stats;

pub use predictor::Predictor;
pub use explainer::{explain, ExplainError};
pub use forest::{ForestModel, ModelInfo};
pub use stats::{ServingStats, StatsSnapshot};
