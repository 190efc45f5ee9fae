//! Predictor capability
//!
//! Any model backend that maps a [`FeatureVector`] to a charge can serve
//! explanations. Implementations must be safe to share read-only across
//! request threads.

use thiserror::Error;

use crate::models::{Feature, FeatureVector};

#[derive(Debug, Clone, Error, PartialEq)]
pub enum PredictError {
    #[error("unknown category '{value}' for {feature}")]
    UnknownCategory { feature: Feature, value: String },

    #[error("non-finite value for {feature}")]
    NonFinite { feature: Feature },

    #[error("model error: {0}")]
    Model(String),
}

/// Opaque, deterministic, read-only predictor
pub trait Predictor: Send + Sync {
    fn predict(&self, features: &FeatureVector) -> Result<f64, PredictError>;
}

impl<F> Predictor for F
where
    F: Fn(&FeatureVector) -> Result<f64, PredictError> + Send + Sync,
{
    fn predict(&self, features: &FeatureVector) -> Result<f64, PredictError> {
        self(features)
    }
}
