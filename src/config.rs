//! Configuration module

use std::env;
use std::time::Duration;

use crate::models::NumericPolicy;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port
    pub port: u16,

    /// Path to the persisted model artifact
    pub model_path: String,

    /// Expected SHA-256 of the model artifact (hex)
    pub model_sha256: Option<String>,

    /// Handling of unparseable numeric input
    pub numeric_policy: NumericPolicy,

    /// Deadline for one explanation; zero disables it
    pub predict_timeout_ms: u64,

    /// Environment (development, production)
    pub environment: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),

            model_path: env::var("MODEL_PATH")
                .unwrap_or_else(|_| "models/insurance_forest.json".to_string()),

            model_sha256: env::var("MODEL_SHA256")
                .ok()
                .filter(|s| !s.trim().is_empty()),

            numeric_policy: env::var("NUMERIC_INPUT_POLICY")
                .ok()
                .and_then(|p| match p.parse() {
                    Ok(policy) => Some(policy),
                    Err(e) => {
                        tracing::warn!("{}, falling back to lenient", e);
                        None
                    }
                })
                .unwrap_or_default(),

            predict_timeout_ms: env::var("PREDICT_TIMEOUT_MS")
                .ok()
                .and_then(|t| t.parse().ok())
                .unwrap_or(2000),

            environment: env::var("ENVIRONMENT")
                .unwrap_or_else(|_| "development".to_string()),
        }
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn predict_timeout(&self) -> Option<Duration> {
        (self.predict_timeout_ms > 0).then(|| Duration::from_millis(self.predict_timeout_ms))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            model_path: "models/insurance_forest.json".to_string(),
            model_sha256: None,
            numeric_policy: NumericPolicy::Lenient,
            predict_timeout_ms: 2000,
            environment: "development".to_string(),
        }
    }
}
