//! HTTP handlers

pub mod health;
pub mod pages;
pub mod api;
pub mod view;

use std::time::Instant;

use crate::{AppError, AppResult, AppState};
use crate::logic::explain;
use crate::logic::explainer::PREDICTIONS_PER_EXPLANATION;
use crate::models::{ExplanationResult, FeatureVector};

/// Run one explanation on the blocking pool under the configured deadline
pub async fn run_explanation(
    state: &AppState,
    vector: FeatureVector,
) -> AppResult<ExplanationResult> {
    let predictor = state.predictor.clone();
    let baseline = state.baseline.clone();
    let start = Instant::now();

    let task = tokio::task::spawn_blocking(move || explain(&vector, predictor.as_ref(), &baseline));

    let joined = match state.config.predict_timeout() {
        Some(limit) => tokio::time::timeout(limit, task)
            .await
            .map_err(|_| AppError::Timeout),
        None => Ok(task.await),
    };

    let outcome = joined.and_then(|res| {
        res.map_err(|e| AppError::InternalError(format!("explanation task failed: {}", e)))?
            .map_err(AppError::from)
    });

    match &outcome {
        Ok(result) => {
            state.stats.record_success(start.elapsed());
            tracing::debug!(
                "Explained prediction {:.2} with {} model calls in {:?}",
                result.prediction,
                PREDICTIONS_PER_EXPLANATION,
                start.elapsed()
            );
            let defaulted = result.defaulted_features();
            if !defaulted.is_empty() {
                tracing::debug!("Contributions defaulted to zero for {:?}", defaulted);
            }
        }
        Err(e) => {
            state.stats.record_failure();
            tracing::warn!("Explanation failed: {}", e);
        }
    }

    outcome
}
