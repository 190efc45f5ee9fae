//! JSON API handlers

use std::collections::BTreeMap;

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::Serialize;

use crate::{AppResult, AppState};
use crate::logic::{ModelInfo, StatsSnapshot};
use crate::models::{ExplanationResult, InputSource, NumericPolicy, RawFeatures};
use super::run_explanation;

#[derive(Debug, Serialize)]
pub struct PredictResponse {
    pub prediction: f64,
    pub contributions: BTreeMap<&'static str, f64>,
    pub non_smoker_pred: f64,
    pub lower_bmi_pred: f64,
    pub base_cost: f64,
}

impl From<ExplanationResult> for PredictResponse {
    fn from(result: ExplanationResult) -> Self {
        Self {
            contributions: result.contribution_map(),
            prediction: result.prediction,
            non_smoker_pred: result.non_smoker_prediction,
            lower_bmi_pred: result.lower_bmi_prediction,
            base_cost: result.base_cost,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ModelStatusResponse {
    pub model: Option<ModelInfo>,
    pub numeric_policy: NumericPolicy,
    pub stats: StatsSnapshot,
}

/// Predict and explain from a JSON body. Absent fields take neutral values.
pub async fn predict(
    State(state): State<AppState>,
    payload: Result<Json<RawFeatures>, JsonRejection>,
) -> AppResult<Json<PredictResponse>> {
    let Json(raw) = payload?;
    let vector = raw.into_vector(state.config.numeric_policy, InputSource::Json)?;
    let result = run_explanation(&state, vector).await?;
    Ok(Json(result.into()))
}

/// Loaded model metadata and serving counters
pub async fn model_status(State(state): State<AppState>) -> Json<ModelStatusResponse> {
    Json(ModelStatusResponse {
        model: state.model_info.as_deref().cloned(),
        numeric_policy: state.config.numeric_policy,
        stats: state.stats.snapshot(),
    })
}
