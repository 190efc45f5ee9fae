//! Insurance Charges Prediction Server
//!
//! Serves a pre-trained regression model over an HTML form and a JSON API,
//! with leave-one-out feature contributions and two what-if scenarios.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                    CHARGES SERVER                        │
//! ├──────────────────────────────────────────────────────────┤
//! │  ┌────────────┐   ┌────────────┐                         │
//! │  │ HTML form  │   │ JSON API   │   (Axum)                │
//! │  └─────┬──────┘   └─────┬──────┘                         │
//! │        └───────┬────────┘                                │
//! │                ▼                                         │
//! │        ┌───────────────┐      ┌──────────────────────┐   │
//! │        │   Explainer   │ ───▶ │ Predictor (forest)   │   │
//! │        └───────────────┘      └──────────────────────┘   │
//! └──────────────────────────────────────────────────────────┘
//! ```

mod config;
mod error;
mod handlers;
mod logging;
mod logic;
mod models;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::{
    Router,
    routing::{get, post},
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{CorsLayer, Any},
    trace::TraceLayer,
    compression::CompressionLayer,
};

use handlers::view::Pages;
use logic::{ForestModel, ModelInfo, Predictor, ServingStats};
use models::FeatureVector;

pub use error::{AppError, AppResult};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    logging::init(std::env::var("ENVIRONMENT").map_or(false, |e| e == "production"));

    let config = config::Config::from_env();
    tracing::info!("Charges server starting...");
    tracing::info!("Numeric input policy: {:?}", config.numeric_policy);
    if config.is_production() && config.model_sha256.is_none() {
        tracing::warn!("MODEL_SHA256 not set, model artifact will not be verified");
    }

    // No model, no service
    let model = ForestModel::load(&config.model_path, config.model_sha256.as_deref())
        .with_context(|| format!("failed to load model from {}", config.model_path))?;

    let pages = Pages::new().context("failed to compile page templates")?;

    let state = AppState {
        model_info: Some(Arc::new(model.info().clone())),
        predictor: Arc::new(model),
        baseline: Arc::new(FeatureVector::neutral()),
        stats: Arc::new(ServingStats::new()),
        pages: Arc::new(pages),
        config: config.clone(),
    };

    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("🚀 Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub predictor: Arc<dyn Predictor>,
    pub model_info: Option<Arc<ModelInfo>>,
    pub baseline: Arc<FeatureVector>,
    pub stats: Arc<ServingStats>,
    pub pages: Arc<Pages>,
    pub config: config::Config,
}

/// Create the main router with all routes
fn create_router(state: AppState) -> Router {
    Router::new()
        // HTML form
        .route("/", get(handlers::pages::home))
        .route("/predict", post(handlers::pages::predict))

        // JSON API
        .route("/api/predict", post(handlers::api::predict))
        .route("/api/model", get(handlers::api::model_status))

        .route("/health", get(handlers::health::check))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods(Any)
                        .allow_headers(Any)
                ),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use tokio_test::{assert_err, assert_ok};
    use tower::ServiceExt;

    use crate::logic::predictor::PredictError;

    /// age*10 + 50 for smokers; rejects the "mars" region
    fn stub_model(v: &FeatureVector) -> Result<f64, PredictError> {
        if v.region == "mars" {
            return Err(PredictError::UnknownCategory {
                feature: models::Feature::Region,
                value: v.region.clone(),
            });
        }
        Ok(v.age * 10.0 + if v.is_smoker() { 50.0 } else { 0.0 })
    }

    fn test_state(config: config::Config) -> AppState {
        AppState {
            predictor: Arc::new(stub_model),
            model_info: None,
            baseline: Arc::new(FeatureVector::neutral()),
            stats: Arc::new(ServingStats::new()),
            pages: Arc::new(Pages::new().unwrap()),
            config,
        }
    }

    fn app() -> Router {
        create_router(test_state(config::Config::default()))
    }

    fn json_request(uri: &str, body: &str) -> Request<Body> {
        Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn form_request(body: &str) -> Request<Body> {
        Request::post("/predict")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn body_text(response: axum::response::Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_api_predict() {
        let body = r#"{"age": 30, "bmi": 25, "children": 0, "sex": "female", "smoker": "yes", "region": "northeast"}"#;
        let response = app().oneshot(json_request("/api/predict", body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["prediction"], 350.0);
        assert_eq!(json["contributions"]["age"], -100.0);
        assert_eq!(json["contributions"]["smoker"], 50.0);
        assert_eq!(json["contributions"]["region"], 0.0);
        assert_eq!(json["non_smoker_pred"], 300.0);
        assert_eq!(json["lower_bmi_pred"], 350.0);
        assert_eq!(json["base_cost"], 3000.0);
    }

    #[tokio::test]
    async fn test_api_defaults_missing_fields() {
        let response = app().oneshot(json_request("/api/predict", "{}")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["prediction"], 400.0);
        assert_eq!(json["contributions"]["age"], 0.0);
    }

    #[tokio::test]
    async fn test_api_prediction_failure_is_client_error() {
        let response = app()
            .oneshot(json_request("/api/predict", r#"{"region": "mars"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let json = body_json(response).await;
        assert!(json["error"].as_str().unwrap().contains("mars"));
        assert_eq!(json["status"], 400);
    }

    #[tokio::test]
    async fn test_api_malformed_json() {
        let response = app()
            .oneshot(json_request("/api/predict", "{not json"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_json(response).await["error"].is_string());
    }

    #[tokio::test]
    async fn test_api_strict_policy_rejects_garbage() {
        let config = config::Config {
            numeric_policy: models::NumericPolicy::Strict,
            ..Default::default()
        };
        let response = create_router(test_state(config))
            .oneshot(json_request("/api/predict", r#"{"age": "old"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_api_lenient_policy_zeroes_garbage() {
        let response = app()
            .oneshot(json_request("/api/predict", r#"{"age": "old"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["prediction"], 0.0);
    }

    #[tokio::test]
    async fn test_api_lenient_policy_zeroes_non_numeric_json() {
        for body in [r#"{"age": true}"#, r#"{"age": [1]}"#] {
            let response = app().oneshot(json_request("/api/predict", body)).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK);
            assert_eq!(body_json(response).await["prediction"], 0.0);
        }
    }

    #[tokio::test]
    async fn test_api_missed_deadline_is_request_timeout() {
        let slow = |v: &FeatureVector| -> Result<f64, PredictError> {
            std::thread::sleep(std::time::Duration::from_millis(50));
            Ok(v.age)
        };
        let state = AppState {
            predictor: Arc::new(slow),
            ..test_state(config::Config {
                predict_timeout_ms: 20,
                ..Default::default()
            })
        };

        let response = create_router(state.clone())
            .oneshot(json_request("/api/predict", "{}"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);

        let json = body_json(response).await;
        assert_eq!(json["error"], "Prediction timed out");
        assert_eq!(json["status"], 408);
        assert_eq!(state.stats.snapshot().failures, 1);
    }

    #[tokio::test]
    async fn test_form_predict_renders_result() {
        let response = app()
            .oneshot(form_request(
                "age=30&bmi=25&children=0&sex=female&smoker=yes&region=northeast",
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let html = body_text(response).await;
        assert!(html.contains("Your Medical Insurance Prediction is $350.00"));
        assert!(html.contains("If you did not smoke: $300.00"));
        assert!(html.contains("-$100.00"));
    }

    #[tokio::test]
    async fn test_form_failure_renders_error_on_page() {
        let response = app()
            .oneshot(form_request(
                "age=30&bmi=25&children=0&sex=female&smoker=no&region=mars",
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let html = body_text(response).await;
        assert!(html.contains("class=\"error\""));
        assert!(html.contains("mars"));
        assert!(!html.contains("class=\"result\""));
    }

    #[tokio::test]
    async fn test_home_and_health() {
        let response = app()
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response).await.contains("<form"));

        let response = app()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(body_json(response).await["status"], "healthy");
    }

    #[tokio::test]
    async fn test_model_status_counts_requests() {
        let state = test_state(config::Config::default());
        let router = create_router(state.clone());

        assert_ok!(handlers::run_explanation(&state, FeatureVector::neutral()).await);
        let bad = FeatureVector {
            region: "mars".to_string(),
            ..FeatureVector::neutral()
        };
        assert_err!(handlers::run_explanation(&state, bad).await);

        let response = router
            .oneshot(Request::get("/api/model").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let json = body_json(response).await;
        assert_eq!(json["stats"]["explanations"], 1);
        assert_eq!(json["stats"]["failures"], 1);
        assert_eq!(json["numeric_policy"], "lenient");
        assert!(json["model"].is_null());
    }

    #[tokio::test]
    async fn test_bundled_model_serves() {
        let model = ForestModel::load("models/insurance_forest.json", None).unwrap();
        let state = AppState {
            model_info: Some(Arc::new(model.info().clone())),
            predictor: Arc::new(model),
            ..test_state(config::Config::default())
        };

        let result = handlers::run_explanation(&state, FeatureVector::neutral()).await.unwrap();
        assert!(result.prediction > 0.0);
        assert!(result.contributions.iter().all(|c| c.outcome.value() == 0.0));
    }
}
