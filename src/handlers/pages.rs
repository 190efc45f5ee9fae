//! HTML form handlers

use axum::{
    extract::{rejection::FormRejection, State},
    response::Html,
    Form,
};

use crate::{AppResult, AppState};
use crate::models::{InputSource, RawFeatures};
use super::view::PageContent;
use super::run_explanation;

/// Empty prediction form
pub async fn home(State(state): State<AppState>) -> AppResult<Html<String>> {
    Ok(Html(state.pages.render(PageContent::Empty)?))
}

/// Handle a form submission. Failures are shown on the page itself.
pub async fn predict(
    State(state): State<AppState>,
    form: Result<Form<RawFeatures>, FormRejection>,
) -> AppResult<Html<String>> {
    let raw = match form {
        Ok(Form(raw)) => raw,
        Err(rejection) => {
            tracing::debug!("Form rejected: {}", rejection);
            let page = state.pages.render(PageContent::Error {
                input: None,
                message: &rejection.body_text(),
            })?;
            return Ok(Html(page));
        }
    };

    let vector = match raw.into_vector(state.config.numeric_policy, InputSource::Form) {
        Ok(vector) => vector,
        Err(e) => {
            let page = state.pages.render(PageContent::Error {
                input: None,
                message: &e.to_string(),
            })?;
            return Ok(Html(page));
        }
    };

    let page = match run_explanation(&state, vector.clone()).await {
        Ok(explanation) => state.pages.render(PageContent::Result {
            input: &vector,
            explanation: &explanation,
        })?,
        Err(e) => state.pages.render(PageContent::Error {
            input: Some(&vector),
            message: &e.message(),
        })?,
    };
    Ok(Html(page))
}
