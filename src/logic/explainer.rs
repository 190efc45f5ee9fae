//! Prediction Explainer
//!
//! Produces a point prediction, leave-one-out feature contributions and two
//! fixed what-if scenarios using only forward evaluations of a predictor.
//!
//! Each call costs exactly nine predictions:
//!
//! ```text
//! 1 base  +  6 substitutions (one per feature)  +  2 scenarios
//! ```

use thiserror::Error;

use crate::models::{
    round2, ContributionOutcome, ExplanationResult, Feature, FeatureContribution, FeatureVector,
    BASE_COST,
};
use super::predictor::{PredictError, Predictor};

/// BMI never drops below this in the lower-BMI scenario
pub const BMI_FLOOR: f64 = 18.0;

/// BMI reduction applied in the lower-BMI scenario
pub const BMI_REDUCTION: f64 = 5.0;

/// Number of predictor calls made by [`explain`]
pub const PREDICTIONS_PER_EXPLANATION: usize = 1 + Feature::ALL.len() + 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scenario {
    NonSmoker,
    LowerBmi,
}

impl std::fmt::Display for Scenario {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Scenario::NonSmoker => f.write_str("non-smoker"),
            Scenario::LowerBmi => f.write_str("lower BMI"),
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ExplainError {
    #[error("prediction failed: {0}")]
    Base(#[source] PredictError),

    #[error("{scenario} scenario prediction failed: {source}")]
    Scenario {
        scenario: Scenario,
        #[source]
        source: PredictError,
    },
}

/// Scenario BMI: five points lower, floored at [`BMI_FLOOR`]
pub fn lower_bmi(bmi: f64) -> f64 {
    (bmi - BMI_REDUCTION).max(BMI_FLOOR)
}

/// Explain one prediction.
///
/// Only a failure of the base or a scenario prediction fails the call. A
/// failed substitution degrades that feature's contribution to zero.
pub fn explain<P>(
    vector: &FeatureVector,
    predictor: &P,
    baseline: &FeatureVector,
) -> Result<ExplanationResult, ExplainError>
where
    P: Predictor + ?Sized,
{
    let base = evaluate(predictor, vector).map_err(ExplainError::Base)?;

    let contributions = Feature::ALL
        .iter()
        .map(|&feature| FeatureContribution {
            feature,
            outcome: contribution(predictor, vector, baseline, feature, base),
        })
        .collect();

    let mut non_smoker = vector.clone();
    non_smoker.smoker = "no".to_string();
    let non_smoker_prediction = evaluate(predictor, &non_smoker).map_err(|source| {
        ExplainError::Scenario {
            scenario: Scenario::NonSmoker,
            source,
        }
    })?;

    let mut slimmer = vector.clone();
    slimmer.bmi = lower_bmi(vector.bmi);
    let lower_bmi_prediction = evaluate(predictor, &slimmer).map_err(|source| {
        ExplainError::Scenario {
            scenario: Scenario::LowerBmi,
            source,
        }
    })?;

    Ok(ExplanationResult {
        prediction: round2(base),
        contributions,
        non_smoker_prediction: round2(non_smoker_prediction),
        lower_bmi_prediction: round2(lower_bmi_prediction),
        base_cost: BASE_COST,
    })
}

fn contribution<P>(
    predictor: &P,
    vector: &FeatureVector,
    baseline: &FeatureVector,
    feature: Feature,
    base: f64,
) -> ContributionOutcome
where
    P: Predictor + ?Sized,
{
    let substituted = vector.with_feature_from(feature, baseline);
    match evaluate(predictor, &substituted) {
        Ok(modified) => ContributionOutcome::Computed {
            value: round2(base - modified),
        },
        Err(e) => {
            tracing::debug!("Contribution for {} defaulted to 0: {}", feature, e);
            ContributionOutcome::Defaulted {
                reason: e.to_string(),
            }
        }
    }
}

fn evaluate<P>(predictor: &P, vector: &FeatureVector) -> Result<f64, PredictError>
where
    P: Predictor + ?Sized,
{
    let value = predictor.predict(vector)?;
    if value.is_finite() {
        Ok(value)
    } else {
        Err(PredictError::Model(format!("non-finite prediction {}", value)))
    }
}
