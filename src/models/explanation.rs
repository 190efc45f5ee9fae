//! Explanation result model

use std::collections::BTreeMap;

use serde::Serialize;

use super::features::Feature;

/// Illustrative base cost shown next to every result. Not derived from data.
pub const BASE_COST: f64 = 3000.0;

/// Round half away from zero to two decimal places
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Outcome of a single leave-one-out substitution
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ContributionOutcome {
    Computed { value: f64 },
    /// The substituted prediction failed; the contribution counts as zero
    Defaulted { reason: String },
}

impl ContributionOutcome {
    pub fn value(&self) -> f64 {
        match self {
            ContributionOutcome::Computed { value } => *value,
            ContributionOutcome::Defaulted { .. } => 0.0,
        }
    }

    pub fn is_defaulted(&self) -> bool {
        matches!(self, ContributionOutcome::Defaulted { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureContribution {
    pub feature: Feature,
    pub outcome: ContributionOutcome,
}

/// Prediction plus per-feature contributions and the two what-if scenarios.
///
/// All numeric fields are rounded to two decimals.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExplanationResult {
    pub prediction: f64,
    pub contributions: Vec<FeatureContribution>,
    pub non_smoker_prediction: f64,
    pub lower_bmi_prediction: f64,
    pub base_cost: f64,
}

impl ExplanationResult {
    #[cfg(test)]
    pub fn contribution(&self, feature: Feature) -> Option<f64> {
        self.contributions
            .iter()
            .find(|c| c.feature == feature)
            .map(|c| c.outcome.value())
    }

    /// Feature name -> contribution value
    pub fn contribution_map(&self) -> BTreeMap<&'static str, f64> {
        self.contributions
            .iter()
            .map(|c| (c.feature.name(), c.outcome.value()))
            .collect()
    }

    pub fn defaulted_features(&self) -> Vec<Feature> {
        self.contributions
            .iter()
            .filter(|c| c.outcome.is_defaulted())
            .map(|c| c.feature)
            .collect()
    }
}
