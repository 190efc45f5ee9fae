//! Raw request input and coercion into a [`FeatureVector`]

use serde::{Deserialize, Serialize};
use thiserror::Error;
use validator::Validate;

use super::features::{Feature, FeatureVector};

/// How numeric fields that fail to parse are handled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NumericPolicy {
    /// Unparseable numbers silently become 0.0
    #[default]
    Lenient,
    /// Unparseable or out-of-range numbers reject the request
    Strict,
}

impl std::str::FromStr for NumericPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lenient" => Ok(NumericPolicy::Lenient),
            "strict" => Ok(NumericPolicy::Strict),
            other => Err(format!("unknown numeric input policy '{}'", other)),
        }
    }
}

/// Where the raw values came from. Decides how absent numeric fields are filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputSource {
    /// Absent numeric fields are treated like unparseable ones
    Form,
    /// Absent fields take the neutral profile's value
    Json,
}

#[derive(Debug, Error, PartialEq)]
pub enum InputError {
    #[error("invalid number for {feature}: '{raw}'")]
    InvalidNumber { feature: Feature, raw: String },

    #[error("missing value for {feature}")]
    Missing { feature: Feature },

    #[error("{0}")]
    OutOfRange(String),
}

/// A numeric field as submitted: JSON may carry a number or a string
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Number(f64),
    Text(String),
    /// Booleans, arrays, objects; never a valid number
    Other(serde_json::Value),
}

/// Six optional, unvalidated values from a form or JSON body
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawFeatures {
    pub age: Option<RawValue>,
    pub bmi: Option<RawValue>,
    pub children: Option<RawValue>,
    pub sex: Option<String>,
    pub smoker: Option<String>,
    pub region: Option<String>,
}

impl RawFeatures {
    /// Coerce into a complete feature vector
    pub fn into_vector(
        self,
        policy: NumericPolicy,
        source: InputSource,
    ) -> Result<FeatureVector, InputError> {
        let neutral = FeatureVector::neutral();

        let vector = FeatureVector {
            age: coerce_number(Feature::Age, self.age, neutral.age, policy, source)?,
            bmi: coerce_number(Feature::Bmi, self.bmi, neutral.bmi, policy, source)?,
            children: coerce_number(
                Feature::Children,
                self.children,
                neutral.children,
                policy,
                source,
            )?,
            sex: categorical(self.sex, neutral.sex),
            smoker: categorical(self.smoker, neutral.smoker),
            region: categorical(self.region, neutral.region),
        };

        if policy == NumericPolicy::Strict {
            vector
                .validate()
                .map_err(|e| InputError::OutOfRange(e.to_string()))?;
        }

        Ok(vector)
    }
}

fn coerce_number(
    feature: Feature,
    raw: Option<RawValue>,
    neutral: f64,
    policy: NumericPolicy,
    source: InputSource,
) -> Result<f64, InputError> {
    let parsed = match raw {
        None if source == InputSource::Json => return Ok(neutral),
        None => Err(InputError::Missing { feature }),
        Some(RawValue::Number(n)) if n.is_finite() => Ok(n),
        Some(RawValue::Number(n)) => Err(InputError::InvalidNumber {
            feature,
            raw: n.to_string(),
        }),
        Some(RawValue::Text(text)) => match text.trim().parse::<f64>() {
            Ok(n) if n.is_finite() => Ok(n),
            _ => Err(InputError::InvalidNumber { feature, raw: text }),
        },
        Some(RawValue::Other(value)) => Err(InputError::InvalidNumber {
            feature,
            raw: value.to_string(),
        }),
    };

    match (parsed, policy) {
        (Ok(n), _) => Ok(n),
        (Err(e), NumericPolicy::Strict) => Err(e),
        (Err(e), NumericPolicy::Lenient) => {
            tracing::debug!("Coercing {} to 0.0: {}", feature, e);
            Ok(0.0)
        }
    }
}

fn categorical(raw: Option<String>, neutral: String) -> String {
    match raw {
        Some(value) if !value.trim().is_empty() => value.trim().to_string(),
        _ => neutral,
    }
}
