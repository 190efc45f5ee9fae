//! Tree Ensemble Model
//!
//! Loads the persisted regression pipeline: a one-hot category encoder
//! followed by an ensemble of regression trees whose outputs are averaged.
//!
//! Encoded row layout:
//!
//! ```text
//! [ one-hot(sex) | one-hot(smoker) | one-hot(region) | age | bmi | children ]
//! ```

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::models::{Feature, FeatureVector};
use super::predictor::{PredictError, Predictor};

/// Passthrough numeric columns after the one-hot block
const NUMERIC_COLUMNS: usize = 3;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("failed to read model {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse model: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("model checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch { expected: String, actual: String },

    #[error("invalid model: {0}")]
    Invalid(String),
}

// ============================================================================
// ARTIFACT FORMAT
// ============================================================================

/// Known labels per categorical feature, in one-hot column order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryEncoder {
    pub sex: Vec<String>,
    pub smoker: Vec<String>,
    pub region: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Node {
    /// `row[feature] <= threshold` goes left
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: f64,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegressionTree {
    pub nodes: Vec<Node>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForestArtifact {
    pub name: String,
    pub encoder: CategoryEncoder,
    pub trees: Vec<RegressionTree>,
}

/// Load metadata reported by the model status endpoint
#[derive(Debug, Clone, Serialize)]
pub struct ModelInfo {
    pub path: String,
    pub name: String,
    pub tree_count: usize,
    pub encoded_width: usize,
    pub sha256: String,
    pub loaded_at: DateTime<Utc>,
}

// ============================================================================
// ENCODING
// ============================================================================

impl CategoryEncoder {
    pub fn width(&self) -> usize {
        self.sex.len() + self.smoker.len() + self.region.len() + NUMERIC_COLUMNS
    }

    pub fn encode(&self, features: &FeatureVector) -> Result<Vec<f64>, PredictError> {
        let mut row = Vec::with_capacity(self.width());

        one_hot(&mut row, &self.sex, Feature::Sex, &features.sex)?;
        one_hot(&mut row, &self.smoker, Feature::Smoker, &features.smoker)?;
        one_hot(&mut row, &self.region, Feature::Region, &features.region)?;

        for (feature, value) in [
            (Feature::Age, features.age),
            (Feature::Bmi, features.bmi),
            (Feature::Children, features.children),
        ] {
            if !value.is_finite() {
                return Err(PredictError::NonFinite { feature });
            }
            row.push(value);
        }

        Ok(row)
    }

    fn validate(&self) -> Result<(), ModelError> {
        for (feature, labels) in [
            (Feature::Sex, &self.sex),
            (Feature::Smoker, &self.smoker),
            (Feature::Region, &self.region),
        ] {
            if labels.is_empty() {
                return Err(ModelError::Invalid(format!("no categories for {}", feature)));
            }
            for (i, label) in labels.iter().enumerate() {
                if labels[..i].contains(label) {
                    return Err(ModelError::Invalid(format!(
                        "duplicate category '{}' for {}",
                        label, feature
                    )));
                }
            }
        }
        Ok(())
    }
}

fn one_hot(
    row: &mut Vec<f64>,
    labels: &[String],
    feature: Feature,
    value: &str,
) -> Result<(), PredictError> {
    let hot = labels
        .iter()
        .position(|l| l == value)
        .ok_or_else(|| PredictError::UnknownCategory {
            feature,
            value: value.to_string(),
        })?;
    row.extend((0..labels.len()).map(|i| if i == hot { 1.0 } else { 0.0 }));
    Ok(())
}

// ============================================================================
// TREES
// ============================================================================

impl RegressionTree {
    fn evaluate(&self, row: &[f64]) -> Result<f64, PredictError> {
        let mut idx = 0;
        loop {
            match self.nodes.get(idx) {
                Some(Node::Leaf { value }) => return Ok(*value),
                Some(Node::Split { feature, threshold, left, right }) => {
                    let x = row.get(*feature).ok_or_else(|| {
                        PredictError::Model(format!("split on missing column {}", feature))
                    })?;
                    idx = if *x <= *threshold { *left } else { *right };
                }
                None => return Err(PredictError::Model(format!("dangling node {}", idx))),
            }
        }
    }

    /// Children must point forward so evaluation always terminates
    fn validate(&self, tree: usize, width: usize) -> Result<(), ModelError> {
        if self.nodes.is_empty() {
            return Err(ModelError::Invalid(format!("tree {} has no nodes", tree)));
        }
        let count = self.nodes.len();
        for (idx, node) in self.nodes.iter().enumerate() {
            let problem = match node {
                Node::Leaf { value } if !value.is_finite() => Some("non-finite leaf value".to_string()),
                Node::Leaf { .. } => None,
                Node::Split { feature, .. } if *feature >= width => {
                    Some(format!("feature {} outside encoded width {}", feature, width))
                }
                Node::Split { threshold, .. } if !threshold.is_finite() => {
                    Some("non-finite threshold".to_string())
                }
                Node::Split { left, right, .. } => [left, right]
                    .into_iter()
                    .find(|&&child| child <= idx || child >= count)
                    .map(|child| format!("invalid child index {}", child)),
            };
            if let Some(problem) = problem {
                return Err(ModelError::Invalid(format!(
                    "tree {} node {}: {}",
                    tree, idx, problem
                )));
            }
        }
        Ok(())
    }
}

// ============================================================================
// MODEL
// ============================================================================

/// Immutable tree-ensemble predictor, loaded once at startup
#[derive(Debug, Clone)]
pub struct ForestModel {
    artifact: ForestArtifact,
    info: ModelInfo,
}

impl ForestModel {
    /// Load model from file, verifying its SHA-256 when one is given
    pub fn load(path: impl AsRef<Path>, expected_sha256: Option<&str>) -> Result<Self, ModelError> {
        let path = path.as_ref();
        tracing::info!("Loading model from: {}", path.display());

        let bytes = std::fs::read(path).map_err(|source| ModelError::Io {
            path: path.display().to_string(),
            source,
        })?;

        let actual = hex::encode(Sha256::digest(&bytes));
        if let Some(expected) = expected_sha256 {
            if !expected.trim().eq_ignore_ascii_case(&actual) {
                return Err(ModelError::ChecksumMismatch {
                    expected: expected.trim().to_string(),
                    actual,
                });
            }
        }

        let artifact: ForestArtifact = serde_json::from_slice(&bytes)?;
        let model = Self::build(artifact, path.display().to_string(), actual)?;

        tracing::info!(
            "Model '{}' loaded: {} trees, {} encoded columns",
            model.info.name,
            model.info.tree_count,
            model.info.encoded_width
        );
        Ok(model)
    }

    /// Build from an in-memory artifact
    #[cfg(test)]
    pub fn from_artifact(artifact: ForestArtifact) -> Result<Self, ModelError> {
        let bytes = serde_json::to_vec(&artifact)?;
        let digest = hex::encode(Sha256::digest(&bytes));
        Self::build(artifact, "<memory>".to_string(), digest)
    }

    fn build(artifact: ForestArtifact, path: String, sha256: String) -> Result<Self, ModelError> {
        artifact.encoder.validate()?;
        if artifact.trees.is_empty() {
            return Err(ModelError::Invalid("model has no trees".to_string()));
        }
        let width = artifact.encoder.width();
        for (i, tree) in artifact.trees.iter().enumerate() {
            tree.validate(i, width)?;
        }

        let info = ModelInfo {
            path,
            name: artifact.name.clone(),
            tree_count: artifact.trees.len(),
            encoded_width: width,
            sha256,
            loaded_at: Utc::now(),
        };
        Ok(Self { artifact, info })
    }

    pub fn info(&self) -> &ModelInfo {
        &self.info
    }
}

impl Predictor for ForestModel {
    fn predict(&self, features: &FeatureVector) -> Result<f64, PredictError> {
        let row = self.artifact.encoder.encode(features)?;
        let mut sum = 0.0;
        for tree in &self.artifact.trees {
            sum += tree.evaluate(&row)?;
        }
        Ok(sum / self.artifact.trees.len() as f64)
    }
}
