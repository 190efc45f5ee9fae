//! Feature vector model

use serde::{Deserialize, Serialize};
use validator::Validate;

/// One of the six model inputs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    Age,
    Bmi,
    Children,
    Sex,
    Smoker,
    Region,
}

impl Feature {
    /// All features in presentation order
    pub const ALL: [Feature; 6] = [
        Feature::Age,
        Feature::Bmi,
        Feature::Children,
        Feature::Sex,
        Feature::Smoker,
        Feature::Region,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Feature::Age => "age",
            Feature::Bmi => "bmi",
            Feature::Children => "children",
            Feature::Sex => "sex",
            Feature::Smoker => "smoker",
            Feature::Region => "region",
        }
    }
}

impl std::fmt::Display for Feature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Fully populated model input.
///
/// Categorical values are carried as-is; membership in the training label
/// set is the predictor's concern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct FeatureVector {
    #[validate(range(min = 0.0, message = "age must not be negative"))]
    pub age: f64,
    pub bmi: f64,
    #[validate(range(min = 0.0, message = "children must not be negative"))]
    pub children: f64,
    pub sex: String,
    pub smoker: String,
    pub region: String,
}

impl FeatureVector {
    /// Neutral reference profile used for leave-one-out substitution
    pub fn neutral() -> Self {
        Self {
            age: 40.0,
            bmi: 25.0,
            children: 0.0,
            sex: "female".to_string(),
            smoker: "no".to_string(),
            region: "northeast".to_string(),
        }
    }

    /// Copy of `self` with `feature` taken from `other`
    pub fn with_feature_from(&self, feature: Feature, other: &FeatureVector) -> Self {
        let mut out = self.clone();
        match feature {
            Feature::Age => out.age = other.age,
            Feature::Bmi => out.bmi = other.bmi,
            Feature::Children => out.children = other.children,
            Feature::Sex => out.sex = other.sex.clone(),
            Feature::Smoker => out.smoker = other.smoker.clone(),
            Feature::Region => out.region = other.region.clone(),
        }
        out
    }

    pub fn is_smoker(&self) -> bool {
        self.smoker == "yes"
    }

    /// Display form of a single field, used when echoing inputs
    pub fn display_value(&self, feature: Feature) -> String {
        match feature {
            Feature::Age => format_number(self.age),
            Feature::Bmi => format_number(self.bmi),
            Feature::Children => format_number(self.children),
            Feature::Sex => self.sex.clone(),
            Feature::Smoker => self.smoker.clone(),
            Feature::Region => self.region.clone(),
        }
    }
}

impl Default for FeatureVector {
    fn default() -> Self {
        Self::neutral()
    }
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn smoker_profile() -> FeatureVector {
        FeatureVector {
            age: 30.0,
            bmi: 31.2,
            children: 2.0,
            sex: "male".to_string(),
            smoker: "yes".to_string(),
            region: "southwest".to_string(),
        }
    }

    #[test]
    fn test_neutral_profile() {
        let n = FeatureVector::neutral();
        assert_eq!(n.age, 40.0);
        assert_eq!(n.bmi, 25.0);
        assert_eq!(n.children, 0.0);
        assert_eq!(n.sex, "female");
        assert_eq!(n.smoker, "no");
        assert_eq!(n.region, "northeast");
    }

    #[test]
    fn test_substitution_replaces_only_one_field() {
        let v = smoker_profile();
        let neutral = FeatureVector::neutral();

        let swapped = v.with_feature_from(Feature::Smoker, &neutral);
        assert_eq!(swapped.smoker, "no");
        assert_eq!(swapped.age, v.age);
        assert_eq!(swapped.region, v.region);

        let swapped = v.with_feature_from(Feature::Bmi, &neutral);
        assert_eq!(swapped.bmi, 25.0);
        assert_eq!(swapped.smoker, "yes");

        // input untouched
        assert_eq!(v, smoker_profile());
    }

    #[test]
    fn test_every_feature_substitutes_to_neutral() {
        let v = smoker_profile();
        let neutral = FeatureVector::neutral();
        for feature in Feature::ALL {
            let swapped = v.with_feature_from(feature, &neutral);
            assert_eq!(swapped.display_value(feature), neutral.display_value(feature));
        }
    }

    #[test]
    fn test_range_validation() {
        assert!(smoker_profile().validate().is_ok());

        let mut v = smoker_profile();
        v.age = -1.0;
        assert!(v.validate().is_err());

        let mut v = smoker_profile();
        v.children = -2.0;
        assert!(v.validate().is_err());
    }

    #[test]
    fn test_display_value() {
        let v = smoker_profile();
        assert_eq!(v.display_value(Feature::Age), "30");
        assert_eq!(v.display_value(Feature::Bmi), "31.2");
        assert_eq!(v.display_value(Feature::Region), "southwest");
        assert_eq!(Feature::Children.to_string(), "children");
    }
}
