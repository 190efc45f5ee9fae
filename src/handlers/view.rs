//! HTML rendering for the form page

use minijinja::{context, AutoEscape, Environment};
use serde::Serialize;

use crate::models::{ExplanationResult, Feature, FeatureVector};

const INDEX_TEMPLATE: &str = "index.html";

const SEX_OPTIONS: &[&str] = &["female", "male"];
const SMOKER_OPTIONS: &[&str] = &["no", "yes"];
const REGION_OPTIONS: &[&str] = &["northeast", "northwest", "southeast", "southwest"];

/// What the page shows below the form
pub enum PageContent<'a> {
    Empty,
    Result {
        input: &'a FeatureVector,
        explanation: &'a ExplanationResult,
    },
    Error {
        input: Option<&'a FeatureVector>,
        message: &'a str,
    },
}

#[derive(Serialize)]
struct NumericField {
    name: &'static str,
    value: String,
}

#[derive(Serialize)]
struct ChoiceField {
    name: &'static str,
    options: &'static [&'static str],
    current: String,
}

/// Form values echoed back into the inputs
#[derive(Serialize)]
struct FormValues {
    numeric: Vec<NumericField>,
    choices: Vec<ChoiceField>,
}

impl FormValues {
    fn from_vector(values: &FeatureVector) -> Self {
        let numeric = [Feature::Age, Feature::Bmi, Feature::Children]
            .into_iter()
            .map(|feature| NumericField {
                name: feature.name(),
                value: values.display_value(feature),
            })
            .collect();

        let choices = [
            (Feature::Sex, SEX_OPTIONS),
            (Feature::Smoker, SMOKER_OPTIONS),
            (Feature::Region, REGION_OPTIONS),
        ]
        .into_iter()
        .map(|(feature, options)| ChoiceField {
            name: feature.name(),
            options,
            current: values.display_value(feature),
        })
        .collect();

        Self { numeric, choices }
    }
}

#[derive(Serialize)]
struct ContributionRow {
    feature: &'static str,
    input: String,
    value: f64,
    defaulted: bool,
}

/// Compiled page templates, built once at startup and shared via state
pub struct Pages {
    env: Environment<'static>,
}

impl Pages {
    pub fn new() -> Result<Self, minijinja::Error> {
        let mut env = Environment::new();
        env.set_auto_escape_callback(|_| AutoEscape::Html);
        env.add_filter("currency", format_currency);
        env.add_filter("signed_currency", format_signed_currency);
        env.add_template(INDEX_TEMPLATE, include_str!("../../templates/index.html"))?;
        Ok(Self { env })
    }

    pub fn render(&self, content: PageContent<'_>) -> Result<String, minijinja::Error> {
        let neutral = FeatureVector::neutral();
        let (input, explanation, error) = match content {
            PageContent::Empty => (&neutral, None, None),
            PageContent::Result { input, explanation } => (input, Some(explanation), None),
            PageContent::Error { input, message } => (input.unwrap_or(&neutral), None, Some(message)),
        };

        let rows: Vec<ContributionRow> = explanation
            .map(|e| {
                e.contributions
                    .iter()
                    .map(|c| ContributionRow {
                        feature: c.feature.name(),
                        input: input.display_value(c.feature),
                        value: c.outcome.value(),
                        defaulted: c.outcome.is_defaulted(),
                    })
                    .collect()
            })
            .unwrap_or_default();

        self.env.get_template(INDEX_TEMPLATE)?.render(context!(
            input => FormValues::from_vector(input),
            explanation => explanation,
            rows => rows,
            error => error
        ))
    }
}

/// `$12,345.67`, negative amounts as `-$12.00`
pub fn format_currency(amount: f64) -> String {
    let cents = (amount.abs() * 100.0).round() as u64;
    let whole = (cents / 100).to_string();
    let frac = cents % 100;

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if amount < 0.0 && cents > 0 { "-" } else { "" };
    format!("{}${}.{:02}", sign, grouped, frac)
}

fn format_signed_currency(amount: f64) -> String {
    if amount > 0.0 {
        format!("+{}", format_currency(amount))
    } else {
        format_currency(amount)
    }
}
