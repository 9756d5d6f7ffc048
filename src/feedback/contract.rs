//! The feedback contract.
//!
//! [`ReviewFeedback`] is both what a provider must return and what the API
//! hands back to callers. Its JSON Schema is embedded in provider prompts, and
//! [`ReviewFeedback::validate`] enforces the bounds the schema cannot express.

use crate::error::ContractError;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, JsonSchema)]
pub struct Issue {
    pub severity: Severity,
    pub area: String,
    pub description: String,
    pub suggestion: String,
}

/// A bounding box over one frame, in percent of the image size.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, JsonSchema)]
pub struct Annotation {
    /// 0-based index of the frame the box belongs to
    #[serde(default)]
    pub frame_index: usize,

    #[schemars(range(min = 0, max = 100))]
    pub x_pct: f64,

    #[schemars(range(min = 0, max = 100))]
    pub y_pct: f64,

    #[schemars(range(min = 0, max = 100))]
    pub width_pct: f64,

    #[schemars(range(min = 0, max = 100))]
    pub height_pct: f64,

    /// 0-based index into `issues`
    pub issue_index: usize,

    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, JsonSchema)]
pub struct ReviewFeedback {
    pub persona: String,

    pub persona_label: String,

    pub overall_impression: String,

    pub issues: Vec<Issue>,

    pub positives: Vec<String>,

    #[schemars(range(min = 1, max = 10))]
    pub score: u8,

    #[serde(default)]
    pub annotations: Option<Vec<Annotation>>,
}

impl ReviewFeedback {
    /// Check the bounds the type system does not cover.
    ///
    /// `frame_count` is the number of frames that were submitted; annotations
    /// must point at one of them and at an existing issue.
    pub fn validate(&self, frame_count: usize) -> Result<(), ContractError> {
        if !(1..=10).contains(&self.score) {
            return Err(ContractError::Invalid(format!(
                "score {} is outside 1-10",
                self.score
            )));
        }

        for (idx, annotation) in self.annotations.iter().flatten().enumerate() {
            let boxes = [
                ("x_pct", annotation.x_pct),
                ("y_pct", annotation.y_pct),
                ("width_pct", annotation.width_pct),
                ("height_pct", annotation.height_pct),
            ];
            for (field, value) in boxes {
                if !(0.0..=100.0).contains(&value) {
                    return Err(ContractError::Invalid(format!(
                        "annotation {} {} = {} is outside 0-100",
                        idx, field, value
                    )));
                }
            }

            if annotation.issue_index >= self.issues.len() {
                return Err(ContractError::Invalid(format!(
                    "annotation {} references issue {} but only {} issues exist",
                    idx,
                    annotation.issue_index,
                    self.issues.len()
                )));
            }

            if annotation.frame_index >= frame_count {
                return Err(ContractError::Invalid(format!(
                    "annotation {} references frame {} but only {} frames were submitted",
                    idx, annotation.frame_index, frame_count
                )));
            }
        }

        Ok(())
    }
}

/// JSON Schema of the feedback contract, pretty-printed.
pub fn feedback_schema() -> String {
    let schema = schemars::schema_for!(ReviewFeedback);
    // Serializing a schema generated from our own types cannot fail
    serde_json::to_string_pretty(&schema).unwrap_or_default()
}
