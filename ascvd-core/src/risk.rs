//! Risk categories and lipid targets
//!
//! Global invariants enforced:
//! - Exactly one category per assessment
//! - Each category maps to one fixed pair of targets

use crate::rules::Criterion;
use serde::{Deserialize, Serialize};

/// Risk category, ordered from least to most severe
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RiskCategory {
    Low,
    Moderate,
    High,
    VeryHigh,
}

impl RiskCategory {
    /// All categories, least severe first
    pub const ALL: [RiskCategory; 4] = [
        RiskCategory::Low,
        RiskCategory::Moderate,
        RiskCategory::High,
        RiskCategory::VeryHigh,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskCategory::Low => "low",
            RiskCategory::Moderate => "moderate",
            RiskCategory::High => "high",
            RiskCategory::VeryHigh => "very-high",
        }
    }

    /// Heading shown to the user
    pub fn label(&self) -> &'static str {
        match self {
            RiskCategory::Low => "Low Risk",
            RiskCategory::Moderate => "Moderate Risk",
            RiskCategory::High => "High Risk",
            RiskCategory::VeryHigh => "Very High Risk",
        }
    }

    /// LDL and Non-HDL targets for this category
    pub fn targets(&self) -> LipidTargets {
        let (ldl, non_hdl) = match self {
            RiskCategory::VeryHigh => ("<55 mg/dL", "<85 mg/dL"),
            RiskCategory::High => ("<70 mg/dL", "<100 mg/dL"),
            RiskCategory::Moderate => ("<100 mg/dL", "<130 mg/dL"),
            RiskCategory::Low => ("<130 mg/dL", "<160 mg/dL"),
        };
        LipidTargets { ldl, non_hdl }
    }
}

impl std::fmt::Display for RiskCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Treatment thresholds attached to a category
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LipidTargets {
    pub ldl: &'static str,
    pub non_hdl: &'static str,
}

/// Outcome of classifying one assessment
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskResult {
    pub risk_category: RiskCategory,
    pub ldl_target: &'static str,
    pub non_hdl_target: &'static str,
    /// Only populated by rule sets that collect weight and height
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bmi: Option<f64>,
    /// Clauses of the winning tier that matched (empty for Low)
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub triggered_by: Vec<Criterion>,
}

impl RiskResult {
    pub fn new(risk_category: RiskCategory, triggered_by: Vec<Criterion>) -> Self {
        let targets = risk_category.targets();
        RiskResult {
            risk_category,
            ldl_target: targets.ldl,
            non_hdl_target: targets.non_hdl,
            bmi: None,
            triggered_by,
        }
    }

    pub fn with_bmi(mut self, bmi: f64) -> Self {
        self.bmi = Some(bmi);
        self
    }
}
