//! Reporting and output generation
//!
//! Global invariants enforced:
//! - Advice is fixed and never varies by category
//! - Identical results render byte-for-byte identical output

use crate::bmi::BmiClass;
use crate::risk::{RiskCategory, RiskResult};
use crate::rules::{Criterion, RuleSetKind};
use serde::Serialize;

/// Lifestyle and medical recommendations shown with every result
pub const ADVICE: [&str; 5] = [
    "Reduce refined carbohydrates and sugar.",
    "Increase fiber intake (whole grains, legumes, vegetables, and fruits).",
    "Use healthy fats (MUFA, Omega-3). Avoid trans fats.",
    "Engage in 150 minutes/week of moderate-intensity aerobic exercise.",
    "Consider statins, ezetimibe, or PCSK9 inhibitors if LDL remains high.",
];

/// BMI in report format
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct BmiReport {
    pub value: f64,
    pub class: BmiClass,
}

/// Everything the presenter displays for one calculation
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AssessmentReport {
    pub rules: RuleSetKind,
    pub risk_category: RiskCategory,
    pub risk_label: String,
    pub ldl_target: String,
    pub non_hdl_target: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bmi: Option<BmiReport>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub triggered_by: Vec<Criterion>,
    pub advice: Vec<String>,
}

impl AssessmentReport {
    /// Create a report. Criteria are kept only when `explain` is set.
    pub fn new(rules: RuleSetKind, result: RiskResult, explain: bool) -> Self {
        AssessmentReport {
            rules,
            risk_category: result.risk_category,
            risk_label: result.risk_category.label().to_string(),
            ldl_target: result.ldl_target.to_string(),
            non_hdl_target: result.non_hdl_target.to_string(),
            bmi: result.bmi.map(|value| BmiReport {
                value,
                class: BmiClass::from_bmi(value),
            }),
            triggered_by: if explain {
                result.triggered_by
            } else {
                Vec::new()
            },
            advice: ADVICE.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Render a report as plain-text sections
pub fn render_text(report: &AssessmentReport) -> String {
    let mut output = String::new();

    output.push_str("Risk Classification\n");
    output.push_str(&format!("  {}\n\n", report.risk_label));

    output.push_str("LDL & Non-HDL Targets\n");
    output.push_str(&format!("  LDL Target: {}\n", report.ldl_target));
    output.push_str(&format!("  Non-HDL Target: {}\n", report.non_hdl_target));

    if let Some(ref bmi) = report.bmi {
        output.push_str(&format!("\nBMI: {:.2} ({})\n", bmi.value, bmi.class.as_str()));
    }

    if !report.triggered_by.is_empty() {
        output.push_str("\nTriggered By\n");
        for criterion in &report.triggered_by {
            output.push_str(&format!("  {}\n", criterion));
        }
    }

    output.push_str("\nLifestyle & Medical Recommendations\n");
    for line in &report.advice {
        output.push_str(&format!("- {}\n", line));
    }

    output
}

/// Render a report as pretty JSON
pub fn render_json(report: &AssessmentReport) -> String {
    serde_json::to_string_pretty(report).unwrap_or_else(|_| "{}".to_string())
}
