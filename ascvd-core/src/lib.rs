//! ASCVD core library - risk classification and lipid targets

#![deny(warnings)]

// Global invariants enforced in this crate:
// - Classification is a pure function of one immutable assessment
// - No global mutable state, no I/O outside config loading
// - Tier precedence is explicit: most severe tier is checked first
// - Identical input yields byte-for-byte identical output

pub mod assessment;
pub mod bmi;
pub mod config;
pub mod form;
pub mod report;
pub mod risk;
pub mod rules;

pub use assessment::{RiskAssessment, Sex};
pub use form::FormValues;
pub use report::{render_json, render_text, AssessmentReport};
pub use risk::{RiskCategory, RiskResult};
pub use rules::{BasicRules, ExtendedRules, RuleSet, RuleSetKind};

/// Classify an assessment with the selected rule set
pub fn classify(kind: RuleSetKind, assessment: &RiskAssessment) -> RiskResult {
    kind.ruleset().classify(assessment)
}

/// Build an assessment from form answers, classify it and assemble the report
///
/// This is the "Calculate" action: nothing is computed before it is called.
pub fn calculate(
    kind: RuleSetKind,
    values: &FormValues,
    explain: bool,
) -> anyhow::Result<AssessmentReport> {
    let assessment = values.build(kind)?;
    let result = classify(kind, &assessment);
    Ok(AssessmentReport::new(kind, result, explain))
}
