//! Risk classification rule sets
//!
//! Pure, stateless tier selection from a `RiskAssessment`.
//! Tiers are checked most severe first and the first matching tier wins;
//! lower tiers are never evaluated once a higher one matches.
//!
//! Global invariants enforced:
//! - Classification is total: every input yields exactly one category
//! - All numeric clauses use strict comparisons
//! - Informational inputs are never read

use crate::assessment::RiskAssessment;
use crate::bmi::{calculate_bmi, round2};
use crate::risk::{RiskCategory, RiskResult};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// A single clause that caused a tier to match
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Criterion {
    /// Boolean input answered "Yes"
    Flag { input: &'static str },
    /// Numeric input strictly above a threshold
    Above {
        input: &'static str,
        value: f64,
        threshold: f64,
    },
    /// Numeric input strictly below a threshold
    Below {
        input: &'static str,
        value: f64,
        threshold: f64,
    },
}

impl Criterion {
    pub fn input(&self) -> &'static str {
        match self {
            Criterion::Flag { input }
            | Criterion::Above { input, .. }
            | Criterion::Below { input, .. } => input,
        }
    }
}

impl std::fmt::Display for Criterion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Criterion::Flag { input } => write!(f, "{}", input),
            Criterion::Above {
                input,
                value,
                threshold,
            } => write!(f, "{}={} (>{})", input, value, threshold),
            Criterion::Below {
                input,
                value,
                threshold,
            } => write!(f, "{}={} (<{})", input, value, threshold),
        }
    }
}

/// Collects the clauses of one tier that fire
#[derive(Default)]
struct Tier {
    fired: Vec<Criterion>,
}

impl Tier {
    fn flag(mut self, input: &'static str, value: bool) -> Self {
        if value {
            self.fired.push(Criterion::Flag { input });
        }
        self
    }

    fn above(mut self, input: &'static str, value: f64, threshold: f64) -> Self {
        if value > threshold {
            self.fired.push(Criterion::Above {
                input,
                value,
                threshold,
            });
        }
        self
    }

    fn below(mut self, input: &'static str, value: f64, threshold: f64) -> Self {
        if value < threshold {
            self.fired.push(Criterion::Below {
                input,
                value,
                threshold,
            });
        }
        self
    }

    fn matched(self) -> Option<Vec<Criterion>> {
        if self.fired.is_empty() {
            None
        } else {
            Some(self.fired)
        }
    }
}

/// A named set of tier conditions
pub trait RuleSet {
    fn name(&self) -> &'static str;

    /// Select the category and the clauses of the winning tier
    fn evaluate(&self, assessment: &RiskAssessment) -> (RiskCategory, Vec<Criterion>);

    /// Classify an assessment. Never fails.
    fn classify(&self, assessment: &RiskAssessment) -> RiskResult {
        let (category, triggered_by) = self.evaluate(assessment);
        tracing::debug!(
            rules = self.name(),
            category = category.as_str(),
            clauses = triggered_by.len(),
            "classified assessment"
        );
        RiskResult::new(category, triggered_by)
    }
}

/// Six-input rule set: age, diabetes, LDL, HDL, total cholesterol, calcium score
#[derive(Debug, Clone, Copy, Default)]
pub struct BasicRules;

impl RuleSet for BasicRules {
    fn name(&self) -> &'static str {
        "basic"
    }

    fn evaluate(&self, a: &RiskAssessment) -> (RiskCategory, Vec<Criterion>) {
        let calcium = f64::from(a.calcium_score);

        if let Some(fired) = Tier::default()
            .flag("diabetes", a.diabetes)
            .above("ldl", a.ldl, 160.0)
            .above("calcium_score", calcium, 100.0)
            .matched()
        {
            return (RiskCategory::VeryHigh, fired);
        }

        if let Some(fired) = Tier::default()
            .above("ldl", a.ldl, 130.0)
            .above("calcium_score", calcium, 50.0)
            .matched()
        {
            return (RiskCategory::High, fired);
        }

        if let Some(fired) = Tier::default().above("ldl", a.ldl, 100.0).matched() {
            return (RiskCategory::Moderate, fired);
        }

        (RiskCategory::Low, Vec::new())
    }
}

/// Twenty-four-input rule set with enhancer conditions
#[derive(Debug, Clone, Copy, Default)]
pub struct ExtendedRules;

impl RuleSet for ExtendedRules {
    fn name(&self) -> &'static str {
        "extended"
    }

    fn evaluate(&self, a: &RiskAssessment) -> (RiskCategory, Vec<Criterion>) {
        let calcium = f64::from(a.calcium_score);

        if let Some(fired) = Tier::default()
            .flag("diabetes", a.diabetes)
            .flag("prediabetes", a.prediabetes)
            .flag("hypertension", a.hypertension)
            .flag("smoking", a.smoking)
            .flag("family_history", a.family_history)
            .above("ldl", a.ldl, 160.0)
            .above("calcium_score", calcium, 100.0)
            .above("lpa", a.lpa, 50.0)
            .flag("carotid_plaque", a.carotid_plaque)
            .below("abi", a.abi, 0.9)
            .flag("menopause", a.menopause)
            .flag("inflammatory_diseases", a.inflammatory_diseases)
            .flag("nafld", a.nafld)
            .flag("air_pollution", a.air_pollution)
            .matched()
        {
            return (RiskCategory::VeryHigh, fired);
        }

        if let Some(fired) = Tier::default()
            .above("ldl", a.ldl, 130.0)
            .above("calcium_score", calcium, 50.0)
            .above("triglycerides", a.triglycerides, 200.0)
            .above("lpa", a.lpa, 30.0)
            .matched()
        {
            return (RiskCategory::High, fired);
        }

        if let Some(fired) = Tier::default().above("ldl", a.ldl, 100.0).matched() {
            return (RiskCategory::Moderate, fired);
        }

        (RiskCategory::Low, Vec::new())
    }

    fn classify(&self, a: &RiskAssessment) -> RiskResult {
        let (category, triggered_by) = self.evaluate(a);
        let bmi = round2(calculate_bmi(a.weight_kg, a.height_cm));
        tracing::debug!(
            rules = self.name(),
            category = category.as_str(),
            clauses = triggered_by.len(),
            bmi,
            "classified assessment"
        );
        RiskResult::new(category, triggered_by).with_bmi(bmi)
    }
}

/// Caller-selected rule set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleSetKind {
    #[default]
    Basic,
    Extended,
}

impl RuleSetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleSetKind::Basic => "basic",
            RuleSetKind::Extended => "extended",
        }
    }

    pub fn ruleset(&self) -> &'static dyn RuleSet {
        match self {
            RuleSetKind::Basic => &BasicRules,
            RuleSetKind::Extended => &ExtendedRules,
        }
    }
}

impl FromStr for RuleSetKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s {
            "basic" => Ok(RuleSetKind::Basic),
            "extended" => Ok(RuleSetKind::Extended),
            other => anyhow::bail!("unknown rule set {:?} (expected basic or extended)", other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extended_baseline() -> RiskAssessment {
        RiskAssessment {
            ldl: 95.0,
            calcium_score: 0,
            triglycerides: 150.0,
            lpa: 10.0,
            abi: 1.0,
            ..RiskAssessment::default()
        }
    }

    #[test]
    fn test_basic_scenario_moderate() {
        let a = RiskAssessment {
            age: 50,
            diabetes: false,
            ldl: 120.0,
            hdl: 50.0,
            total_cholesterol: 200.0,
            calcium_score: 0,
            ..RiskAssessment::default()
        };
        let result = BasicRules.classify(&a);
        assert_eq!(result.risk_category, RiskCategory::Moderate);
        assert_eq!(result.ldl_target, "<100 mg/dL");
        assert_eq!(result.non_hdl_target, "<130 mg/dL");
        assert!(result.bmi.is_none());
    }

    #[test]
    fn test_extended_scenario_low() {
        let result = ExtendedRules.classify(&extended_baseline());
        assert_eq!(result.risk_category, RiskCategory::Low);
        assert_eq!(result.ldl_target, "<130 mg/dL");
        assert_eq!(result.non_hdl_target, "<160 mg/dL");
        assert!(result.triggered_by.is_empty());
    }

    #[test]
    fn test_basic_diabetes_is_very_high() {
        let a = RiskAssessment {
            diabetes: true,
            ldl: 60.0,
            ..RiskAssessment::default()
        };
        assert_eq!(BasicRules.classify(&a).risk_category, RiskCategory::VeryHigh);
    }

    #[test]
    fn test_calcium_boundaries() {
        let at = |score| RiskAssessment {
            ldl: 90.0,
            calcium_score: score,
            ..RiskAssessment::default()
        };
        assert_eq!(BasicRules.classify(&at(50)).risk_category, RiskCategory::Low);
        assert_eq!(BasicRules.classify(&at(51)).risk_category, RiskCategory::High);
        assert_eq!(BasicRules.classify(&at(100)).risk_category, RiskCategory::High);
        assert_eq!(
            BasicRules.classify(&at(101)).risk_category,
            RiskCategory::VeryHigh
        );
    }

    #[test]
    fn test_basic_ignores_extended_inputs() {
        let a = RiskAssessment {
            ldl: 90.0,
            smoking: true,
            hypertension: true,
            lpa: 80.0,
            abi: 0.6,
            triglycerides: 400.0,
            ..RiskAssessment::default()
        };
        assert_eq!(BasicRules.classify(&a).risk_category, RiskCategory::Low);
        assert_eq!(ExtendedRules.classify(&a).risk_category, RiskCategory::VeryHigh);
    }

    #[test]
    fn test_extended_abi_strictly_below() {
        let mut a = extended_baseline();
        a.abi = 0.9;
        assert_eq!(ExtendedRules.classify(&a).risk_category, RiskCategory::Low);
        a.abi = 0.89;
        assert_eq!(ExtendedRules.classify(&a).risk_category, RiskCategory::VeryHigh);
    }

    #[test]
    fn test_extended_lpa_tiers() {
        let mut a = extended_baseline();
        a.lpa = 30.0;
        assert_eq!(ExtendedRules.classify(&a).risk_category, RiskCategory::Low);
        a.lpa = 31.0;
        assert_eq!(ExtendedRules.classify(&a).risk_category, RiskCategory::High);
        a.lpa = 50.0;
        assert_eq!(ExtendedRules.classify(&a).risk_category, RiskCategory::High);
        a.lpa = 51.0;
        assert_eq!(ExtendedRules.classify(&a).risk_category, RiskCategory::VeryHigh);
    }

    #[test]
    fn test_extended_triglycerides_high() {
        let mut a = extended_baseline();
        a.triglycerides = 201.0;
        let result = ExtendedRules.classify(&a);
        assert_eq!(result.risk_category, RiskCategory::High);
        assert_eq!(
            result.triggered_by,
            vec![Criterion::Above {
                input: "triglycerides",
                value: 201.0,
                threshold: 200.0,
            }]
        );
    }

    #[test]
    fn test_triggered_by_lists_winning_tier_only() {
        let a = RiskAssessment {
            diabetes: true,
            ldl: 140.0,
            calcium_score: 60,
            ..RiskAssessment::default()
        };
        let result = BasicRules.classify(&a);
        assert_eq!(result.risk_category, RiskCategory::VeryHigh);
        // ldl and calcium only satisfy High clauses, which are never evaluated
        assert_eq!(result.triggered_by, vec![Criterion::Flag { input: "diabetes" }]);
    }

    #[test]
    fn test_extended_attaches_rounded_bmi() {
        let result = ExtendedRules.classify(&extended_baseline());
        assert_eq!(result.bmi, Some(24.22));
    }

    #[test]
    fn test_criterion_display() {
        let c = Criterion::Below {
            input: "abi",
            value: 0.8,
            threshold: 0.9,
        };
        assert_eq!(c.to_string(), "abi=0.8 (<0.9)");
        assert_eq!(Criterion::Flag { input: "nafld" }.to_string(), "nafld");
    }

    #[test]
    fn test_ruleset_kind_selection() {
        assert_eq!(RuleSetKind::Basic.ruleset().name(), "basic");
        assert_eq!(RuleSetKind::Extended.ruleset().name(), "extended");
        assert_eq!("extended".parse::<RuleSetKind>().unwrap(), RuleSetKind::Extended);
        assert!("v3".parse::<RuleSetKind>().is_err());
    }
}
