//! Clinical inputs for one risk assessment
//!
//! A `RiskAssessment` is built fresh from the form values on every
//! calculation and discarded once the result is rendered.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Biological sex. Collected by the extended form, never used by any rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    #[default]
    Male,
    Female,
}

impl Sex {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sex::Male => "Male",
            Sex::Female => "Female",
        }
    }
}

impl FromStr for Sex {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "male" | "m" => Ok(Sex::Male),
            "female" | "f" => Ok(Sex::Female),
            other => anyhow::bail!("expected Male or Female (got {:?})", other),
        }
    }
}

/// Map a Yes/No selection to a boolean. Anything other than "yes" is false.
pub fn parse_yes_no(s: &str) -> bool {
    s.trim().eq_ignore_ascii_case("yes")
}

/// Every input either form can collect.
///
/// Lipid values are mg/dL. Fields marked informational are collected and
/// echoed back but no rule set reads them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub age: u32,
    /// Informational
    pub sex: Sex,
    pub weight_kg: f64,
    pub height_cm: f64,

    pub diabetes: bool,
    pub prediabetes: bool,
    pub hypertension: bool,
    pub smoking: bool,
    pub family_history: bool,
    pub carotid_plaque: bool,
    pub menopause: bool,
    pub inflammatory_diseases: bool,
    pub nafld: bool,
    pub air_pollution: bool,
    /// Informational
    pub ethnicity: bool,
    /// Informational
    pub socioeconomic_factors: bool,

    pub ldl: f64,
    /// Informational
    pub hdl: f64,
    pub triglycerides: f64,
    /// Informational
    pub non_hdl_cholesterol: f64,
    /// Informational
    pub apo_b: f64,
    /// Informational
    pub total_cholesterol: f64,

    pub calcium_score: u32,
    pub abi: f64,
    pub lpa: f64,
}

impl Default for RiskAssessment {
    fn default() -> Self {
        RiskAssessment {
            age: 50,
            sex: Sex::Male,
            weight_kg: 70.0,
            height_cm: 170.0,
            diabetes: false,
            prediabetes: false,
            hypertension: false,
            smoking: false,
            family_history: false,
            carotid_plaque: false,
            menopause: false,
            inflammatory_diseases: false,
            nafld: false,
            air_pollution: false,
            ethnicity: false,
            socioeconomic_factors: false,
            ldl: 120.0,
            hdl: 50.0,
            triglycerides: 150.0,
            non_hdl_cholesterol: 130.0,
            apo_b: 90.0,
            total_cholesterol: 200.0,
            calcium_score: 0,
            abi: 1.0,
            lpa: 10.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yes_no_mapping() {
        assert!(parse_yes_no("Yes"));
        assert!(parse_yes_no(" yes "));
        assert!(!parse_yes_no("No"));
        assert!(!parse_yes_no("y"));
        assert!(!parse_yes_no(""));
    }

    #[test]
    fn test_parse_sex() {
        assert_eq!("Female".parse::<Sex>().unwrap(), Sex::Female);
        assert_eq!("m".parse::<Sex>().unwrap(), Sex::Male);
        assert!("other".parse::<Sex>().is_err());
    }

    #[test]
    fn test_defaults_match_form() {
        let a = RiskAssessment::default();
        assert_eq!(a.age, 50);
        assert_eq!(a.ldl, 120.0);
        assert_eq!(a.calcium_score, 0);
        assert!(!a.diabetes);
    }

    #[test]
    fn test_json_roundtrip_keeps_informational_fields() {
        let a = RiskAssessment {
            sex: Sex::Female,
            apo_b: 110.0,
            ..RiskAssessment::default()
        };
        let json = serde_json::to_string(&a).unwrap();
        assert!(json.contains("\"sex\":\"female\""));
        let back: RiskAssessment = serde_json::from_str(&json).unwrap();
        assert_eq!(back, a);
    }
}
