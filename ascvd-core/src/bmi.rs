//! Body mass index
//!
//! Computed alongside the extended classification for display only.
//! No rule set reads it.

use serde::{Deserialize, Serialize};

/// BMI = weight_kg / (height_cm / 100)^2
pub fn calculate_bmi(weight_kg: f64, height_cm: f64) -> f64 {
    let height_m = height_cm / 100.0;
    weight_kg / (height_m * height_m)
}

/// Round to two decimals for display
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// WHO adult BMI bands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BmiClass {
    Underweight, // < 18.5
    Normal,      // 18.5-25
    Overweight,  // 25-30
    Obese,       // >= 30
}

impl BmiClass {
    pub fn from_bmi(bmi: f64) -> Self {
        if bmi < 18.5 {
            BmiClass::Underweight
        } else if bmi < 25.0 {
            BmiClass::Normal
        } else if bmi < 30.0 {
            BmiClass::Overweight
        } else {
            BmiClass::Obese
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BmiClass::Underweight => "underweight",
            BmiClass::Normal => "normal",
            BmiClass::Overweight => "overweight",
            BmiClass::Obese => "obese",
        }
    }
}
