//! Form field catalog and input collection
//!
//! Each rule set has a catalog of fields with their range constraints and
//! defaults. Raw text answers are validated here, at the collection
//! boundary, so the classifier only ever sees in-range values.

use crate::assessment::{parse_yes_no, RiskAssessment, Sex};
use crate::rules::RuleSetKind;
use anyhow::{Context, Result};

/// Value constraints for a single field
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldKind {
    Integer { min: u32, max: u32, default: u32 },
    Real { min: f64, max: f64, default: f64 },
    /// Yes/No selection, default No
    Choice,
    Sex,
}

/// One entry in a form
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldSpec {
    pub key: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
}

/// A parsed, range-checked field value
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue {
    Integer(u32),
    Real(f64),
    Flag(bool),
    Sex(Sex),
}

const fn integer(
    key: &'static str,
    label: &'static str,
    min: u32,
    max: u32,
    default: u32,
) -> FieldSpec {
    FieldSpec {
        key,
        label,
        kind: FieldKind::Integer { min, max, default },
    }
}

const fn real(
    key: &'static str,
    label: &'static str,
    min: f64,
    max: f64,
    default: f64,
) -> FieldSpec {
    FieldSpec {
        key,
        label,
        kind: FieldKind::Real { min, max, default },
    }
}

const fn choice(key: &'static str, label: &'static str) -> FieldSpec {
    FieldSpec {
        key,
        label,
        kind: FieldKind::Choice,
    }
}

const BASIC_FIELDS: &[FieldSpec] = &[
    integer("age", "Age", 18, 100, 50),
    choice("diabetes", "Do you have diabetes?"),
    real("ldl", "LDL Cholesterol (mg/dL)", 50.0, 300.0, 120.0),
    real("hdl", "HDL Cholesterol (mg/dL)", 20.0, 100.0, 50.0),
    real("total_cholesterol", "Total Cholesterol (mg/dL)", 100.0, 400.0, 200.0),
    integer("calcium_score", "CT Calcium Score (if available)", 0, 1000, 0),
];

const EXTENDED_FIELDS: &[FieldSpec] = &[
    integer("age", "Age", 18, 100, 50),
    FieldSpec {
        key: "sex",
        label: "Sex",
        kind: FieldKind::Sex,
    },
    real("weight_kg", "Weight (kg)", 30.0, 200.0, 70.0),
    real("height_cm", "Height (cm)", 100.0, 250.0, 170.0),
    choice("diabetes", "Do you have diabetes?"),
    choice("prediabetes", "Do you have prediabetes?"),
    choice("hypertension", "Do you have hypertension?"),
    choice("smoking", "Do you smoke?"),
    choice("family_history", "Family history of premature ASCVD?"),
    real("ldl", "LDL Cholesterol (mg/dL)", 50.0, 300.0, 120.0),
    real("hdl", "HDL Cholesterol (mg/dL)", 20.0, 100.0, 50.0),
    real("triglycerides", "Triglycerides (mg/dL)", 50.0, 1000.0, 150.0),
    real("non_hdl_cholesterol", "Non-HDL Cholesterol (mg/dL)", 50.0, 300.0, 130.0),
    real("apo_b", "Apolipoprotein B (mg/dL)", 20.0, 300.0, 90.0),
    real("total_cholesterol", "Total Cholesterol (mg/dL)", 100.0, 400.0, 200.0),
    integer("calcium_score", "CT Calcium Score (if available)", 0, 1000, 0),
    real("abi", "Ankle-Brachial Index", 0.5, 1.5, 1.0),
    real("lpa", "Lipoprotein(a) (mg/dL)", 0.0, 300.0, 10.0),
    choice("carotid_plaque", "Carotid plaque present?"),
    choice("menopause", "Premature menopause?"),
    choice("inflammatory_diseases", "Chronic inflammatory disease?"),
    choice("nafld", "Non-alcoholic fatty liver disease?"),
    choice("air_pollution", "Long-term exposure to air pollution?"),
    choice("ethnicity", "South Asian ethnicity?"),
    choice("socioeconomic_factors", "Adverse socioeconomic factors?"),
];

/// Fields collected for a rule set, in prompt order
pub fn fields(kind: RuleSetKind) -> &'static [FieldSpec] {
    match kind {
        RuleSetKind::Basic => BASIC_FIELDS,
        RuleSetKind::Extended => EXTENDED_FIELDS,
    }
}

/// Look up a field by key
pub fn field(kind: RuleSetKind, key: &str) -> Option<&'static FieldSpec> {
    fields(kind).iter().find(|f| f.key == key)
}

impl FieldSpec {
    /// Parse and range-check a raw answer
    pub fn parse(&self, raw: &str) -> Result<FieldValue> {
        let raw = raw.trim();
        match self.kind {
            FieldKind::Integer { min, max, .. } => {
                let value: u32 = raw.parse().with_context(|| {
                    format!("{} must be a whole number (got {:?})", self.key, raw)
                })?;
                if !(min..=max).contains(&value) {
                    anyhow::bail!(
                        "{} must be between {} and {} (got {})",
                        self.key,
                        min,
                        max,
                        value
                    );
                }
                Ok(FieldValue::Integer(value))
            }
            FieldKind::Real { min, max, .. } => {
                let value: f64 = raw
                    .parse()
                    .with_context(|| format!("{} must be a number (got {:?})", self.key, raw))?;
                if !(min..=max).contains(&value) {
                    anyhow::bail!(
                        "{} must be between {} and {} (got {})",
                        self.key,
                        min,
                        max,
                        value
                    );
                }
                Ok(FieldValue::Real(value))
            }
            FieldKind::Choice => Ok(FieldValue::Flag(parse_yes_no(raw))),
            FieldKind::Sex => Ok(FieldValue::Sex(raw.parse()?)),
        }
    }

    /// Default answer rendered the way a user would type it
    pub fn default_text(&self) -> String {
        match self.kind {
            FieldKind::Integer { default, .. } => default.to_string(),
            FieldKind::Real { default, .. } => default.to_string(),
            FieldKind::Choice => "No".to_string(),
            FieldKind::Sex => Sex::default().as_str().to_string(),
        }
    }

    /// Accepted values, e.g. "18-100" or "Yes/No"
    pub fn range_text(&self) -> String {
        match self.kind {
            FieldKind::Integer { min, max, .. } => format!("{}-{}", min, max),
            FieldKind::Real { min, max, .. } => format!("{}-{}", min, max),
            FieldKind::Choice => "Yes/No".to_string(),
            FieldKind::Sex => "Male/Female".to_string(),
        }
    }
}

/// Write a parsed value into the matching assessment field
fn assign(a: &mut RiskAssessment, key: &str, value: FieldValue) -> Result<()> {
    match (key, value) {
        ("age", FieldValue::Integer(v)) => a.age = v,
        ("calcium_score", FieldValue::Integer(v)) => a.calcium_score = v,
        ("sex", FieldValue::Sex(v)) => a.sex = v,
        ("weight_kg", FieldValue::Real(v)) => a.weight_kg = v,
        ("height_cm", FieldValue::Real(v)) => a.height_cm = v,
        ("ldl", FieldValue::Real(v)) => a.ldl = v,
        ("hdl", FieldValue::Real(v)) => a.hdl = v,
        ("triglycerides", FieldValue::Real(v)) => a.triglycerides = v,
        ("non_hdl_cholesterol", FieldValue::Real(v)) => a.non_hdl_cholesterol = v,
        ("apo_b", FieldValue::Real(v)) => a.apo_b = v,
        ("total_cholesterol", FieldValue::Real(v)) => a.total_cholesterol = v,
        ("abi", FieldValue::Real(v)) => a.abi = v,
        ("lpa", FieldValue::Real(v)) => a.lpa = v,
        ("diabetes", FieldValue::Flag(v)) => a.diabetes = v,
        ("prediabetes", FieldValue::Flag(v)) => a.prediabetes = v,
        ("hypertension", FieldValue::Flag(v)) => a.hypertension = v,
        ("smoking", FieldValue::Flag(v)) => a.smoking = v,
        ("family_history", FieldValue::Flag(v)) => a.family_history = v,
        ("carotid_plaque", FieldValue::Flag(v)) => a.carotid_plaque = v,
        ("menopause", FieldValue::Flag(v)) => a.menopause = v,
        ("inflammatory_diseases", FieldValue::Flag(v)) => a.inflammatory_diseases = v,
        ("nafld", FieldValue::Flag(v)) => a.nafld = v,
        ("air_pollution", FieldValue::Flag(v)) => a.air_pollution = v,
        ("ethnicity", FieldValue::Flag(v)) => a.ethnicity = v,
        ("socioeconomic_factors", FieldValue::Flag(v)) => a.socioeconomic_factors = v,
        (key, value) => anyhow::bail!("field {} cannot hold {:?}", key, value),
    }
    Ok(())
}

/// Raw answers keyed by field, in the order they were entered
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormValues {
    entries: Vec<(String, String)>,
}

impl FormValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an answer, replacing any earlier one for the same key
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Parse a `key=value` pair
    pub fn insert_pair(&mut self, pair: &str) -> Result<()> {
        let (key, value) = pair
            .split_once('=')
            .with_context(|| format!("expected key=value (got {:?})", pair))?;
        self.insert(key.trim(), value.trim());
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Overlay `other` on top of these answers
    pub fn merge(&mut self, other: &FormValues) {
        for (key, value) in &other.entries {
            self.insert(key.clone(), value.clone());
        }
    }

    /// Check every answer against the catalog without building
    pub fn validate(&self, kind: RuleSetKind) -> Result<()> {
        for (key, raw) in &self.entries {
            let spec = field(kind, key)
                .with_context(|| format!("unknown field {:?} for {} rules", key, kind.as_str()))?;
            spec.parse(raw)?;
        }
        Ok(())
    }

    /// Build an assessment from form defaults plus these answers
    pub fn build(&self, kind: RuleSetKind) -> Result<RiskAssessment> {
        let mut assessment = RiskAssessment::default();
        for (key, raw) in &self.entries {
            let spec = field(kind, key)
                .with_context(|| format!("unknown field {:?} for {} rules", key, kind.as_str()))?;
            let value = spec.parse(raw)?;
            assign(&mut assessment, spec.key, value)?;
        }
        tracing::debug!(rules = kind.as_str(), answers = self.entries.len(), "built assessment");
        Ok(assessment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_defaults_match_assessment_defaults() {
        let built = FormValues::new().build(RuleSetKind::Extended).unwrap();
        let mut explicit = FormValues::new();
        for spec in fields(RuleSetKind::Extended) {
            explicit.insert(spec.key, spec.default_text());
        }
        assert_eq!(explicit.build(RuleSetKind::Extended).unwrap(), built);
        assert_eq!(built, RiskAssessment::default());
    }

    #[test]
    fn test_basic_catalog_has_six_fields() {
        let keys: Vec<_> = fields(RuleSetKind::Basic).iter().map(|f| f.key).collect();
        assert_eq!(
            keys,
            vec!["age", "diabetes", "ldl", "hdl", "total_cholesterol", "calcium_score"]
        );
    }

    #[test]
    fn test_extended_keys_are_unique_and_assignable() {
        let specs = fields(RuleSetKind::Extended);
        for (i, spec) in specs.iter().enumerate() {
            assert!(
                specs[i + 1..].iter().all(|other| other.key != spec.key),
                "duplicate key {}",
                spec.key
            );
            let value = spec.parse(&spec.default_text()).unwrap();
            let mut a = RiskAssessment::default();
            assign(&mut a, spec.key, value).unwrap();
        }
    }

    #[test]
    fn test_build_applies_answers() {
        let mut values = FormValues::new();
        values.insert("ldl", "165");
        values.insert("diabetes", "Yes");
        values.insert("calcium_score", "20");
        let a = values.build(RuleSetKind::Basic).unwrap();
        assert_eq!(a.ldl, 165.0);
        assert!(a.diabetes);
        assert_eq!(a.calcium_score, 20);
    }

    #[test]
    fn test_reject_out_of_range() {
        let mut values = FormValues::new();
        values.insert("age", "17");
        let err = values.build(RuleSetKind::Basic).unwrap_err();
        assert!(err.to_string().contains("between 18 and 100"));
    }

    #[test]
    fn test_reject_fractional_integer() {
        let mut values = FormValues::new();
        values.insert("calcium_score", "10.5");
        assert!(values.build(RuleSetKind::Basic).is_err());
    }

    #[test]
    fn test_reject_nan() {
        let spec = field(RuleSetKind::Basic, "ldl").unwrap();
        assert!(spec.parse("NaN").is_err());
    }

    #[test]
    fn test_reject_field_outside_catalog() {
        let mut values = FormValues::new();
        values.insert("lpa", "60");
        let err = values.build(RuleSetKind::Basic).unwrap_err();
        assert!(err.to_string().contains("unknown field"));
        assert!(values.build(RuleSetKind::Extended).is_ok());
    }

    #[test]
    fn test_choice_only_yes_is_true() {
        let spec = field(RuleSetKind::Basic, "diabetes").unwrap();
        assert_eq!(spec.parse("Yes").unwrap(), FieldValue::Flag(true));
        assert_eq!(spec.parse("No").unwrap(), FieldValue::Flag(false));
        assert_eq!(spec.parse("maybe").unwrap(), FieldValue::Flag(false));
    }

    #[test]
    fn test_insert_pair_and_merge() {
        let mut base = FormValues::new();
        base.insert_pair("age=60").unwrap();
        base.insert_pair("ldl = 110").unwrap();
        assert!(base.insert_pair("ldl").is_err());

        let mut overrides = FormValues::new();
        overrides.insert("ldl", "140");
        base.merge(&overrides);

        assert_eq!(base.get("age"), Some("60"));
        assert_eq!(base.get("ldl"), Some("140"));
    }

    #[test]
    fn test_range_text() {
        let abi = field(RuleSetKind::Extended, "abi").unwrap();
        assert_eq!(abi.range_text(), "0.5-1.5");
        let sex = field(RuleSetKind::Extended, "sex").unwrap();
        assert_eq!(sex.default_text(), "Male");
    }
}
