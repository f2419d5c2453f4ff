//! Feature derivation: raw form input to the record the classifier was trained on.

use serde::{Deserialize, Serialize};

use super::assessment::RawAssessmentInput;

/// BMI bucket. Lower bounds are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BmiCategory {
    /// bmi < 18.5
    Underweight,
    /// 18.5 <= bmi < 25
    Normal,
    /// 25 <= bmi < 30
    Overweight,
    /// bmi >= 30
    Obese,
}

impl BmiCategory {
    #[must_use]
    pub fn from_bmi(bmi: f64) -> Self {
        if bmi < 18.5 {
            Self::Underweight
        } else if bmi < 25.0 {
            Self::Normal
        } else if bmi < 30.0 {
            Self::Overweight
        } else {
            Self::Obese
        }
    }

    /// Encoded value fed to the model (0-3).
    #[must_use]
    pub fn code(self) -> u8 {
        match self {
            Self::Underweight => 0,
            Self::Normal => 1,
            Self::Overweight => 2,
            Self::Obese => 3,
        }
    }
}

impl std::fmt::Display for BmiCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Underweight => write!(f, "Underweight"),
            Self::Normal => write!(f, "Normal"),
            Self::Overweight => write!(f, "Overweight"),
            Self::Obese => write!(f, "Obese"),
        }
    }
}

/// Derived feature record, one per assessment.
///
/// Field names follow the training data columns. Categorical fields keep
/// their raw integer encoding.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureRecord {
    pub age_years: u16,
    pub height: u16,
    pub weight: u16,
    pub ap_hi: u16,
    pub ap_lo: u16,
    pub bmi: f64,
    /// Pulse pressure; negative when diastolic exceeds systolic.
    pub bp_diff: i32,
    pub gender: u8,
    pub cholesterol: u8,
    pub gluc: u8,
    pub smoke: u8,
    pub active: u8,
    pub alco: u8,
    pub bmi_cat: BmiCategory,
}

impl FeatureRecord {
    /// Column names in the order the classifier was trained on.
    pub const FEATURE_NAMES: [&'static str; 14] = [
        "age_years",
        "height",
        "weight",
        "ap_hi",
        "ap_lo",
        "bmi",
        "bp_diff",
        "gender",
        "cholesterol",
        "gluc",
        "smoke",
        "active",
        "alco",
        "bmi_cat",
    ];

    /// Positional vector matching [`Self::FEATURE_NAMES`].
    #[must_use]
    pub fn to_vec(&self) -> Vec<f64> {
        vec![
            f64::from(self.age_years),
            f64::from(self.height),
            f64::from(self.weight),
            f64::from(self.ap_hi),
            f64::from(self.ap_lo),
            self.bmi,
            f64::from(self.bp_diff),
            f64::from(self.gender),
            f64::from(self.cholesterol),
            f64::from(self.gluc),
            f64::from(self.smoke),
            f64::from(self.active),
            f64::from(self.alco),
            f64::from(self.bmi_cat.code()),
        ]
    }

    /// Look up a feature by column name.
    #[must_use]
    pub fn value(&self, name: &str) -> Option<f64> {
        Self::index_of(name).map(|i| self.to_vec()[i])
    }

    /// Position of a column in [`Self::FEATURE_NAMES`].
    #[must_use]
    pub fn index_of(name: &str) -> Option<usize> {
        Self::FEATURE_NAMES.iter().position(|n| *n == name)
    }
}

/// Derive the classifier's feature record from raw input.
///
/// Pure and deterministic. Ranges are not re-checked here; callers validate
/// with [`RawAssessmentInput::validate`] first.
#[must_use]
pub fn derive(raw: &RawAssessmentInput) -> FeatureRecord {
    let height_m = f64::from(raw.height_cm) / 100.0;
    let bmi = f64::from(raw.weight_kg) / (height_m * height_m);

    FeatureRecord {
        age_years: raw.age_years,
        height: raw.height_cm,
        weight: raw.weight_kg,
        ap_hi: raw.systolic_bp,
        ap_lo: raw.diastolic_bp,
        bmi,
        bp_diff: i32::from(raw.systolic_bp) - i32::from(raw.diastolic_bp),
        gender: raw.gender.code(),
        cholesterol: raw.cholesterol.code(),
        gluc: raw.glucose.code(),
        smoke: u8::from(raw.smoker),
        active: u8::from(raw.active),
        alco: u8::from(raw.alcohol),
        bmi_cat: BmiCategory::from_bmi(bmi),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Gender, Level};

    fn scenario_one() -> RawAssessmentInput {
        RawAssessmentInput {
            age_years: 45,
            gender: Gender::Male,
            height_cm: 165,
            weight_kg: 70,
            systolic_bp: 120,
            diastolic_bp: 80,
            cholesterol: Level::Normal,
            glucose: Level::Normal,
            smoker: false,
            alcohol: false,
            active: true,
        }
    }

    #[test]
    fn test_scenario_one() {
        let record = derive(&scenario_one());

        assert!((record.bmi - 25.71).abs() < 0.005);
        assert_eq!(record.bmi_cat, BmiCategory::Overweight);
        assert_eq!(record.bmi_cat.code(), 2);
        assert_eq!(record.bp_diff, 40);
        assert_eq!(record.gender, 2);
        assert_eq!(record.active, 1);
        assert_eq!(record.smoke, 0);
    }

    #[test]
    fn test_bmi_formula_across_ranges() {
        for height in (120..=220).step_by(7).chain([220]) {
            for weight in (30..=200).step_by(11).chain([200]) {
                let raw = RawAssessmentInput {
                    height_cm: height,
                    weight_kg: weight,
                    ..Default::default()
                };
                let expected = f64::from(weight) / (f64::from(height) / 100.0).powi(2);
                let record = derive(&raw);
                assert!((record.bmi - expected).abs() < 1e-9);
                assert!(record.bmi > 0.0);
            }
        }
    }

    #[test]
    fn test_bmi_category_boundaries() {
        assert_eq!(BmiCategory::from_bmi(18.49).code(), 0);
        assert_eq!(BmiCategory::from_bmi(18.5).code(), 1);
        assert_eq!(BmiCategory::from_bmi(24.99).code(), 1);
        assert_eq!(BmiCategory::from_bmi(25.0).code(), 2);
        assert_eq!(BmiCategory::from_bmi(29.99).code(), 2);
        assert_eq!(BmiCategory::from_bmi(30.0).code(), 3);
    }

    #[test]
    fn test_bp_diff_is_not_clamped() {
        let raw = RawAssessmentInput {
            systolic_bp: 90,
            diastolic_bp: 110,
            ..Default::default()
        };
        assert_eq!(derive(&raw).bp_diff, -20);
    }

    #[test]
    fn test_derive_is_deterministic() {
        let raw = scenario_one();
        let a = derive(&raw);
        let b = derive(&raw);
        assert_eq!(a, b);
        assert_eq!(a.bmi.to_bits(), b.bmi.to_bits());
    }

    #[test]
    fn test_vector_order_matches_names() {
        let record = derive(&scenario_one());
        let v = record.to_vec();
        assert_eq!(v.len(), FeatureRecord::FEATURE_NAMES.len());
        assert_eq!(record.value("ap_lo"), Some(80.0));
        assert_eq!(record.value("bp_diff"), Some(40.0));
        assert_eq!(record.value("bmi_cat"), Some(2.0));
        assert_eq!(record.value("cholesterol"), Some(1.0));
        assert_eq!(record.value("unknown"), None);
    }

    #[test]
    fn test_extreme_inputs_do_not_panic() {
        let raw = RawAssessmentInput {
            height_cm: 120,
            weight_kg: 200,
            ..Default::default()
        };
        assert_eq!(derive(&raw).bmi_cat, BmiCategory::Obese);
    }
}
