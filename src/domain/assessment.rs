//! Raw assessment input as entered on the form.
//!
//! Categorical fields are typed so that invalid codes cannot be represented
//! once parsed. Numeric ranges are checked by [`RawAssessmentInput::validate`].

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

/// Age in years.
pub const AGE_RANGE: RangeInclusive<u16> = 18..=100;
/// Height in cm.
pub const HEIGHT_RANGE: RangeInclusive<u16> = 120..=220;
/// Weight in kg.
pub const WEIGHT_RANGE: RangeInclusive<u16> = 30..=200;
/// Systolic blood pressure in mmHg.
pub const SYSTOLIC_RANGE: RangeInclusive<u16> = 80..=220;
/// Diastolic blood pressure in mmHg.
pub const DIASTOLIC_RANGE: RangeInclusive<u16> = 40..=160;

/// Biological sex as encoded in the training data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    Female,
    Male,
}

impl Gender {
    /// Raw encoding: 1 = female, 2 = male.
    #[must_use]
    pub fn code(self) -> u8 {
        match self {
            Self::Female => 1,
            Self::Male => 2,
        }
    }
}

impl TryFrom<u8> for Gender {
    type Error = String;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            1 => Ok(Self::Female),
            2 => Ok(Self::Male),
            other => Err(format!("Gender code {other} must be 1 or 2")),
        }
    }
}

impl std::fmt::Display for Gender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Female => write!(f, "Female"),
            Self::Male => write!(f, "Male"),
        }
    }
}

/// Three-step lab scale shared by cholesterol and glucose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Level {
    Normal,
    AboveNormal,
    High,
}

impl Level {
    /// Raw encoding: 1 = normal, 2 = above normal, 3 = high.
    #[must_use]
    pub fn code(self) -> u8 {
        match self {
            Self::Normal => 1,
            Self::AboveNormal => 2,
            Self::High => 3,
        }
    }
}

impl TryFrom<u8> for Level {
    type Error = String;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            1 => Ok(Self::Normal),
            2 => Ok(Self::AboveNormal),
            3 => Ok(Self::High),
            other => Err(format!("Level code {other} must be 1, 2 or 3")),
        }
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Normal => write!(f, "Normal"),
            Self::AboveNormal => write!(f, "Above Normal"),
            Self::High => write!(f, "High"),
        }
    }
}

/// Everything the user enters for one assessment.
///
/// Lives only for the duration of a single assessment; nothing is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawAssessmentInput {
    /// Age in years (18-100)
    pub age_years: u16,

    pub gender: Gender,

    /// Height in cm (120-220)
    pub height_cm: u16,

    /// Weight in kg (30-200)
    pub weight_kg: u16,

    /// Systolic blood pressure, `ap_hi` (80-220 mmHg)
    pub systolic_bp: u16,

    /// Diastolic blood pressure, `ap_lo` (40-160 mmHg)
    pub diastolic_bp: u16,

    pub cholesterol: Level,

    pub glucose: Level,

    pub smoker: bool,

    pub alcohol: bool,

    /// Physically active
    pub active: bool,
}

impl Default for RawAssessmentInput {
    /// Form defaults: a 45 year old woman, 165 cm, 70 kg, 120/80 mmHg,
    /// normal labs, no risk behaviours.
    fn default() -> Self {
        Self {
            age_years: 45,
            gender: Gender::Female,
            height_cm: 165,
            weight_kg: 70,
            systolic_bp: 120,
            diastolic_bp: 80,
            cholesterol: Level::Normal,
            glucose: Level::Normal,
            smoker: false,
            alcohol: false,
            active: false,
        }
    }
}

fn check_range(
    errors: &mut Vec<String>,
    label: &str,
    value: u16,
    range: &RangeInclusive<u16>,
    unit: &str,
) {
    if !range.contains(&value) {
        errors.push(format!(
            "{label} {value} {unit} out of range [{}, {}]",
            range.start(),
            range.end()
        ));
    }
}

impl RawAssessmentInput {
    /// Check every numeric field against its allowed range.
    ///
    /// # Errors
    /// Returns all violations, not just the first one.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        check_range(&mut errors, "Age", self.age_years, &AGE_RANGE, "years");
        check_range(&mut errors, "Height", self.height_cm, &HEIGHT_RANGE, "cm");
        check_range(&mut errors, "Weight", self.weight_kg, &WEIGHT_RANGE, "kg");
        check_range(
            &mut errors,
            "Systolic BP",
            self.systolic_bp,
            &SYSTOLIC_RANGE,
            "mmHg",
        );
        check_range(
            &mut errors,
            "Diastolic BP",
            self.diastolic_bp,
            &DIASTOLIC_RANGE,
            "mmHg",
        );

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
