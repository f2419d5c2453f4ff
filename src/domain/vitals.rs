//! Display indicators derived from a feature record.
//!
//! None of this feeds the classifier.

use serde::{Deserialize, Serialize};

use super::features::FeatureRecord;

/// One axis of the profile chart, normalized to `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RadarAxis {
    pub label: &'static str,
    pub value: f64,
}

/// Five-axis profile: age, BMI, systolic BP, cholesterol and glucose.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RadarProfile {
    pub axes: [RadarAxis; 5],
}

impl RadarProfile {
    #[must_use]
    pub fn from_record(record: &FeatureRecord) -> Self {
        Self {
            axes: [
                RadarAxis {
                    label: "Age",
                    value: (f64::from(record.age_years) / 80.0).min(1.0),
                },
                RadarAxis {
                    label: "BMI",
                    value: (record.bmi / 40.0).min(1.0),
                },
                RadarAxis {
                    label: "BP",
                    value: (f64::from(record.ap_hi) / 180.0).min(1.0),
                },
                RadarAxis {
                    label: "Cholesterol",
                    value: f64::from(record.cholesterol) / 3.0,
                },
                RadarAxis {
                    label: "Glucose",
                    value: f64::from(record.gluc) / 3.0,
                },
            ],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BmiStatus {
    Normal,
    Attention,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BpStatus {
    Normal,
    Elevated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PulsePressureStatus {
    Normal,
    Wide,
}

impl std::fmt::Display for BmiStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Normal => write!(f, "Normal"),
            Self::Attention => write!(f, "Attention"),
        }
    }
}

impl std::fmt::Display for BpStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Normal => write!(f, "Normal"),
            Self::Elevated => write!(f, "Elevated"),
        }
    }
}

impl std::fmt::Display for PulsePressureStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Normal => write!(f, "Normal"),
            Self::Wide => write!(f, "Wide"),
        }
    }
}

/// Metrics row shown under the risk badge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VitalsSummary {
    pub bmi: f64,
    pub bmi_status: BmiStatus,
    pub systolic: u16,
    pub diastolic: u16,
    pub bp_status: BpStatus,
    pub pulse_pressure: i32,
    pub pulse_pressure_status: PulsePressureStatus,
    pub profile: RadarProfile,
}

impl VitalsSummary {
    #[must_use]
    pub fn from_record(record: &FeatureRecord) -> Self {
        let bmi_status = if (18.5..25.0).contains(&record.bmi) {
            BmiStatus::Normal
        } else {
            BmiStatus::Attention
        };
        let bp_status = if record.ap_hi > 120 {
            BpStatus::Elevated
        } else {
            BpStatus::Normal
        };
        let pulse_pressure_status = if record.bp_diff > 60 {
            PulsePressureStatus::Wide
        } else {
            PulsePressureStatus::Normal
        };

        Self {
            bmi: record.bmi,
            bmi_status,
            systolic: record.ap_hi,
            diastolic: record.ap_lo,
            bp_status,
            pulse_pressure: record.bp_diff,
            pulse_pressure_status,
            profile: RadarProfile::from_record(record),
        }
    }
}
