//! Domain layer: Core business types and logic.
//!
//! Pure Rust types with no I/O. Feature derivation and risk tiering live
//! here so they can be tested without a model file.

mod assessment;
mod features;
mod risk;
mod vitals;

pub use assessment::{
    Gender, Level, RawAssessmentInput, AGE_RANGE, DIASTOLIC_RANGE, HEIGHT_RANGE, SYSTOLIC_RANGE,
    WEIGHT_RANGE,
};
pub use features::{derive, BmiCategory, FeatureRecord};
pub use risk::{
    AssessmentResult, ClassLabel, ClassProbabilities, RiskTier, HIGH_THRESHOLD,
    MODERATE_THRESHOLD,
};
pub use vitals::{BmiStatus, BpStatus, PulsePressureStatus, RadarAxis, RadarProfile, VitalsSummary};
