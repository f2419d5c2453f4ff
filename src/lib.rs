//! # CardioGuard
//!
//! Cardiovascular risk assessment from routine health measurements.
//!
//! This crate provides:
//! - Feature derivation (BMI, BMI category, pulse pressure) from raw input
//! - A pluggable binary classifier with a random-forest adapter
//! - Three-tier risk interpretation of the positive-class probability
//! - Terminal UI for local use
//!
//! ## Architecture
//!
//! The crate follows Hexagonal Architecture:
//! - `domain`: Core business types (input, features, risk tiers)
//! - `ports`: Trait definitions for the classifier capability
//! - `adapters`: Concrete implementations (JSON random forest, signed manifest)
//! - `application`: Use cases orchestrating domain and ports
//! - `config`: Environment-driven settings
//! - `tui`: Terminal user interface

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
pub mod tui;

pub use domain::{AssessmentResult, FeatureRecord, RawAssessmentInput, RiskTier};

/// Result type for CardioGuard operations
pub type Result<T> = std::result::Result<T, CardioError>;

/// Main error type for CardioGuard
#[derive(Debug, thiserror::Error)]
pub enum CardioError {
    #[error(transparent)]
    Load(#[from] ports::LoadError),

    #[error(transparent)]
    Inference(#[from] ports::InferenceError),

    #[error("Invalid assessment input: {0}")]
    Validation(String),
}
