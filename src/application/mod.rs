//! Application layer: Use cases and services.
//!
//! Orchestrates the feature deriver and the classifier port into a single
//! assessment call.

mod assessment;
mod classification;

pub use assessment::{Assessment, AssessmentService, AssessmentStage};
pub use classification::classify;
