//! Ports layer: Trait definitions for external operations.
//!
//! Following Hexagonal Architecture, these traits define the boundary
//! between the application and the externally supplied classifier.

mod classifier;

pub use classifier::{Classifier, ClassifierLoader, InferenceError, LoadError, ModelInfo};
