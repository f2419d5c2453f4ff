//! Classifier port: the pre-trained model as an opaque capability.
//!
//! The application only needs to load a binary classifier once and ask it
//! for a class and a pair of class probabilities. How the artifact is
//! produced or serialized is an adapter concern.

use std::path::PathBuf;

use serde::Serialize;

use crate::domain::{ClassLabel, ClassProbabilities, FeatureRecord};

/// The classifier artifact could not be loaded.
///
/// Fatal for the session: no assessment can run without a model.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoadError {
    #[error("Model artifact not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to read model artifact: {0}")]
    Io(String),

    #[error("Model artifact is corrupt: {0}")]
    Corrupt(String),

    #[error("Model artifact is incompatible: {0}")]
    Incompatible(String),

    #[error("Model integrity check failed: {0}")]
    Integrity(String),
}

/// The classifier failed on a structurally valid feature record.
///
/// Not transient; the assessment fails without a partial result.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InferenceError {
    #[error("Feature mismatch: {0}")]
    FeatureMismatch(String),

    #[error("Classifier returned invalid probabilities: {0}")]
    InvalidProbabilities(String),

    #[error("Model evaluation failed: {0}")]
    Evaluation(String),
}

/// Descriptive metadata about a loaded classifier.
#[derive(Debug, Clone, Serialize)]
pub struct ModelInfo {
    /// e.g. `random_forest`
    pub model_type: String,
    pub source: PathBuf,
    pub n_estimators: usize,
    pub feature_names: Vec<String>,
    /// SHA-256 of the artifact bytes (hex)
    pub sha256: String,
    /// Whether a signed manifest vouched for the artifact
    pub signed: bool,
    pub loaded_at: chrono::DateTime<chrono::Utc>,
}

/// A loaded binary classifier.
///
/// Evaluation takes `&self` and must not mutate the model, so one instance
/// can be shared read-only between threads.
pub trait Classifier: Send + Sync {
    /// Predict the class for a single record.
    ///
    /// # Errors
    /// Returns `InferenceError` if the model cannot evaluate the record.
    fn predict(&self, record: &FeatureRecord) -> Result<ClassLabel, InferenceError>;

    /// Class probabilities `(class 0, class 1)` for a single record.
    ///
    /// # Errors
    /// Returns `InferenceError` if the model cannot evaluate the record or
    /// produces an invalid distribution.
    fn predict_probabilities(
        &self,
        record: &FeatureRecord,
    ) -> Result<ClassProbabilities, InferenceError>;

    /// Class and probabilities in one logical call.
    ///
    /// Adapters that compute both from the same pass should override this.
    ///
    /// # Errors
    /// Returns the first `InferenceError` encountered.
    fn predict_with_probabilities(
        &self,
        record: &FeatureRecord,
    ) -> Result<(ClassLabel, ClassProbabilities), InferenceError> {
        let label = self.predict(record)?;
        let probabilities = self.predict_probabilities(record)?;
        Ok((label, probabilities))
    }

    /// Metadata for display, if the adapter has any.
    fn info(&self) -> Option<&ModelInfo> {
        None
    }
}

/// Produces a classifier from its external artifact.
pub trait ClassifierLoader: Send + Sync {
    type Classifier: Classifier + 'static;

    /// Load and validate the artifact.
    ///
    /// # Errors
    /// Returns `LoadError` if the artifact is missing, corrupt or
    /// incompatible.
    fn load(&self) -> Result<Self::Classifier, LoadError>;
}
