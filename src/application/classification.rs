//! Risk classification: interpret classifier output as an assessment result.

use crate::domain::{AssessmentResult, FeatureRecord};
use crate::ports::{Classifier, InferenceError};

/// Run the classifier once for `record` and map the output to a risk tier.
///
/// # Errors
/// Returns `InferenceError` if the classifier fails or returns an invalid
/// distribution. No partial result is produced.
pub fn classify<C>(classifier: &C, record: &FeatureRecord) -> Result<AssessmentResult, InferenceError>
where
    C: Classifier + ?Sized,
{
    let (label, probabilities) = classifier.predict_with_probabilities(record)?;
    let result = AssessmentResult::new(label, probabilities);

    tracing::debug!(
        "Classifier returned class {} (p0={:.4}, p1={:.4})",
        label.code(),
        probabilities.negative,
        probabilities.positive
    );

    Ok(result)
}
