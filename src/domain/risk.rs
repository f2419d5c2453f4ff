//! Classification output and risk tiers.

use serde::{Deserialize, Serialize};

/// Probability below which an assessment is low risk.
pub const MODERATE_THRESHOLD: f64 = 0.35;
/// Probability from which an assessment is high risk.
pub const HIGH_THRESHOLD: f64 = 0.65;

/// Tolerance used when checking that class probabilities sum to one.
const PROBABILITY_SUM_TOLERANCE: f64 = 1e-6;

/// Binary class predicted by the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClassLabel {
    /// No cardiovascular disease (class 0)
    Negative,
    /// Cardiovascular disease present (class 1)
    Positive,
}

impl ClassLabel {
    #[must_use]
    pub fn code(self) -> u8 {
        match self {
            Self::Negative => 0,
            Self::Positive => 1,
        }
    }
}

/// Class probabilities `(P(class 0), P(class 1))`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassProbabilities {
    pub negative: f64,
    pub positive: f64,
}

impl ClassProbabilities {
    /// Build a checked pair.
    ///
    /// # Errors
    /// Returns a description if either value is not a finite number in
    /// `[0, 1]` or the pair does not sum to one.
    pub fn new(negative: f64, positive: f64) -> Result<Self, String> {
        for (name, p) in [("class 0", negative), ("class 1", positive)] {
            if !p.is_finite() || !(0.0..=1.0).contains(&p) {
                return Err(format!("Probability for {name} is {p}, expected [0, 1]"));
            }
        }
        let sum = negative + positive;
        if (sum - 1.0).abs() > PROBABILITY_SUM_TOLERANCE {
            return Err(format!("Class probabilities sum to {sum}, expected 1"));
        }
        Ok(Self { negative, positive })
    }

    /// Highest class probability.
    #[must_use]
    pub fn max(&self) -> f64 {
        self.negative.max(self.positive)
    }
}

/// Three-tier risk classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskTier {
    Low,
    Moderate,
    High,
}

impl RiskTier {
    /// Tier for a positive-class probability. Nothing else influences it.
    #[must_use]
    pub fn from_probability(probability: f64) -> Self {
        if probability < MODERATE_THRESHOLD {
            Self::Low
        } else if probability < HIGH_THRESHOLD {
            Self::Moderate
        } else {
            Self::High
        }
    }

    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Low => "Low Risk",
            Self::Moderate => "Moderate Risk",
            Self::High => "High Risk",
        }
    }

    /// Advisory message shown with the badge.
    #[must_use]
    pub fn message(&self) -> &'static str {
        match self {
            Self::Low => "Great job! Maintain your healthy lifestyle.",
            Self::Moderate => "Warning: Consider lifestyle improvements.",
            Self::High => "Action Required: Seek medical advice.",
        }
    }

    /// Badge color (RGB).
    #[must_use]
    pub fn color(&self) -> (u8, u8, u8) {
        match self {
            Self::Low => (16, 185, 129),     // #10B981
            Self::Moderate => (245, 158, 11), // #F59E0B
            Self::High => (239, 68, 68),     // #EF4444
        }
    }
}

impl std::fmt::Display for RiskTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Interpreted classifier output for one assessment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AssessmentResult {
    /// Class predicted by the model
    pub prediction: ClassLabel,

    /// Probability of the positive (disease) class, 0.0 to 1.0
    pub probability: f64,

    /// Highest class probability, 0.0 to 1.0
    pub confidence: f64,

    pub tier: RiskTier,
}

impl AssessmentResult {
    #[must_use]
    pub fn new(prediction: ClassLabel, probabilities: ClassProbabilities) -> Self {
        Self {
            prediction,
            probability: probabilities.positive,
            confidence: probabilities.max(),
            tier: RiskTier::from_probability(probabilities.positive),
        }
    }

    /// Confidence as a whole percentage for display.
    #[must_use]
    pub fn confidence_percent(&self) -> u8 {
        (self.confidence * 100.0).round().clamp(0.0, 100.0) as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_boundaries() {
        assert_eq!(RiskTier::from_probability(0.349999), RiskTier::Low);
        assert_eq!(RiskTier::from_probability(0.35), RiskTier::Moderate);
        assert_eq!(RiskTier::from_probability(0.649999), RiskTier::Moderate);
        assert_eq!(RiskTier::from_probability(0.65), RiskTier::High);
        assert_eq!(RiskTier::from_probability(0.0), RiskTier::Low);
        assert_eq!(RiskTier::from_probability(1.0), RiskTier::High);
    }

    #[test]
    fn test_high_probability_result() {
        let probs = ClassProbabilities::new(0.20, 0.80).expect("valid pair");
        let result = AssessmentResult::new(ClassLabel::Positive, probs);

        assert_eq!(result.tier, RiskTier::High);
        assert_eq!(result.tier.label(), "High Risk");
        assert!((result.confidence - 0.80).abs() < f64::EPSILON);
        assert!((result.probability - 0.80).abs() < f64::EPSILON);
        assert_eq!(result.confidence_percent(), 80);
    }

    #[test]
    fn test_confidence_uses_negative_class_when_larger() {
        let probs = ClassProbabilities::new(0.9, 0.1).expect("valid pair");
        let result = AssessmentResult::new(ClassLabel::Negative, probs);
        assert_eq!(result.tier, RiskTier::Low);
        assert!((result.confidence - 0.9).abs() < f64::EPSILON);
    }

    #[test]
    fn test_probabilities_are_checked() {
        assert!(ClassProbabilities::new(0.5, 0.6).is_err());
        assert!(ClassProbabilities::new(-0.1, 1.1).is_err());
        assert!(ClassProbabilities::new(f64::NAN, 0.5).is_err());
        assert!(ClassProbabilities::new(0.0, 1.0).is_ok());
    }

    #[test]
    fn test_messages_are_fixed_per_tier() {
        assert_eq!(
            RiskTier::Low.message(),
            "Great job! Maintain your healthy lifestyle."
        );
        assert_eq!(
            RiskTier::Moderate.message(),
            "Warning: Consider lifestyle improvements."
        );
        assert_eq!(RiskTier::High.message(), "Action Required: Seek medical advice.");
    }
}
