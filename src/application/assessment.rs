//! Assessment service: validate, derive, classify.
//!
//! The service owns the process-wide classifier slot. The classifier is
//! loaded at most once, either eagerly through [`AssessmentService::initialize`]
//! or on the first assessment, and then shared read-only. A failed load is
//! kept and returned to every later caller; nothing retries it.

use std::sync::{Arc, Mutex};

use serde::Serialize;

use crate::domain::{derive, AssessmentResult, FeatureRecord, RawAssessmentInput, VitalsSummary};
use crate::ports::{Classifier, ClassifierLoader, LoadError, ModelInfo};
use crate::CardioError;

use super::classification::classify;

/// Everything one assessment produces.
#[derive(Debug, Clone, Serialize)]
pub struct Assessment {
    pub features: FeatureRecord,
    pub result: AssessmentResult,
    pub vitals: VitalsSummary,
}

/// Pipeline stage reported to progress observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssessmentStage {
    Validating,
    LoadingModel,
    Deriving,
    Classifying,
}

enum Slot<C> {
    Unloaded,
    Ready(Arc<C>),
    Failed(LoadError),
}

/// Service running risk assessments against a lazily loaded classifier.
pub struct AssessmentService<L: ClassifierLoader> {
    loader: L,
    slot: Mutex<Slot<L::Classifier>>,
}

impl<L: ClassifierLoader> AssessmentService<L> {
    /// Create a service. Nothing is loaded until first use.
    pub fn new(loader: L) -> Self {
        Self {
            loader,
            slot: Mutex::new(Slot::Unloaded),
        }
    }

    /// Load the classifier now instead of on the first assessment.
    ///
    /// # Errors
    /// Returns the `LoadError` from this or an earlier failed load.
    pub fn initialize(&self) -> Result<(), LoadError> {
        tracing::info!("Initializing assessment service...");
        self.classifier().map(|_| ())
    }

    /// Shared handle to the loaded classifier, loading it on first call.
    ///
    /// # Errors
    /// Returns `LoadError` if the artifact cannot be loaded, now or earlier.
    pub fn classifier(&self) -> Result<Arc<L::Classifier>, LoadError> {
        let mut slot = self
            .slot
            .lock()
            .map_err(|_| LoadError::Io("classifier slot poisoned".into()))?;

        match &*slot {
            Slot::Ready(classifier) => return Ok(Arc::clone(classifier)),
            Slot::Failed(e) => return Err(e.clone()),
            Slot::Unloaded => {}
        }

        match self.loader.load() {
            Ok(classifier) => {
                let classifier = Arc::new(classifier);
                *slot = Slot::Ready(Arc::clone(&classifier));
                tracing::info!("Classifier loaded");
                Ok(classifier)
            }
            Err(e) => {
                tracing::error!("Classifier load failed: {e}");
                *slot = Slot::Failed(e.clone());
                Err(e)
            }
        }
    }

    /// Whether a classifier is loaded and ready.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.slot
            .lock()
            .map(|s| matches!(*s, Slot::Ready(_)))
            .unwrap_or(false)
    }

    /// The cached load failure, if the load has already failed.
    #[must_use]
    pub fn load_error(&self) -> Option<LoadError> {
        self.slot.lock().ok().and_then(|s| match &*s {
            Slot::Failed(e) => Some(e.clone()),
            _ => None,
        })
    }

    /// Metadata of the loaded classifier, without triggering a load.
    #[must_use]
    pub fn model_info(&self) -> Option<ModelInfo> {
        self.slot.lock().ok().and_then(|s| match &*s {
            Slot::Ready(c) => c.info().cloned(),
            _ => None,
        })
    }

    /// Run one assessment.
    ///
    /// # Errors
    /// - `CardioError::Validation` when any field is out of range
    /// - `CardioError::Load` when the classifier is unavailable
    /// - `CardioError::Inference` when classification fails
    pub fn assess(&self, raw: &RawAssessmentInput) -> crate::Result<Assessment> {
        self.assess_with_progress(raw, |_| {})
    }

    /// Run one assessment, reporting each stage before it starts.
    ///
    /// # Errors
    /// Same as [`AssessmentService::assess`].
    pub fn assess_with_progress<F>(
        &self,
        raw: &RawAssessmentInput,
        mut on_stage: F,
    ) -> crate::Result<Assessment>
    where
        F: FnMut(AssessmentStage),
    {
        on_stage(AssessmentStage::Validating);
        raw.validate()
            .map_err(|errors| CardioError::Validation(errors.join("; ")))?;

        on_stage(AssessmentStage::LoadingModel);
        let classifier = self.classifier()?;

        on_stage(AssessmentStage::Deriving);
        let features = derive(raw);
        tracing::debug!("Derived {} features", FeatureRecord::FEATURE_NAMES.len());

        on_stage(AssessmentStage::Classifying);
        let result = classify(classifier.as_ref(), &features)?;
        let vitals = VitalsSummary::from_record(&features);

        tracing::info!(
            "Assessment complete: tier={}, probability={:.3}, confidence={}%",
            result.tier,
            result.probability,
            result.confidence_percent()
        );

        Ok(Assessment {
            features,
            result,
            vitals,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ClassLabel, ClassProbabilities, RiskTier};
    use crate::ports::InferenceError;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Returns `bmi / 50` as the positive probability.
    struct BmiScaled;

    impl Classifier for BmiScaled {
        fn predict(&self, record: &FeatureRecord) -> Result<ClassLabel, InferenceError> {
            let p = self.predict_probabilities(record)?;
            Ok(if p.positive > p.negative {
                ClassLabel::Positive
            } else {
                ClassLabel::Negative
            })
        }

        fn predict_probabilities(
            &self,
            record: &FeatureRecord,
        ) -> Result<ClassProbabilities, InferenceError> {
            let p = (record.bmi / 50.0).min(1.0);
            ClassProbabilities::new(1.0 - p, p).map_err(InferenceError::InvalidProbabilities)
        }
    }

    struct CountingLoader {
        loads: Arc<AtomicUsize>,
        fail: bool,
    }

    impl ClassifierLoader for CountingLoader {
        type Classifier = BmiScaled;

        fn load(&self) -> Result<BmiScaled, LoadError> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(LoadError::NotFound(PathBuf::from("models/missing.json")))
            } else {
                Ok(BmiScaled)
            }
        }
    }

    fn service(fail: bool) -> (AssessmentService<CountingLoader>, Arc<AtomicUsize>) {
        let loads = Arc::new(AtomicUsize::new(0));
        let loader = CountingLoader {
            loads: Arc::clone(&loads),
            fail,
        };
        (AssessmentService::new(loader), loads)
    }

    #[test]
    fn test_scenario_default_input() {
        let (service, _) = service(false);
        let raw = RawAssessmentInput {
            gender: crate::domain::Gender::Male,
            active: true,
            ..Default::default()
        };

        let assessment = service.assess(&raw).expect("assess");
        assert!((assessment.features.bmi - 25.71).abs() < 0.01);
        assert_eq!(assessment.features.bp_diff, 40);
        assert_eq!(
            assessment.result.tier,
            RiskTier::from_probability(assessment.result.probability)
        );
        assert_eq!(assessment.result.tier, RiskTier::Moderate);
    }

    #[test]
    fn test_loads_once_across_assessments() {
        let (service, loads) = service(false);
        assert!(!service.is_ready());

        for _ in 0..5 {
            service
                .assess(&RawAssessmentInput::default())
                .expect("assess");
        }
        assert!(service.is_ready());
        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_initialize_loads_eagerly() {
        let (service, loads) = service(false);
        service.initialize().expect("init");
        assert_eq!(loads.load(Ordering::SeqCst), 1);
        service
            .assess(&RawAssessmentInput::default())
            .expect("assess");
        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_load_failure_is_cached() {
        let (service, loads) = service(true);

        let first = service
            .assess(&RawAssessmentInput::default())
            .expect_err("load fails");
        assert!(matches!(first, CardioError::Load(LoadError::NotFound(_))));

        let second = service
            .assess(&RawAssessmentInput::default())
            .expect_err("still failing");
        assert!(matches!(second, CardioError::Load(LoadError::NotFound(_))));

        assert_eq!(loads.load(Ordering::SeqCst), 1);
        assert!(!service.is_ready());
        assert!(service.load_error().is_some());
        assert!(service.model_info().is_none());
    }

    #[test]
    fn test_validation_rejects_before_loading() {
        let (service, loads) = service(false);
        let raw = RawAssessmentInput {
            age_years: 10,
            systolic_bp: 300,
            ..Default::default()
        };

        let err = service.assess(&raw).expect_err("invalid");
        match err {
            CardioError::Validation(msg) => {
                assert!(msg.contains("Age"));
                assert!(msg.contains("Systolic"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(loads.load(Ordering::SeqCst), 0);
    }

    struct Broken;

    impl Classifier for Broken {
        fn predict(&self, _: &FeatureRecord) -> Result<ClassLabel, InferenceError> {
            Err(InferenceError::Evaluation("tree traversal did not reach a leaf".into()))
        }

        fn predict_probabilities(
            &self,
            _: &FeatureRecord,
        ) -> Result<ClassProbabilities, InferenceError> {
            Err(InferenceError::Evaluation("tree traversal did not reach a leaf".into()))
        }
    }

    struct BrokenLoader;

    impl ClassifierLoader for BrokenLoader {
        type Classifier = Broken;

        fn load(&self) -> Result<Broken, LoadError> {
            Ok(Broken)
        }
    }

    #[test]
    fn test_inference_failure_is_reported() {
        let service = AssessmentService::new(BrokenLoader);

        let err = service
            .assess(&RawAssessmentInput::default())
            .expect_err("classifier fails");
        assert!(matches!(
            err,
            CardioError::Inference(InferenceError::Evaluation(_))
        ));
        // The classifier itself loaded; only evaluation failed.
        assert!(service.is_ready());
        assert!(service.load_error().is_none());
    }

    #[test]
    fn test_progress_stages_in_order() {
        let (service, _) = service(false);
        let mut stages = Vec::new();
        service
            .assess_with_progress(&RawAssessmentInput::default(), |s| stages.push(s))
            .expect("assess");
        assert_eq!(
            stages,
            vec![
                AssessmentStage::Validating,
                AssessmentStage::LoadingModel,
                AssessmentStage::Deriving,
                AssessmentStage::Classifying,
            ]
        );
    }

    #[test]
    fn test_shared_across_threads() {
        let (service, loads) = service(false);
        let service = Arc::new(service);

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let service = Arc::clone(&service);
                std::thread::spawn(move || service.assess(&RawAssessmentInput::default()))
            })
            .collect();
        for h in handles {
            h.join().expect("join").expect("assess");
        }
        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }
}
