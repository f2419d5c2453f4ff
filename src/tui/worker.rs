//! Background assessment worker.
//!
//! Runs one assessment on its own thread so the render loop keeps drawing
//! while the classifier evaluates. Progress arrives over an `mpsc` channel.

use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::application::{Assessment, AssessmentService, AssessmentStage};
use crate::domain::RawAssessmentInput;
use crate::ports::ClassifierLoader;

/// Progress updates from the assessment worker.
#[derive(Debug, Clone)]
pub enum AssessmentProgress {
    /// Pipeline stage about to start
    Stage(AssessmentStage),
    /// Assessment finished
    Complete(Box<Assessment>),
    /// Assessment failed; no partial result
    Error(String),
}

/// Handle to a running assessment worker.
pub struct AssessmentWorkerHandle {
    progress_rx: Receiver<AssessmentProgress>,
    _handle: JoinHandle<()>,
}

impl AssessmentWorkerHandle {
    /// Try to receive the next progress update (non-blocking).
    ///
    /// A worker that hung up without a final message (it panicked) is
    /// reported as an error so the caller stops waiting.
    #[must_use]
    pub fn try_recv(&self) -> Option<AssessmentProgress> {
        match self.progress_rx.try_recv() {
            Ok(progress) => Some(progress),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                tracing::error!("Assessment worker exited without a result");
                Some(AssessmentProgress::Error(
                    "Assessment worker stopped unexpectedly".into(),
                ))
            }
        }
    }
}

pub struct AssessmentWorker;

impl AssessmentWorker {
    /// Spawn a background assessment.
    pub fn spawn<L>(
        service: Arc<AssessmentService<L>>,
        input: RawAssessmentInput,
    ) -> AssessmentWorkerHandle
    where
        L: ClassifierLoader + 'static,
    {
        let (tx, rx) = mpsc::channel();

        let handle = thread::spawn(move || {
            Self::run(&service, &input, &tx);
        });

        AssessmentWorkerHandle {
            progress_rx: rx,
            _handle: handle,
        }
    }

    fn run<L>(
        service: &AssessmentService<L>,
        input: &RawAssessmentInput,
        tx: &Sender<AssessmentProgress>,
    ) where
        L: ClassifierLoader,
    {
        let result = service.assess_with_progress(input, |stage| {
            let _ = tx.send(AssessmentProgress::Stage(stage));
        });

        let message = match result {
            Ok(assessment) => AssessmentProgress::Complete(Box::new(assessment)),
            Err(e) => AssessmentProgress::Error(e.to_string()),
        };
        let _ = tx.send(message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ClassLabel, ClassProbabilities, FeatureRecord};
    use crate::ports::{Classifier, InferenceError, LoadError};
    use std::time::{Duration, Instant};

    struct Even;

    impl Classifier for Even {
        fn predict(&self, _: &FeatureRecord) -> Result<ClassLabel, InferenceError> {
            Ok(ClassLabel::Negative)
        }

        fn predict_probabilities(
            &self,
            _: &FeatureRecord,
        ) -> Result<ClassProbabilities, InferenceError> {
            ClassProbabilities::new(0.5, 0.5).map_err(InferenceError::InvalidProbabilities)
        }
    }

    struct Loader(bool);

    impl ClassifierLoader for Loader {
        type Classifier = Even;

        fn load(&self) -> Result<Even, LoadError> {
            if self.0 {
                Ok(Even)
            } else {
                Err(LoadError::Corrupt("truncated".into()))
            }
        }
    }

    struct Panicking;

    impl ClassifierLoader for Panicking {
        type Classifier = Even;

        fn load(&self) -> Result<Even, LoadError> {
            panic!("loader blew up");
        }
    }

    fn drain(handle: &AssessmentWorkerHandle) -> Vec<AssessmentProgress> {
        let deadline = Instant::now() + Duration::from_secs(5);
        let mut out = Vec::new();
        while Instant::now() < deadline {
            match handle.try_recv() {
                Some(p) => {
                    let done = matches!(
                        p,
                        AssessmentProgress::Complete(_) | AssessmentProgress::Error(_)
                    );
                    out.push(p);
                    if done {
                        break;
                    }
                }
                None => thread::sleep(Duration::from_millis(5)),
            }
        }
        out
    }

    #[test]
    fn test_worker_reports_stages_then_result() {
        let service = Arc::new(AssessmentService::new(Loader(true)));
        let handle = AssessmentWorker::spawn(service, RawAssessmentInput::default());
        let events = drain(&handle);

        assert!(matches!(
            events.first(),
            Some(AssessmentProgress::Stage(AssessmentStage::Validating))
        ));
        match events.last() {
            Some(AssessmentProgress::Complete(a)) => {
                assert_eq!(a.result.tier, crate::domain::RiskTier::Moderate);
            }
            other => panic!("expected completion, got {other:?}"),
        }
    }

    #[test]
    fn test_worker_reports_load_failure() {
        let service = Arc::new(AssessmentService::new(Loader(false)));
        let handle = AssessmentWorker::spawn(service, RawAssessmentInput::default());
        let events = drain(&handle);

        match events.last() {
            Some(AssessmentProgress::Error(msg)) => assert!(msg.contains("truncated")),
            other => panic!("expected error, got {other:?}"),
        }
    }

    #[test]
    fn test_worker_panic_ends_in_error() {
        let service = Arc::new(AssessmentService::new(Panicking));
        let handle = AssessmentWorker::spawn(service, RawAssessmentInput::default());
        let events = drain(&handle);

        match events.last() {
            Some(AssessmentProgress::Error(msg)) => {
                assert_eq!(msg, "Assessment worker stopped unexpectedly");
            }
            other => panic!("expected error, got {other:?}"),
        }
    }
}
