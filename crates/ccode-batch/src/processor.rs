use std::{
    any::Any,
    panic::{self, AssertUnwindSafe},
    path::{Path, PathBuf},
    sync::{Arc, mpsc},
    thread,
    time::Duration,
};

use tracing::{Level, instrument, warn};

use crate::{batch::ProcessingResult, error::ProcessError, traits::IdentifierEngine};

/// Frontera entre el lote y el motor: nada de lo que haga el motor la cruza
/// como error o pánico, todo vuelve como `ProcessingResult`.
#[derive(Clone)]
pub struct Processor {
    engine: Arc<dyn IdentifierEngine>,
    timeout: Option<Duration>,
}

impl Processor {
    pub fn new(engine: Arc<dyn IdentifierEngine>) -> Self {
        Processor { engine, timeout: None }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    #[instrument(level = Level::DEBUG, skip(self, path), fields(path = %path.as_ref().display()))]
    pub fn process<P: AsRef<Path>>(&self, path: P) -> ProcessingResult {
        let path = path.as_ref().to_path_buf();

        let outcome = match self.timeout {
            None => run_guarded(self.engine.as_ref(), &path),
            Some(limit) => self.run_with_timeout(&path, limit),
        };

        match outcome {
            Ok(record) => ProcessingResult::Success { path, record },
            Err(error) => ProcessingResult::Failure { path, error },
        }
    }

    /// El motor corre en un hilo aparte; si no responde a tiempo el hilo queda
    /// suelto y el archivo se da por fallido.
    fn run_with_timeout(&self, path: &Path, limit: Duration) -> Result<ccode_engine::IdentifierRecord, ProcessError> {
        let (tx, rx) = mpsc::channel();
        let engine = Arc::clone(&self.engine);
        let owned: PathBuf = path.to_path_buf();

        let spawned = thread::Builder::new()
            .name("ccode-engine".into())
            .spawn(move || {
                let _ = tx.send(run_guarded(engine.as_ref(), &owned));
            });

        if let Err(e) = spawned {
            return Err(ProcessError::Engine(anyhow::Error::new(e).context("could not spawn engine thread")));
        }

        match rx.recv_timeout(limit) {
            Ok(outcome) => outcome,
            Err(mpsc::RecvTimeoutError::Timeout) => {
                warn!(path = %path.display(), ?limit, "engine timed out");
                Err(ProcessError::Timeout(limit))
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                Err(ProcessError::Panicked("engine thread exited without a result".into()))
            }
        }
    }
}

fn run_guarded(
    engine: &dyn IdentifierEngine,
    path: &Path,
) -> Result<ccode_engine::IdentifierRecord, ProcessError> {
    match panic::catch_unwind(AssertUnwindSafe(|| engine.build_identifier(path))) {
        Ok(Ok(record)) => Ok(record),
        Ok(Err(e)) => Err(ProcessError::Engine(e)),
        Err(payload) => Err(ProcessError::Panicked(panic_message(payload.as_ref()))),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use anyhow::bail;
    use ccode_engine::{Engine, IdentifierRecord};

    use super::*;

    struct Slow(Duration);
    impl IdentifierEngine for Slow {
        fn build_identifier(&self, path: &Path) -> anyhow::Result<IdentifierRecord> {
            thread::sleep(self.0);
            Ok(IdentifierRecord::new("CC:SLOW", path.display().to_string(), 0))
        }
    }

    struct Panicky;
    impl IdentifierEngine for Panicky {
        fn build_identifier(&self, _path: &Path) -> anyhow::Result<IdentifierRecord> {
            panic!("decoder exploded");
        }
    }

    #[derive(Default)]
    struct Counting(AtomicUsize);
    impl IdentifierEngine for Counting {
        fn build_identifier(&self, _path: &Path) -> anyhow::Result<IdentifierRecord> {
            self.0.fetch_add(1, Ordering::SeqCst);
            bail!("unsupported")
        }
    }

    #[test]
    fn missing_file_becomes_failure_with_its_path() {
        let processor = Processor::new(Arc::new(Engine::default()));
        match processor.process("does-not-exist") {
            ProcessingResult::Failure { path, error } => {
                assert_eq!(path, PathBuf::from("does-not-exist"));
                assert!(matches!(error, ProcessError::Engine(_)));
            }
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[test]
    fn engine_causes_are_reported_once() {
        let processor = Processor::new(Arc::new(Engine::default()));
        let cause = std::fs::metadata("does-not-exist").unwrap_err().to_string();

        let ProcessingResult::Failure { error, .. } = processor.process("does-not-exist") else {
            panic!("expected failure");
        };
        let msg = error.to_string();
        assert!(msg.starts_with("I/O error for path"), "{msg}");
        assert_eq!(msg.matches(&cause).count(), 1, "{msg}");

        let dir = tempfile::tempdir().unwrap();
        let png = dir.path().join("broken.png");
        std::fs::write(&png, b"\x89PNG\r\n\x1a\nnot really").unwrap();
        let ProcessingResult::Failure { error, .. } = processor.process(&png) else {
            panic!("expected failure");
        };
        let msg = error.to_string();
        assert!(msg.starts_with("Invalid image file: "), "{msg}");
        assert_eq!(msg.matches("Invalid image file").count(), 1, "{msg}");
    }

    #[test]
    fn panics_are_captured() {
        let processor = Processor::new(Arc::new(Panicky));
        let result = processor.process("a.wav");
        match result {
            ProcessingResult::Failure {
                error: ProcessError::Panicked(msg),
                ..
            } => assert_eq!(msg, "decoder exploded"),
            other => panic!("expected panic failure, got {other:?}"),
        }
    }

    #[test]
    fn panics_are_captured_behind_a_timeout_too() {
        let processor = Processor::new(Arc::new(Panicky)).with_timeout(Some(Duration::from_secs(5)));
        assert!(matches!(
            processor.process("a.wav"),
            ProcessingResult::Failure {
                error: ProcessError::Panicked(_),
                ..
            }
        ));
    }

    #[test]
    fn slow_engine_times_out() {
        let processor =
            Processor::new(Arc::new(Slow(Duration::from_secs(2)))).with_timeout(Some(Duration::from_millis(50)));
        assert!(matches!(
            processor.process("slow.mp4"),
            ProcessingResult::Failure {
                error: ProcessError::Timeout(_),
                ..
            }
        ));
    }

    #[test]
    fn fast_engine_beats_the_timeout() {
        let processor =
            Processor::new(Arc::new(Slow(Duration::ZERO))).with_timeout(Some(Duration::from_secs(5)));
        assert!(processor.process("fast.mp4").is_success());
    }

    #[test]
    fn no_retries() {
        let engine = Arc::new(Counting::default());
        let processor = Processor::new(engine.clone());
        assert!(!processor.process("x").is_success());
        assert_eq!(engine.0.load(Ordering::SeqCst), 1);
    }
}
