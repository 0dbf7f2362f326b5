//! Autocomprobación: genera identificadores de muestras incluidas en el
//! binario y los compara con valores conocidos.

use std::{fs, sync::Arc};

use tracing::{Level, info, instrument, warn};

use crate::{
    batch::ProcessingResult, error::SelfCheckError, processor::Processor, traits::IdentifierEngine,
};

/// Muestra incluida en el binario junto con el código que debe producir.
#[derive(Debug, Clone, Copy)]
pub struct Fixture {
    pub name: &'static str,
    pub bytes: &'static [u8],
    pub expected: &'static str,
}

pub const FIXTURES: &[Fixture] = &[
    Fixture {
        name: "lorem.txt",
        bytes: include_bytes!("../fixtures/lorem.txt"),
        expected: "CC:KAATIAF3JFOD7DCM6PRACPRGQUIZW",
    },
    Fixture {
        name: "pixel.png",
        bytes: include_bytes!("../fixtures/pixel.png"),
        expected: "CC:KABD7DLTPHRPB56QHUT3J3JP37NRE",
    },
    Fixture {
        name: "tone.wav",
        bytes: include_bytes!("../fixtures/tone.wav"),
        expected: "CC:KABQBT2M4OJVZCTATTEPD3TA6IJ34",
    },
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckOutcome {
    Match,
    Mismatch { actual: String },
    Failed { error: String },
}

#[derive(Debug, Clone)]
pub struct CheckResult {
    pub fixture: &'static str,
    pub expected: &'static str,
    pub outcome: CheckOutcome,
}

impl CheckResult {
    pub fn passed(&self) -> bool {
        self.outcome == CheckOutcome::Match
    }
}

#[derive(Debug, Clone, Default)]
pub struct SelfCheckReport {
    pub checks: Vec<CheckResult>,
}

impl SelfCheckReport {
    /// Falso si alguna muestra no coincide o si no hubo ninguna.
    pub fn passed(&self) -> bool {
        !self.checks.is_empty() && self.checks.iter().all(CheckResult::passed)
    }
}

/// Escribe las muestras en un directorio temporal y pasa cada una por el
/// procesador. El directorio se borra al terminar.
#[instrument(level = Level::INFO, skip(engine), err)]
pub fn run(engine: Arc<dyn IdentifierEngine>) -> Result<SelfCheckReport, SelfCheckError> {
    let dir = tempfile::Builder::new().prefix("ccode-selftest").tempdir()?;
    let processor = Processor::new(engine);
    let mut report = SelfCheckReport::default();

    for fixture in FIXTURES {
        let path = dir.path().join(fixture.name);
        fs::write(&path, fixture.bytes)?;

        let outcome = match processor.process(&path) {
            ProcessingResult::Success { record, .. } if record.iscc == fixture.expected => CheckOutcome::Match,
            ProcessingResult::Success { record, .. } => CheckOutcome::Mismatch { actual: record.iscc },
            ProcessingResult::Failure { error, .. } => CheckOutcome::Failed {
                error: error.to_string(),
            },
        };

        if outcome != CheckOutcome::Match {
            warn!(fixture = fixture.name, ?outcome, "self-test check failed");
        }

        report.checks.push(CheckResult {
            fixture: fixture.name,
            expected: fixture.expected,
            outcome,
        });
    }

    dir.close()?;
    info!(passed = report.passed(), "self-test finished");
    Ok(report)
}
