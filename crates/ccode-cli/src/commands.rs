use std::{io::Write, path::Path, sync::Arc};

use ccode_batch::{
    BatchConfig, BatchError, BatchRunner, IdentifierEngine, ProcessingResult, Processor, ScanError, marker,
    selfcheck::{self, CheckOutcome},
};
use ccode_engine::Engine;
use ccode_paths::CcodePaths;
use tracing::{debug, error, info};

use crate::{
    EXIT_FAILURE, EXIT_OK,
    args::{BatchArgs, CreateArgs},
    progress::TerminalProgress,
};

pub fn create(args: &CreateArgs, config: Option<&Path>, out: &mut dyn Write, err: &mut dyn Write) -> u8 {
    let config = match load_config(config) {
        Ok(cfg) => cfg,
        Err(e) => {
            let _ = writeln!(err, "Error: {e}");
            return EXIT_FAILURE;
        }
    };
    create_with(Arc::new(Engine::default()), &config, args, out, err)
}

/// `create` con el motor inyectado; pasa por el mismo `Processor` que el lote.
pub fn create_with(
    engine: Arc<dyn IdentifierEngine>,
    config: &BatchConfig,
    args: &CreateArgs,
    out: &mut dyn Write,
    err: &mut dyn Write,
) -> u8 {
    if !args.file.is_file() {
        let _ = writeln!(err, "Invalid file path: {}", args.file.display());
        return EXIT_FAILURE;
    }

    let processor = Processor::new(engine).with_timeout(config.timeout);
    let record = match processor.process(&args.file) {
        ProcessingResult::Success { record, .. } => record,
        ProcessingResult::Failure { path, error } => {
            error!(path = %path.display(), error = %error, "identifier creation failed");
            let _ = writeln!(err, "Error: {error}");
            return EXIT_FAILURE;
        }
    };

    if args.sidecar {
        match marker::write_marker(&args.file, &record) {
            Ok(sidecar) => info!(path = %sidecar.display(), "sidecar written"),
            Err(e) => {
                let _ = writeln!(err, "Error: {e}");
                return EXIT_FAILURE;
            }
        }
    }

    match serde_json::to_string_pretty(&record) {
        Ok(json) => {
            let _ = writeln!(out, "{json}");
            EXIT_OK
        }
        Err(e) => {
            let _ = writeln!(err, "Error: {e}");
            EXIT_FAILURE
        }
    }
}

pub fn batch(args: &BatchArgs, config: Option<&Path>, out: &mut dyn Write, err: &mut dyn Write) -> u8 {
    let config = match load_config(config) {
        Ok(cfg) => args.apply(cfg),
        Err(e) => {
            let _ = writeln!(err, "Error: {e}");
            return EXIT_FAILURE;
        }
    };
    debug!(?config, "batch configuration");

    let runner = BatchRunner::new(Arc::new(Engine::default()), config);
    let mut progress = TerminalProgress::new(out);

    match runner.run(&args.folder, &mut progress) {
        Ok(_) => EXIT_OK,
        Err(BatchError::Scan(ScanError::InvalidRoot(_))) => {
            let _ = writeln!(err, "Invalid folder: {}", args.folder.display());
            EXIT_FAILURE
        }
        Err(e) => {
            error!(error = %e, "batch aborted");
            let _ = writeln!(err, "Error: {e}");
            EXIT_FAILURE
        }
    }
}

/// El archivo explícito manda; si no, el `ccode.toml` del directorio de
/// configuración si existe. Las variables `CCODE_*` se aplican encima.
fn load_config(explicit: Option<&Path>) -> Result<BatchConfig, ccode_batch::ConfigError> {
    match explicit {
        Some(path) => BatchConfig::load(Some(path)),
        None => {
            let default = CcodePaths::new().ok().map(|p| p.config_file);
            BatchConfig::load(default.as_deref())
        }
    }
}

pub fn selftest(out: &mut dyn Write, err: &mut dyn Write) -> u8 {
    let report = match selfcheck::run(Arc::new(Engine::default())) {
        Ok(report) => report,
        Err(e) => {
            let _ = writeln!(err, "Error: {e}");
            return EXIT_FAILURE;
        }
    };

    for check in &report.checks {
        let _ = match &check.outcome {
            CheckOutcome::Match => writeln!(out, "PASS {}  {}", check.fixture, check.expected),
            CheckOutcome::Mismatch { actual } => writeln!(
                out,
                "FAIL {}  expected {}, got {}",
                check.fixture, check.expected, actual
            ),
            CheckOutcome::Failed { error } => writeln!(out, "FAIL {}  {}", check.fixture, error),
        };
    }

    let verdict = if report.passed() {
        "Self-test PASSED"
    } else {
        "Self-test FAILED"
    };
    let _ = writeln!(out, "{verdict}");
    EXIT_OK
}
