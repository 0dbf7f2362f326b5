//! Orquestación por lotes: qué archivos faltan, pasar cada uno por el motor
//! sin que un fallo tumbe el resto, y marcar lo ya hecho con un sidecar.

pub mod batch;
pub mod config;
pub mod error;
pub mod marker;
pub mod processor;
pub mod scanner;
pub mod selfcheck;
pub mod traits;

pub use batch::{BatchReport, BatchRunner, ProcessingResult};
pub use config::{BatchConfig, BatchConfigBuilder, ScanOrder};
pub use error::{BatchError, ConfigError, MarkerError, ProcessError, ScanError, SelfCheckError};
pub use processor::Processor;
pub use scanner::{Candidate, Scan, Scanner, ScannerConfig};
pub use selfcheck::SelfCheckReport;
pub use traits::{IdentifierEngine, NoProgress, ProgressSink};
