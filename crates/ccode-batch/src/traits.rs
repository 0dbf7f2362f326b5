use std::path::Path;

use ccode_engine::{Engine, IdentifierRecord};

use crate::batch::{BatchReport, ProcessingResult};

/// Lo único que el core sabe del motor de generación.
pub trait IdentifierEngine: Send + Sync {
    fn build_identifier(&self, path: &Path) -> anyhow::Result<IdentifierRecord>;
}

impl IdentifierEngine for Engine {
    fn build_identifier(&self, path: &Path) -> anyhow::Result<IdentifierRecord> {
        Ok(self.generate(path)?)
    }
}

/// Observador del progreso de un lote. Los resultados llegan en el orden del
/// informe, siempre desde el hilo que ejecuta el lote.
pub trait ProgressSink {
    /// `total` solo se conoce cuando el lote drena el scanner antes de empezar.
    fn on_start(&mut self, _total: Option<usize>) {}
    fn on_result(&mut self, index: usize, result: &ProcessingResult);
    fn on_finish(&mut self, _report: &BatchReport) {}
}

/// No informa de nada.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn on_result(&mut self, _index: usize, _result: &ProcessingResult) {}
}
