use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::{Duration, Instant},
};

use ccode_engine::IdentifierRecord;
use rayon::{
    ThreadPool, ThreadPoolBuilder,
    iter::{IntoParallelRefIterator, ParallelIterator},
};
use tracing::{Level, debug, info, instrument, warn};

use crate::{
    config::{BatchConfig, ScanOrder},
    error::{BatchError, ProcessError, ScanError},
    marker,
    processor::Processor,
    scanner::{Candidate, Scanner, ScannerConfig},
    traits::{IdentifierEngine, ProgressSink},
};

/// Resultado de un archivo. Siempre lleva la ruta que se le pasó al procesador.
#[derive(Debug)]
pub enum ProcessingResult {
    Success { path: PathBuf, record: IdentifierRecord },
    Failure { path: PathBuf, error: ProcessError },
}

impl ProcessingResult {
    pub fn path(&self) -> &Path {
        match self {
            ProcessingResult::Success { path, .. } | ProcessingResult::Failure { path, .. } => path,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ProcessingResult::Success { .. })
    }

    pub fn record(&self) -> Option<&IdentifierRecord> {
        match self {
            ProcessingResult::Success { record, .. } => Some(record),
            ProcessingResult::Failure { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&ProcessError> {
        match self {
            ProcessingResult::Success { .. } => None,
            ProcessingResult::Failure { error, .. } => Some(error),
        }
    }
}

/// Un resultado por candidato intentado, en el orden de proceso.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub results: Vec<ProcessingResult>,
    pub elapsed: Duration,
    /// Bytes de los archivos que obtuvieron identificador.
    pub bytes: u64,
}

impl BatchReport {
    pub fn processed(&self) -> usize {
        self.successes().count()
    }

    pub fn errored(&self) -> usize {
        self.failures().count()
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn successes(&self) -> impl Iterator<Item = &ProcessingResult> {
        self.results.iter().filter(|r| r.is_success())
    }

    pub fn failures(&self) -> impl Iterator<Item = &ProcessingResult> {
        self.results.iter().filter(|r| !r.is_success())
    }
}

type Candidates = Box<dyn Iterator<Item = Result<Candidate, ScanError>>>;

pub struct BatchRunner {
    processor: Processor,
    scanner: Scanner,
    config: BatchConfig,
}

impl BatchRunner {
    pub fn new(engine: Arc<dyn IdentifierEngine>, config: BatchConfig) -> Self {
        BatchRunner {
            processor: Processor::new(engine).with_timeout(config.timeout),
            scanner: Scanner::new(ScannerConfig::from(&config)),
            config,
        }
    }

    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    /// Procesa todo lo pendiente bajo `root`.
    ///
    /// Solo una raíz inválida o un fallo de recorrido devuelven `Err`; los
    /// fallos por archivo quedan en el informe.
    #[instrument(level = Level::INFO, skip(self, progress), err)]
    pub fn run(&self, root: &Path, progress: &mut dyn ProgressSink) -> Result<BatchReport, BatchError> {
        let start = Instant::now();
        let scan = self.scanner.scan(root)?;

        let (candidates, total): (Candidates, Option<usize>) = match self.config.order {
            ScanOrder::Traversal => (Box::new(scan) as Candidates, None),
            ScanOrder::SmallestFirst => {
                let mut all = scan.collect::<Result<Vec<_>, _>>()?;
                all.sort_by_key(|c| c.size);
                let total = all.len();
                (Box::new(all.into_iter().map(Ok)) as Candidates, Some(total))
            }
        };

        let workers = self.config.effective_workers();
        info!(root = %root.display(), workers, order = ?self.config.order, "batch started");
        progress.on_start(total);

        let mut report = BatchReport::default();
        if workers <= 1 {
            self.run_sequential(candidates, &mut report, progress)?;
        } else {
            let pool = ThreadPoolBuilder::new()
                .num_threads(workers)
                .thread_name(|i| format!("ccode-worker-{i}"))
                .build()?;
            self.run_windowed(&pool, workers, candidates, &mut report, progress)?;
        }

        report.elapsed = start.elapsed();
        info!(
            processed = report.processed(),
            errored = report.errored(),
            elapsed = ?report.elapsed,
            "batch finished"
        );
        progress.on_finish(&report);
        Ok(report)
    }

    fn run_sequential(
        &self,
        candidates: Candidates,
        report: &mut BatchReport,
        progress: &mut dyn ProgressSink,
    ) -> Result<(), BatchError> {
        for candidate in candidates {
            let candidate = candidate?;
            let result = self.handle(&candidate);
            push_result(report, progress, &candidate, result);
        }
        Ok(())
    }

    /// Toma ventanas de `workers` candidatos y las procesa en paralelo; el
    /// `collect` de rayon conserva el orden de entrada.
    fn run_windowed(
        &self,
        pool: &ThreadPool,
        workers: usize,
        mut candidates: Candidates,
        report: &mut BatchReport,
        progress: &mut dyn ProgressSink,
    ) -> Result<(), BatchError> {
        let mut window: Vec<Candidate> = Vec::with_capacity(workers);
        loop {
            window.clear();
            for candidate in candidates.by_ref().take(workers) {
                window.push(candidate?);
            }
            if window.is_empty() {
                return Ok(());
            }

            debug!(size = window.len(), "processing window");
            let results: Vec<ProcessingResult> =
                pool.install(|| window.par_iter().map(|c| self.handle(c)).collect());

            for (candidate, result) in window.iter().zip(results) {
                push_result(report, progress, candidate, result);
            }
        }
    }

    /// Procesa un candidato y, si salió bien, deja su sidecar.
    fn handle(&self, candidate: &Candidate) -> ProcessingResult {
        let result = self.processor.process(&candidate.path);
        if !self.config.write_sidecar {
            return result;
        }

        match result {
            ProcessingResult::Success { path, record } => match marker::write_marker(&path, &record) {
                Ok(_) => ProcessingResult::Success { path, record },
                Err(e) => ProcessingResult::Failure {
                    path,
                    error: ProcessError::Marker(e),
                },
            },
            failure => failure,
        }
    }
}

fn push_result(
    report: &mut BatchReport,
    progress: &mut dyn ProgressSink,
    candidate: &Candidate,
    result: ProcessingResult,
) {
    match &result {
        ProcessingResult::Success { path, record } => {
            info!(path = %path.display(), iscc = %record.iscc, "identifier created");
            report.bytes += candidate.size;
        }
        ProcessingResult::Failure { path, error } => {
            warn!(path = %path.display(), error = %error, "file failed");
        }
    }

    progress.on_result(report.results.len(), &result);
    report.results.push(result);
}

#[cfg(test)]
mod tests {
    use std::fs;

    use anyhow::bail;

    use super::*;
    use crate::traits::NoProgress;

    /// Éxito para todo salvo los `.bad`.
    struct Picky;
    impl IdentifierEngine for Picky {
        fn build_identifier(&self, path: &Path) -> anyhow::Result<IdentifierRecord> {
            if path.extension().is_some_and(|e| e == "bad") {
                bail!("cannot read {}", path.display());
            }
            let size = fs::metadata(path)?.len();
            let name = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
            Ok(IdentifierRecord::new(format!("CC:{name}"), name, size))
        }
    }

    #[derive(Default)]
    struct Collect {
        started: Option<Option<usize>>,
        seen: Vec<(usize, PathBuf)>,
        finished: bool,
    }

    impl ProgressSink for Collect {
        fn on_start(&mut self, total: Option<usize>) {
            self.started = Some(total);
        }
        fn on_result(&mut self, index: usize, result: &ProcessingResult) {
            self.seen.push((index, result.path().to_path_buf()));
        }
        fn on_finish(&mut self, _report: &BatchReport) {
            self.finished = true;
        }
    }

    #[test]
    fn failures_do_not_stop_the_batch() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), "a").unwrap();
        fs::write(dir.path().join("b.bad"), "b").unwrap();
        fs::write(dir.path().join("c.txt"), "cc").unwrap();

        let runner = BatchRunner::new(Arc::new(Picky), BatchConfig::default());
        let report = runner.run(dir.path(), &mut NoProgress).unwrap();

        assert_eq!(report.len(), 3);
        assert_eq!(report.processed(), 2);
        assert_eq!(report.errored(), 1);
        assert_eq!(report.bytes, 3);
        assert_eq!(report.failures().next().unwrap().path(), dir.path().join("b.bad"));
        assert!(!marker::is_processed(&dir.path().join("b.bad")));
    }

    #[test]
    fn progress_sees_every_result_in_order() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["a.txt", "b.txt", "c.txt"] {
            fs::write(dir.path().join(name), name).unwrap();
        }

        let mut sink = Collect::default();
        BatchRunner::new(Arc::new(Picky), BatchConfig::default())
            .run(dir.path(), &mut sink)
            .unwrap();

        assert_eq!(sink.started, Some(None));
        assert!(sink.finished);
        assert_eq!(
            sink.seen,
            vec![
                (0, dir.path().join("a.txt")),
                (1, dir.path().join("b.txt")),
                (2, dir.path().join("c.txt")),
            ]
        );
    }

    #[test]
    fn smallest_first_announces_the_total() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), "aaaa").unwrap();
        fs::write(dir.path().join("b.txt"), "b").unwrap();

        let cfg = BatchConfig {
            order: ScanOrder::SmallestFirst,
            ..Default::default()
        };
        let mut sink = Collect::default();
        BatchRunner::new(Arc::new(Picky), cfg).run(dir.path(), &mut sink).unwrap();

        assert_eq!(sink.started, Some(Some(2)));
        assert_eq!(sink.seen[0].1, dir.path().join("b.txt"));
    }

    #[test]
    fn without_sidecars_nothing_is_marked() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), "a").unwrap();

        let cfg = BatchConfig {
            write_sidecar: false,
            ..Default::default()
        };
        let runner = BatchRunner::new(Arc::new(Picky), cfg);
        assert_eq!(runner.run(dir.path(), &mut NoProgress).unwrap().processed(), 1);
        assert_eq!(runner.run(dir.path(), &mut NoProgress).unwrap().processed(), 1);
        assert!(!marker::sidecar_path(&dir.path().join("a.txt")).exists());
    }

    #[test]
    fn invalid_root_is_a_batch_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = Collect::default();
        let err = BatchRunner::new(Arc::new(Picky), BatchConfig::default())
            .run(&dir.path().join("missing"), &mut sink)
            .unwrap_err();

        assert!(matches!(err, BatchError::Scan(ScanError::InvalidRoot(_))));
        assert!(sink.started.is_none());
    }
}
