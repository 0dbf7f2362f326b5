use std::{io::Write, time::Duration};

use bytesize::ByteSize;
use ccode_batch::{BatchReport, ProcessingResult, ProgressSink};
use indicatif::{ProgressBar, ProgressStyle};

/// Barra en stderr y una línea por archivo en la salida del comando.
pub struct TerminalProgress<'a> {
    out: &'a mut dyn Write,
    bar: ProgressBar,
}

impl<'a> TerminalProgress<'a> {
    pub fn new(out: &'a mut dyn Write) -> Self {
        TerminalProgress {
            out,
            bar: ProgressBar::hidden(),
        }
    }
}

impl ProgressSink for TerminalProgress<'_> {
    fn on_start(&mut self, total: Option<usize>) {
        self.bar = match total {
            Some(n) => {
                let bar = ProgressBar::new(n as u64);
                bar.set_style(
                    ProgressStyle::with_template("{spinner} [{bar:40}] {pos}/{len} {wide_msg}")
                        .unwrap_or_else(|_| ProgressStyle::default_bar())
                        .progress_chars("=> "),
                );
                bar
            }
            None => {
                let bar = ProgressBar::new_spinner();
                bar.set_style(
                    ProgressStyle::with_template("{spinner} {pos} files {wide_msg}")
                        .unwrap_or_else(|_| ProgressStyle::default_spinner()),
                );
                bar
            }
        };
        self.bar.enable_steady_tick(Duration::from_millis(120));
    }

    fn on_result(&mut self, _index: usize, result: &ProcessingResult) {
        let line = match result {
            ProcessingResult::Success { path, record } => format!("OK   {}  {}", record.iscc, path.display()),
            ProcessingResult::Failure { path, error } => format!("FAIL {}: {}", path.display(), error),
        };

        let out = &mut self.out;
        // si stdout ya no acepta escritura no hay a quién avisar
        let _ = self.bar.suspend(|| writeln!(out, "{line}"));

        self.bar.set_message(result.path().display().to_string());
        self.bar.inc(1);
    }

    fn on_finish(&mut self, report: &BatchReport) {
        self.bar.finish_and_clear();
        let _ = writeln!(self.out, "{}", summary(report));
    }
}

pub fn summary(report: &BatchReport) -> String {
    format!(
        "Processed {} file(s), {} failed, {} hashed in {}",
        report.processed(),
        report.errored(),
        ByteSize::b(report.bytes),
        humantime::format_duration(Duration::from_millis(report.elapsed.as_millis() as u64)),
    )
}
