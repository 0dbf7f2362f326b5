use std::{path::PathBuf, time::Duration};

use ccode_batch::{BatchConfig, ScanOrder};
use clap::{Args, Parser, Subcommand};

/// Genera códigos de contenido compuestos para archivos multimedia.
#[derive(Debug, Parser)]
#[command(name = "ccode", version, about = "Composite content codes for media files")]
pub struct Cli {
    /// Show debug logs on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file (defaults to ccode.toml in the config directory)
    #[arg(long, global = true, value_name = "PATH", env = "CCODE_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Create the identifier of a single file and print it as JSON
    Create(CreateArgs),
    /// Create identifiers for every unprocessed file under a folder
    Batch(BatchArgs),
    /// Check the engine against bundled samples
    Selftest,
}

#[derive(Debug, Args)]
pub struct CreateArgs {
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Also write the sidecar marker next to the file
    #[arg(long)]
    pub sidecar: bool,
}

#[derive(Debug, Args)]
pub struct BatchArgs {
    #[arg(value_name = "FOLDER")]
    pub folder: PathBuf,

    /// Files processed at once (0 = one per CPU)
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Per-file time limit, e.g. "30s" or "2m"
    #[arg(long, value_parser = humantime::parse_duration)]
    pub timeout: Option<Duration>,

    /// Processing order: traversal or smallest-first
    #[arg(long)]
    pub order: Option<ScanOrder>,

    /// Do not write sidecar markers
    #[arg(long)]
    pub no_sidecar: bool,

    /// Follow symbolic links
    #[arg(long)]
    pub follow_symlinks: bool,

    /// Skip this subtree (repeatable)
    #[arg(long, value_name = "PATH")]
    pub exclude: Vec<PathBuf>,
}

impl BatchArgs {
    /// Los flags mandan sobre lo que venga del archivo o del entorno.
    pub fn apply(&self, mut cfg: BatchConfig) -> BatchConfig {
        if let Some(workers) = self.workers {
            cfg.workers = workers;
        }
        if self.timeout.is_some() {
            cfg.timeout = self.timeout;
        }
        if let Some(order) = self.order {
            cfg.order = order;
        }
        if self.no_sidecar {
            cfg.write_sidecar = false;
        }
        if self.follow_symlinks {
            cfg.follow_symlinks = true;
        }
        cfg.exclude.extend(self.exclude.iter().cloned());
        cfg
    }
}
