use std::{io, path::PathBuf, time::Duration};

use thiserror::Error;

/// Fallos del escaneo. Ninguno es "por archivo": invalidan la operación entera.
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Invalid folder: {0:?} does not exist or is not a directory")]
    InvalidRoot(PathBuf),

    #[error("Traversal failed at {path:?}: {source}")]
    Traversal {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
}

/// Por qué un archivo concreto no obtuvo identificador.
#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("{0:#}")]
    Engine(anyhow::Error),

    #[error("engine panicked: {0}")]
    Panicked(String),

    #[error("engine did not finish within {0:?}")]
    Timeout(Duration),

    #[error("identifier built but marker not written: {0}")]
    Marker(#[source] MarkerError),
}

#[derive(Error, Debug)]
pub enum MarkerError {
    #[error("I/O error writing sidecar {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Could not persist sidecar {path:?}: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Fallos que abortan un lote completo.
#[derive(Error, Debug)]
pub enum BatchError {
    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error("Could not build worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration parse error: {0}")]
    Parse(#[from] config::ConfigError),
}

#[derive(Error, Debug)]
pub enum SelfCheckError {
    #[error("Could not prepare self-test fixtures: {0}")]
    Io(#[from] io::Error),
}
