use std::{io, path::PathBuf};

use thiserror::Error;

/// La causa va en `source()`, no en el mensaje: quien informa recorre la cadena.
#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error for path {path:?}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Not a regular file: {0:?}")]
    NotAFile(PathBuf),

    #[error("Unsupported media type for {0:?}")]
    Unsupported(PathBuf),

    #[cfg(feature = "lofty")]
    #[error("Invalid audio file")]
    Audio(#[from] lofty::error::LoftyError),

    #[cfg(feature = "image")]
    #[error("Invalid image file")]
    Image(#[from] image::ImageError),

    #[error("Metadata reader not enabled: {0}")]
    ReaderDisabled(&'static str),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}
