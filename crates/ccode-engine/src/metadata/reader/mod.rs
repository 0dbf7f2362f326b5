#[cfg(feature = "image")]
pub mod image;
#[cfg(feature = "lofty")]
pub mod lofty;

use std::path::Path;

use crate::{error::Error, format::MediaFormat, metadata::MediaDetails};

#[cfg(feature = "image")]
pub use self::image::ImageReader;
#[cfg(feature = "lofty")]
pub use self::lofty::LoftyReader;

/// Lee los metadatos embebidos que el motor necesita de un formato concreto.
pub trait MetadataReader {
    fn read(&self, path: &Path, format: MediaFormat) -> Result<MediaDetails, Error>;
}

#[derive(Default)]
pub struct NoopReader;
impl MetadataReader for NoopReader {
    fn read(&self, _path: &Path, _format: MediaFormat) -> Result<MediaDetails, Error> {
        Err(Error::ReaderDisabled("metadata reader not enabled"))
    }
}

/// Para formatos que no tienen nada que leer (texto, vídeo).
#[derive(Default)]
pub struct EmptyReader;
impl MetadataReader for EmptyReader {
    fn read(&self, _path: &Path, _format: MediaFormat) -> Result<MediaDetails, Error> {
        Ok(MediaDetails::default())
    }
}
