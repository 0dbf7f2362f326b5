use std::path::Path;

use crate::{
    error::Error,
    format::MediaFormat,
    metadata::{MediaDetails, reader::MetadataReader},
};

/// Lee las dimensiones de la imagen; falla si la cabecera está corrupta.
#[derive(Debug, Clone, Default)]
pub struct ImageReader;

impl MetadataReader for ImageReader {
    fn read(&self, path: &Path, _format: MediaFormat) -> Result<MediaDetails, Error> {
        let (width, height) = image::ImageReader::open(path)
            .and_then(|r| r.with_guessed_format())
            .map_err(|e| Error::io(path, e))?
            .into_dimensions()?;

        Ok(MediaDetails {
            width: Some(width),
            height: Some(height),
            ..Default::default()
        })
    }
}
