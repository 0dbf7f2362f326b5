use std::{borrow::Cow, path::Path};

use lofty::{
    file::{AudioFile, TaggedFile, TaggedFileExt},
    probe::Probe,
    tag::{Accessor, Tag, TagType},
};
use tracing::trace;

use crate::{
    error::Error,
    format::MediaFormat,
    metadata::{MediaDetails, reader::MetadataReader},
};

/// Lector de audio basado en lofty: duración y título.
#[derive(Debug, Clone)]
pub struct LoftyReader {
    read_title: bool,
}

impl LoftyReader {
    pub fn new() -> Self {
        Self { read_title: true }
    }

    /// Ignora el título embebido y deja que el motor use el nombre del archivo.
    pub fn without_title(mut self) -> Self {
        self.read_title = false;
        self
    }

    fn find_best_tag<'a>(&self, tagged: &'a TaggedFile) -> Option<&'a Tag> {
        tagged
            .primary_tag()
            .filter(|t| matches!(t.tag_type(), TagType::Id3v2 | TagType::Ape | TagType::VorbisComments))
            .or_else(|| tagged.tags().iter().find(|t| t.tag_type() == TagType::Id3v2))
            .or_else(|| tagged.first_tag())
    }
}

impl Default for LoftyReader {
    fn default() -> Self {
        Self::new()
    }
}

impl MetadataReader for LoftyReader {
    fn read(&self, path: &Path, format: MediaFormat) -> Result<MediaDetails, Error> {
        // La firma manda; la extensión puede mentir.
        let tagged = Probe::open(path)
            .map_err(Error::from)?
            .guess_file_type()
            .map_err(|e| Error::io(path, e))?
            .read()?;

        let props = tagged.properties();
        let title = if self.read_title {
            self.find_best_tag(&tagged)
                .and_then(|tag| tag.title().map(Cow::into_owned))
                .filter(|t| !t.trim().is_empty())
        } else {
            None
        };

        trace!(path = %path.display(), %format, duration = ?props.duration(), ?title, "audio metadata");

        Ok(MediaDetails {
            title,
            duration: Some(props.duration()),
            ..Default::default()
        })
    }
}
