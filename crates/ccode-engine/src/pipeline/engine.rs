use std::{fs, path::Path};

use tracing::{Level, debug, instrument};

use crate::{
    code::{self, Digest},
    error::Error,
    format::{MediaFormat, MediaKind},
    metadata::{
        MediaDetails,
        name::{name_from_path, normalize_name},
        reader::{EmptyReader, MetadataReader},
    },
    pipeline::config::EngineConfig,
    record::{IdentifierRecord, JSON_SCHEMA, JSONLD_CONTEXT},
};

type Reader = Box<dyn MetadataReader + Send + Sync>;

#[derive(Default)]
pub struct EngineBuilder {
    cfg: EngineConfig,
    audio: Option<Reader>,
    image: Option<Reader>,
}

impl EngineBuilder {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn read_buffer(mut self, bytes: usize) -> Self {
        self.cfg.read_buffer = bytes.max(1);
        self
    }
    pub fn prefer_embedded_title(mut self, yes: bool) -> Self {
        self.cfg.prefer_embedded_title = yes;
        self
    }

    pub fn with_audio_reader<R: MetadataReader + Send + Sync + 'static>(mut self, r: R) -> Self {
        self.audio = Some(Box::new(r));
        self
    }
    pub fn with_image_reader<R: MetadataReader + Send + Sync + 'static>(mut self, r: R) -> Self {
        self.image = Some(Box::new(r));
        self
    }

    pub fn build(self) -> Engine {
        Engine {
            cfg: self.cfg,
            audio: self.audio.unwrap_or_else(default_audio_reader),
            image: self.image.unwrap_or_else(default_image_reader),
            plain: Box::new(EmptyReader),
        }
    }
}

/// Motor de referencia: detecta el formato, lee metadatos y compone el código.
pub struct Engine {
    cfg: EngineConfig,
    audio: Reader,
    image: Reader,
    plain: Reader,
}

pub fn default_audio_reader() -> Reader {
    #[cfg(feature = "lofty")]
    {
        Box::new(crate::metadata::reader::LoftyReader::new())
    }
    #[cfg(not(feature = "lofty"))]
    {
        Box::new(crate::metadata::reader::NoopReader)
    }
}

pub fn default_image_reader() -> Reader {
    #[cfg(feature = "image")]
    {
        Box::new(crate::metadata::reader::ImageReader)
    }
    #[cfg(not(feature = "image"))]
    {
        Box::new(crate::metadata::reader::NoopReader)
    }
}

impl Engine {
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.cfg
    }

    /// Genera el registro completo de `path`.
    #[instrument(level = Level::DEBUG, skip(self, path), fields(path = %path.as_ref().display()), err)]
    pub fn generate<P: AsRef<Path>>(&self, path: P) -> Result<IdentifierRecord, Error> {
        let path = path.as_ref();

        let meta = fs::metadata(path).map_err(|e| Error::io(path, e))?;
        if !meta.is_file() {
            return Err(Error::NotAFile(path.to_path_buf()));
        }

        let format = MediaFormat::detect(path)?;
        let kind = format.kind();
        let details = self.read_details(path, format)?;

        let name = details
            .title
            .as_deref()
            .filter(|_| self.cfg.prefer_embedded_title)
            .map(normalize_name)
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| name_from_path(path));

        let meta_digest = Digest::of_bytes(name.as_bytes());
        let (data_digest, filesize) = Digest::of_file(path, self.cfg.read_buffer)?;
        let iscc = code::compose(kind, &meta_digest, &data_digest);

        debug!(%iscc, %format, filesize, "identifier built");

        Ok(IdentifierRecord {
            context: JSONLD_CONTEXT.to_string(),
            schema: JSON_SCHEMA.to_string(),
            object_type: kind.object_type().to_string(),
            iscc,
            name,
            mode: kind.as_str().to_string(),
            filename: path
                .file_name()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default(),
            filesize,
            mediatype: format.mediatype().to_string(),
            duration: details.duration.map(|d| d.as_secs_f64().round() as u64),
            width: details.width,
            height: details.height,
            metahash: meta_digest.multihash(),
            datahash: data_digest.multihash(),
        })
    }

    /// Solo metadatos, sin hashear el contenido.
    pub fn read_details(&self, path: &Path, format: MediaFormat) -> Result<MediaDetails, Error> {
        match format.kind() {
            MediaKind::Audio => self.audio.read(path, format),
            MediaKind::Image => self.image.read(path, format),
            MediaKind::Text | MediaKind::Video | MediaKind::Generic => self.plain.read(path, format),
        }
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::builder().build()
    }
}
