use std::{ffi::OsStr, fs::File, io::Read, path::Path};

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Bytes que se leen del principio del archivo para detectar el formato.
const MAGIC_LEN: usize = 64;

/// Familia de medio; el discriminante va en la cabecera del código.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum MediaKind {
    Generic = 0,
    Text = 1,
    Image = 2,
    Audio = 3,
    Video = 4,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Generic => "generic",
            MediaKind::Text => "text",
            MediaKind::Image => "image",
            MediaKind::Audio => "audio",
            MediaKind::Video => "video",
        }
    }

    /// Tipo schema.org que acompaña al registro.
    pub fn object_type(&self) -> &'static str {
        match self {
            MediaKind::Generic => "CreativeWork",
            MediaKind::Text => "TextDigitalDocument",
            MediaKind::Image => "ImageObject",
            MediaKind::Audio => "AudioObject",
            MediaKind::Video => "VideoObject",
        }
    }
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Formatos soportados
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum MediaFormat {
    Mp3,
    Aac,
    M4a,
    Ogg,
    Opus,
    Wav,
    Flac,
    Png,
    Jpeg,
    Gif,
    Webp,
    Bmp,
    Tiff,
    Mp4,
    Mkv,
    Webm,
    Txt,
    Md,
}

impl MediaFormat {
    pub const ALL: &'static [MediaFormat] = &[
        MediaFormat::Mp3,
        MediaFormat::Aac,
        MediaFormat::M4a,
        MediaFormat::Ogg,
        MediaFormat::Opus,
        MediaFormat::Wav,
        MediaFormat::Flac,
        MediaFormat::Png,
        MediaFormat::Jpeg,
        MediaFormat::Gif,
        MediaFormat::Webp,
        MediaFormat::Bmp,
        MediaFormat::Tiff,
        MediaFormat::Mp4,
        MediaFormat::Mkv,
        MediaFormat::Webm,
        MediaFormat::Txt,
        MediaFormat::Md,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MediaFormat::Mp3 => "mp3",
            MediaFormat::Aac => "aac",
            MediaFormat::M4a => "m4a",
            MediaFormat::Ogg => "ogg",
            MediaFormat::Opus => "opus",
            MediaFormat::Wav => "wav",
            MediaFormat::Flac => "flac",
            MediaFormat::Png => "png",
            MediaFormat::Jpeg => "jpg",
            MediaFormat::Gif => "gif",
            MediaFormat::Webp => "webp",
            MediaFormat::Bmp => "bmp",
            MediaFormat::Tiff => "tif",
            MediaFormat::Mp4 => "mp4",
            MediaFormat::Mkv => "mkv",
            MediaFormat::Webm => "webm",
            MediaFormat::Txt => "txt",
            MediaFormat::Md => "md",
        }
    }

    pub fn kind(&self) -> MediaKind {
        use MediaFormat::*;
        match self {
            Mp3 | Aac | M4a | Ogg | Opus | Wav | Flac => MediaKind::Audio,
            Png | Jpeg | Gif | Webp | Bmp | Tiff => MediaKind::Image,
            Mp4 | Mkv | Webm => MediaKind::Video,
            Txt | Md => MediaKind::Text,
        }
    }

    pub fn mediatype(&self) -> &'static str {
        match self {
            MediaFormat::Mp3 => "audio/mpeg",
            MediaFormat::Aac => "audio/aac",
            MediaFormat::M4a => "audio/mp4",
            MediaFormat::Ogg => "audio/ogg",
            MediaFormat::Opus => "audio/opus",
            MediaFormat::Wav => "audio/wav",
            MediaFormat::Flac => "audio/flac",
            MediaFormat::Png => "image/png",
            MediaFormat::Jpeg => "image/jpeg",
            MediaFormat::Gif => "image/gif",
            MediaFormat::Webp => "image/webp",
            MediaFormat::Bmp => "image/bmp",
            MediaFormat::Tiff => "image/tiff",
            MediaFormat::Mp4 => "video/mp4",
            MediaFormat::Mkv => "video/x-matroska",
            MediaFormat::Webm => "video/webm",
            MediaFormat::Txt => "text/plain",
            MediaFormat::Md => "text/markdown",
        }
    }

    /// Extensión → formato, sin distinguir mayúsculas.
    pub fn from_extension(ext: &str) -> Option<Self> {
        let lower = ext.to_ascii_lowercase();
        match lower.as_str() {
            "jpeg" => Some(MediaFormat::Jpeg),
            "tiff" => Some(MediaFormat::Tiff),
            "markdown" => Some(MediaFormat::Md),
            _ => MediaFormat::ALL.iter().find(|f| f.as_str() == lower).copied(),
        }
    }

    /// Reconoce el formato por la firma de los primeros bytes.
    pub fn from_magic(head: &[u8]) -> Option<Self> {
        if sig_at(head, 0, b"\x89PNG\r\n\x1a\n") {
            return Some(MediaFormat::Png);
        }
        if sig_at(head, 0, &[0xFF, 0xD8, 0xFF]) {
            return Some(MediaFormat::Jpeg);
        }
        if sig_at(head, 0, b"GIF87a") || sig_at(head, 0, b"GIF89a") {
            return Some(MediaFormat::Gif);
        }
        if sig_at(head, 0, b"RIFF") && sig_at(head, 8, b"WAVE") {
            return Some(MediaFormat::Wav);
        }
        if sig_at(head, 0, b"RIFF") && sig_at(head, 8, b"WEBP") {
            return Some(MediaFormat::Webp);
        }
        if sig_at(head, 0, b"II*\0") || sig_at(head, 0, b"MM\0*") {
            return Some(MediaFormat::Tiff);
        }
        // "BM" a secas es demasiado débil: exige también un tamaño de cabecera DIB conocido.
        if sig_at(head, 0, b"BM")
            && matches!(head.get(14).copied(), Some(12 | 40 | 56 | 108 | 124))
            && sig_at(head, 15, &[0, 0, 0])
        {
            return Some(MediaFormat::Bmp);
        }
        if sig_at(head, 0, b"fLaC") {
            return Some(MediaFormat::Flac);
        }
        if sig_at(head, 0, b"OggS") {
            return Some(if sig_at(head, 28, b"OpusHead") {
                MediaFormat::Opus
            } else {
                MediaFormat::Ogg
            });
        }
        if sig_at(head, 4, b"ftyp") {
            return Some(if sig_at(head, 8, b"M4A ") || sig_at(head, 8, b"M4B ") {
                MediaFormat::M4a
            } else {
                MediaFormat::Mp4
            });
        }
        if sig_at(head, 0, &[0x1A, 0x45, 0xDF, 0xA3]) {
            return Some(MediaFormat::Mkv);
        }
        if sig_at(head, 0, b"ID3") {
            return Some(MediaFormat::Mp3);
        }
        match head {
            // ADTS: sync de 12 bits, layer 00
            [0xFF, b1, ..] if b1 & 0xF6 == 0xF0 => Some(MediaFormat::Aac),
            // MPEG audio: sync de 11 bits, layer != reservado
            [0xFF, b1, ..] if b1 & 0xE0 == 0xE0 && b1 & 0x06 != 0 => Some(MediaFormat::Mp3),
            _ => None,
        }
    }

    /// Detecta el formato de `path`: primero la firma, luego la extensión.
    pub fn detect(path: &Path) -> Result<Self, Error> {
        let mut head = Vec::with_capacity(MAGIC_LEN);
        File::open(path)
            .and_then(|f| f.take(MAGIC_LEN as u64).read_to_end(&mut head))
            .map_err(|e| Error::io(path, e))?;

        let by_ext = path
            .extension()
            .and_then(OsStr::to_str)
            .and_then(MediaFormat::from_extension);

        match (MediaFormat::from_magic(&head), by_ext) {
            // Matroska y WebM comparten firma
            (Some(MediaFormat::Mkv), Some(MediaFormat::Webm)) => Ok(MediaFormat::Webm),
            (Some(format), _) => Ok(format),
            (None, Some(format)) => Ok(format),
            (None, None) => Err(Error::Unsupported(path.to_path_buf())),
        }
    }
}

fn sig_at(head: &[u8], offset: usize, sig: &[u8]) -> bool {
    head.get(offset..offset + sig.len()) == Some(sig)
}

impl std::str::FromStr for MediaFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MediaFormat::from_extension(s).ok_or_else(|| format!("Extension not supported: {}", s))
    }
}

impl std::fmt::Display for MediaFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
