//! Motor de referencia para códigos de contenido compuestos.
//!
//! Detecta el tipo de medio, lee lo mínimo de metadatos (título y duración
//! del audio, dimensiones de imagen) y compone un identificador `CC:` a
//! partir de un digest del nombre y otro del contenido.

pub mod code;
pub mod error;
pub mod format;
pub mod metadata;
pub mod pipeline;
pub mod prelude;
pub mod record;

use std::path::Path;

pub use error::Error;
pub use format::{MediaFormat, MediaKind};
pub use pipeline::{
    config::EngineConfig,
    engine::{Engine, EngineBuilder},
};
pub use record::IdentifierRecord;

/// Atajo: genera el registro de `path` con el motor por defecto.
pub fn generate<P: AsRef<Path>>(path: P) -> Result<IdentifierRecord, Error> {
    Engine::default().generate(path)
}
