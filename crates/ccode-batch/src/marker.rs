//! Marcador de "ya procesado": un sidecar JSON junto al archivo.
//!
//! No hay base de datos. Si el sidecar no se puede leer o no cuadra con el
//! archivo, el archivo cuenta como no procesado y se vuelve a generar.

use std::{
    ffi::OsString,
    fs,
    io::Write,
    path::{Path, PathBuf},
};

use ccode_engine::IdentifierRecord;
use serde::Deserialize;
use tempfile::NamedTempFile;
use tracing::{Level, debug, instrument, trace};

use crate::error::MarkerError;

/// Sufijo que se añade al nombre completo del archivo (extensión incluida).
pub const SIDECAR_SUFFIX: &str = ".ccode.json";

/// Lo mínimo que hay que leer de un sidecar para fiarse de él.
#[derive(Debug, Deserialize)]
struct SidecarMarker {
    iscc: String,
    #[serde(default)]
    filesize: Option<u64>,
}

/// `foto.jpg` → `foto.jpg.ccode.json`
pub fn sidecar_path(path: &Path) -> PathBuf {
    let mut name: OsString = path.as_os_str().to_owned();
    name.push(SIDECAR_SUFFIX);
    PathBuf::from(name)
}

pub fn is_sidecar(path: &Path) -> bool {
    path.file_name()
        .map(|n| n.to_string_lossy().ends_with(SIDECAR_SUFFIX))
        .unwrap_or(false)
}

/// TRUE  -> tiene identificador válido
/// FALSE -> hay que (re)procesarlo, incluso si no se pudo comprobar
pub fn is_processed(path: &Path) -> bool {
    let sidecar = sidecar_path(path);

    let raw = match fs::read(&sidecar) {
        Ok(raw) => raw,
        Err(e) => {
            trace!(path = %sidecar.display(), error = %e, "no readable sidecar");
            return false;
        }
    };

    let marker: SidecarMarker = match serde_json::from_slice(&raw) {
        Ok(m) => m,
        Err(e) => {
            debug!(path = %sidecar.display(), error = %e, "malformed sidecar, reprocessing");
            return false;
        }
    };

    if marker.iscc.trim().is_empty() {
        debug!(path = %sidecar.display(), "sidecar without identifier, reprocessing");
        return false;
    }

    if let Some(recorded) = marker.filesize {
        match fs::metadata(path) {
            Ok(md) if md.len() == recorded => {}
            Ok(md) => {
                debug!(path = %path.display(), recorded, current = md.len(), "file changed since marked");
                return false;
            }
            Err(e) => {
                trace!(path = %path.display(), error = %e, "cannot stat marked file");
                return false;
            }
        }
    }

    true
}

/// Escribe el sidecar de forma atómica: fichero temporal en la misma carpeta
/// y luego rename, para que nunca quede un JSON a medias.
#[instrument(level = Level::TRACE, skip(record), err)]
pub fn write_marker(path: &Path, record: &IdentifierRecord) -> Result<PathBuf, MarkerError> {
    let target = sidecar_path(path);
    let dir = match target.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };

    let io_err = |source| MarkerError::Io {
        path: target.clone(),
        source,
    };

    let mut tmp = NamedTempFile::new_in(&dir).map_err(io_err)?;
    serde_json::to_writer_pretty(&mut tmp, record)?;
    tmp.write_all(b"\n").map_err(io_err)?;
    tmp.as_file().sync_all().map_err(io_err)?;
    // el temporal se descarta aquí si el rename falla
    tmp.persist(&target).map_err(|e| MarkerError::Persist {
        path: target.clone(),
        source: e.error,
    })?;

    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record_for(path: &Path) -> IdentifierRecord {
        let size = fs::metadata(path).unwrap().len();
        IdentifierRecord::new("CC:KAATIAF3JFOD7DCM6PRACPRGQUIZW", "a.txt", size)
    }

    #[test]
    fn sidecar_keeps_the_original_extension() {
        assert_eq!(
            sidecar_path(Path::new("/music/a.flac")),
            PathBuf::from("/music/a.flac.ccode.json")
        );
        assert!(is_sidecar(Path::new("/music/a.flac.ccode.json")));
        assert!(!is_sidecar(Path::new("/music/a.flac")));
        assert!(!is_sidecar(Path::new("/music/ccode.json")));
    }

    #[test]
    fn write_then_detect() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.txt");
        fs::write(&file, "hello").unwrap();
        assert!(!is_processed(&file));

        let written = write_marker(&file, &record_for(&file)).unwrap();
        assert_eq!(written, sidecar_path(&file));
        assert!(is_processed(&file));

        // solo el archivo y su sidecar: el temporal se renombró
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 2);
    }

    #[test]
    fn malformed_sidecar_is_not_processed() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.txt");
        fs::write(&file, "hello").unwrap();

        fs::write(sidecar_path(&file), "{ not json").unwrap();
        assert!(!is_processed(&file));

        fs::write(sidecar_path(&file), r#"{"iscc": "  "}"#).unwrap();
        assert!(!is_processed(&file));

        fs::write(sidecar_path(&file), r#"{"name": "no code here"}"#).unwrap();
        assert!(!is_processed(&file));
    }

    #[test]
    fn sidecar_without_size_is_trusted() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.txt");
        fs::write(&file, "hello").unwrap();
        fs::write(sidecar_path(&file), r#"{"iscc": "CC:SOMETHING"}"#).unwrap();

        assert!(is_processed(&file));
    }

    #[test]
    fn changed_file_needs_reprocessing() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.txt");
        fs::write(&file, "hello").unwrap();
        write_marker(&file, &record_for(&file)).unwrap();

        fs::write(&file, "hello, world").unwrap();
        assert!(!is_processed(&file));
    }

    #[cfg(unix)]
    #[test]
    fn unreadable_sidecar_is_not_processed() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.txt");
        fs::write(&file, "hello").unwrap();
        // un directorio con el nombre del sidecar no se puede leer como archivo
        fs::create_dir(sidecar_path(&file)).unwrap();

        assert!(!is_processed(&file));
    }
}
