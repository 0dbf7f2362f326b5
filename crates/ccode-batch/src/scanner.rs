use std::{
    collections::HashSet,
    fs,
    path::{Path, PathBuf},
};

use tracing::{Level, instrument, trace, warn};
use walkdir::{DirEntry, WalkDir};

use crate::{config::BatchConfig, error::ScanError, marker};

/// Archivo pendiente de identificador, con su tamaño como clave de orden.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub path: PathBuf,
    pub size: u64,
}

#[derive(Debug, Clone, Default)]
pub struct ScannerConfig {
    pub follow_symlinks: bool,
    pub exclude: Vec<PathBuf>,
}

impl From<&BatchConfig> for ScannerConfig {
    fn from(cfg: &BatchConfig) -> Self {
        ScannerConfig {
            follow_symlinks: cfg.follow_symlinks,
            exclude: cfg.exclude.clone(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Scanner {
    config: ScannerConfig,
}

impl Scanner {
    pub fn new(config: ScannerConfig) -> Self {
        Scanner { config }
    }

    /// Valida la raíz y devuelve el recorrido perezoso.
    ///
    /// La raíz inválida es el único error inmediato; los fallos de recorrido
    /// llegan como elementos `Err` de la secuencia.
    #[instrument(level = Level::DEBUG, skip(self), err)]
    pub fn scan(&self, root: &Path) -> Result<Scan, ScanError> {
        if !root.is_dir() {
            return Err(ScanError::InvalidRoot(root.to_path_buf()));
        }

        let excluded = excluded_under(root, &self.config.exclude);
        let walker = WalkDir::new(root)
            .follow_links(self.config.follow_symlinks)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(move |de| !excluded.iter().any(|e| de.path().starts_with(e)));

        Ok(Scan {
            root: root.to_path_buf(),
            walker: Box::new(walker),
            seen: HashSet::new(),
        })
    }
}

/// Traduce cada exclusión a una ruta con el mismo prefijo que `root`, para
/// que `./media` y `/abs/media/skip` casen entre sí.
fn excluded_under(root: &Path, exclude: &[PathBuf]) -> Vec<PathBuf> {
    let canon_root = fs::canonicalize(root).ok();
    let mut out = Vec::with_capacity(exclude.len() * 2);

    for e in exclude {
        out.push(e.clone());
        let rel = match (&canon_root, fs::canonicalize(e)) {
            (Some(base), Ok(canon)) => canon.strip_prefix(base).map(Path::to_path_buf).ok(),
            _ => None,
        };
        if let Some(rel) = rel {
            out.push(root.join(rel));
        }
    }
    out
}

/// Secuencia de candidatos de un único recorrido. No se puede reiniciar.
pub struct Scan {
    root: PathBuf,
    walker: Box<dyn Iterator<Item = walkdir::Result<DirEntry>>>,
    seen: HashSet<FileId>,
}

impl Scan {
    fn should_process(&mut self, de: &DirEntry) -> Option<Candidate> {
        // con follow_links el tipo ya es el del destino; sin él, los symlinks quedan fuera
        if !de.file_type().is_file() {
            return None;
        }

        let path = de.path();
        if marker::is_sidecar(path) {
            return None;
        }

        let md = match de.metadata() {
            Ok(md) => md,
            Err(e) => {
                // no se puede ni medir: que lo intente el motor y falle con su ruta
                trace!(path = %path.display(), error = %e, "metadata unavailable");
                return Some(Candidate {
                    path: path.to_path_buf(),
                    size: 0,
                });
            }
        };

        if let Some(id) = file_id(&md) {
            if !self.seen.insert(id) {
                trace!(path = %path.display(), "already seen through another link");
                return None;
            }
        }

        if marker::is_processed(path) {
            trace!(path = %path.display(), "already processed");
            return None;
        }

        Some(Candidate {
            path: path.to_path_buf(),
            size: md.len(),
        })
    }
}

impl Iterator for Scan {
    type Item = Result<Candidate, ScanError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.walker.next()? {
                Ok(de) => {
                    if let Some(candidate) = self.should_process(&de) {
                        return Some(Ok(candidate));
                    }
                }
                Err(e) => {
                    let path = e.path().map(Path::to_path_buf).unwrap_or_default();
                    // una entrada rota (enlace colgante, bucle, carpeta sin permiso) no
                    // invalida el resto; perder la raíz sí
                    if e.depth() > 0 && fs::read_dir(&self.root).is_ok() {
                        warn!(path = %path.display(), error = %e, "skipping unreadable entry");
                        continue;
                    }
                    return Some(Err(ScanError::Traversal { path, source: e }));
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct FileId(u64, u64);

/// Identificador único del archivo en el sistema (dispositivo + inodo).
#[cfg(unix)]
fn file_id(md: &std::fs::Metadata) -> Option<FileId> {
    use std::os::unix::fs::MetadataExt;
    Some(FileId(md.dev(), md.ino()))
}

#[cfg(not(unix))]
fn file_id(_md: &std::fs::Metadata) -> Option<FileId> {
    None
}
