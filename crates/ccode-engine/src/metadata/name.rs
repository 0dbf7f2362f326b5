use std::path::Path;

use unicode_normalization::UnicodeNormalization;

/// Normaliza un nombre antes de hashearlo: NFKC, `_` como espacio y
/// espacios colapsados.
pub fn normalize_name(raw: &str) -> String {
    let nfkc: String = raw.nfkc().collect();
    nfkc.replace('_', " ").split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Nombre por defecto: el stem del archivo, normalizado.
pub fn name_from_path(path: &Path) -> String {
    path.file_stem()
        .map(|s| normalize_name(&s.to_string_lossy()))
        .unwrap_or_default()
}
