use serde::{Deserialize, Serialize};

pub const JSONLD_CONTEXT: &str = "http://purl.org/iscc/context/0.4.0.jsonld";
pub const JSON_SCHEMA: &str = "http://purl.org/iscc/schema/0.4.0.json";

/// Registro que produce el motor para un archivo.
///
/// Quien orqueste lotes debe tratarlo como opaco: solo `iscc` y `filesize`
/// tienen significado fuera del motor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentifierRecord {
    #[serde(rename = "@context")]
    pub context: String,
    #[serde(rename = "$schema")]
    pub schema: String,
    #[serde(rename = "@type")]
    pub object_type: String,
    pub iscc: String,
    pub name: String,
    pub mode: String,
    pub filename: String,
    pub filesize: u64,
    pub mediatype: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    pub metahash: String,
    pub datahash: String,
}

impl IdentifierRecord {
    /// Registro mínimo con los campos obligatorios; el resto por defecto.
    pub fn new(iscc: impl Into<String>, filename: impl Into<String>, filesize: u64) -> Self {
        IdentifierRecord {
            context: JSONLD_CONTEXT.to_string(),
            schema: JSON_SCHEMA.to_string(),
            object_type: "CreativeWork".to_string(),
            iscc: iscc.into(),
            name: String::new(),
            mode: "generic".to_string(),
            filename: filename.into(),
            filesize,
            mediatype: "application/octet-stream".to_string(),
            duration: None,
            width: None,
            height: None,
            metahash: String::new(),
            datahash: String::new(),
        }
    }
}
