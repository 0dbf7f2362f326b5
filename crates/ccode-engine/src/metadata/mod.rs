pub mod name;
pub mod reader;

use std::time::Duration;

/// Lo que los lectores saben extraer de un archivo, según su tipo.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MediaDetails {
    pub title: Option<String>,
    pub duration: Option<Duration>,
    pub width: Option<u32>,
    pub height: Option<u32>,
}
