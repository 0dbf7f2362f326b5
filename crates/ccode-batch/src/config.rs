use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use config::{Config, Environment, File, FileFormat};
use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Prefijo de las variables de entorno que sobrescriben la configuración.
pub const ENV_PREFIX: &str = "CCODE";

/// Orden en el que se procesan los candidatos
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum ScanOrder {
    /// Tal cual los entrega el scanner, en streaming.
    #[default]
    Traversal,
    /// Se drena el scanner y se ordena por tamaño (estable).
    SmallestFirst,
}

impl std::str::FromStr for ScanOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "traversal" => Ok(ScanOrder::Traversal),
            "smallest-first" | "size" => Ok(ScanOrder::SmallestFirst),
            _ => Err(format!("Unknown order: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Builder, PartialEq, Eq)]
#[builder(setter(into), default)]
#[serde(default)]
pub struct BatchConfig {
    /// Archivos en vuelo a la vez. 1 = secuencial, 0 = uno por CPU.
    pub workers: usize,
    /// Límite por archivo para el motor.
    #[serde(with = "humantime_serde")]
    pub timeout: Option<Duration>,
    pub order: ScanOrder,
    pub follow_symlinks: bool,
    /// Subárboles que no se recorren.
    pub exclude: Vec<PathBuf>,
    /// Escribir el sidecar tras cada éxito.
    pub write_sidecar: bool,
}

impl Default for BatchConfig {
    fn default() -> Self {
        BatchConfig {
            workers: 1,
            timeout: None,
            order: ScanOrder::Traversal,
            follow_symlinks: false,
            exclude: Vec::new(),
            write_sidecar: true,
        }
    }
}

impl BatchConfig {
    /// Carga la configuración desde un TOML (opcional) y luego `CCODE_*`.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            let path = path.to_string_lossy().into_owned();
            builder = builder.add_source(File::new(&path, FileFormat::Toml).required(false));
        }

        let cfg = builder
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?;
        Ok(cfg.try_deserialize::<BatchConfig>()?)
    }

    /// Número real de hilos, resolviendo el `0` automático.
    pub fn effective_workers(&self) -> usize {
        match self.workers {
            0 => num_cpus::get(),
            n => n,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = BatchConfig::load(Some(dir.path().join("nope.toml").as_path())).unwrap();
        assert_eq!(cfg, BatchConfig::default());
    }

    #[test]
    fn toml_values_override_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ccode.toml");
        std::fs::write(
            &path,
            r#"
workers = 4
timeout = "1m 30s"
order = "smallest-first"
exclude = ["/tmp/skip-me"]
"#,
        )
        .unwrap();

        let cfg = BatchConfig::load(Some(path.as_path())).unwrap();
        assert_eq!(cfg.workers, 4);
        assert_eq!(cfg.timeout, Some(Duration::from_secs(90)));
        assert_eq!(cfg.order, ScanOrder::SmallestFirst);
        assert_eq!(cfg.exclude, vec![PathBuf::from("/tmp/skip-me")]);
        assert!(cfg.write_sidecar);
    }

    #[test]
    fn builder_fills_the_rest_with_defaults() {
        let cfg = BatchConfigBuilder::default()
            .workers(3usize)
            .timeout(Some(Duration::from_secs(5)))
            .build()
            .unwrap();
        assert_eq!(cfg.workers, 3);
        assert_eq!(cfg.timeout, Some(Duration::from_secs(5)));
        assert!(cfg.write_sidecar);
        assert_eq!(cfg.order, ScanOrder::Traversal);
    }

    #[test]
    fn zero_workers_means_one_per_cpu() {
        let cfg = BatchConfig {
            workers: 0,
            ..Default::default()
        };
        assert_eq!(cfg.effective_workers(), num_cpus::get());
    }

    #[test]
    fn order_parses_from_cli_strings() {
        assert_eq!("smallest-first".parse::<ScanOrder>(), Ok(ScanOrder::SmallestFirst));
        assert_eq!("Traversal".parse::<ScanOrder>(), Ok(ScanOrder::Traversal));
        assert!("random".parse::<ScanOrder>().is_err());
    }
}
