use std::{
    env,
    path::{Path, PathBuf},
};

use directories::ProjectDirs;
use tracing::debug;

use crate::{errors::Error, fs_utils};

/// Nombre de la ENV var para override de ruta base (modo “portable”)
pub const ENV_BASE_DIR: &str = "CCODE_BASE_DIR";

/// Rutas y ficheros que usa `ccode` fuera de las carpetas del usuario.
///
/// El core no persiste nada aquí: solo viven la configuración opcional
/// y los logs del binario.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CcodePaths {
    // config_dir
    pub config_dir: PathBuf,
    pub config_file: PathBuf,

    // data_dir
    pub data_dir: PathBuf,
    pub logs_dir: PathBuf,
    pub log_file: PathBuf,
}

impl CcodePaths {
    /// Resuelve las rutas (respetando `CCODE_BASE_DIR`) y crea la estructura.
    pub fn new() -> Result<Self, Error> {
        let paths = match env::var_os(ENV_BASE_DIR) {
            Some(base) => Self::layout_portable(Path::new(&base)),
            None => {
                let proj = ProjectDirs::from("org", "ccode", "ccode").ok_or(Error::NoHome)?;
                Self::layout(proj.config_dir().to_path_buf(), proj.data_dir().to_path_buf())
            }
        };

        paths.ensure_structure()?;
        paths.validate_structure()?;

        Ok(paths)
    }

    /// Igual que `new`, pero con todo colgando de `base`.
    pub fn with_base(base: impl AsRef<Path>) -> Result<Self, Error> {
        let paths = Self::layout_portable(base.as_ref());
        paths.ensure_structure()?;
        paths.validate_structure()?;
        Ok(paths)
    }

    fn layout_portable(base: &Path) -> Self {
        Self::layout(base.join("config"), base.join("data"))
    }

    fn layout(config_dir: PathBuf, data_dir: PathBuf) -> Self {
        let logs_dir = data_dir.join("logs");

        CcodePaths {
            config_file: config_dir.join("ccode.toml"),
            config_dir,
            log_file: logs_dir.join("ccode.log"),
            logs_dir,
            data_dir,
        }
    }

    /// Crea carpetas y el fichero de log. El fichero de configuración es opcional
    /// y no se crea.
    pub fn ensure_structure(&self) -> Result<(), Error> {
        for dir in [&self.config_dir, &self.data_dir, &self.logs_dir] {
            fs_utils::ensure_dir(dir)?;
        }
        fs_utils::ensure_file(&self.log_file)?;
        Ok(())
    }

    /// Vuelve a crear lo que falte y comprueba permisos de escritura.
    pub fn validate_structure(&self) -> Result<(), Error> {
        self.ensure_structure()?;
        fs_utils::check_writable(&self.logs_dir)?;
        fs_utils::check_writable(&self.log_file)?;
        debug!(data_dir = %self.data_dir.display(), "paths ready");
        Ok(())
    }
}
