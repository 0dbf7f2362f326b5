//! Crate `ccode_paths`: rutas de configuración y logs de ccode

mod errors;
mod fs_utils;
mod paths;

pub use errors::Error;
pub use paths::{CcodePaths, ENV_BASE_DIR};
