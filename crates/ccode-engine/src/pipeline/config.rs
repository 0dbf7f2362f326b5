/// Ajustes del motor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Tamaño del buffer con el que se hashea el contenido.
    pub read_buffer: usize,
    /// Usar el título embebido (audio) como nombre en lugar del stem.
    pub prefer_embedded_title: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            read_buffer: 1 << 20,
            prefer_embedded_title: true,
        }
    }
}
