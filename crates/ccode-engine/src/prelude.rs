pub use crate::{
    Engine, EngineBuilder, EngineConfig, IdentifierRecord, MediaFormat, MediaKind, error::Error,
};
