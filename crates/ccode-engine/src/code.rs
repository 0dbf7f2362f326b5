use std::{
    fs::File,
    io::{BufReader, Read},
    path::Path,
};

use data_encoding::BASE32_NOPAD;
use sha2::{Digest as _, Sha256};

use crate::{error::Error, format::MediaKind};

/// Prefijo del identificador canónico.
pub const CODE_PREFIX: &str = "CC:";

/// Main-type de un código compuesto (primer byte de la cabecera).
pub const MAINTYPE_COMPOSITE: u8 = 0x50;

/// Cabecera multihash de sha2-256 (código 0x12, longitud 32).
pub const MULTIHASH_SHA2_256: [u8; 2] = [0x12, 0x20];

/// Bytes de cada digest que entran en el código.
const UNIT_LEN: usize = 8;

/// Digest sha2-256.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Digest(pub [u8; 32]);

impl Digest {
    pub fn of_bytes(data: &[u8]) -> Self {
        Digest(Sha256::digest(data).into())
    }

    /// Hashea el archivo por bloques; devuelve también los bytes leídos.
    pub fn of_file(path: &Path, buffer_size: usize) -> Result<(Self, u64), Error> {
        let file = File::open(path).map_err(|e| Error::io(path, e))?;
        let mut reader = BufReader::with_capacity(buffer_size, file);
        let mut hasher = Sha256::new();
        let mut buf = vec![0u8; buffer_size.max(1)];
        let mut total = 0u64;

        loop {
            let n = reader.read(&mut buf).map_err(|e| Error::io(path, e))?;
            if n == 0 {
                break; // EOF
            }
            hasher.update(&buf[..n]);
            total += n as u64;
        }

        Ok((Digest(hasher.finalize().into()), total))
    }

    /// `1220` + hex del digest.
    pub fn multihash(&self) -> String {
        format!("{}{}", hex::encode(MULTIHASH_SHA2_256), hex::encode(self.0))
    }

    fn unit(&self) -> &[u8] {
        &self.0[..UNIT_LEN]
    }
}

/// Compone el identificador: cabecera + unidad de metadatos + unidad de datos.
pub fn compose(kind: MediaKind, meta: &Digest, data: &Digest) -> String {
    let mut raw = Vec::with_capacity(2 + 2 * UNIT_LEN);
    raw.push(MAINTYPE_COMPOSITE);
    raw.push(kind as u8);
    raw.extend_from_slice(meta.unit());
    raw.extend_from_slice(data.unit());

    format!("{}{}", CODE_PREFIX, BASE32_NOPAD.encode(&raw))
}
