//! On-disk wrapping of encoded containers.

use crate::error::{Error, Result};
use std::io::{Read, Write};

/// Compresses encoded container bytes for storage and reverses it on load.
pub trait Compression: Send + Sync {
    fn compress(&self, data: &[u8]) -> Result<Vec<u8>>;
    fn decompress(&self, data: &[u8]) -> Result<Vec<u8>>;
}

const ZSTD_MAGIC: [u8; 4] = [0x28, 0xB5, 0x2F, 0xFD];

/// Zstandard compression.
#[derive(Debug, Clone, Copy)]
pub struct ZstdCompression {
    level: i32,
}

impl ZstdCompression {
    pub fn new(level: i32) -> Self {
        Self { level }
    }
}

impl Default for ZstdCompression {
    fn default() -> Self {
        Self::new(3)
    }
}

impl Compression for ZstdCompression {
    fn compress(&self, data: &[u8]) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        let mut encoder = zstd::Encoder::new(&mut out, self.level)
            .map_err(|e| Error::Compression(e.to_string()))?;
        encoder.write_all(data)?;
        encoder
            .finish()
            .map_err(|e| Error::Compression(e.to_string()))?;
        Ok(out)
    }

    fn decompress(&self, data: &[u8]) -> Result<Vec<u8>> {
        if !data.starts_with(&ZSTD_MAGIC) {
            return Err(Error::Compression(
                "missing zstd frame magic".to_string(),
            ));
        }

        let mut decoder =
            zstd::Decoder::new(data).map_err(|e| Error::Compression(e.to_string()))?;
        let mut out = Vec::new();
        decoder
            .read_to_end(&mut out)
            .map_err(|e| Error::Compression(e.to_string()))?;
        Ok(out)
    }
}
