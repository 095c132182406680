//! File-level container access: `compress(encode(document))` on disk.

use crate::codec::{Codec, MsgPackCodec};
use crate::compression::{Compression, ZstdCompression};
use crate::document::{ActorCatalog, ActorInfo, MapUnit};
use crate::error::Result;
use camino::Utf8Path;
use std::sync::Arc;

/// A codec + compression pair used to read and write container files.
///
/// Cheap to clone; both halves are shared behind [`Arc`].
#[derive(Clone)]
pub struct Container {
    codec: Arc<dyn Codec>,
    compression: Arc<dyn Compression>,
}

impl Container {
    pub fn new(codec: Arc<dyn Codec>, compression: Arc<dyn Compression>) -> Self {
        Self { codec, compression }
    }

    pub fn codec(&self) -> &dyn Codec {
        self.codec.as_ref()
    }

    pub fn compression(&self) -> &dyn Compression {
        self.compression.as_ref()
    }

    pub fn read_map_unit(&self, path: &Utf8Path) -> Result<MapUnit> {
        let bytes = self.read_unwrapped(path)?;
        self.codec.decode_map_unit(&bytes)
    }

    pub fn write_map_unit(&self, path: &Utf8Path, unit: &MapUnit) -> Result<()> {
        let bytes = self.codec.encode_map_unit(unit)?;
        self.write_wrapped(path, &bytes)
    }

    pub fn read_actor_info(&self, path: &Utf8Path) -> Result<ActorInfo> {
        let bytes = self.read_unwrapped(path)?;
        self.codec.decode_actor_info(&bytes)
    }

    pub fn write_actor_info(&self, path: &Utf8Path, info: &ActorInfo) -> Result<()> {
        let bytes = self.codec.encode_actor_info(info)?;
        self.write_wrapped(path, &bytes)
    }

    pub fn read_actor_catalog(&self, path: &Utf8Path) -> Result<ActorCatalog> {
        let bytes = self.read_unwrapped(path)?;
        self.codec.decode_actor_catalog(&bytes)
    }

    pub fn write_actor_catalog(&self, path: &Utf8Path, catalog: &ActorCatalog) -> Result<()> {
        let bytes = self.codec.encode_actor_catalog(catalog)?;
        self.write_wrapped(path, &bytes)
    }

    fn read_unwrapped(&self, path: &Utf8Path) -> Result<Vec<u8>> {
        let raw = std::fs::read(path.as_std_path())?;
        self.compression.decompress(&raw)
    }

    fn write_wrapped(&self, path: &Utf8Path, bytes: &[u8]) -> Result<()> {
        let packed = self.compression.compress(bytes)?;
        if let Some(parent) = path.parent() {
            if !parent.as_str().is_empty() {
                std::fs::create_dir_all(parent.as_std_path())?;
            }
        }
        std::fs::write(path.as_std_path(), packed)?;
        Ok(())
    }
}

impl Default for Container {
    fn default() -> Self {
        Self::new(Arc::new(MsgPackCodec), Arc::new(ZstdCompression::default()))
    }
}

impl std::fmt::Debug for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Container").finish_non_exhaustive()
    }
}
