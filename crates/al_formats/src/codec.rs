//! Container codecs: document <-> uncompressed bytes.

use crate::document::{ActorCatalog, ActorInfo, MapUnit};
use crate::error::{Error, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Encodes and decodes the documents stored inside containers.
///
/// Implementations must be [`Send`] + [`Sync`]; a single codec instance is shared by every
/// worker thread during a patch run.
pub trait Codec: Send + Sync {
    fn decode_map_unit(&self, bytes: &[u8]) -> Result<MapUnit>;
    fn encode_map_unit(&self, unit: &MapUnit) -> Result<Vec<u8>>;

    fn decode_actor_info(&self, bytes: &[u8]) -> Result<ActorInfo>;
    fn encode_actor_info(&self, info: &ActorInfo) -> Result<Vec<u8>>;

    /// Decode the bundled source catalog. Entries without a `name` take their catalog key.
    fn decode_actor_catalog(&self, bytes: &[u8]) -> Result<ActorCatalog>;
    fn encode_actor_catalog(&self, catalog: &ActorCatalog) -> Result<Vec<u8>>;
}

/// MessagePack codec backed by `rmp-serde`. Structs are always written as named maps.
#[derive(Debug, Clone, Copy, Default)]
pub struct MsgPackCodec;

impl MsgPackCodec {
    fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
        Ok(rmp_serde::from_slice(bytes)?)
    }

    fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
        Ok(rmp_serde::to_vec_named(value)?)
    }
}

impl Codec for MsgPackCodec {
    fn decode_map_unit(&self, bytes: &[u8]) -> Result<MapUnit> {
        Self::decode(bytes)
    }

    fn encode_map_unit(&self, unit: &MapUnit) -> Result<Vec<u8>> {
        Self::encode(unit)
    }

    fn decode_actor_info(&self, bytes: &[u8]) -> Result<ActorInfo> {
        let info: ActorInfo = Self::decode(bytes)?;
        if let Some(unnamed) = info.actors.iter().position(|a| a.name.is_empty()) {
            return Err(Error::InvalidDocument(format!(
                "actor entry #{unnamed} has no name"
            )));
        }
        Ok(info)
    }

    fn encode_actor_info(&self, info: &ActorInfo) -> Result<Vec<u8>> {
        Self::encode(info)
    }

    fn decode_actor_catalog(&self, bytes: &[u8]) -> Result<ActorCatalog> {
        let mut catalog: ActorCatalog = Self::decode(bytes)?;
        for (key, entry) in catalog.iter_mut() {
            if entry.name.is_empty() {
                entry.name = key.clone();
            }
        }
        Ok(catalog)
    }

    fn encode_actor_catalog(&self, catalog: &ActorCatalog) -> Result<Vec<u8>> {
        Self::encode(catalog)
    }
}
