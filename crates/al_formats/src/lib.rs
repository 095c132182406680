//! Document types and on-disk container handling for actor-loader.
//!
//! A mod ships two kinds of containers that the patcher touches:
//!
//! - **Map units** (`*.smubin`): the placed objects of one map section. Each object is a
//!   loosely-typed record; the patcher only reads `UnitConfigName` / `HashId` and may rename
//!   the former.
//! - **Actor info** (`ActorInfo.product.sbyml`): the mod's actor index, a list of actor
//!   entries plus the parallel list of their name hashes.
//!
//! Containers are stored as `compress(encode(document))`. Both halves are pluggable through
//! the [`Codec`] and [`Compression`] traits; [`Container`] bundles a pair and performs the
//! file-level read/write.

pub mod codec;
pub mod compression;
pub mod container;
pub mod document;
pub mod error;
pub mod hash;

pub use codec::{Codec, MsgPackCodec};
pub use compression::{Compression, ZstdCompression};
pub use container::Container;
pub use document::{ActorCatalog, ActorEntry, ActorInfo, MapUnit, PlacedObject, Record};
pub use error::{Error, Result};
pub use hash::actor_hash;

/// File extension of map unit containers.
pub const MAP_UNIT_EXTENSION: &str = "smubin";

/// File extension of installed actor packs.
pub const ACTOR_PACK_EXTENSION: &str = "sbactorpack";

/// File name of the actor index, under `Actor/` in both a mod and the update dump.
pub const ACTOR_INFO_FILE_NAME: &str = "ActorInfo.product.sbyml";
