//! The mod's actor index, held in memory for the duration of a run.

use crate::error::{Error, Result};
use al_formats::{actor_hash, ActorEntry, ActorInfo, Container, Record};
use al_mod_core::{GameDump, ModRoot};
use camino::Utf8Path;
use std::collections::HashSet;
use std::sync::Mutex;

#[derive(Debug, Default)]
struct IndexState {
    hashes: Vec<u32>,
    actors: Vec<ActorEntry>,
    known: HashSet<u32>,
}

/// Append-only, mutex-guarded view of `ActorInfo.product.sbyml`.
///
/// `hashes[i]` is always the name hash of `actors[i]` and no hash appears twice.
/// Concurrent resolvers call [`append`](Self::append); the check and the push happen
/// under one lock.
#[derive(Debug, Default)]
pub struct ContentIndex {
    state: Mutex<IndexState>,
    rest: Record,
}

impl ContentIndex {
    /// Build an index from a decoded actor info document.
    ///
    /// Fails if the hash and actor lists differ in length. Duplicate hashes already
    /// present on disk are kept as-is.
    pub fn from_actor_info(info: ActorInfo, path: &Utf8Path) -> Result<Self> {
        if info.hashes.len() != info.actors.len() {
            return Err(Error::InvalidIndex {
                path: path.to_owned(),
                reason: format!(
                    "{} hashes but {} actors",
                    info.hashes.len(),
                    info.actors.len()
                ),
            });
        }

        let known = info.hashes.iter().copied().collect();
        Ok(Self {
            state: Mutex::new(IndexState {
                hashes: info.hashes,
                actors: info.actors,
                known,
            }),
            rest: info.rest,
        })
    }

    /// Load the mod's actor index, seeding it from the game dump if the mod has none.
    ///
    /// Seeding copies `update_dir/Actor/ActorInfo.product.sbyml` into the mod. With no
    /// index in either place this is a configuration error.
    pub fn load(mod_root: &ModRoot, game_dump: &GameDump, container: &Container) -> Result<Self> {
        let path = mod_root.actor_info_path();

        if !path.as_std_path().exists() {
            let Some(vanilla) = game_dump.vanilla_actor_info() else {
                return Err(Error::Config(format!(
                    "Mod has no actor index at {} and no update dump is configured to seed it from",
                    path
                )));
            };

            tracing::info!("Seeding actor index from {}", vanilla);
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent.as_std_path())?;
            }
            std::fs::copy(vanilla.as_std_path(), path.as_std_path())?;
        }

        let info = container.read_actor_info(&path)?;
        let index = Self::from_actor_info(info, &path)?;
        tracing::debug!("Loaded actor index with {} entries", index.len());
        Ok(index)
    }

    /// Whether `hash` is already indexed.
    pub fn contains(&self, hash: u32) -> Result<bool> {
        let state = self.lock()?;
        Ok(state.known.contains(&hash))
    }

    /// Append `entry` unless its name hash is already indexed.
    ///
    /// Returns `true` if the entry was appended.
    pub fn append(&self, entry: &ActorEntry) -> Result<bool> {
        let hash = actor_hash(&entry.name);
        let mut state = self.lock()?;
        if !state.known.insert(hash) {
            return Ok(false);
        }
        state.hashes.push(hash);
        state.actors.push(entry.clone());
        Ok(true)
    }

    pub fn len(&self) -> usize {
        self.state
            .lock()
            .map(|state| state.actors.len())
            .unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Consume the index and return it as an (unsorted) actor info document.
    pub fn into_actor_info(self) -> Result<ActorInfo> {
        let state = self
            .state
            .into_inner()
            .map_err(|e| Error::InternalState(e.to_string()))?;
        Ok(ActorInfo {
            actors: state.actors,
            hashes: state.hashes,
            rest: self.rest,
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, IndexState>> {
        self.state
            .lock()
            .map_err(|e| Error::InternalState(e.to_string()))
    }
}
