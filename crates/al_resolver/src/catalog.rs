//! Read-only reference data shared by every worker during a run.
//!
//! A [`CatalogSet`] bundles three lookups, all loaded once from the data directory:
//!
//! - the **vanilla set**: name hashes of actors shipped with the base game. Membership is
//!   the only test for "never copy this actor".
//! - the **ignore set**: actor names excluded from resolution entirely.
//! - the **source catalog**: name -> [`ActorEntry`] for every actor we can install.
//!
//! ```text
//! data_dir/
//!   ActorInfo.sbyml        # source catalog container (required)
//!   VanillaActors.json     # [u32 | "Name", ...] (required)
//!   Ignored.json           # ["Name", ...] (optional)
//!   Actors/                # local actor pack cache
//! ```

use crate::error::{Error, Result};
use al_formats::{actor_hash, ActorCatalog, ActorEntry, Container};
use camino::{Utf8Path, Utf8PathBuf};
use serde::Deserialize;
use std::collections::HashSet;

pub const SOURCE_CATALOG_FILE: &str = "ActorInfo.sbyml";
pub const VANILLA_ACTORS_FILE: &str = "VanillaActors.json";
pub const IGNORED_ACTORS_FILE: &str = "Ignored.json";
pub const ACTOR_CACHE_DIR: &str = "Actors";

/// One entry of `VanillaActors.json`: either a precomputed hash or a plain name.
#[derive(Deserialize)]
#[serde(untagged)]
enum VanillaActor {
    Hash(u32),
    Name(String),
}

impl VanillaActor {
    fn hash(&self) -> u32 {
        match self {
            VanillaActor::Hash(hash) => *hash,
            VanillaActor::Name(name) => actor_hash(name),
        }
    }
}

/// Immutable reference catalogs for one patch run.
#[derive(Debug, Clone, Default)]
pub struct CatalogSet {
    vanilla: HashSet<u32>,
    ignored: HashSet<String>,
    source: ActorCatalog,
}

impl CatalogSet {
    pub fn new(vanilla: HashSet<u32>, ignored: HashSet<String>, source: ActorCatalog) -> Self {
        Self {
            vanilla,
            ignored,
            source,
        }
    }

    /// Load all catalogs from `data_dir`.
    ///
    /// The source catalog and vanilla list are required; a missing ignore list means
    /// nothing is ignored.
    pub fn load(data_dir: &Utf8Path, container: &Container) -> Result<Self> {
        let source_path = data_dir.join(SOURCE_CATALOG_FILE);
        if !source_path.as_std_path().exists() {
            return Err(Error::Config(format!(
                "Source actor catalog not found at {}",
                source_path
            )));
        }
        let source = container.read_actor_catalog(&source_path)?;

        let vanilla_path = data_dir.join(VANILLA_ACTORS_FILE);
        if !vanilla_path.as_std_path().exists() {
            return Err(Error::Config(format!(
                "Vanilla actor list not found at {}",
                vanilla_path
            )));
        }
        let vanilla: Vec<VanillaActor> = read_json(&vanilla_path)?;
        let vanilla = vanilla.iter().map(VanillaActor::hash).collect::<HashSet<_>>();

        let ignored_path = data_dir.join(IGNORED_ACTORS_FILE);
        let ignored: HashSet<String> = if ignored_path.as_std_path().exists() {
            read_json::<Vec<String>>(&ignored_path)?.into_iter().collect()
        } else {
            tracing::debug!("No ignore list at {}", ignored_path);
            HashSet::new()
        };

        tracing::info!(
            "Loaded catalogs: {} source actors, {} vanilla hashes, {} ignored",
            source.len(),
            vanilla.len(),
            ignored.len()
        );

        Ok(Self::new(vanilla, ignored, source))
    }

    /// Whether `name` hashes into the vanilla set.
    pub fn is_vanilla(&self, name: &str) -> bool {
        self.vanilla.contains(&actor_hash(name))
    }

    pub fn is_ignored(&self, name: &str) -> bool {
        self.ignored.contains(name)
    }

    /// Whether the source catalog can provide `name`.
    pub fn has_source(&self, name: &str) -> bool {
        self.source.contains_key(name)
    }

    pub fn source_entry(&self, name: &str) -> Option<&ActorEntry> {
        self.source.get(name)
    }

    pub fn source_len(&self) -> usize {
        self.source.len()
    }
}

/// Local pack cache inside the data directory.
pub fn actor_cache_dir(data_dir: &Utf8Path) -> Utf8PathBuf {
    data_dir.join(ACTOR_CACHE_DIR)
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Utf8Path) -> Result<T> {
    let contents = std::fs::read_to_string(path.as_std_path())?;
    Ok(serde_json::from_str(&contents)?)
}
