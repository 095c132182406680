//! Vanilla map lookups used by auto-correction.

use crate::error::{Error, Result};
use al_formats::Container;
use al_mod_core::GameDump;
use camino::Utf8Path;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

/// Identifies a map unit file: `<map>/<unit>/<unit>_<kind>.smubin`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MapCoordinate {
    pub map: String,
    pub unit: String,
    pub kind: String,
}

impl MapCoordinate {
    /// Derive the coordinate from a map unit path.
    ///
    /// `.../MainField/A-1/A-1_Static.smubin` -> `(MainField, A-1, Static)`.
    /// Returns `None` if the path is too shallow or the file stem has no `_<kind>` suffix.
    pub fn from_path(path: &Utf8Path) -> Option<Self> {
        let stem = path.file_stem()?;
        let unit_dir = path.parent()?;
        let unit = unit_dir.file_name()?;
        let map = unit_dir.parent()?.file_name()?;

        let kind = match stem.strip_prefix(unit).and_then(|s| s.strip_prefix('_')) {
            Some(kind) => kind,
            None => stem.rsplit_once('_')?.1,
        };
        if kind.is_empty() {
            return None;
        }

        Some(Self {
            map: map.to_string(),
            unit: unit.to_string(),
            kind: kind.to_string(),
        })
    }
}

impl std::fmt::Display for MapCoordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}_{}", self.map, self.unit, self.unit, self.kind)
    }
}

/// Set of object ids present in one vanilla map unit.
pub type DiffSet = Arc<HashSet<u32>>;

/// One cached coordinate. Empty until its first successful load.
type DiffSlot = Arc<Mutex<Option<DiffSet>>>;

/// Lazily loads and caches vanilla map units from the DLC dump.
///
/// Each coordinate is read at most once per run. A missing DLC dump or a missing
/// vanilla file yields an empty set. Loads of different coordinates run concurrently;
/// callers asking for the same coordinate wait for the first load.
pub struct VanillaDiff {
    game_dump: GameDump,
    container: Container,
    cache: Mutex<HashMap<MapCoordinate, DiffSlot>>,
}

impl VanillaDiff {
    pub fn new(game_dump: GameDump, container: Container) -> Self {
        Self {
            game_dump,
            container,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// The vanilla object ids for `coordinate`.
    pub fn ids_for(&self, coordinate: &MapCoordinate) -> Result<DiffSet> {
        let slot = {
            let mut cache = self
                .cache
                .lock()
                .map_err(|e| Error::InternalState(e.to_string()))?;
            Arc::clone(cache.entry(coordinate.clone()).or_default())
        };

        // Only this coordinate's slot stays locked while the file is decoded.
        let mut cached = slot
            .lock()
            .map_err(|e| Error::InternalState(e.to_string()))?;
        if let Some(ids) = cached.as_ref() {
            return Ok(Arc::clone(ids));
        }

        let ids = Arc::new(self.load(coordinate)?);
        *cached = Some(Arc::clone(&ids));
        Ok(ids)
    }

    /// Number of coordinates loaded so far.
    pub fn cached_len(&self) -> usize {
        let Ok(cache) = self.cache.lock() else {
            return 0;
        };
        cache
            .values()
            .filter(|slot| slot.try_lock().is_ok_and(|ids| ids.is_some()))
            .count()
    }

    fn load(&self, coordinate: &MapCoordinate) -> Result<HashSet<u32>> {
        let Some(path) = self.game_dump.vanilla_map_unit(
            &coordinate.map,
            &coordinate.unit,
            &coordinate.kind,
        ) else {
            tracing::debug!("No DLC dump configured, empty vanilla diff for {}", coordinate);
            return Ok(HashSet::new());
        };

        if !path.as_std_path().exists() {
            tracing::debug!("No vanilla map unit at {}", path);
            return Ok(HashSet::new());
        }

        let unit = self.container.read_map_unit(&path)?;
        Ok(unit.objs.iter().filter_map(|obj| obj.hash_id()).collect())
    }
}

impl std::fmt::Debug for VanillaDiff {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VanillaDiff")
            .field("game_dump", &self.game_dump)
            .field("cached", &self.cached_len())
            .finish()
    }
}
