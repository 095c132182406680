//! Per-object classification of map unit references.
//!
//! # Decision order
//!
//! For every placed object, in on-disk order:
//!
//! 1. A record without a string `UnitConfigName` is malformed and skipped.
//! 2. Ignored names and names already installed in the mod's pack directory are skipped.
//! 3. In auto mode, if the catalog has `<name>C`, the object is renamed to it and the
//!    file is marked modified. If the object's `HashId` is placed in the matching
//!    vanilla map unit, resolution stops there.
//! 4. A (possibly renamed) catalogued, non-vanilla name is staged for install and
//!    appended to the actor index if its hash is new.
//! 5. Anything else is inert.

use crate::catalog::CatalogSet;
use crate::content_index::ContentIndex;
use crate::diff::{DiffSet, MapCoordinate, VanillaDiff};
use crate::error::Result;
use crate::staging::StagingRegistry;
use al_formats::{Container, PlacedObject};
use al_mod_core::ModRoot;
use camino::{Utf8Path, Utf8PathBuf};
use std::collections::HashSet;
use std::sync::Arc;

/// Suffix appended by auto-correction.
pub const CORRECTED_SUFFIX: char = 'C';

/// What happened to one placed object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// No string name on the record.
    Malformed,
    Ignored,
    AlreadyInstalled,
    /// Auto-corrected, but the object is vanilla-placed; nothing staged.
    VanillaPlacement,
    /// Install staged for the name. `appended` is set if the index grew.
    Staged { appended: bool },
    /// Not installable or already vanilla.
    Inert,
}

/// Outcome of resolving one object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// The final name (after any rename), if the record had one.
    pub name: Option<String>,
    pub auto_fixed: bool,
    pub decision: Decision,
}

/// Per-file tallies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FileOutcome {
    pub modified: bool,
    pub auto_fixes: usize,
    pub staged: usize,
    pub appended: usize,
}

/// Shared, read-mostly context for resolving objects across worker threads.
pub struct ObjectResolver<'a> {
    pub catalogs: &'a CatalogSet,
    pub index: &'a ContentIndex,
    pub staging: &'a StagingRegistry,
    pub mod_root: &'a ModRoot,
    /// Pack directory listing taken before the walk.
    pub installed: &'a HashSet<String>,
    /// Local pack cache.
    pub cache_dir: &'a Utf8Path,
    pub container: &'a Container,
    /// Present only in auto mode.
    pub vanilla_diff: Option<&'a VanillaDiff>,
}

impl ObjectResolver<'_> {
    pub fn auto(&self) -> bool {
        self.vanilla_diff.is_some()
    }

    /// Decode `path`, resolve all of its objects and rewrite it if anything was renamed.
    ///
    /// Everything that can fail for the file as a whole (decoding it, loading its vanilla
    /// ids) happens before the first object is resolved, so a failed file leaves the index
    /// and the staging registry untouched.
    pub fn process_file(&self, path: &Utf8Path) -> Result<FileOutcome> {
        tracing::info!("Processing {}", path.file_stem().unwrap_or(path.as_str()));

        let mut unit = self.container.read_map_unit(path)?;
        let vanilla_ids = match self.vanilla_diff {
            Some(diff) => Some(self.vanilla_ids(diff, path, &unit.objs)?),
            None => None,
        };

        let mut outcome = FileOutcome::default();
        for obj in unit.objs.iter_mut() {
            let resolution = self.resolve(obj, vanilla_ids.as_deref())?;
            if resolution.auto_fixed {
                outcome.modified = true;
                outcome.auto_fixes += 1;
            }
            if let Decision::Staged { appended } = resolution.decision {
                outcome.staged += 1;
                if appended {
                    outcome.appended += 1;
                }
            }
        }

        if outcome.modified {
            self.container.write_map_unit(path, &unit)?;
            tracing::debug!("Rewrote {}", path);
        }
        Ok(outcome)
    }

    /// The vanilla ids for the map unit at `path`. The vanilla file is only read if some
    /// object in `objs` would be auto-corrected and carries a `HashId`.
    fn vanilla_ids(
        &self,
        diff: &VanillaDiff,
        path: &Utf8Path,
        objs: &[PlacedObject],
    ) -> Result<DiffSet> {
        let needed = objs.iter().any(|obj| {
            obj.hash_id().is_some()
                && obj
                    .name()
                    .is_some_and(|name| self.skip(name).is_none() && self.has_correction(name))
        });

        match MapCoordinate::from_path(path) {
            Some(coordinate) if needed => diff.ids_for(&coordinate),
            _ => Ok(Arc::new(HashSet::new())),
        }
    }

    fn skip(&self, name: &str) -> Option<Decision> {
        if self.catalogs.is_ignored(name) {
            Some(Decision::Ignored)
        } else if self.installed.contains(name) {
            Some(Decision::AlreadyInstalled)
        } else {
            None
        }
    }

    fn has_correction(&self, name: &str) -> bool {
        self.catalogs.has_source(&format!("{name}{CORRECTED_SUFFIX}"))
    }

    /// Resolve one object. `vanilla_ids` is `Some` in auto mode.
    fn resolve(
        &self,
        obj: &mut PlacedObject,
        vanilla_ids: Option<&HashSet<u32>>,
    ) -> Result<Resolution> {
        let Some(original) = obj.name() else {
            tracing::debug!("Skipping object without a name: {:?}", obj.record());
            return Ok(Resolution {
                name: None,
                auto_fixed: false,
                decision: Decision::Malformed,
            });
        };
        let mut name = original.to_string();

        if let Some(decision) = self.skip(&name) {
            tracing::debug!(actor = %name, ?decision, "Skipped");
            return Ok(resolution(name, false, decision));
        }

        let mut auto_fixed = false;
        if let Some(vanilla_ids) = vanilla_ids {
            if self.has_correction(&name) {
                name.push(CORRECTED_SUFFIX);
                obj.rename(name.as_str());
                auto_fixed = true;

                let hash_id = obj.hash_id();
                tracing::info!(
                    "Auto-Fixed {}@{}",
                    name,
                    hash_id.map(|id| id.to_string()).unwrap_or_default()
                );

                if hash_id.is_some_and(|id| vanilla_ids.contains(&id)) {
                    return Ok(resolution(name, auto_fixed, Decision::VanillaPlacement));
                }
            }
        }

        let entry = match self.catalogs.source_entry(&name) {
            Some(entry) if !self.catalogs.is_vanilla(&name) => entry,
            _ => return Ok(resolution(name, auto_fixed, Decision::Inert)),
        };

        self.staging.stage(&name, self.cache_path(&name), self.mod_root.pack_path(&name))?;
        let appended = self.index.append(entry)?;
        if appended {
            tracing::info!(actor = %name, "Updated");
        }

        Ok(resolution(name, auto_fixed, Decision::Staged { appended }))
    }

    fn cache_path(&self, name: &str) -> Utf8PathBuf {
        self.cache_dir
            .join(format!("{name}.{}", al_formats::ACTOR_PACK_EXTENSION))
    }
}

fn resolution(name: String, auto_fixed: bool, decision: Decision) -> Resolution {
    Resolution {
        name: Some(name),
        auto_fixed,
        decision,
    }
}
