//! Deduplicated fetch + install actions, executed once after the walk.

use crate::error::{Error, Result};
use crate::remote::RemoteSource;
use camino::{Utf8Path, Utf8PathBuf};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Mutex;

/// Install one actor pack: fill the cache from the remote if needed, then copy the
/// cached pack into the mod.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedInstall {
    pub name: String,
    /// Cached pack in the data directory.
    pub source: Utf8PathBuf,
    /// Installed pack in the mod.
    pub destination: Utf8PathBuf,
}

impl StagedInstall {
    fn run(&self, remote: &dyn RemoteSource) -> Result<()> {
        if !self.source.as_std_path().exists() {
            let bytes = remote.fetch(&self.name)?;
            write_atomic(&self.source, &bytes)?;
        }

        if let Some(parent) = self.destination.parent() {
            std::fs::create_dir_all(parent.as_std_path())?;
        }
        std::fs::copy(self.source.as_std_path(), self.destination.as_std_path())?;
        Ok(())
    }
}

/// Write via `<path>.part` and rename into place. A cached pack is complete or absent.
fn write_atomic(path: &Utf8Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent.as_std_path())?;
    }
    let part = Utf8PathBuf::from(format!("{path}.part"));
    std::fs::write(part.as_std_path(), bytes)?;
    std::fs::rename(part.as_std_path(), path.as_std_path())?;
    Ok(())
}

/// An install that failed; other installs are unaffected.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstallFailure {
    pub name: String,
    pub error: String,
}

/// Result of [`StagingRegistry::execute`].
#[derive(Debug, Default)]
pub struct InstallOutcome {
    /// Installed actor names, sorted.
    pub installed: Vec<String>,
    pub failures: Vec<InstallFailure>,
}

/// Key-deduplicating registry of pending installs.
///
/// [`stage`](Self::stage) registers at most one action per actor name for the lifetime
/// of the registry, no matter how many workers race on the same name.
#[derive(Debug, Default)]
pub struct StagingRegistry {
    pending: Mutex<HashMap<String, StagedInstall>>,
}

impl StagingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an install for `name`. Returns `true` if this call registered it.
    pub fn stage(
        &self,
        name: &str,
        source: Utf8PathBuf,
        destination: Utf8PathBuf,
    ) -> Result<bool> {
        let mut pending = self
            .pending
            .lock()
            .map_err(|e| Error::InternalState(e.to_string()))?;

        match pending.entry(name.to_string()) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(slot) => {
                slot.insert(StagedInstall {
                    name: name.to_string(),
                    source,
                    destination,
                });
                Ok(true)
            }
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.pending
            .lock()
            .map(|p| p.contains_key(name))
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.pending.lock().map(|p| p.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Run every registered install in parallel on the current rayon pool.
    ///
    /// The registry is drained. A failing install is logged and recorded; it never stops
    /// the others.
    pub fn execute(&self, remote: &dyn RemoteSource) -> Result<InstallOutcome> {
        let mut installs: Vec<StagedInstall> = {
            let mut pending = self
                .pending
                .lock()
                .map_err(|e| Error::InternalState(e.to_string()))?;
            pending.drain().map(|(_, install)| install).collect()
        };
        installs.sort_by(|a, b| a.name.cmp(&b.name));

        tracing::info!("Installing {} actor(s)", installs.len());

        let results: Vec<(String, Result<()>)> = installs
            .par_iter()
            .map(|install| (install.name.clone(), install.run(remote)))
            .collect();

        let mut outcome = InstallOutcome::default();
        for (name, result) in results {
            match result {
                Ok(()) => {
                    tracing::debug!(actor = %name, "Installed");
                    outcome.installed.push(name);
                }
                Err(e) => {
                    tracing::warn!(actor = %name, "Failed to install actor: {}", e);
                    outcome.failures.push(InstallFailure {
                        name,
                        error: e.to_string(),
                    });
                }
            }
        }
        Ok(outcome)
    }
}
