//! Game dump detection (unmodified update and DLC files).

use crate::error::Result;
use al_formats::{ACTOR_INFO_FILE_NAME, MAP_UNIT_EXTENSION};
use camino::{Utf8Path, Utf8PathBuf};
use serde::Deserialize;

/// Locations of the user's unmodified game files.
///
/// - `update_dir` holds the latest base-game files (`Actor/ActorInfo.product.sbyml`).
/// - `dlc_dir` holds the DLC files, including the vanilla map units under `Map/`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GameDump {
    pub update_dir: Option<Utf8PathBuf>,
    pub dlc_dir: Option<Utf8PathBuf>,
}

/// Subset of BCML's `settings.json` that we read.
#[derive(Debug, Deserialize)]
struct BcmlSettings {
    #[serde(default)]
    update_dir: String,
    #[serde(default)]
    dlc_dir: String,
}

impl GameDump {
    /// Fill any unset directory from `fallback`.
    pub fn or(self, fallback: GameDump) -> GameDump {
        GameDump {
            update_dir: self.update_dir.or(fallback.update_dir),
            dlc_dir: self.dlc_dir.or(fallback.dlc_dir),
        }
    }

    /// Path of the vanilla actor index, if an update dir is known and the file exists.
    pub fn vanilla_actor_info(&self) -> Option<Utf8PathBuf> {
        let path = self
            .update_dir
            .as_ref()?
            .join("Actor")
            .join(ACTOR_INFO_FILE_NAME);
        path.as_std_path().exists().then_some(path)
    }

    /// Path of the vanilla map unit for `(map, unit, kind)`, if a DLC dir is known.
    ///
    /// e.g. `("MainField", "A-1", "Static")` -> `<dlc_dir>/Map/MainField/A-1/A-1_Static.smubin`.
    /// The file itself may not exist.
    pub fn vanilla_map_unit(&self, map: &str, unit: &str, kind: &str) -> Option<Utf8PathBuf> {
        let dlc_dir = self.dlc_dir.as_ref()?;
        Some(
            dlc_dir
                .join("Map")
                .join(map)
                .join(unit)
                .join(format!("{unit}_{kind}.{MAP_UNIT_EXTENSION}")),
        )
    }
}

/// Read a BCML `settings.json` file. Empty directory entries are treated as unset.
pub fn read_bcml_settings(path: &Utf8Path) -> Result<GameDump> {
    let contents = std::fs::read_to_string(path.as_std_path())?;
    let settings: BcmlSettings = serde_json::from_str(&contents)?;

    let non_empty = |s: String| (!s.trim().is_empty()).then(|| Utf8PathBuf::from(s));
    Ok(GameDump {
        update_dir: non_empty(settings.update_dir),
        dlc_dir: non_empty(settings.dlc_dir),
    })
}

/// Candidate locations of BCML's `settings.json`.
fn bcml_settings_candidates() -> Vec<Utf8PathBuf> {
    let Some(dirs) = directories_next::BaseDirs::new() else {
        return Vec::new();
    };

    [dirs.data_local_dir(), dirs.config_dir()]
        .into_iter()
        .filter_map(|dir| Utf8PathBuf::from_path_buf(dir.to_path_buf()).ok())
        .map(|dir| dir.join("bcml").join("settings.json"))
        .collect()
}

/// Detect the game dump from an installed BCML.
fn detect_from_bcml() -> Option<GameDump> {
    for candidate in bcml_settings_candidates() {
        if !candidate.as_std_path().exists() {
            continue;
        }
        match read_bcml_settings(&candidate) {
            Ok(dump) => {
                tracing::debug!("Read game dump from BCML settings at {}", candidate);
                return Some(dump);
            }
            Err(e) => {
                tracing::warn!("Failed to read BCML settings '{}': {}", candidate, e);
            }
        }
    }
    None
}

/// Auto-detect the game dump.
///
/// Currently the only source is BCML's settings (local data dir, then config dir).
pub fn auto_detect_game_dump() -> Option<GameDump> {
    detect_from_bcml()
}
