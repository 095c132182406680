//! Mod directory layout and validation.

use crate::error::{Error, Result};
use al_formats::{ACTOR_INFO_FILE_NAME, ACTOR_PACK_EXTENSION};
use camino::{Utf8Path, Utf8PathBuf};
use std::collections::HashSet;

/// Top-level folders that identify a mod root (compared case-insensitively).
pub const VALID_SUBDIRS: [&str; 4] = ["content", "aoc", "01007EF00011E000", "01007EF00011F001"];

/// Returns `true` if `path` is a directory containing at least one of [`VALID_SUBDIRS`].
pub fn is_valid_mod_root(path: &Utf8Path) -> bool {
    find_mod_subdir(path).unwrap_or(false)
}

fn find_mod_subdir(path: &Utf8Path) -> Result<bool> {
    for entry in std::fs::read_dir(path.as_std_path())? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let file_name = entry.file_name();
        let Some(name) = file_name.to_str() else {
            continue;
        };
        if VALID_SUBDIRS
            .iter()
            .any(|valid| valid.eq_ignore_ascii_case(name))
        {
            return Ok(true);
        }
    }
    Ok(false)
}

/// A validated mod root directory.
///
/// ```text
/// root/
///   content/
///     Actor/
///       ActorInfo.product.sbyml   # actor index
///       Pack/
///         <Name>.sbactorpack      # installed actors
///     Map/ ...                    # map units (*.smubin)
///   aoc/ ...
/// ```
#[derive(Debug, Clone)]
pub struct ModRoot {
    root: Utf8PathBuf,
}

impl ModRoot {
    /// Open and validate a mod root.
    ///
    /// Fails if `root` is not a directory or has none of the [`VALID_SUBDIRS`].
    pub fn open(root: impl Into<Utf8PathBuf>) -> Result<Self> {
        let root = root.into();
        if !root.as_std_path().is_dir() {
            return Err(Error::NotADirectory(root));
        }

        if !find_mod_subdir(&root)? {
            return Err(Error::MissingModSubdir {
                path: root,
                expected: VALID_SUBDIRS.join(", "),
            });
        }

        Ok(Self { root })
    }

    pub fn path(&self) -> &Utf8Path {
        &self.root
    }

    pub fn actor_dir(&self) -> Utf8PathBuf {
        self.root.join("content").join("Actor")
    }

    pub fn pack_dir(&self) -> Utf8PathBuf {
        self.actor_dir().join("Pack")
    }

    pub fn actor_info_path(&self) -> Utf8PathBuf {
        self.actor_dir().join(ACTOR_INFO_FILE_NAME)
    }

    /// Destination of an installed actor pack.
    pub fn pack_path(&self, name: &str) -> Utf8PathBuf {
        self.pack_dir()
            .join(format!("{name}.{ACTOR_PACK_EXTENSION}"))
    }

    /// Create `content/Actor/Pack` if missing and return it.
    pub fn ensure_pack_dir(&self) -> Result<Utf8PathBuf> {
        let dir = self.pack_dir();
        std::fs::create_dir_all(dir.as_std_path())?;
        Ok(dir)
    }

    /// Names of the actors already installed in the pack directory (file stems).
    ///
    /// Returns an empty set if the pack directory does not exist yet.
    pub fn installed_actors(&self) -> Result<HashSet<String>> {
        let dir = self.pack_dir();
        if !dir.as_std_path().exists() {
            return Ok(HashSet::new());
        }

        let mut names = HashSet::new();
        for entry in std::fs::read_dir(dir.as_std_path())? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let path = match Utf8PathBuf::from_path_buf(entry.path()) {
                Ok(p) => p,
                Err(p) => {
                    tracing::warn!("Skipping non-UTF-8 path: {}", p.display());
                    continue;
                }
            };
            if let Some(stem) = path.file_stem() {
                names.insert(stem.to_string());
            }
        }
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn utf8(dir: &tempfile::TempDir) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap()
    }

    #[test]
    fn test_open_accepts_content_dir() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("content")).unwrap();

        let root = ModRoot::open(utf8(&dir)).unwrap();
        assert_eq!(
            root.actor_info_path(),
            utf8(&dir).join("content/Actor/ActorInfo.product.sbyml")
        );
    }

    #[test]
    fn test_open_accepts_title_id_dir_case_insensitive() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("01007ef00011e000")).unwrap();

        assert!(ModRoot::open(utf8(&dir)).is_ok());
        assert!(is_valid_mod_root(&utf8(&dir)));
    }

    #[test]
    fn test_open_rejects_unrecognized_layout() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("romfs")).unwrap();
        fs::write(dir.path().join("content"), b"not a dir").unwrap();

        let err = ModRoot::open(utf8(&dir)).unwrap_err();
        assert!(matches!(err, Error::MissingModSubdir { .. }));
    }

    #[test]
    fn test_open_rejects_missing_path() {
        let dir = tempdir().unwrap();
        let missing = utf8(&dir).join("nope");

        assert!(matches!(
            ModRoot::open(missing),
            Err(Error::NotADirectory(_))
        ));
    }

    #[test]
    fn test_paths_use_shared_file_names() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("content")).unwrap();
        let root = ModRoot::open(utf8(&dir)).unwrap();

        assert_eq!(
            root.actor_info_path().file_name(),
            Some(ACTOR_INFO_FILE_NAME)
        );
        assert_eq!(
            root.pack_path("Obj_A").extension(),
            Some(ACTOR_PACK_EXTENSION)
        );
    }

    #[test]
    fn test_installed_actors_lists_file_stems() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("content")).unwrap();
        let root = ModRoot::open(utf8(&dir)).unwrap();

        assert!(root.installed_actors().unwrap().is_empty());

        let pack_dir = root.ensure_pack_dir().unwrap();
        fs::write(pack_dir.join("Obj_A.sbactorpack"), b"").unwrap();
        fs::write(pack_dir.join("Obj_B.sbactorpack"), b"").unwrap();

        let installed = root.installed_actors().unwrap();
        assert_eq!(installed.len(), 2);
        assert!(installed.contains("Obj_A"));
        assert_eq!(root.pack_path("Obj_A"), pack_dir.join("Obj_A.sbactorpack"));
    }
}
