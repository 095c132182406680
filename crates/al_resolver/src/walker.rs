//! Recursive discovery of map unit files.
//!
//! Two modes:
//!
//! - **Sequential**: depth-first via `walkdir`, entries sorted by file name, so the
//!   processing order is deterministic.
//! - **Parallel**: every directory level fans its files and subdirectories out over
//!   the current rayon pool. No ordering between siblings.
//!
//! In both modes an unreadable directory only loses its own subtree, and a file whose
//! processing fails does not stop its siblings. Failures are collected into the
//! [`WalkReport`] unless [`WalkOptions::fail_fast`] is set.

use crate::error::{Error, Result};
use camino::{Utf8Path, Utf8PathBuf};
use rayon::prelude::*;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use walkdir::WalkDir;

#[derive(Debug, Clone, Copy, Default)]
pub struct WalkOptions {
    pub parallel: bool,
    /// Return the first failure as an error instead of collecting it.
    pub fail_fast: bool,
}

/// A file or directory that could not be processed.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WalkFailure {
    pub path: Utf8PathBuf,
    pub error: String,
}

#[derive(Debug, Default)]
pub struct WalkReport {
    /// Map unit files handed to the processor.
    pub files_visited: usize,
    pub failures: Vec<WalkFailure>,
}

fn is_map_unit(path: &Utf8Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case(al_formats::MAP_UNIT_EXTENSION))
}

/// Walk `root` and call `process` for every map unit file beneath it.
pub fn walk<F>(root: &Utf8Path, options: WalkOptions, process: F) -> Result<WalkReport>
where
    F: Fn(&Utf8Path) -> Result<()> + Sync,
{
    let (files_visited, failures) = if options.parallel {
        walk_parallel(root, options.fail_fast, &process, list_dir)?
    } else {
        walk_sequential(root, options.fail_fast, &process)?
    };

    if options.fail_fast {
        if let Some((path, source)) = failures.into_iter().next() {
            return Err(Error::Walk {
                path,
                source: Box::new(source),
            });
        }
        return Ok(WalkReport {
            files_visited,
            failures: Vec::new(),
        });
    }

    let failures = failures
        .into_iter()
        .map(|(path, error)| {
            tracing::warn!("Failed to process {}: {}", path, error);
            WalkFailure {
                path,
                error: error.to_string(),
            }
        })
        .collect();

    Ok(WalkReport {
        files_visited,
        failures,
    })
}

type Failures = Vec<(Utf8PathBuf, Error)>;

/// Map unit files and subdirectories of one directory.
type Listing = (Vec<Utf8PathBuf>, Vec<Utf8PathBuf>);

fn walk_sequential<F>(root: &Utf8Path, fail_fast: bool, process: &F) -> Result<(usize, Failures)>
where
    F: Fn(&Utf8Path) -> Result<()>,
{
    let mut visited = 0;
    let mut failures = Vec::new();

    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                let path = e
                    .path()
                    .and_then(|p| Utf8PathBuf::from_path_buf(p.to_path_buf()).ok())
                    .unwrap_or_else(|| root.to_owned());
                failures.push((path, Error::Io(e.into())));
                if fail_fast {
                    break;
                }
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }

        let path = match Utf8PathBuf::from_path_buf(entry.into_path()) {
            Ok(p) => p,
            Err(p) => {
                tracing::warn!("Skipping non-UTF-8 path: {}", p.display());
                continue;
            }
        };
        if !is_map_unit(&path) {
            continue;
        }

        visited += 1;
        if let Err(e) = process(path.as_path()) {
            failures.push((path, e));
            if fail_fast {
                break;
            }
        }
    }

    Ok((visited, failures))
}

fn walk_parallel<F>(
    root: &Utf8Path,
    fail_fast: bool,
    process: &F,
    list: fn(&Utf8Path) -> Result<Listing>,
) -> Result<(usize, Failures)>
where
    F: Fn(&Utf8Path) -> Result<()> + Sync,
{
    let state = ParallelWalk {
        process,
        list,
        fail_fast,
        abort: AtomicBool::new(false),
        visited: AtomicUsize::new(0),
        failures: Mutex::new(Vec::new()),
    };
    state.visit_dir(root);

    let failures = state
        .failures
        .into_inner()
        .map_err(|e| Error::InternalState(e.to_string()))?;
    Ok((state.visited.into_inner(), failures))
}

struct ParallelWalk<'a, F> {
    process: &'a F,
    list: fn(&Utf8Path) -> Result<Listing>,
    fail_fast: bool,
    abort: AtomicBool,
    visited: AtomicUsize,
    failures: Mutex<Failures>,
}

impl<F> ParallelWalk<'_, F>
where
    F: Fn(&Utf8Path) -> Result<()> + Sync,
{
    fn record(&self, path: Utf8PathBuf, error: Error) {
        if self.fail_fast {
            self.abort.store(true, Ordering::SeqCst);
        }
        if let Ok(mut failures) = self.failures.lock() {
            failures.push((path, error));
        }
    }

    fn visit_dir(&self, dir: &Utf8Path) {
        if self.abort.load(Ordering::SeqCst) {
            return;
        }

        let (files, dirs) = match (self.list)(dir) {
            Ok(listing) => listing,
            Err(e) => {
                self.record(dir.to_owned(), e);
                return;
            }
        };

        rayon::join(
            || {
                files.par_iter().for_each(|file| {
                    if self.abort.load(Ordering::SeqCst) {
                        return;
                    }
                    self.visited.fetch_add(1, Ordering::Relaxed);
                    if let Err(e) = (self.process)(file.as_path()) {
                        self.record(file.clone(), e);
                    }
                })
            },
            || dirs.par_iter().for_each(|sub| self.visit_dir(sub)),
        );
    }
}

/// Split a directory's entries into map unit files and subdirectories.
fn list_dir(dir: &Utf8Path) -> Result<Listing> {
    let mut files = Vec::new();
    let mut dirs = Vec::new();

    for entry in std::fs::read_dir(dir.as_std_path())? {
        let entry = entry?;
        let file_type = entry.file_type()?;
        let path = match Utf8PathBuf::from_path_buf(entry.path()) {
            Ok(p) => p,
            Err(p) => {
                tracing::warn!("Skipping non-UTF-8 path: {}", p.display());
                continue;
            }
        };

        if file_type.is_dir() {
            dirs.push(path);
        } else if file_type.is_file() && is_map_unit(&path) {
            files.push(path);
        }
    }

    Ok((files, dirs))
}
