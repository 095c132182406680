//! Patch run orchestration.
//!
//! The [`ModPatcher`] drives one run over a mod directory:
//!
//! 1. Validate the mod root, load the catalogs and the mod's actor index (seeding it
//!    from the game dump when missing), and snapshot the installed pack directory.
//! 2. Walk every map unit file and resolve its objects, staging installs and
//!    appending index entries as needed.
//! 3. Execute all staged installs once, in parallel.
//! 4. Sort the actor index and write it back.
//!
//! Only steps 1 and 4 can fail the run. Everything in between is isolated per file or per
//! actor and ends up in the [`PatchReport`].

use crate::catalog::{actor_cache_dir, CatalogSet};
use crate::content_index::ContentIndex;
use crate::diff::VanillaDiff;
use crate::error::{Error, Result};
use crate::finalizer::finalize;
use crate::remote::{HttpSource, RemoteSource, DEFAULT_REMOTE_BASE_URL};
use crate::resolver::ObjectResolver;
use crate::staging::{InstallFailure, StagingRegistry};
use crate::walker::{walk, WalkFailure, WalkOptions};
use al_formats::Container;
use al_mod_core::{GameDump, ModRoot};
use camino::Utf8PathBuf;
use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Knobs for a patch run.
#[derive(Debug, Clone)]
pub struct PatchOptions {
    /// Append `C` to names whose corrected variant is catalogued.
    pub auto: bool,
    /// Walk directories in parallel. When `false` everything runs in file-name order.
    pub parallel: bool,
    /// Worker threads. `None` uses rayon's default.
    pub jobs: Option<usize>,
    /// Stop at the first file that fails to process.
    pub fail_fast: bool,
}

impl Default for PatchOptions {
    fn default() -> Self {
        Self {
            auto: false,
            parallel: true,
            jobs: None,
            fail_fast: false,
        }
    }
}

/// Progress information emitted during a run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatchProgress {
    pub stage: PatchStage,
    /// Map unit being processed (set during `Walking`).
    pub current_file: Option<String>,
}

/// Stages of a run, emitted in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum PatchStage {
    Validating,
    Walking,
    Installing,
    Finalizing,
    Complete,
}

/// Summary of a finished run.
#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatchReport {
    pub mod_root: Utf8PathBuf,
    pub files_processed: usize,
    pub files_rewritten: usize,
    pub auto_fixes: usize,
    /// Distinct actors staged for install.
    pub actors_staged: usize,
    pub actors_installed: Vec<String>,
    pub index_appends: usize,
    pub index_size: usize,
    pub walk_failures: Vec<WalkFailure>,
    pub install_failures: Vec<InstallFailure>,
    pub elapsed: Duration,
}

impl PatchReport {
    pub fn has_failures(&self) -> bool {
        !self.walk_failures.is_empty() || !self.install_failures.is_empty()
    }
}

#[derive(Default)]
struct Counters {
    rewritten: AtomicUsize,
    auto_fixes: AtomicUsize,
    appends: AtomicUsize,
}

type ProgressCallback = Arc<dyn Fn(PatchProgress) + Send + Sync>;

/// Patches one mod directory.
///
/// Create with [`new`](Self::new), configure with the `with_*` methods, then call
/// [`run`](Self::run). A patcher can be run again; each run re-reads the mod from disk.
pub struct ModPatcher {
    mod_path: Utf8PathBuf,
    data_dir: Utf8PathBuf,
    game_dump: GameDump,
    options: PatchOptions,
    container: Container,
    catalogs: Option<CatalogSet>,
    remote: Option<Arc<dyn RemoteSource>>,
    remote_base_url: String,
    progress_callback: Option<ProgressCallback>,
}

impl ModPatcher {
    /// * `mod_path` - the mod root (the folder containing `content` / `aoc`).
    /// * `data_dir` - catalogs and the actor pack cache.
    pub fn new(mod_path: Utf8PathBuf, data_dir: Utf8PathBuf) -> Self {
        Self {
            mod_path,
            data_dir,
            game_dump: GameDump::default(),
            options: PatchOptions::default(),
            container: Container::default(),
            catalogs: None,
            remote: None,
            remote_base_url: DEFAULT_REMOTE_BASE_URL.to_string(),
            progress_callback: None,
        }
    }

    pub fn with_game_dump(mut self, game_dump: GameDump) -> Self {
        self.game_dump = game_dump;
        self
    }

    pub fn with_options(mut self, options: PatchOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_container(mut self, container: Container) -> Self {
        self.container = container;
        self
    }

    /// Use preloaded catalogs instead of reading them from the data directory.
    pub fn with_catalogs(mut self, catalogs: CatalogSet) -> Self {
        self.catalogs = Some(catalogs);
        self
    }

    pub fn with_remote(mut self, remote: Arc<dyn RemoteSource>) -> Self {
        self.remote = Some(remote);
        self
    }

    /// Base URL for the default HTTP source. Ignored if [`with_remote`](Self::with_remote)
    /// is used.
    pub fn with_remote_base_url(mut self, url: impl Into<String>) -> Self {
        self.remote_base_url = url.into();
        self
    }

    /// Register a progress callback, called from worker threads during the walk.
    pub fn with_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(PatchProgress) + Send + Sync + 'static,
    {
        self.progress_callback = Some(Arc::new(callback));
        self
    }

    fn emit(&self, stage: PatchStage, current_file: Option<String>) {
        if let Some(callback) = &self.progress_callback {
            callback(PatchProgress {
                stage,
                current_file,
            });
        }
    }

    /// Run the patch.
    pub fn run(&self) -> Result<PatchReport> {
        let start_time = Instant::now();

        // Validation. Every error here is fatal and happens before any file is touched.
        self.emit(PatchStage::Validating, None);

        let mod_root = ModRoot::open(self.mod_path.clone())?;
        tracing::info!("Patching mod at {}", mod_root.path());

        let catalogs = match &self.catalogs {
            Some(catalogs) => catalogs.clone(),
            None => CatalogSet::load(&self.data_dir, &self.container)?,
        };
        let cache_dir = actor_cache_dir(&self.data_dir);
        std::fs::create_dir_all(cache_dir.as_std_path())?;

        mod_root.ensure_pack_dir()?;
        let installed = mod_root.installed_actors()?;
        let index = ContentIndex::load(&mod_root, &self.game_dump, &self.container)?;

        let remote: Arc<dyn RemoteSource> = match &self.remote {
            Some(remote) => Arc::clone(remote),
            None => Arc::new(HttpSource::new(self.remote_base_url.clone())?),
        };

        let pool = self.build_pool()?;
        tracing::debug!(
            "Using {} worker thread(s), {} installed actor(s)",
            pool.current_num_threads(),
            installed.len()
        );

        let vanilla_diff = self
            .options
            .auto
            .then(|| VanillaDiff::new(self.game_dump.clone(), self.container.clone()));
        if self.options.auto && self.game_dump.dlc_dir.is_none() {
            tracing::warn!("Auto mode without a DLC dump: every corrected actor will be staged");
        }

        let staging = StagingRegistry::new();
        let resolver = ObjectResolver {
            catalogs: &catalogs,
            index: &index,
            staging: &staging,
            mod_root: &mod_root,
            installed: &installed,
            cache_dir: &cache_dir,
            container: &self.container,
            vanilla_diff: vanilla_diff.as_ref(),
        };

        // Walk.
        self.emit(PatchStage::Walking, None);
        let counters = Counters::default();
        let walk_options = WalkOptions {
            parallel: self.options.parallel,
            fail_fast: self.options.fail_fast,
        };
        let walk_report = pool.install(|| {
            walk(mod_root.path(), walk_options, |path| {
                self.emit(
                    PatchStage::Walking,
                    path.file_name().map(|name| name.to_string()),
                );
                let outcome = resolver.process_file(path)?;
                if outcome.modified {
                    counters.rewritten.fetch_add(1, Ordering::Relaxed);
                }
                counters
                    .auto_fixes
                    .fetch_add(outcome.auto_fixes, Ordering::Relaxed);
                counters
                    .appends
                    .fetch_add(outcome.appended, Ordering::Relaxed);
                Ok(())
            })
        })?;

        // Install.
        self.emit(PatchStage::Installing, None);
        let actors_staged = staging.len();
        let install = pool.install(|| staging.execute(remote.as_ref()))?;

        // Finalize.
        self.emit(PatchStage::Finalizing, None);
        let info = finalize(index, &mod_root.actor_info_path(), &self.container)?;

        let report = PatchReport {
            mod_root: mod_root.path().to_owned(),
            files_processed: walk_report.files_visited,
            files_rewritten: counters.rewritten.into_inner(),
            auto_fixes: counters.auto_fixes.into_inner(),
            actors_staged,
            actors_installed: install.installed,
            index_appends: counters.appends.into_inner(),
            index_size: info.actors.len(),
            walk_failures: walk_report.failures,
            install_failures: install.failures,
            elapsed: start_time.elapsed(),
        };

        tracing::info!(
            "Patched {} file(s): {} rewritten, {} auto-fixed, {} installed, {} index append(s) in {:?}",
            report.files_processed,
            report.files_rewritten,
            report.auto_fixes,
            report.actors_installed.len(),
            report.index_appends,
            report.elapsed
        );

        self.emit(PatchStage::Complete, None);
        Ok(report)
    }

    fn build_pool(&self) -> Result<rayon::ThreadPool> {
        let threads = if self.options.parallel {
            self.options.jobs.unwrap_or(0)
        } else {
            1
        };
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("actor-loader-{i}"))
            .build()
            .map_err(|e| Error::Config(format!("Failed to build worker pool: {e}")))
    }
}

impl std::fmt::Debug for ModPatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModPatcher")
            .field("mod_path", &self.mod_path)
            .field("data_dir", &self.data_dir)
            .field("game_dump", &self.game_dump)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}
