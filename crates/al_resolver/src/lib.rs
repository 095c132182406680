//! Missing-actor resolution and patching engine for actor-loader.
//!
//! Given a mod directory, this crate finds every placed object whose actor the mod
//! does not ship, installs the actor pack from a local cache (filling it from a remote
//! source on demand), and registers the actor in the mod's actor index. It supports:
//!
//! - **Parallel or deterministic walks** over all map unit files
//! - **Auto-correction** of names to their `C`-suffixed catalogue variant
//! - **Deduplicated installs**: each actor is fetched and copied at most once per run
//! - **Deterministic index output**: the actor index is always written sorted by hash
//!
//! # Example
//!
//! ```no_run
//! use al_resolver::{ModPatcher, PatchOptions};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let report = ModPatcher::new("/mods/MyMod".into(), "/opt/actor-loader/Data".into())
//!     .with_options(PatchOptions {
//!         auto: true,
//!         ..Default::default()
//!     })
//!     .with_progress(|progress| println!("Stage: {:?}", progress.stage))
//!     .run()?;
//!
//! println!(
//!     "Installed {} actors, {} failures",
//!     report.actors_installed.len(),
//!     report.install_failures.len()
//! );
//! # Ok(())
//! # }
//! ```

pub mod catalog;
pub mod content_index;
pub mod diff;
pub mod error;
pub mod finalizer;
pub mod patcher;
pub mod remote;
pub mod resolver;
pub mod staging;
pub mod walker;

// Re-export main types
pub use catalog::CatalogSet;
pub use content_index::ContentIndex;
pub use diff::{MapCoordinate, VanillaDiff};
pub use error::{Error, Result};
pub use patcher::{ModPatcher, PatchOptions, PatchProgress, PatchReport, PatchStage};
pub use remote::{HttpSource, RemoteSource, DEFAULT_REMOTE_BASE_URL};
pub use resolver::{Decision, ObjectResolver};
pub use staging::{InstallFailure, StagingRegistry};
pub use walker::{WalkFailure, WalkOptions, WalkReport};
