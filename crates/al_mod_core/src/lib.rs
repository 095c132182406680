//! Core shared logic for actor-loader.
//!
//! This crate provides the mod directory layout and the game dump lookup used by both
//! the patch engine (`al_resolver`) and the `actor-loader` CLI.

mod error;
mod game_dump;
mod mod_root;

pub use error::{Error, Result};
pub use game_dump::{auto_detect_game_dump, read_bcml_settings, GameDump};
pub use mod_root::{is_valid_mod_root, ModRoot, VALID_SUBDIRS};
