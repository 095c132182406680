mod config;
mod patch;

pub use config::{
    detect_game_dump, reset_config, set_data_dir, set_dlc_dir, set_update_dir, show_config,
};
pub use patch::{patch_mod, PatchModArgs};
