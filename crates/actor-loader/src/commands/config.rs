use crate::errors::CliError;
use crate::utils::config::{self, AppConfig};
use al_mod_core::{auto_detect_game_dump, GameDump};
use camino::{Utf8Path, Utf8PathBuf};
use colored::Colorize;
use miette::Result;

fn update_config(apply: impl FnOnce(&mut AppConfig)) -> Result<()> {
    let mut cfg = config::load_config();
    apply(&mut cfg);
    config::save_config(&cfg).map_err(|e| miette::miette!("Failed to save config: {}", e))
}

fn is_valid_update_dir(path: &Utf8Path) -> bool {
    GameDump {
        update_dir: Some(path.to_owned()),
        dlc_dir: None,
    }
    .vanilla_actor_info()
    .is_some()
}

fn is_valid_dlc_dir(path: &Utf8Path) -> bool {
    path.join("Map").as_std_path().is_dir()
}

fn is_valid_data_dir(path: &Utf8Path) -> bool {
    path.join(al_resolver::catalog::SOURCE_CATALOG_FILE)
        .as_std_path()
        .is_file()
}

/// Print a config path entry with status indicator
fn print_path_config(
    name: &str,
    path: Option<&Utf8PathBuf>,
    validator: impl Fn(&Utf8Path) -> bool,
) {
    match path {
        Some(p) => {
            let status = if validator(p.as_path()) {
                "✓".bright_green()
            } else {
                "✗".bright_red()
            };
            println!("  {} {} {}", format!("{}:", name).bright_white(), p, status);
        }
        None => {
            println!(
                "  {} {}",
                format!("{}:", name).bright_white(),
                "(not set)".bright_yellow()
            );
        }
    }
}

pub fn show_config() -> Result<()> {
    let cfg = config::load_config();
    let config_path = config::default_config_path()
        .map(|p| p.to_string())
        .unwrap_or_else(|| "Unknown".to_string());

    println!();
    println!("  {} {}", "config_file:".bright_white(), config_path);

    print_path_config("update_dir", cfg.update_dir.as_ref(), is_valid_update_dir);
    print_path_config("dlc_dir", cfg.dlc_dir.as_ref(), is_valid_dlc_dir);

    let default_data_dir = config::default_data_dir();
    print_path_config(
        "data_dir",
        cfg.data_dir.as_ref().or(default_data_dir.as_ref()),
        is_valid_data_dir,
    );

    println!(
        "  {} {}",
        "remote_base_url:".bright_white(),
        cfg.remote_base_url
            .as_deref()
            .unwrap_or(al_resolver::DEFAULT_REMOTE_BASE_URL)
    );
    println!(
        "  {} {}",
        "jobs:".bright_white(),
        cfg.jobs
            .map(|j| j.to_string())
            .unwrap_or_else(|| "(auto)".to_string())
    );

    println!();
    Ok(())
}

pub fn set_update_dir(path: String) -> Result<()> {
    let path = Utf8PathBuf::from(&path);
    if !is_valid_update_dir(&path) {
        return Err(CliError::InvalidDumpDir {
            kind: "update",
            path,
            expected: "The update dump must contain Actor/ActorInfo.product.sbyml",
        }
        .into());
    }

    update_config(|cfg| cfg.update_dir = Some(path.clone()))?;
    print_set("Update dir", &path);
    Ok(())
}

pub fn set_dlc_dir(path: String) -> Result<()> {
    let path = Utf8PathBuf::from(&path);
    if !is_valid_dlc_dir(&path) {
        return Err(CliError::InvalidDumpDir {
            kind: "DLC",
            path,
            expected: "The DLC dump must contain a Map folder",
        }
        .into());
    }

    update_config(|cfg| cfg.dlc_dir = Some(path.clone()))?;
    print_set("DLC dir", &path);
    Ok(())
}

pub fn set_data_dir(path: String) -> Result<()> {
    let path = Utf8PathBuf::from(&path);
    if !is_valid_data_dir(&path) {
        return Err(CliError::DataDirMissing { path }.into());
    }

    update_config(|cfg| cfg.data_dir = Some(path.clone()))?;
    print_set("Data dir", &path);
    Ok(())
}

fn print_set(label: &str, path: &Utf8Path) {
    println!(
        "{}",
        format!("✓ {label} set successfully!").bright_green().bold()
    );
    println!();
    println!(
        "  {} {}",
        "Path:".bright_white().bold(),
        path.as_str().bright_green()
    );
}

pub fn detect_game_dump() -> Result<()> {
    println!("{}", "Searching for BCML settings...".bright_cyan());
    println!();

    match auto_detect_game_dump() {
        Some(dump) if dump.update_dir.is_some() || dump.dlc_dir.is_some() => {
            println!("{}", "✓ Found BCML settings!".bright_green().bold());
            println!();
            print_path_config("update_dir", dump.update_dir.as_ref(), is_valid_update_dir);
            print_path_config("dlc_dir", dump.dlc_dir.as_ref(), is_valid_dlc_dir);
            println!();

            update_config(|cfg| {
                if dump.update_dir.is_some() {
                    cfg.update_dir = dump.update_dir.clone();
                }
                if dump.dlc_dir.is_some() {
                    cfg.dlc_dir = dump.dlc_dir.clone();
                }
            })?;

            println!(
                "{}",
                "✓ Configuration updated successfully!"
                    .bright_green()
                    .bold()
            );
        }
        _ => {
            println!(
                "{}",
                "✗ Could not find a game dump in BCML's settings"
                    .bright_red()
                    .bold()
            );
            println!();
            println!(
                "  {} Use 'actor-loader config set-update-dir <path>' to set the update dump",
                "•".bright_cyan()
            );
            println!(
                "  {} Use 'actor-loader config set-dlc-dir <path>' to set the DLC dump",
                "•".bright_cyan()
            );
        }
    }

    Ok(())
}

pub fn reset_config() -> Result<()> {
    let config_path = config::default_config_path()
        .map(|p| p.to_string())
        .unwrap_or_else(|| "Unknown".to_string());

    let default_cfg = AppConfig::default();
    config::save_config(&default_cfg)
        .map_err(|e| miette::miette!("Failed to reset config: {}", e))?;

    println!(
        "{}",
        "✓ Configuration reset to defaults".bright_green().bold()
    );
    println!();
    println!("  {} {}", "Config file:".bright_white().bold(), config_path);
    println!();
    println!(
        "  {}",
        "Run 'actor-loader config detect' to read your game dump from BCML".bright_cyan()
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn dump_validators_check_expected_layout() {
        let dir = tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();

        assert!(!is_valid_update_dir(&root));
        assert!(!is_valid_dlc_dir(&root));
        assert!(!is_valid_data_dir(&root));

        std::fs::create_dir_all(root.join("Actor")).unwrap();
        std::fs::write(root.join("Actor/ActorInfo.product.sbyml"), b"").unwrap();
        std::fs::create_dir_all(root.join("Map")).unwrap();
        std::fs::write(root.join("ActorInfo.sbyml"), b"").unwrap();

        assert!(is_valid_update_dir(&root));
        assert!(is_valid_dlc_dir(&root));
        assert!(is_valid_data_dir(&root));
    }
}
