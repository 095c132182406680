use crate::errors::CliError;
use crate::println_pad;
use crate::utils::config::{self, AppConfig};
use al_mod_core::{auto_detect_game_dump, GameDump};
use al_resolver::{ModPatcher, PatchOptions, PatchReport, PatchStage, DEFAULT_REMOTE_BASE_URL};
use camino::Utf8PathBuf;
use colored::Colorize;
use miette::IntoDiagnostic;
use std::sync::{Arc, Mutex};

pub struct PatchModArgs {
    pub path: String,
    pub auto: bool,
    pub sequential: bool,
    pub jobs: Option<usize>,
    pub fail_fast: bool,
    pub data_dir: Option<String>,
    pub update_dir: Option<String>,
    pub dlc_dir: Option<String>,
    pub remote_url: Option<String>,
    pub json: bool,
}

/// Run settings after applying CLI flags, config.toml, BCML detection and defaults,
/// in that order of precedence.
#[derive(Debug, PartialEq, Eq)]
struct RunSettings {
    data_dir: Utf8PathBuf,
    game_dump: GameDump,
    remote_base_url: String,
    jobs: Option<usize>,
}

fn resolve_settings(
    args: &PatchModArgs,
    cfg: &AppConfig,
    detect: impl FnOnce() -> Option<GameDump>,
    default_data_dir: Option<Utf8PathBuf>,
) -> Result<RunSettings, CliError> {
    let data_dir = args
        .data_dir
        .as_deref()
        .map(Utf8PathBuf::from)
        .or_else(|| cfg.data_dir.clone())
        .or(default_data_dir)
        .ok_or(CliError::DataDirUnknown)?;

    let from_flags = GameDump {
        update_dir: args.update_dir.as_deref().map(Utf8PathBuf::from),
        dlc_dir: args.dlc_dir.as_deref().map(Utf8PathBuf::from),
    };
    let from_config = GameDump {
        update_dir: cfg.update_dir.clone(),
        dlc_dir: cfg.dlc_dir.clone(),
    };
    let mut game_dump = from_flags.or(from_config);
    if game_dump.update_dir.is_none() || game_dump.dlc_dir.is_none() {
        if let Some(detected) = detect() {
            game_dump = game_dump.or(detected);
        }
    }

    let remote_base_url = args
        .remote_url
        .clone()
        .or_else(|| cfg.remote_base_url.clone())
        .unwrap_or_else(|| DEFAULT_REMOTE_BASE_URL.to_string());

    Ok(RunSettings {
        data_dir,
        game_dump,
        remote_base_url,
        jobs: args.jobs.or(cfg.jobs),
    })
}

pub fn patch_mod(args: PatchModArgs) -> miette::Result<()> {
    let cfg = config::load_config();
    let settings = resolve_settings(&args, &cfg, auto_detect_game_dump, config::default_data_dir())?;

    if !settings.data_dir.as_std_path().is_dir() {
        return Err(CliError::DataDirMissing {
            path: settings.data_dir,
        }
        .into());
    }
    tracing::debug!(?settings, "Resolved run settings");

    if !args.json {
        println!(
            "{} {}",
            "Patching".bright_cyan().bold(),
            args.path.bright_white()
        );
        if args.auto {
            println_pad!("{}", "Auto-correction enabled".bright_yellow());
        }
    }

    let stage = Arc::new(Mutex::new(PatchStage::Validating));
    let sink = Arc::clone(&stage);

    let patcher = ModPatcher::new(Utf8PathBuf::from(&args.path), settings.data_dir)
        .with_game_dump(settings.game_dump)
        .with_remote_base_url(settings.remote_base_url)
        .with_options(PatchOptions {
            auto: args.auto,
            parallel: !args.sequential,
            jobs: settings.jobs,
            fail_fast: args.fail_fast,
        })
        .with_progress(move |progress| {
            if let Ok(mut current) = sink.lock() {
                *current = progress.stage;
            }
        });

    let report = patcher.run().map_err(|e| {
        let failed_in = stage
            .lock()
            .map(|s| *s)
            .unwrap_or(PatchStage::Validating);
        CliError::from_patch_error(e, failed_in)
    })?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report).into_diagnostic()?);
    } else {
        print_report(&report);
    }

    Ok(())
}

fn print_report(report: &PatchReport) {
    println!();
    println!("{}", "✓ Patch complete".bright_green().bold());
    println!();
    println_pad!(
        "{} {} ({} rewritten)",
        "Map files:".bright_white(),
        report.files_processed,
        report.files_rewritten
    );
    println_pad!("{} {}", "Auto-fixed:".bright_white(), report.auto_fixes);
    println_pad!(
        "{} {} of {} staged",
        "Installed:".bright_white(),
        report.actors_installed.len(),
        report.actors_staged
    );
    println_pad!(
        "{} {} new, {} total",
        "Actor index:".bright_white(),
        report.index_appends,
        report.index_size
    );
    println_pad!("{} {:.2?}", "Elapsed:".bright_white(), report.elapsed);

    if !report.walk_failures.is_empty() {
        println!();
        println_pad!(
            "{}",
            format!("⚠ {} file(s) could not be processed:", report.walk_failures.len())
                .bright_yellow()
                .bold()
        );
        for failure in &report.walk_failures {
            println_pad!("  {} {}: {}", "•".bright_red(), failure.path, failure.error.dimmed());
        }
    }

    if !report.install_failures.is_empty() {
        println!();
        println_pad!(
            "{}",
            format!("⚠ {} actor(s) could not be installed:", report.install_failures.len())
                .bright_yellow()
                .bold()
        );
        for failure in &report.install_failures {
            println_pad!("  {} {}: {}", "•".bright_red(), failure.name, failure.error.dimmed());
        }
    }
}
