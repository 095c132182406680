use clap::builder::{styling::AnsiColor, Styles};
use clap::ColorChoice;
use clap::{CommandFactory, FromArgMatches, Parser, Subcommand};
use commands::PatchModArgs;
use miette::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;
mod errors;
mod utils;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Log debug output (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Install the actors a mod references but does not ship
    Patch {
        /// The path to the root mod folder (the folder containing 'content')
        path: String,

        /// Append C to catalogued actors that don't exist in the vanilla game files
        #[arg(short, long)]
        auto: bool,

        /// Process files one at a time, in file name order
        #[arg(long)]
        sequential: bool,

        /// Number of worker threads
        #[arg(short, long)]
        jobs: Option<usize>,

        /// Abort on the first map file that fails to process
        #[arg(long)]
        fail_fast: bool,

        /// Directory holding the actor catalogs and pack cache
        #[arg(long)]
        data_dir: Option<String>,

        /// Game update dump directory
        #[arg(long)]
        update_dir: Option<String>,

        /// Game DLC dump directory
        #[arg(long)]
        dlc_dir: Option<String>,

        /// Base URL actor packs are downloaded from
        #[arg(long)]
        remote_url: Option<String>,

        /// Print the run report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show or change the saved configuration
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show the current configuration
    Show,
    /// Set the game update dump directory
    SetUpdateDir { path: String },
    /// Set the game DLC dump directory
    SetDlcDir { path: String },
    /// Set the catalog data directory
    SetDataDir { path: String },
    /// Read the game dump directories from BCML
    Detect,
    /// Reset the configuration to defaults
    Reset,
}

fn parse_args() -> Args {
    // Configure colored/styled help output
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default().bold())
        .usage(AnsiColor::Green.on_default().bold())
        .literal(AnsiColor::Cyan.on_default())
        .placeholder(AnsiColor::Blue.on_default());

    let matches = Args::command()
        .styles(styles)
        .color(ColorChoice::Auto)
        .get_matches();

    match Args::from_arg_matches(&matches) {
        Ok(args) => args,
        Err(e) => e.exit(),
    }
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "actor_loader=debug,al_resolver=debug,al_mod_core=debug"
    } else {
        "actor_loader=info,al_resolver=info"
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

fn main() -> Result<()> {
    let args = parse_args();
    init_tracing(args.verbose);

    match args.command {
        Commands::Patch {
            path,
            auto,
            sequential,
            jobs,
            fail_fast,
            data_dir,
            update_dir,
            dlc_dir,
            remote_url,
            json,
        } => commands::patch_mod(PatchModArgs {
            path,
            auto,
            sequential,
            jobs,
            fail_fast,
            data_dir,
            update_dir,
            dlc_dir,
            remote_url,
            json,
        }),
        Commands::Config { action } => match action {
            ConfigCommands::Show => commands::show_config(),
            ConfigCommands::SetUpdateDir { path } => commands::set_update_dir(path),
            ConfigCommands::SetDlcDir { path } => commands::set_dlc_dir(path),
            ConfigCommands::SetDataDir { path } => commands::set_data_dir(path),
            ConfigCommands::Detect => commands::detect_game_dump(),
            ConfigCommands::Reset => commands::reset_config(),
        },
    }
}
