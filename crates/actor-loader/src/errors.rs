use al_resolver::PatchStage;
use camino::Utf8PathBuf;
use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum CliError {
    #[error("Invalid mod directory: {path}")]
    #[diagnostic(
        code(mod_root::invalid),
        help("Point to the root mod folder, the one containing 'content', 'aoc', '01007EF00011E000' or '01007EF00011F001'")
    )]
    InvalidModRoot {
        path: Utf8PathBuf,
        #[source]
        source: al_mod_core::Error,
    },

    #[error("Data directory not found: {path}")]
    #[diagnostic(
        code(config::data_dir_missing),
        help("Pass --data-dir or run 'actor-loader config set-data-dir <path>'. It must contain ActorInfo.sbyml and VanillaActors.json")
    )]
    DataDirMissing { path: Utf8PathBuf },

    #[error("Could not determine the data directory")]
    #[diagnostic(
        code(config::data_dir_unknown),
        help("Pass --data-dir or run 'actor-loader config set-data-dir <path>'")
    )]
    DataDirUnknown,

    #[error("{message}")]
    #[diagnostic(
        code(config::invalid),
        help("Check 'actor-loader config show'. The game dump can be detected from BCML with 'actor-loader config detect'")
    )]
    Configuration { message: String },

    #[error("Invalid {kind} directory: {path}")]
    #[diagnostic(code(config::invalid_path), help("{expected}"))]
    InvalidDumpDir {
        kind: &'static str,
        path: Utf8PathBuf,
        expected: &'static str,
    },

    #[error("Patch failed while {stage}")]
    #[diagnostic(code(patch::failed))]
    PatchFailed {
        stage: &'static str,
        #[source]
        source: al_resolver::Error,
    },

    #[error("Failed to write the actor index: {path}")]
    #[diagnostic(
        code(patch::finalize_failed),
        help("Installed actor packs were kept. Check that the file is writable and run the patch again")
    )]
    FinalizeFailed {
        path: Utf8PathBuf,
        #[source]
        source: Box<al_resolver::Error>,
    },
}

impl CliError {
    /// Map an engine error to a diagnostic, naming the stage the run was in.
    pub fn from_patch_error(error: al_resolver::Error, stage: PatchStage) -> Self {
        use al_mod_core::Error as ModError;
        use al_resolver::Error;

        match error {
            Error::ModLayout(ModError::NotADirectory(path)) => Self::InvalidModRoot {
                path: path.clone(),
                source: ModError::NotADirectory(path),
            },
            Error::ModLayout(ModError::MissingModSubdir { path, expected }) => {
                Self::InvalidModRoot {
                    path: path.clone(),
                    source: ModError::MissingModSubdir { path, expected },
                }
            }
            Error::Config(message) => Self::Configuration { message },
            Error::Finalize { path, source } => Self::FinalizeFailed { path, source },
            source => Self::PatchFailed {
                stage: stage_label(stage),
                source,
            },
        }
    }
}

fn stage_label(stage: PatchStage) -> &'static str {
    match stage {
        PatchStage::Validating => "validating the mod",
        PatchStage::Walking => "processing map files",
        PatchStage::Installing => "installing actors",
        PatchStage::Finalizing => "writing the actor index",
        PatchStage::Complete => "finishing up",
    }
}
