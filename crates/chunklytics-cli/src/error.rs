//! CLI failures and the exit code each one maps to

use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Arguments(#[from] clap::Error),

    #[error("[--in] must contain a valid filepath: {} ({source})", path.display())]
    InputPath {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("[--out] failed to access {} ({source})", path.display())]
    OutputPath {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to read {} ({source})", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write {} ({source})", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to serialize results: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl CliError {
    /// 1 for bad arguments or unusable paths, 2 when the results could not be written
    pub fn exit_code(&self) -> u8 {
        match self {
            CliError::Arguments(_)
            | CliError::InputPath { .. }
            | CliError::OutputPath { .. }
            | CliError::Read { .. } => 1,
            CliError::Write { .. } | CliError::Serialize(_) => 2,
        }
    }
}
