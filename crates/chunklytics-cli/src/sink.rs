//! Output sink - JSON results file

use crate::error::CliError;
use chunklytics_core::ParseResult;
use std::fs::{self, OpenOptions};
use std::path::Path;

/// Create parent directories and the file itself (without truncating it),
/// so an unwritable destination fails before any input is read.
pub fn prepare(path: &Path) -> Result<(), CliError> {
    let output_error = |source| CliError::OutputPath {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(output_error)?;
    }

    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(output_error)?;
    Ok(())
}

pub fn write_json(result: &ParseResult, path: &Path) -> Result<(), CliError> {
    let json = result.to_json_pretty()?;

    fs::write(path, json).map_err(|source| CliError::Write {
        path: path.to_path_buf(),
        source,
    })
}
