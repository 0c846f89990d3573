//! Input source - stream a log file into the pipeline line by line

use crate::error::CliError;
use chunklytics_core::{LineMatcher, Pipeline};
use indicatif::ProgressBar;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

pub fn open(path: &Path) -> Result<BufReader<File>, CliError> {
    let input_error = |source| CliError::InputPath {
        path: path.to_path_buf(),
        source,
    };

    if !path.is_file() {
        return Err(input_error(io::Error::new(
            io::ErrorKind::NotFound,
            "not a regular file",
        )));
    }

    File::open(path).map(BufReader::new).map_err(input_error)
}

/// Feed every line of `reader` to the pipeline, in file order.
/// Lines are decoded lossily so one bad byte sequence fails only its own line.
pub fn feed_lines<R, M>(
    reader: R,
    path: &Path,
    pipeline: &mut Pipeline<'_, M>,
    progress: &ProgressBar,
) -> Result<(), CliError>
where
    R: BufRead,
    M: LineMatcher + ?Sized,
{
    for chunk in reader.split(b'\n') {
        let bytes = chunk.map_err(|source| CliError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let line = String::from_utf8_lossy(&bytes);

        // rejected lines are already counted by the pipeline
        let _ = pipeline.feed(&line);
        progress.inc(1);
    }
    Ok(())
}
