//! Pre- and post-flight checks around the ssss invocation.

use crate::config::OutputTarget;
use crate::error::{Result, SilentError};
use std::path::{Path, PathBuf};

/// Refuse to run if any split output file already exists.
///
/// Called before the secret is read so a doomed run does no work.
pub fn check_split_targets(paths: &[PathBuf]) -> Result<()> {
    for path in paths {
        refuse_existing(path)?;
    }
    Ok(())
}

/// Refuse to run if the combine output file already exists.
/// Standard output is never checked.
pub fn check_output_target(target: &OutputTarget) -> Result<()> {
    match target {
        OutputTarget::Stdout => Ok(()),
        OutputTarget::Path(path) => refuse_existing(path),
    }
}

/// More share files than the threshold is a usage error.
pub fn check_input_file_count(files: &[PathBuf], threshold: u32) -> Result<()> {
    if files.len() > threshold as usize {
        return Err(SilentError::Usage(format!(
            "too many input files specified ({}, max {threshold})",
            files.len()
        )));
    }
    Ok(())
}

/// A split must produce exactly the requested number of shares.
pub fn check_share_count(actual: usize, expected: u32) -> Result<()> {
    if actual != expected as usize {
        return Err(SilentError::CountMismatch {
            expected: expected as usize,
            actual,
        });
    }
    Ok(())
}

fn refuse_existing(path: &Path) -> Result<()> {
    // symlink_metadata so a dangling symlink still counts as existing
    if path.symlink_metadata().is_ok() {
        tracing::debug!(path = %path.display(), "output target exists");
        return Err(SilentError::OverwriteRefused {
            path: path.to_path_buf(),
        });
    }
    Ok(())
}
