use crate::config::{share_path, OutputTarget};
use crate::error::{Result, SilentError};
use crate::share::{IndexedShare, Secret};
use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::Path;

/// Write each share to `prefix` + its 1-based index.
///
/// Files hold the bare share with no trailing newline. Pre-flight already
/// verified none of the names exist; a file that appeared since is still
/// refused rather than overwritten.
pub fn write_shares(prefix: &Path, shares: &[IndexedShare]) -> Result<()> {
    for indexed in shares {
        let path = share_path(prefix, indexed.index);
        write_new_file(&path, indexed.share.expose().as_bytes())?;
        tracing::info!(path = %path.display(), "wrote share {}", indexed.index);
    }
    Ok(())
}

/// Write the combined secret to a fresh file, or to `out` followed by a
/// newline when the target is standard output.
pub fn write_secret(target: &OutputTarget, secret: &Secret, out: &mut impl Write) -> Result<()> {
    match target {
        OutputTarget::Stdout => {
            writeln!(out, "{}", secret.expose())
                .and_then(|_| out.flush())
                .map_err(|e| SilentError::io("write stdout", e))?;
            tracing::info!("wrote secret to stdout");
        }
        OutputTarget::Path(path) => {
            write_new_file(path, secret.expose().as_bytes())?;
            tracing::info!(path = %path.display(), "wrote secret");
        }
    }
    Ok(())
}

/// Create `path` (must not exist), owner-only on Unix, and write `data`.
fn write_new_file(path: &Path, data: &[u8]) -> Result<()> {
    let mut file = create_new(path).map_err(|e| match e.kind() {
        ErrorKind::AlreadyExists => SilentError::OverwriteRefused {
            path: path.to_path_buf(),
        },
        _ => SilentError::io(format!("create {}", path.display()), e),
    })?;
    file.write_all(data)
        .and_then(|_| file.sync_all())
        .map_err(|e| SilentError::io(format!("write {}", path.display()), e))
}

fn create_new(path: &Path) -> std::io::Result<File> {
    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    options.open(path)
}
