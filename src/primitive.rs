//! The external Shamir primitive.
//!
//! [`SharingPrimitive`] is the seam between the workflows and whatever does
//! the actual secret sharing. [`SsssCommand`] drives the `ssss-split` and
//! `ssss-combine` binaries from <http://point-at-infinity.org/ssss/> as
//! one-shot subprocesses, always with `-q`.
//!
//! Channel contract of the quiet ssss tools:
//!
//! | Tool           | stdin                         | result on |
//! |----------------|-------------------------------|-----------|
//! | `ssss-split`   | the secret                    | stdout, one share per line |
//! | `ssss-combine` | shares, one per line          | **stderr**, single value   |

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use zeroize::Zeroizing;

use crate::config::{CombineConfig, SplitConfig};
use crate::error::{Result, SilentError, ToolStatus};
use crate::share::{Secret, Share};

pub const DEFAULT_SPLIT_PROGRAM: &str = "ssss-split";
pub const DEFAULT_COMBINE_PROGRAM: &str = "ssss-combine";

/// Split / combine capability.
pub trait SharingPrimitive {
    /// Split `secret`; shares come back in the order the primitive emitted them.
    fn split(&self, secret: &Secret, config: &SplitConfig) -> Result<Vec<Share>>;

    /// Reconstruct the secret from exactly `threshold` shares.
    fn combine(&self, shares: &[Share], config: &CombineConfig) -> Result<Secret>;
}

/// Runs the ssss command-line tools.
#[derive(Debug, Clone)]
pub struct SsssCommand {
    split_program: PathBuf,
    combine_program: PathBuf,
}

/// Captured result of a successful run. Both buffers are wiped on drop.
struct ToolOutput {
    stdout: Zeroizing<Vec<u8>>,
    stderr: Zeroizing<Vec<u8>>,
}

impl SsssCommand {
    pub fn new(split_program: PathBuf, combine_program: PathBuf) -> Self {
        Self {
            split_program,
            combine_program,
        }
    }

    fn run(
        &self,
        program: &Path,
        args: &[String],
        input: Zeroizing<Vec<u8>>,
    ) -> Result<ToolOutput> {
        let tool = program.display().to_string();
        tracing::debug!(tool = %tool, ?args, "running");

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| SilentError::ExternalToolFailure {
                tool: tool.clone(),
                status: ToolStatus::NotStarted,
                diagnostic: e.to_string(),
            })?;

        // Feed stdin from a separate thread so a chatty child cannot block
        // on a full stdout pipe while we are still writing.
        let mut stdin = child.stdin.take().ok_or_else(|| {
            SilentError::io(format!("open stdin of {tool}"), std::io::ErrorKind::BrokenPipe.into())
        })?;
        let writer = std::thread::spawn(move || -> std::io::Result<()> {
            stdin.write_all(&input)?;
            // dropping stdin closes the pipe
            Ok(())
        });

        let output = child
            .wait_with_output()
            .map_err(|e| SilentError::io(format!("wait for {tool}"), e))?;
        let write_result = writer
            .join()
            .unwrap_or_else(|_| Err(std::io::ErrorKind::Other.into()));

        let stdout = Zeroizing::new(output.stdout);
        let stderr = Zeroizing::new(output.stderr);

        if !output.status.success() {
            let diagnostic = String::from_utf8_lossy(&stderr).trim().to_string();
            tracing::debug!(tool = %tool, status = %output.status, "tool failed");
            return Err(SilentError::ExternalToolFailure {
                tool,
                status: ToolStatus::Exited(output.status),
                diagnostic,
            });
        }
        write_result.map_err(|e| SilentError::io(format!("write to {tool}"), e))?;

        tracing::debug!(tool = %tool, "tool succeeded");
        Ok(ToolOutput { stdout, stderr })
    }
}

impl SharingPrimitive for SsssCommand {
    fn split(&self, secret: &Secret, config: &SplitConfig) -> Result<Vec<Share>> {
        let args = split_args(config);
        let input = Zeroizing::new(secret.expose().as_bytes().to_vec());
        let out = self.run(&self.split_program, &args, input)?;
        Ok(parse_split_output(&out.stdout))
    }

    fn combine(&self, shares: &[Share], config: &CombineConfig) -> Result<Secret> {
        let args = combine_args(config);
        let input = combine_input(shares);
        let out = self.run(&self.combine_program, &args, input)?;
        Ok(parse_combine_output(&out.stderr))
    }
}

fn split_args(config: &SplitConfig) -> Vec<String> {
    let mut args = vec![
        "-q".to_string(),
        "-t".to_string(),
        config.threshold().to_string(),
        "-n".to_string(),
        config.share_count().to_string(),
    ];
    if let Some(token) = &config.mode.token {
        args.push("-w".to_string());
        args.push(token.clone());
    }
    if let Some(level) = config.mode.security_level {
        args.push("-s".to_string());
        args.push(level.to_string());
    }
    if config.mode.hex {
        args.push("-x".to_string());
    }
    args
}

fn combine_args(config: &CombineConfig) -> Vec<String> {
    let mut args = vec!["-q".to_string(), "-t".to_string(), config.threshold().to_string()];
    if config.mode.hex {
        args.push("-x".to_string());
    }
    args
}

/// Shares one per line, newline-terminated.
fn combine_input(shares: &[Share]) -> Zeroizing<Vec<u8>> {
    let mut buf = Zeroizing::new(Vec::new());
    for share in shares {
        buf.extend_from_slice(share.expose().as_bytes());
        buf.push(b'\n');
    }
    buf
}

/// One share per non-empty line of trimmed stdout.
fn parse_split_output(stdout: &[u8]) -> Vec<Share> {
    let text = Zeroizing::new(String::from_utf8_lossy(stdout).into_owned());
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }
    trimmed
        .split('\n')
        .map(|line| Share::new(line.trim_end_matches('\r')))
        .collect()
}

fn parse_combine_output(stderr: &[u8]) -> Secret {
    let text = Zeroizing::new(String::from_utf8_lossy(stderr).into_owned());
    Secret::new(text.trim())
}
