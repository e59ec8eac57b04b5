//! Validated, immutable run configuration.
//!
//! Built once from the parsed command line and handed to every stage of a
//! workflow. Anything contradictory is rejected here, before any I/O.

use crate::cmd::{CombineArgs, SplitArgs};
use crate::error::{Result, SilentError};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Largest share count (and so threshold) ssss accepts.
pub const MAX_SHARES: u32 = 255;

/// Split parameters: `t` shares reconstruct, `n` are produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThresholdSpec {
    pub threshold: u32,
    pub shares: u32,
}

impl ThresholdSpec {
    pub fn for_split(threshold: u32, shares: u32) -> Result<Self> {
        let threshold = checked_threshold(threshold)?;
        if shares == 0 {
            return Err(SilentError::Usage("number of shares must be at least 1".into()));
        }
        if shares > MAX_SHARES {
            return Err(SilentError::Usage(format!(
                "number of shares must not exceed {MAX_SHARES}"
            )));
        }
        if threshold > shares {
            return Err(SilentError::Usage(format!(
                "threshold ({threshold}) must not exceed number of shares ({shares})"
            )));
        }
        Ok(Self { threshold, shares })
    }
}

/// `1 <= t <= 255`; the only check combine can make on its own.
pub fn checked_threshold(threshold: u32) -> Result<u32> {
    if threshold == 0 {
        return Err(SilentError::Usage("threshold must be at least 1".into()));
    }
    if threshold > MAX_SHARES {
        return Err(SilentError::Usage(format!(
            "threshold must not exceed {MAX_SHARES}"
        )));
    }
    Ok(threshold)
}

/// Where a combined secret goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
    /// `-` on the command line.
    Stdout,
    Path(PathBuf),
}

impl OutputTarget {
    pub fn parse(raw: &Path) -> Self {
        if raw.as_os_str() == "-" {
            OutputTarget::Stdout
        } else {
            OutputTarget::Path(raw.to_path_buf())
        }
    }
}

/// Options forwarded to ssss. An empty token or a zero level counts as unset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Passthrough {
    pub hex: bool,
    pub token: Option<String>,
    pub security_level: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct SplitConfig {
    pub spec: ThresholdSpec,
    pub mode: Passthrough,
    pub prefix: PathBuf,
}

impl SplitConfig {
    pub fn threshold(&self) -> u32 {
        self.spec.threshold
    }

    pub fn share_count(&self) -> u32 {
        self.spec.shares
    }

    /// Output file names: prefix followed by the 1-based index, no padding.
    pub fn share_paths(&self) -> Vec<PathBuf> {
        (1..=self.share_count())
            .map(|i| share_path(&self.prefix, i))
            .collect()
    }
}

impl TryFrom<SplitArgs> for SplitConfig {
    type Error = SilentError;

    fn try_from(args: SplitArgs) -> Result<Self> {
        let threshold = args
            .threshold
            .ok_or_else(|| SilentError::Usage("threshold (-t) is required".into()))?;
        let shares = args
            .shares
            .ok_or_else(|| SilentError::Usage("number of shares (-n) is required".into()))?;
        let spec = ThresholdSpec::for_split(threshold, shares)?;
        if args.output_prefix.as_os_str().is_empty() {
            return Err(SilentError::Usage("output prefix must not be empty".into()));
        }
        Ok(Self {
            spec,
            mode: Passthrough {
                hex: args.hex,
                token: args.token.filter(|token| !token.is_empty()),
                security_level: args.level.filter(|&level| level != 0),
            },
            prefix: args.output_prefix,
        })
    }
}

#[derive(Debug, Clone)]
pub struct CombineConfig {
    pub threshold: u32,
    pub mode: Passthrough,
    pub input_files: Vec<PathBuf>,
    pub output: OutputTarget,
}

impl CombineConfig {
    pub fn threshold(&self) -> u32 {
        self.threshold
    }
}

impl TryFrom<CombineArgs> for CombineConfig {
    type Error = SilentError;

    fn try_from(args: CombineArgs) -> Result<Self> {
        let threshold = args
            .threshold
            .ok_or_else(|| SilentError::Usage("threshold (-t) is required".into()))?;
        let threshold = checked_threshold(threshold)?;
        crate::guard::check_input_file_count(&args.input_files, threshold)?;
        Ok(Self {
            threshold,
            mode: Passthrough {
                hex: args.hex,
                token: None,
                security_level: None,
            },
            input_files: args.input_files,
            output: OutputTarget::parse(&args.output_file),
        })
    }
}

/// `prefix` with `index` appended verbatim (`share` + 3 → `share3`).
pub fn share_path(prefix: &Path, index: u32) -> PathBuf {
    let mut name = OsString::from(prefix.as_os_str());
    name.push(index.to_string());
    PathBuf::from(name)
}
