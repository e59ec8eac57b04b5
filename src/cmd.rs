use crate::collector::{self, LineSource, TerminalSource};
use crate::config::{CombineConfig, SplitConfig};
use crate::error::Result;
use crate::guard;
use crate::io;
use crate::primitive::{
    SharingPrimitive, SsssCommand, DEFAULT_COMBINE_PROGRAM, DEFAULT_SPLIT_PROGRAM,
};
use crate::share;
use clap::{Args, Subcommand};
use std::path::PathBuf;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Split a secret into N share files without displaying the secret or any share
    Split(SplitArgs),
    /// Reconstruct a secret from share files and/or hidden input
    Combine(CombineArgs),
}

// ---------------------------------------------------------------------------
// Shared arg groups
// ---------------------------------------------------------------------------

/// Locations of the ssss binaries.
#[derive(Args, Debug)]
pub struct ProgramArgs {
    /// ssss-split executable
    #[arg(long, env = "SSSS_SPLIT", value_name = "PATH", default_value = DEFAULT_SPLIT_PROGRAM, global = true)]
    pub ssss_split: PathBuf,

    /// ssss-combine executable
    #[arg(long, env = "SSSS_COMBINE", value_name = "PATH", default_value = DEFAULT_COMBINE_PROGRAM, global = true)]
    pub ssss_combine: PathBuf,
}

// ---------------------------------------------------------------------------
// Per-command args
// ---------------------------------------------------------------------------

#[derive(Args, Debug)]
pub struct SplitArgs {
    /// Number of shares necessary to reconstruct the secret
    #[arg(short = 't', value_name = "THRESHOLD")]
    pub threshold: Option<u32>,

    /// Number of shares to generate
    #[arg(short = 'n', value_name = "SHARES")]
    pub shares: Option<u32>,

    /// Text token to name shares, to avoid confusion between independent secrets
    #[arg(short = 'w', value_name = "TOKEN")]
    pub token: Option<String>,

    /// Enforce the scheme's security level (in bits)
    #[arg(short = 's', value_name = "LEVEL")]
    pub level: Option<u32>,

    /// Hex mode: hexadecimal digits in place of ASCII characters for I/O
    #[arg(short = 'x')]
    pub hex: bool,

    /// Name prefix for share files (share i is saved as OUTPUT_PREFIX<i>)
    #[arg(value_name = "OUTPUT_PREFIX")]
    pub output_prefix: PathBuf,
}

#[derive(Args, Debug)]
pub struct CombineArgs {
    /// Number of shares necessary to reconstruct the secret
    #[arg(short = 't', value_name = "THRESHOLD")]
    pub threshold: Option<u32>,

    /// Hex mode: hexadecimal digits in place of ASCII characters for I/O
    #[arg(short = 'x')]
    pub hex: bool,

    /// Read a share from FILE (repeatable, at most THRESHOLD times)
    #[arg(short = 'i', value_name = "FILE")]
    pub input_files: Vec<PathBuf>,

    /// File to save the secret in, or `-` for standard output
    #[arg(value_name = "OUTPUT_FILE")]
    pub output_file: PathBuf,
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub fn run(command: Command, programs: ProgramArgs) -> Result<()> {
    let primitive = SsssCommand::new(programs.ssss_split, programs.ssss_combine);
    let mut input = TerminalSource::new();
    match command {
        Command::Split(args) => split(SplitConfig::try_from(args)?, &mut input, &primitive),
        Command::Combine(args) => {
            let config = CombineConfig::try_from(args)?;
            let mut stdout = std::io::stdout().lock();
            combine(config, &mut input, &primitive, &mut stdout)
        }
    }
}

// ---------------------------------------------------------------------------
// Workflows
// ---------------------------------------------------------------------------

/// Where a run is. Any step may end in failure instead; nothing loops back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Parsed,
    PreflightChecked,
    InputCollected,
    PrimitiveInvoked,
    PostflightChecked,
    Written,
    Done,
}

struct Progress {
    workflow: &'static str,
    stage: Stage,
}

impl Progress {
    fn start(workflow: &'static str) -> Self {
        tracing::debug!(workflow, stage = ?Stage::Parsed);
        Self {
            workflow,
            stage: Stage::Parsed,
        }
    }

    fn advance(&mut self, stage: Stage) {
        self.stage = stage;
        tracing::debug!(workflow = self.workflow, stage = ?stage);
    }

    fn finish<T>(&self, result: Result<T>) -> Result<T> {
        if let Err(e) = &result {
            tracing::debug!(workflow = self.workflow, after = ?self.stage, "failed: {e}");
        }
        result
    }
}

/// Split: check targets, read the secret, run ssss-split, verify the share
/// count, then write one file per share.
pub fn split(
    config: SplitConfig,
    input: &mut impl LineSource,
    primitive: &impl SharingPrimitive,
) -> Result<()> {
    let mut progress = Progress::start("split");
    let result = split_steps(&config, input, primitive, &mut progress);
    progress.finish(result)
}

fn split_steps(
    config: &SplitConfig,
    input: &mut impl LineSource,
    primitive: &impl SharingPrimitive,
    progress: &mut Progress,
) -> Result<()> {
    guard::check_split_targets(&config.share_paths())?;
    progress.advance(Stage::PreflightChecked);

    let secret = collector::collect_secret(input)?;
    tracing::info!("split: read secret ({} bytes)", secret.len());
    progress.advance(Stage::InputCollected);

    let shares = primitive.split(&secret, config)?;
    // Only the shares are needed from here on.
    drop(secret);
    progress.advance(Stage::PrimitiveInvoked);

    guard::check_share_count(shares.len(), config.share_count())?;
    progress.advance(Stage::PostflightChecked);

    let indexed = share::index_shares(shares);
    io::write_shares(&config.prefix, &indexed)?;
    progress.advance(Stage::Written);

    tracing::info!(
        "split: wrote {}-of-{} shares with prefix {:?}",
        config.threshold(),
        config.share_count(),
        config.prefix
    );
    progress.advance(Stage::Done);
    Ok(())
}

/// Combine: check the target, gather exactly `t` shares, run ssss-combine,
/// then write the secret.
pub fn combine(
    config: CombineConfig,
    input: &mut impl LineSource,
    primitive: &impl SharingPrimitive,
    stdout: &mut impl std::io::Write,
) -> Result<()> {
    let mut progress = Progress::start("combine");
    let result = combine_steps(&config, input, primitive, stdout, &mut progress);
    progress.finish(result)
}

fn combine_steps(
    config: &CombineConfig,
    input: &mut impl LineSource,
    primitive: &impl SharingPrimitive,
    stdout: &mut impl std::io::Write,
    progress: &mut Progress,
) -> Result<()> {
    guard::check_input_file_count(&config.input_files, config.threshold())?;
    guard::check_output_target(&config.output)?;
    progress.advance(Stage::PreflightChecked);

    let shares = collector::collect_shares(&config.input_files, config.threshold(), input)?;
    tracing::info!("combine: collected {} share(s)", shares.len());
    progress.advance(Stage::InputCollected);

    let secret = primitive.combine(&shares, config)?;
    drop(shares);
    progress.advance(Stage::PrimitiveInvoked);

    // a single value: nothing to count
    progress.advance(Stage::PostflightChecked);

    io::write_secret(&config.output, &secret, stdout)?;
    progress.advance(Stage::Written);

    progress.advance(Stage::Done);
    Ok(())
}
