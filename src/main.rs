mod cmd;
mod collector;
mod config;
mod error;
mod guard;
mod io;
mod primitive;
mod share;

use clap::{ArgAction, Parser};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// ssss-silent — run ssss-split / ssss-combine without seeing the secret.
///
/// The secret and shares are typed with echo off (or piped in), handed to
/// the ssss tools on stdin, and saved straight to files. No operator sees the
/// secret alongside enough shares to rebuild it, and no holder sees another's
/// share. Output files are never overwritten.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: cmd::Command,

    #[command(flatten)]
    programs: cmd::ProgramArgs,

    /// More log output on stderr (-v info, -vv debug). Secrets are never logged.
    #[arg(short = 'v', long, action = ArgAction::Count, global = true)]
    verbose: u8,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cmd::run(cli.command, cli.programs) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("ssss-silent: {e}");
            ExitCode::from(e.exit_code())
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use std::path::PathBuf;

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_split_flags() {
        let cli = Cli::try_parse_from([
            "ssss-silent", "split", "-t", "2", "-n", "3", "-w", "vault", "-s", "128", "-x",
            "prefix",
        ])
        .unwrap();
        let cmd::Command::Split(args) = cli.command else {
            panic!("expected split");
        };
        assert_eq!(args.threshold, Some(2));
        assert_eq!(args.shares, Some(3));
        assert_eq!(args.token.as_deref(), Some("vault"));
        assert_eq!(args.level, Some(128));
        assert!(args.hex);
        assert_eq!(args.output_prefix, PathBuf::from("prefix"));
    }

    #[test]
    fn parses_repeated_input_files() {
        let cli = Cli::try_parse_from([
            "ssss-silent", "-vv", "combine", "-t", "2", "-i", "prefix1", "-i", "prefix2", "-",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        let cmd::Command::Combine(args) = cli.command else {
            panic!("expected combine");
        };
        assert_eq!(
            args.input_files,
            vec![PathBuf::from("prefix1"), PathBuf::from("prefix2")]
        );
        assert_eq!(args.output_file, PathBuf::from("-"));
    }

    #[test]
    fn program_overrides() {
        let cli = Cli::try_parse_from([
            "ssss-silent",
            "combine",
            "--ssss-combine",
            "/opt/ssss/bin/ssss-combine",
            "-t",
            "1",
            "out",
        ])
        .unwrap();
        assert_eq!(
            cli.programs.ssss_combine,
            PathBuf::from("/opt/ssss/bin/ssss-combine")
        );
    }

    #[test]
    fn non_numeric_threshold_rejected_by_parser() {
        assert!(Cli::try_parse_from(["ssss-silent", "split", "-t", "two", "-n", "3", "p"]).is_err());
    }
}
