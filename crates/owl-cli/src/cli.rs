use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};
use clap_complete::Shell;

use owl_core::crypto::DEFAULT_RSA_BITS;
use owl_core::VERSION;

/// Owl - records window activity into per-day logs, optionally encrypted
#[derive(Parser)]
#[command(name = "owl")]
#[command(author, version = VERSION, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the config file
    #[arg(short, long, global = true, env = "OWL_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Quiet mode (minimal output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

/// Arguments for the `init` command
#[derive(Args)]
pub struct InitArgs {
    /// Overwrite an existing config file
    #[arg(long)]
    pub force: bool,

    /// Directory for day logs (stored as given)
    #[arg(long, value_name = "DIR")]
    pub out_dir: Option<PathBuf>,
}

/// Arguments for the `run` command
#[derive(Args)]
pub struct RunArgs {
    /// Override the configured logging interval (seconds)
    #[arg(long, value_name = "SECONDS")]
    pub interval: Option<u64>,

    /// Stop after this many captures
    #[arg(long, value_name = "N")]
    pub max_captures: Option<u64>,
}

/// Arguments for the `setup` command
#[derive(Args)]
pub struct SetupArgs {
    /// RSA key size in bits
    #[arg(long, default_value_t = DEFAULT_RSA_BITS, value_parser = parse_key_bits)]
    pub bits: usize,

    /// Replace existing key files
    #[arg(long)]
    pub force: bool,

    /// Disable interactive prompts
    #[arg(long)]
    pub no_input: bool,
}

/// Arguments for the `decrypt` command
#[derive(Args)]
pub struct DecryptArgs {
    /// Directory holding encrypted day logs (defaults to outDir)
    #[arg(long, value_name = "DIR")]
    pub source: Option<PathBuf>,

    /// Directory receiving the plain logs (defaults to <source>/decrypted)
    #[arg(long, value_name = "DIR")]
    pub dest: Option<PathBuf>,

    /// Disable interactive prompts
    #[arg(long)]
    pub no_input: bool,
}

/// Arguments for the `inspect` command
#[derive(Args)]
pub struct InspectArgs {
    /// Encrypted day log to list
    #[arg(value_name = "FILE")]
    pub file: PathBuf,
}

/// Arguments for the `completions` command
#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_name = "SHELL")]
    pub shell: Shell,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a default config file
    Init(InitArgs),

    /// Capture one snapshot into today's log
    Capture,

    /// Capture snapshots on the configured interval until stopped
    Run(RunArgs),

    /// Generate a password-protected key pair and enable encryption
    Setup(SetupArgs),

    /// Decrypt a directory of encrypted day logs
    Decrypt(DecryptArgs),

    /// List the records of an encrypted log without decrypting it
    Inspect(InspectArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// RSA sizes the setup flow accepts.
pub const KEY_SIZES: [usize; 4] = [1024, 2048, 3072, 4096];

fn parse_key_bits(value: &str) -> Result<usize, String> {
    let bits: usize = value
        .parse()
        .map_err(|_| format!("'{}' is not a number", value))?;
    if KEY_SIZES.contains(&bits) {
        Ok(bits)
    } else {
        Err(format!(
            "unsupported key size {} (choose one of 1024, 2048, 3072, 4096)",
            bits
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_key_bits_parser() {
        assert_eq!(parse_key_bits("2048"), Ok(2048));
        assert!(parse_key_bits("1000").is_err());
        assert!(parse_key_bits("big").is_err());
    }

    #[test]
    fn test_verbose_counts() {
        let cli = Cli::try_parse_from(["owl", "-vv", "capture"]).unwrap();
        assert_eq!(cli.verbose, 2);
        assert!(matches!(cli.command, Some(Commands::Capture)));
    }
}
