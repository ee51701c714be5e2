//! Owl CLI - records window activity into per-day logs, optionally encrypted
//!
//! This is the command-line interface for Owl. It wires configuration,
//! the command-based capture backend and password prompts to the core
//! library.

mod app;
mod capturer;
mod cli;
mod commands;
mod config;
mod constants;
mod errors;
mod logging;
mod ui;

use clap::{CommandFactory, Parser};

use crate::app::AppContext;
use crate::cli::{Cli, Commands};
use crate::commands::{capture, decrypt, init, inspect, misc, setup};
use crate::errors::exit_code_for;
use crate::ui::print_error;

fn main() {
    let cli = Cli::parse();
    logging::init_tracing(cli.verbose, cli.quiet);
    let ctx = AppContext::new(&cli);

    if let Err(e) = run(&ctx, &cli) {
        let error_msg = format!("{}", e);
        let (message, hint) = split_hint(&error_msg);
        let hint = hint.or_else(|| contextual_hint(message));

        print_error(ctx.ui(), message, hint.as_deref());
        std::process::exit(exit_code_for(&e));
    }
}

/// Split a trailing "Hint: ..." line off an error message.
fn split_hint(error: &str) -> (&str, Option<String>) {
    match error.find("\nHint:") {
        Some(idx) => (&error[..idx], Some(error[idx + 1..].to_string())),
        None => (error, None),
    }
}

/// Provide hints for common error types.
fn contextual_hint(error: &str) -> Option<String> {
    let error_lower = error.to_lowercase();

    if error_lower.contains("failed to parse config") {
        return Some("Hint: Field names are camelCase, e.g. `loggingInterval = 60`.".to_string());
    }

    if error_lower.contains("capture command") {
        return Some(
            "Hint: Run the command from capture.windowsCommand / capture.idleCommand by hand to check its output."
                .to_string(),
        );
    }

    if error_lower.contains("format error") || error_lower.contains("unknown record type") {
        return Some("Hint: Run `owl inspect <file>` to see where the log is damaged.".to_string());
    }

    None
}

fn run(ctx: &AppContext, cli: &Cli) -> anyhow::Result<()> {
    match &cli.command {
        Some(Commands::Init(args)) => init::handle_init(ctx, args),
        Some(Commands::Capture) => capture::handle_capture(ctx),
        Some(Commands::Run(args)) => capture::handle_run(ctx, args),
        Some(Commands::Setup(args)) => setup::handle_setup(ctx, args),
        Some(Commands::Decrypt(args)) => decrypt::handle_decrypt(ctx, args),
        Some(Commands::Inspect(args)) => inspect::handle_inspect(ctx, args),
        Some(Commands::Completions(args)) => misc::handle_completions(args),
        None => {
            Cli::command().print_help()?;
            println!();
            Ok(())
        }
    }
}
