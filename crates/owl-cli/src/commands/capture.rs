//! `owl capture` and `owl run`.

use std::thread;
use std::time::{Duration, Instant};

use owl_core::{CaptureOutcome, Logger};
use tracing::{info, warn};

use crate::app::AppContext;
use crate::capturer::CommandCapturer;
use crate::cli::RunArgs;
use crate::errors::CliError;
use crate::ui::{badge, print, Badge, UiContext};

fn build_logger(ctx: &AppContext) -> anyhow::Result<Logger<CommandCapturer>> {
    let config = ctx.config()?;
    if config.encryption.enabled && !config.encryption.rsa_public_key_path.exists() {
        return Err(CliError::not_found(
            format!(
                "Public key not found: {}",
                config.encryption.rsa_public_key_path.display()
            ),
            "Hint: Run `owl setup` or disable encryption in the config.",
        )
        .into());
    }
    let capturer = CommandCapturer::new(&config.capture);
    Ok(Logger::new(config, capturer)?)
}

fn report(ui: &UiContext, outcome: &CaptureOutcome) {
    let kind = if outcome.idle { "idle" } else { "activity" };
    let mut line = format!("Captured {} into {}", kind, outcome.path.display());
    if outcome.rotated {
        line.push_str(" (new key)");
    }
    print(ui, &badge(ui, Badge::Ok, &line));
}

pub fn handle_capture(ctx: &AppContext) -> anyhow::Result<()> {
    let mut logger = build_logger(ctx)?;
    let outcome = logger.capture_and_append()?;
    report(ctx.ui(), &outcome);
    Ok(())
}

/// Capture on a fixed schedule. Failed captures are logged and skipped.
pub fn handle_run(ctx: &AppContext, args: &RunArgs) -> anyhow::Result<()> {
    let config = ctx.config()?;
    let interval_secs = args.interval.unwrap_or(config.logging_interval);
    if interval_secs == 0 {
        return Err(CliError::invalid_input("Interval must be greater than zero").into());
    }
    let interval = Duration::from_secs(interval_secs);

    let mut logger = build_logger(ctx)?;
    info!(
        interval_secs,
        out_dir = %logger.out_dir().display(),
        encrypted = logger.is_encrypted(),
        "capture loop started"
    );

    let started = Instant::now();
    let mut captures: u64 = 0;
    loop {
        match logger.capture_and_append() {
            Ok(outcome) => report(ctx.ui(), &outcome),
            Err(err) => warn!(error = %err, "capture failed"),
        }
        captures += 1;
        if args.max_captures.is_some_and(|max| captures >= max) {
            break;
        }

        // Sleep to the next slot of the fixed schedule so slow captures do not drift.
        let Some(next) = next_slot(started, interval, captures) else {
            warn!(interval_secs, "next capture time is out of range; stopping");
            break;
        };
        if let Some(wait) = next.checked_duration_since(Instant::now()) {
            thread::sleep(wait);
        }
    }

    info!(captures, "capture loop finished");
    Ok(())
}

/// Start of capture slot `n`, or `None` when it cannot be represented.
fn next_slot(started: Instant, interval: Duration, n: u64) -> Option<Instant> {
    let n = u32::try_from(n).ok()?;
    started.checked_add(interval.checked_mul(n)?)
}
