//! Capture backend that delegates to user-configured shell commands.
//!
//! `windowsCommand` must print a JSON array of
//! `{"title": ..., "path": ..., "isActive": bool}` objects and
//! `idleCommand` the number of seconds since the last input. Either may be
//! left unset, in which case no windows / no idle time are reported.

use std::collections::HashSet;
use std::io;
use std::process::{Command, Output};

use owl_core::config::CaptureConfig;
use owl_core::{AppRecord, Capturer, OwlError, Result};
use tracing::{debug, warn};

pub struct CommandCapturer {
    windows_command: Option<String>,
    idle_command: Option<String>,
    warned_unset: HashSet<&'static str>,
}

impl CommandCapturer {
    pub fn new(config: &CaptureConfig) -> Self {
        Self {
            windows_command: config.windows_command.clone(),
            idle_command: config.idle_command.clone(),
            warned_unset: HashSet::new(),
        }
    }

    /// Warn about an unset command the first time it is needed.
    fn warn_unset_once(&mut self, key: &'static str) -> bool {
        let first = self.warned_unset.insert(key);
        if first {
            warn!("capture.{} is not configured; recording empty values", key);
        }
        first
    }
}

impl Capturer for CommandCapturer {
    fn open_windows(&mut self) -> Result<Vec<AppRecord>> {
        let Some(command) = self.windows_command.clone() else {
            self.warn_unset_once("windowsCommand");
            return Ok(Vec::new());
        };
        let stdout = run_shell(&command)?;
        let apps: Vec<AppRecord> = serde_json::from_str(stdout.trim())?;
        debug!(count = apps.len(), "windows captured");
        Ok(apps)
    }

    fn seconds_since_last_input(&mut self) -> Result<u64> {
        let Some(command) = self.idle_command.clone() else {
            self.warn_unset_once("idleCommand");
            return Ok(0);
        };
        let stdout = run_shell(&command)?;
        parse_idle_seconds(&stdout)
    }
}

fn parse_idle_seconds(output: &str) -> Result<u64> {
    let text = output.trim();
    if let Ok(seconds) = text.parse::<u64>() {
        return Ok(seconds);
    }
    match text.parse::<f64>() {
        Ok(seconds) if seconds.is_finite() && seconds >= 0.0 => Ok(seconds as u64),
        _ => Err(OwlError::InvalidInput(format!(
            "idleCommand printed '{}', expected a number of seconds",
            text
        ))),
    }
}

fn run_shell(command: &str) -> Result<String> {
    let output = shell(command).output()?;
    check_status(command, &output)?;
    String::from_utf8(output.stdout).map_err(|_| {
        OwlError::InvalidInput(format!("Output of `{}` is not valid UTF-8", command))
    })
}

fn check_status(command: &str, output: &Output) -> Result<()> {
    if output.status.success() {
        return Ok(());
    }
    let stderr = String::from_utf8_lossy(&output.stderr);
    Err(OwlError::from(io::Error::new(
        io::ErrorKind::Other,
        format!(
            "capture command `{}` exited with {}: {}",
            command,
            output.status,
            stderr.trim()
        ),
    )))
}

#[cfg(unix)]
fn shell(command: &str) -> Command {
    let mut cmd = Command::new("sh");
    cmd.arg("-c").arg(command);
    cmd
}

#[cfg(windows)]
fn shell(command: &str) -> Command {
    let mut cmd = Command::new("cmd");
    cmd.arg("/C").arg(command);
    cmd
}
