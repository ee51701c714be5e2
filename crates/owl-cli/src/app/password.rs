//! Password reading and private key unlocking with retry logic.

use dialoguer::{Confirm, Password};
use owl_core::config::KeyPaths;
use owl_core::{unlock_private_key, AsymKey, OwlError};
use tracing::debug;
use zeroize::Zeroizing;

use crate::constants::{env_vars, MAX_PASSWORD_ATTEMPTS};
use crate::errors::CliError;
use crate::ui::{badge, Badge, UiContext};

fn env_password() -> Option<Zeroizing<String>> {
    std::env::var(env_vars::PASSWORD)
        .ok()
        .filter(|value| !value.is_empty())
        .map(Zeroizing::new)
}

fn no_password_error() -> CliError {
    CliError::invalid_input(format!(
        "No password provided and no TTY available. Set {}.",
        env_vars::PASSWORD
    ))
}

/// Read the password for a new key set, with confirmation when prompting.
pub fn read_new_password(ui: &UiContext, no_input: bool) -> anyhow::Result<Zeroizing<String>> {
    if let Some(password) = env_password() {
        return Ok(password);
    }
    if no_input || !ui.is_interactive() {
        return Err(no_password_error().into());
    }
    let password = Password::new()
        .with_prompt("Enter password")
        .with_confirmation("Confirm password", "Passwords do not match")
        .interact()
        .map_err(|e| anyhow::anyhow!("Failed to read password: {}", e))?;
    Ok(Zeroizing::new(password))
}

fn prompt_password() -> anyhow::Result<Zeroizing<String>> {
    let password = Password::new()
        .with_prompt("Password")
        .interact()
        .map_err(|e| anyhow::anyhow!("Failed to read password: {}", e))?;
    Ok(Zeroizing::new(password))
}

/// Unlock the private key, prompting again after a wrong password.
///
/// `OWL_PASSWORD` gets exactly one attempt. Interactive sessions get up to
/// [`MAX_PASSWORD_ATTEMPTS`] and may cancel between attempts.
pub fn unlock_with_retry(
    ui: &UiContext,
    paths: &KeyPaths,
    no_input: bool,
) -> anyhow::Result<AsymKey> {
    if !paths.private_key.exists() || !paths.salt.exists() {
        return Err(CliError::not_found(
            format!(
                "Encryption keys not found: {}",
                paths.private_key.display()
            ),
            "Hint: Run `owl setup` first, or check the encryption paths in your config.",
        )
        .into());
    }

    let mut attempts = scripted_attempts().into_iter().flatten();
    let mut scripted = false;
    let env = env_password();
    let interactive = env.is_none() && !no_input && ui.is_interactive();

    let mut attempt: u32 = 0;
    loop {
        attempt += 1;
        let password = if let Some(password) = env.as_ref() {
            password.clone()
        } else if let Some(next) = attempts.next() {
            scripted = true;
            Zeroizing::new(next)
        } else if interactive {
            prompt_password()?
        } else if scripted {
            return Err(CliError::auth_failed("No password attempts remaining").into());
        } else {
            return Err(no_password_error().into());
        };

        match unlock_private_key(&password, paths) {
            Ok(key) => return Ok(key),
            Err(OwlError::Decryption(detail)) => {
                debug!(attempt, %detail, "private key unlock failed");
                let retry_allowed = (interactive || scripted) && env.is_none();
                let remaining = MAX_PASSWORD_ATTEMPTS.saturating_sub(attempt);
                if !retry_allowed || remaining == 0 {
                    return Err(CliError::auth_failed_with_hint(
                        "Incorrect password: the private key could not be decrypted.",
                        "Hint: Logs cannot be recovered without the password used during `owl setup`.",
                    )
                    .into());
                }
                eprintln!(
                    "{}",
                    badge(
                        ui,
                        Badge::Warn,
                        &format!(
                            "Incorrect password. {} attempt{} remaining.",
                            remaining,
                            if remaining == 1 { "" } else { "s" }
                        )
                    )
                );
                if interactive && !confirm_retry()? {
                    return Err(CliError::auth_failed("Decryption cancelled").into());
                }
            }
            Err(err) => return Err(err.into()),
        }
    }
}

fn confirm_retry() -> anyhow::Result<bool> {
    Confirm::new()
        .with_prompt("Try again?")
        .default(true)
        .interact()
        .map_err(|e| anyhow::anyhow!("Failed to read answer: {}", e))
}

#[cfg(feature = "test-support")]
fn scripted_attempts() -> Option<Vec<String>> {
    std::env::var(env_vars::TEST_PASSWORD_ATTEMPTS).ok().map(|value| {
        value
            .split(',')
            .map(|item| item.trim().to_string())
            .filter(|item| !item.is_empty())
            .collect()
    })
}

#[cfg(not(feature = "test-support"))]
fn scripted_attempts() -> Option<Vec<String>> {
    None
}
