//! `owl setup`: create the password-protected key set and enable encryption.

use std::thread;

use owl_core::crypto::validate_password;
use owl_core::setup::keys_exist;
use owl_core::{setup_encryption, OwlConfig};

use crate::app::{read_new_password, AppContext};
use crate::cli::SetupArgs;
use crate::config::{read_config, write_config};
use crate::errors::CliError;
use crate::ui::{badge, hint, print, receipt, Badge, Spinner};

pub fn handle_setup(ctx: &AppContext, args: &SetupArgs) -> anyhow::Result<()> {
    let config_path = ctx.config_path()?.to_path_buf();
    let paths = ctx.config()?.key_paths();
    let ui = ctx.ui();

    if keys_exist(&paths) && !args.force {
        return Err(CliError::invalid_input(format!(
            "Encryption keys already exist: {}\nHint: Pass --force to replace them. Logs encrypted with the old key will need the old private key.",
            paths.private_key.display()
        ))
        .into());
    }

    let password = read_new_password(ui, args.no_input)?;
    validate_password(&password).map_err(|e| CliError::invalid_input(e.to_string()))?;

    let spinner = Spinner::new(ui, &format!("Generating {}-bit RSA key pair", args.bits));
    spinner.start();
    let bits = args.bits;
    let worker_paths = paths.clone();
    let result = thread::spawn(move || setup_encryption(&password, bits, &worker_paths))
        .join()
        .map_err(|_| anyhow::anyhow!("Key generation thread panicked"))?;
    match result {
        Ok(_) => spinner.finish("Key pair generated"),
        Err(err) => {
            spinner.clear();
            return Err(err.into());
        }
    }

    // Persist only the enable flag; keep the file's own relative paths.
    let mut stored = if config_path.exists() {
        read_config(&config_path)?
    } else {
        OwlConfig::default()
    };
    stored.encryption.enabled = true;
    write_config(&config_path, &stored)?;

    print(
        ui,
        &receipt(
            ui,
            Badge::Ok,
            "Encryption enabled",
            &[
                ("Public key", paths.public_key.display().to_string()),
                ("Private key", paths.private_key.display().to_string()),
                ("Salt", paths.salt.display().to_string()),
                ("Config", config_path.display().to_string()),
            ],
        ),
    );
    print(
        ui,
        &badge(
            ui,
            Badge::Warn,
            "Logs cannot be decrypted without this password. It is not stored anywhere.",
        ),
    );
    print(ui, &hint(ui, "Run `owl decrypt` to read encrypted logs."));
    Ok(())
}
