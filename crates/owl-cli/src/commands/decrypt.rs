//! `owl decrypt`: unlock the private key and decrypt a directory of logs.

use std::path::Path;

use owl_core::decryptor::find_encrypted_logs;
use owl_core::{decrypt_log_files_with, FileReport, Result as CoreResult};

use crate::app::{unlock_with_retry, AppContext};
use crate::cli::DecryptArgs;
use crate::errors::CliError;
use crate::ui::{badge, print, receipt, Badge, ProgressBar, UiContext};

fn file_line(ui: &UiContext, source: &Path, result: &CoreResult<FileReport>) -> String {
    let name = source
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| source.display().to_string());
    match result {
        Ok(file) => {
            let mut line = format!(
                "{}: {} entries, {} key{}",
                name,
                file.entries,
                file.key_epochs,
                if file.key_epochs == 1 { "" } else { "s" }
            );
            if file.truncated {
                line.push_str(" (partial last record ignored)");
            }
            badge(ui, if file.truncated { Badge::Warn } else { Badge::Ok }, &line)
        }
        Err(err) => badge(ui, Badge::Err, &format!("{}: {}", name, err)),
    }
}

pub fn handle_decrypt(ctx: &AppContext, args: &DecryptArgs) -> anyhow::Result<()> {
    let config = ctx.config()?;
    let ui = ctx.ui();
    let source = args.source.clone().unwrap_or_else(|| config.out_dir.clone());
    let dest = args.dest.clone().unwrap_or_else(|| source.join("decrypted"));

    if !source.is_dir() {
        return Err(CliError::not_found(
            format!("Log directory not found: {}", source.display()),
            "Hint: Check outDir in your config or pass --source.",
        )
        .into());
    }
    let total = find_encrypted_logs(&source)?.len();
    if total == 0 {
        print(
            ui,
            &badge(
                ui,
                Badge::Info,
                &format!("No encrypted logs in {}", source.display()),
            ),
        );
        return Ok(());
    }

    let key = unlock_with_retry(ui, &config.key_paths(), args.no_input)?;

    let progress = ProgressBar::new(ui, total as u64, "Decrypting");
    let report = decrypt_log_files_with(&source, &dest, &key, |path, result| {
        if !ctx.quiet() || result.is_err() {
            progress.println(&file_line(ui, path, result));
        }
        progress.inc();
    })?;
    progress.finish();

    let failed = report.failed();
    let kind = if failed == 0 { Badge::Ok } else { Badge::Warn };
    print(
        ui,
        &receipt(
            ui,
            kind,
            "Decryption finished",
            &[
                ("Decrypted", report.succeeded().to_string()),
                ("Failed", failed.to_string()),
                ("Output", dest.display().to_string()),
            ],
        ),
    );

    if failed > 0 {
        return Err(CliError::partial_failure(format!(
            "{} of {} log files could not be decrypted",
            failed,
            report.files.len()
        ))
        .into());
    }
    Ok(())
}
