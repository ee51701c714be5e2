//! `owl init`: write a default config file.

use owl_core::OwlConfig;

use crate::app::AppContext;
use crate::cli::InitArgs;
use crate::config::write_config;
use crate::errors::CliError;
use crate::ui::{hint, print, receipt, Badge};

pub fn handle_init(ctx: &AppContext, args: &InitArgs) -> anyhow::Result<()> {
    let path = ctx.config_path()?;
    if path.exists() && !args.force {
        return Err(CliError::invalid_input(format!(
            "Config already exists: {}\nHint: Pass --force to overwrite it.",
            path.display()
        ))
        .into());
    }

    let mut config = OwlConfig::default();
    if let Some(out_dir) = &args.out_dir {
        config.out_dir = out_dir.clone();
    }
    write_config(path, &config)?;

    let ui = ctx.ui();
    print(
        ui,
        &receipt(
            ui,
            Badge::Ok,
            "Config written",
            &[
                ("Path", path.display().to_string()),
                ("Out dir", config.out_dir.display().to_string()),
            ],
        ),
    );
    print(
        ui,
        &hint(
            ui,
            "Set capture.windowsCommand and capture.idleCommand, then run `owl setup` to enable encryption.",
        ),
    );
    Ok(())
}
