//! Application context for the Owl CLI.
//!
//! Provides a unified context that combines CLI arguments with
//! lazily-loaded configuration.

use std::path::{Path, PathBuf};

use once_cell::unsync::OnceCell;
use owl_core::OwlConfig;

use crate::cli::Cli;
use crate::config::{load_config, resolve_config_path};
use crate::ui::UiContext;

/// Application context that bundles CLI args with configuration.
///
/// This avoids repeatedly loading config and threading multiple parameters
/// through handler functions.
pub struct AppContext<'a> {
    cli: &'a Cli,
    ui: UiContext,
    config_path: OnceCell<PathBuf>,
    config: OnceCell<OwlConfig>,
}

impl<'a> AppContext<'a> {
    /// Create a new application context from CLI arguments.
    pub fn new(cli: &'a Cli) -> Self {
        Self {
            cli,
            ui: UiContext::from_env(cli.no_color, cli.quiet),
            config_path: OnceCell::new(),
            config: OnceCell::new(),
        }
    }

    pub fn ui(&self) -> &UiContext {
        &self.ui
    }

    /// Check if quiet mode is enabled.
    pub fn quiet(&self) -> bool {
        self.cli.quiet
    }

    /// Config file location (`--config`, `OWL_CONFIG`, or the XDG default).
    pub fn config_path(&self) -> anyhow::Result<&Path> {
        self.config_path
            .get_or_try_init(|| resolve_config_path(self.cli.config.as_deref()))
            .map(PathBuf::as_path)
    }

    /// Effective configuration, loading it lazily if needed.
    pub fn config(&self) -> anyhow::Result<&OwlConfig> {
        self.config
            .get_or_try_init(|| load_config(self.config_path()?))
    }
}
