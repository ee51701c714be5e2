//! Tracing subscriber set-up.
//!
//! Diagnostics go to stderr so command output on stdout stays clean.
//! `OWL_LOG` takes standard `EnvFilter` directives and overrides `-v`.

use tracing_subscriber::EnvFilter;

use crate::constants::env_vars;

fn default_directives(verbose: u8, quiet: bool) -> &'static str {
    match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "warn,owl=debug,owl_core=debug",
        (false, _) => "warn,owl=trace,owl_core=trace",
    }
}

pub fn init_tracing(verbose: u8, quiet: bool) {
    let filter = EnvFilter::try_from_env(env_vars::LOG)
        .unwrap_or_else(|_| EnvFilter::new(default_directives(verbose, quiet)));

    // A second initialisation (e.g. in tests) keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(verbose > 0)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directives() {
        assert_eq!(default_directives(0, false), "warn");
        assert_eq!(default_directives(3, true), "error");
        assert!(default_directives(1, false).contains("owl_core=debug"));
        assert!(default_directives(2, false).contains("owl_core=trace"));
    }
}
