//! Constants used throughout the CLI.

/// Exit codes for the CLI.
///
/// These follow common Unix conventions:
/// - 0: Success
/// - 1: General error (used by anyhow for unhandled errors)
/// - 2: Misuse of shell command (reserved by shells)
/// - 3+: Application-specific errors
pub mod exit_codes {
    /// Resource not found (config, key files, log directory).
    pub const NOT_FOUND: i32 = 3;

    /// Invalid user input or arguments.
    pub const INVALID_INPUT: i32 = 4;

    /// Authentication failed (wrong password, too many attempts).
    pub const AUTH_FAILED: i32 = 5;

    /// Some files of a batch could not be processed.
    pub const PARTIAL_FAILURE: i32 = 6;
}

/// Environment variables read by the CLI.
pub mod env_vars {
    /// Config file override.
    pub const CONFIG: &str = "OWL_CONFIG";

    /// Password for setup and decryption, skipping the prompt.
    pub const PASSWORD: &str = "OWL_PASSWORD";

    /// Tracing filter directives (e.g. `owl_core=debug`).
    pub const LOG: &str = "OWL_LOG";

    /// Comma-separated password attempts replayed by the retry loop (test builds only).
    #[cfg(feature = "test-support")]
    pub const TEST_PASSWORD_ATTEMPTS: &str = "OWL_TEST_PASSWORD_ATTEMPTS";
}

/// Maximum password attempts in interactive decryption.
pub const MAX_PASSWORD_ATTEMPTS: u32 = 3;
