//! Application-level utilities for the Owl CLI.
//!
//! This module provides:
//! - The per-invocation context (CLI args, UI, lazily loaded config)
//! - Password reading and private key unlocking with retry logic

mod context;
mod password;

pub use context::AppContext;
pub use password::{read_new_password, unlock_with_retry};
