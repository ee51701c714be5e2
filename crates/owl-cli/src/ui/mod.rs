//! UI primitives for the Owl CLI.
//!
//! This module provides:
//! - **Context**: Environment detection (TTY, color, unicode)
//! - **Mode**: Output mode resolution (plain, pretty)
//! - **Theme**: Badge tokens and styles
//! - **Render**: Tables, receipts, hints, errors
//! - **Progress**: Spinners and progress bars

mod context;
mod mode;
pub mod progress;
pub mod render;
pub mod theme;

pub use context::UiContext;
pub use theme::Badge;

pub use render::{badge, hint, print, print_error, receipt, simple_table, Column};

pub use progress::{ProgressBar, Spinner};
