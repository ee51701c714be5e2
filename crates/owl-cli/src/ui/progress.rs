//! Progress indicators for long-running operations using indicatif.

use std::time::Duration;

use indicatif::{ProgressBar as IndicatifBar, ProgressStyle};

use super::context::UiContext;
use super::render::badge;
use super::theme::Badge;

/// A spinner for indeterminate progress.
pub struct Spinner<'a> {
    ctx: &'a UiContext,
    bar: Option<IndicatifBar>,
}

impl<'a> Spinner<'a> {
    /// Create a new spinner with the given message.
    pub fn new(ctx: &'a UiContext, message: &str) -> Self {
        let bar = if ctx.allows_animation() {
            let pb = IndicatifBar::new_spinner();
            let template = if ctx.unicode {
                "{spinner:.cyan} {msg}... {elapsed}"
            } else {
                "{spinner} {msg}... {elapsed}"
            };
            if let Ok(style) = ProgressStyle::default_spinner().template(template) {
                pb.set_style(style.tick_strings(if ctx.unicode {
                    &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", ""]
                } else {
                    &["|", "/", "-", "\\", ""]
                }));
            }
            pb.set_message(message.to_string());
            Some(pb)
        } else {
            if !ctx.quiet {
                eprintln!("{}...", message);
            }
            None
        };

        Self { ctx, bar }
    }

    /// Begin animating.
    pub fn start(&self) {
        if let Some(bar) = &self.bar {
            bar.enable_steady_tick(Duration::from_millis(80));
        }
    }

    /// Finish spinner with success message.
    pub fn finish(&self, message: &str) {
        if let Some(bar) = &self.bar {
            bar.finish_and_clear();
        }
        if !self.ctx.quiet {
            println!("{}", badge(self.ctx, Badge::Ok, message));
        }
    }

    /// Stop the spinner without printing anything.
    pub fn clear(&self) {
        if let Some(bar) = &self.bar {
            bar.finish_and_clear();
        }
    }
}

/// A progress bar for determinate progress.
pub struct ProgressBar {
    bar: Option<IndicatifBar>,
}

impl ProgressBar {
    /// Create a new progress bar.
    pub fn new(ctx: &UiContext, total: u64, message: &str) -> Self {
        let bar = if ctx.allows_animation() {
            let pb = IndicatifBar::new(total);
            let template = if ctx.unicode {
                "{msg} [{bar:20.cyan/dim}] {pos}/{len}"
            } else {
                "{msg} [{bar:20}] {pos}/{len}"
            };
            if let Ok(style) = ProgressStyle::default_bar().template(template) {
                pb.set_style(style.progress_chars(if ctx.unicode { "━━─" } else { "=>-" }));
            }
            pb.set_message(message.to_string());
            Some(pb)
        } else {
            None
        };

        Self { bar }
    }

    /// Increment progress by one item.
    pub fn inc(&self) {
        if let Some(bar) = &self.bar {
            bar.inc(1);
        }
    }

    /// Print a line above the bar without corrupting it.
    pub fn println(&self, line: &str) {
        match &self.bar {
            Some(bar) => bar.println(line),
            None => println!("{}", line),
        }
    }

    /// Finish progress bar (clears the line).
    pub fn finish(&self) {
        if let Some(bar) = &self.bar {
            bar.finish_and_clear();
        }
    }
}
