//! UI module for CLI output and download progress
//!
//! Draws `indicatif` progress bars on interactive terminals and falls back to
//! plain status lines in CI/non-interactive environments.

mod context;
mod output;
mod progress;

pub use context::UiContext;
pub use output::{step_info, step_ok, step_warn};
pub use progress::{DownloadProgress, ProgressTransport};
