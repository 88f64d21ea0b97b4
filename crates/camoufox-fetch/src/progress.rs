//! Terminal progress bars for downloads.
//!
//! Only available with the `cli` feature. Library callers without a
//! terminal use [`NoopProgress`](camoufox_core::NoopProgress) or their own
//! [`ProgressReporter`].

use std::sync::{Mutex, MutexGuard, PoisonError};

use camoufox_core::ProgressReporter;
use indicatif::{ProgressBar, ProgressStyle};

const DOWNLOAD_TEMPLATE: &str =
    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec})";
const SPINNER_TEMPLATE: &str = "{spinner:.green} [{elapsed_precise}] {bytes} {msg}";

/// CLI progress reporter with terminal progress bars.
pub struct CliProgress {
    bar: Mutex<Option<ProgressBar>>,
}

impl CliProgress {
    pub const fn new() -> Self {
        Self {
            bar: Mutex::new(None),
        }
    }

    fn bar(&self) -> MutexGuard<'_, Option<ProgressBar>> {
        self.bar.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn create_download_bar(total: u64) -> ProgressBar {
        let pb = ProgressBar::new(total);
        let style = ProgressStyle::default_bar()
            .template(DOWNLOAD_TEMPLATE)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓░");
        pb.set_style(style);
        pb
    }

    /// Spinner for downloads without a declared length.
    fn create_spinner() -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        let style = ProgressStyle::default_spinner()
            .template(SPINNER_TEMPLATE)
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        pb.set_style(style);
        pb
    }
}

impl Default for CliProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressReporter for CliProgress {
    fn start(&self, message: &str, total: Option<u64>) {
        let pb = match total {
            Some(t) if t > 0 => Self::create_download_bar(t),
            _ => Self::create_spinner(),
        };
        pb.set_message(message.to_string());
        *self.bar() = Some(pb);
    }

    fn update(&self, current: u64, total: Option<u64>) {
        if let Some(ref pb) = *self.bar() {
            if let Some(t) = total {
                pb.set_length(t);
            } else {
                pb.tick();
            }
            pb.set_position(current);
        }
    }

    fn message(&self, msg: &str) {
        match *self.bar() {
            Some(ref pb) => pb.println(msg),
            None => eprintln!("{msg}"),
        }
    }

    fn finish(&self, message: &str) {
        if let Some(pb) = self.bar().take() {
            pb.finish_with_message(message.to_string());
        }
    }

    fn finish_with_error(&self, message: &str) {
        if let Some(pb) = self.bar().take() {
            pb.abandon_with_message(message.to_string());
        }
    }
}
