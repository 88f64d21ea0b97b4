//! Progress callbacks for browser downloads.
//!
//! The downloader reports each transfer here; launchers decide whether that
//! becomes a terminal bar, a log line or nothing.

/// Receives the lifecycle of one Camoufox download.
///
/// A retried download calls [`start`](Self::start) again for every attempt
/// that gets a successful response, so treat it as a reset rather than a new
/// task.
pub trait ProgressReporter: Send + Sync {
    /// A transfer attempt began.
    ///
    /// `total` is the response's content length, or `None` when the server
    /// did not send one.
    fn start(&self, message: &str, total: Option<u64>);

    /// `current` bytes of the archive have been written to the sink.
    fn update(&self, current: u64, total: Option<u64>);

    /// Free-form status between downloading and a finished install,
    /// e.g. which archive is being extracted.
    fn message(&self, msg: &str);

    /// The archive arrived in full.
    fn finish(&self, message: &str);

    /// The last allowed attempt failed; no more calls follow.
    fn finish_with_error(&self, message: &str);
}

/// Reporter for headless callers.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopProgress;

impl ProgressReporter for NoopProgress {
    fn start(&self, _message: &str, _total: Option<u64>) {}
    fn update(&self, _current: u64, _total: Option<u64>) {}
    fn message(&self, _msg: &str) {}
    fn finish(&self, _message: &str) {}
    fn finish_with_error(&self, _message: &str) {}
}
