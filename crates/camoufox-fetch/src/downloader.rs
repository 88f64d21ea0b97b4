//! Retrying HTTP GET with streaming, progress and pluggable sinks.
//!
//! Every attempt starts from a clean sink, so a transfer that dies halfway
//! never leaves a spliced file behind. Failures of any kind (connection,
//! non-2xx status, broken body) are retried after a fixed delay until the
//! attempt budget is spent.

use std::io;
use std::time::Duration;

use async_trait::async_trait;
use camoufox_core::{FetchConfig, FetchError, FetchResult, ProgressReporter};
use futures_util::StreamExt;
use tokio::io::{AsyncSeekExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, warn};

use crate::http::HttpBackend;

/// Destination for downloaded bytes that can be rewound between attempts.
#[async_trait]
pub trait DownloadSink: AsyncWrite + Unpin + Send {
    /// Discard anything written by a previous attempt.
    async fn reset(&mut self) -> io::Result<()>;
}

#[async_trait]
impl DownloadSink for Vec<u8> {
    async fn reset(&mut self) -> io::Result<()> {
        self.clear();
        Ok(())
    }
}

#[async_trait]
impl DownloadSink for tokio::fs::File {
    async fn reset(&mut self) -> io::Result<()> {
        self.set_len(0).await?;
        self.rewind().await?;
        Ok(())
    }
}

/// Fetches URLs with a fixed retry policy.
pub struct Downloader<B> {
    backend: B,
    attempts: u32,
    retry_delay: Duration,
}

impl<B: HttpBackend> Downloader<B> {
    /// Use the retry count and delay from `config`.
    pub fn new(backend: B, config: &FetchConfig) -> Self {
        Self::with_policy(backend, config.retries(), config.retry_delay())
    }

    /// Explicit policy. `attempts` is clamped to at least one.
    pub fn with_policy(backend: B, attempts: u32, retry_delay: Duration) -> Self {
        Self {
            backend,
            attempts: attempts.max(1),
            retry_delay,
        }
    }

    pub const fn backend(&self) -> &B {
        &self.backend
    }

    pub const fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Download `url` fully into memory.
    pub async fn fetch(&self, url: &str) -> FetchResult<Vec<u8>> {
        let mut buffer = Vec::new();
        self.fetch_into(url, &mut buffer, None).await?;
        Ok(buffer)
    }

    /// Stream `url` into `sink`, returning the number of bytes written.
    ///
    /// Progress is reported per chunk. A missing or zero content length is
    /// passed on as `None` so reporters can show an indeterminate bar.
    pub async fn fetch_into<S: DownloadSink>(
        &self,
        url: &str,
        sink: &mut S,
        progress: Option<&dyn ProgressReporter>,
    ) -> FetchResult<u64> {
        let mut last_error = None;

        for attempt in 1..=self.attempts {
            match self.try_fetch(url, sink, progress).await {
                Ok(written) => {
                    debug!(url, attempt, bytes = written, "Download complete");
                    return Ok(written);
                }
                Err(e) => {
                    warn!(url, attempt, attempts = self.attempts, error = %e, "Download attempt failed");
                    last_error = Some(e);
                    if attempt < self.attempts {
                        tokio::time::sleep(self.retry_delay).await;
                    }
                }
            }
        }

        let reason = last_error.map(|e| e.to_string()).unwrap_or_default();
        if let Some(progress) = progress {
            progress.finish_with_error(&format!("Download failed: {reason}"));
        }
        Err(FetchError::DownloadFailed {
            url: url.to_string(),
            attempts: self.attempts,
            reason,
        })
    }

    async fn try_fetch<S: DownloadSink>(
        &self,
        url: &str,
        sink: &mut S,
        progress: Option<&dyn ProgressReporter>,
    ) -> FetchResult<u64> {
        sink.reset().await?;

        let response = self.backend.get(url).await?;
        if !response.is_success() {
            return Err(FetchError::Http {
                status: response.status,
                url: url.to_string(),
            });
        }

        let total = response.content_length.filter(|&len| len > 0);
        if let Some(progress) = progress {
            progress.start(&format!("Downloading {url}"), total);
        }

        let mut body = response.body;
        let mut written: u64 = 0;
        while let Some(chunk) = body.next().await {
            let chunk = chunk?;
            sink.write_all(&chunk).await?;
            written += chunk.len() as u64;
            if let Some(progress) = progress {
                progress.update(written, total);
            }
        }
        sink.flush().await?;

        if let Some(progress) = progress {
            progress.finish("Download complete");
        }
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::testing::{Scripted, ScriptedBackend};
    use mockall::mock;
    use mockall::predicate::eq;

    mock! {
        Progress {}
        impl ProgressReporter for Progress {
            fn start(&self, message: &str, total: Option<u64>);
            fn update(&self, current: u64, total: Option<u64>);
            fn message(&self, msg: &str);
            fn finish(&self, message: &str);
            fn finish_with_error(&self, message: &str);
        }
    }

    const URL: &str = "https://example.com/asset.zip";

    fn downloader(backend: ScriptedBackend, attempts: u32) -> Downloader<ScriptedBackend> {
        Downloader::with_policy(backend, attempts, Duration::ZERO)
    }

    #[tokio::test]
    async fn test_succeeds_on_fifth_attempt() {
        let backend = ScriptedBackend::new().script(
            URL,
            [
                Scripted::Network,
                Scripted::Status(500),
                Scripted::Truncated {
                    chunks: vec![b"par".to_vec()],
                },
                Scripted::Status(503),
                Scripted::body(b"payload"),
            ],
        );
        let downloader = downloader(backend, 5);

        let bytes = downloader.fetch(URL).await.unwrap();
        assert_eq!(bytes, b"payload");
        assert_eq!(downloader.backend().attempts(URL), 5);
    }

    #[tokio::test]
    async fn test_gives_up_after_exactly_n_attempts() {
        let backend = ScriptedBackend::new().script(URL, [Scripted::Status(502)]);
        let downloader = downloader(backend, 3);

        let err = downloader.fetch(URL).await.unwrap_err();
        match err {
            FetchError::DownloadFailed {
                url,
                attempts,
                reason,
            } => {
                assert_eq!(url, URL);
                assert_eq!(attempts, 3);
                assert!(reason.contains("502"), "{reason}");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(downloader.backend().attempts(URL), 3);
    }

    #[tokio::test]
    async fn test_zero_attempts_still_tries_once() {
        let backend = ScriptedBackend::new().script(URL, [Scripted::Network]);
        let downloader = downloader(backend, 0);
        assert!(downloader.fetch(URL).await.is_err());
        assert_eq!(downloader.backend().attempts(URL), 1);
    }

    #[tokio::test]
    async fn test_sink_is_reset_between_attempts() {
        let backend = ScriptedBackend::new().script(
            URL,
            [
                Scripted::Truncated {
                    chunks: vec![b"garbage".to_vec()],
                },
                Scripted::Body {
                    chunks: vec![b"he".to_vec(), b"llo".to_vec()],
                    content_length: Some(5),
                },
            ],
        );
        let downloader = downloader(backend, 2);

        let mut sink = Vec::new();
        let written = downloader.fetch_into(URL, &mut sink, None).await.unwrap();
        assert_eq!(written, 5);
        assert_eq!(sink, b"hello");
    }

    #[tokio::test]
    async fn test_file_sink_is_truncated_between_attempts() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("asset.bin");
        let backend = ScriptedBackend::new().script(
            URL,
            [
                Scripted::Truncated {
                    chunks: vec![vec![0xAA; 64]],
                },
                Scripted::body(b"final"),
            ],
        );
        let downloader = downloader(backend, 2);

        let mut file = tokio::fs::File::create(&path).await.unwrap();
        downloader.fetch_into(URL, &mut file, None).await.unwrap();
        drop(file);

        assert_eq!(std::fs::read(&path).unwrap(), b"final");
    }

    #[tokio::test]
    async fn test_progress_reports_known_length() {
        let backend = ScriptedBackend::new().script(
            URL,
            [Scripted::Body {
                chunks: vec![vec![1; 4], vec![2; 6]],
                content_length: Some(10),
            }],
        );
        let downloader = downloader(backend, 1);

        let mut progress = MockProgress::new();
        progress
            .expect_start()
            .withf(|_, total| *total == Some(10))
            .times(1)
            .return_const(());
        progress
            .expect_update()
            .with(eq(4), eq(Some(10)))
            .times(1)
            .return_const(());
        progress
            .expect_update()
            .with(eq(10), eq(Some(10)))
            .times(1)
            .return_const(());
        progress.expect_finish().times(1).return_const(());
        progress.expect_finish_with_error().never();

        let mut sink = Vec::new();
        downloader
            .fetch_into(URL, &mut sink, Some(&progress))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_progress_is_indeterminate_without_length() {
        let backend = ScriptedBackend::new().script(
            URL,
            [Scripted::Body {
                chunks: vec![vec![7; 3]],
                content_length: Some(0),
            }],
        );
        let downloader = downloader(backend, 1);

        let mut progress = MockProgress::new();
        progress
            .expect_start()
            .withf(|_, total| total.is_none())
            .times(1)
            .return_const(());
        progress
            .expect_update()
            .with(eq(3), eq(None))
            .times(1)
            .return_const(());
        progress.expect_finish().times(1).return_const(());

        let mut sink = Vec::new();
        downloader
            .fetch_into(URL, &mut sink, Some(&progress))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_progress_reports_final_failure() {
        let backend = ScriptedBackend::new().script(URL, [Scripted::Network]);
        let downloader = downloader(backend, 2);

        let mut progress = MockProgress::new();
        progress.expect_start().never();
        progress
            .expect_finish_with_error()
            .times(1)
            .return_const(());

        let mut sink = Vec::new();
        assert!(
            downloader
                .fetch_into(URL, &mut sink, Some(&progress))
                .await
                .is_err()
        );
    }
}
