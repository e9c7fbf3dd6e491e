//! Download progress with CI fallback

use super::context::UiContext;
use crate::cache::{Download, Transport};
use crate::error::CacheResult;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Read};
use url::Url;

/// Progress bar for a single download.
///
/// The bar only advances as bytes are read, so no ticker thread is started.
pub struct DownloadProgress {
    bar: Option<ProgressBar>,
}

impl DownloadProgress {
    /// Create a progress indicator for a body of `length` bytes (if known)
    pub fn new(ctx: &UiContext, label: &str, length: Option<u64>) -> Self {
        let bar = if ctx.use_fancy_output() {
            let bar = match length {
                Some(len) => {
                    let bar = ProgressBar::new(len);
                    bar.set_style(
                        ProgressStyle::default_bar()
                            .template("  {prefix:.cyan} {bar:30.cyan/dim} {bytes}/{total_bytes} {bytes_per_sec:.dim} {eta:.dim}")
                            .unwrap_or_else(|_| ProgressStyle::default_bar())
                            .progress_chars("━╸─"),
                    );
                    bar
                }
                None => {
                    let bar = ProgressBar::new_spinner();
                    bar.set_style(
                        ProgressStyle::default_spinner()
                            .template("  {spinner:.cyan} {prefix:.cyan} {bytes} {bytes_per_sec:.dim}")
                            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
                    );
                    bar
                }
            };
            bar.set_prefix(label.to_string());
            Some(bar)
        } else {
            None
        };
        Self { bar }
    }

    /// Wrap `reader` so reads advance the bar
    pub fn wrap(&self, reader: Box<dyn Read + Send>) -> Box<dyn Read + Send> {
        match &self.bar {
            Some(bar) => Box::new(ProgressReader {
                inner: reader,
                bar: bar.clone(),
            }),
            None => reader,
        }
    }
}

struct ProgressReader {
    inner: Box<dyn Read + Send>,
    bar: ProgressBar,
}

impl Read for ProgressReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        if n == 0 {
            self.bar.finish_and_clear();
        } else {
            self.bar.inc(n as u64);
        }
        Ok(n)
    }
}

impl Drop for ProgressReader {
    fn drop(&mut self) {
        if !self.bar.is_finished() {
            self.bar.abandon();
        }
    }
}

/// Transport decorator that reports download progress
pub struct ProgressTransport<T> {
    inner: T,
    ctx: UiContext,
}

impl<T> ProgressTransport<T> {
    pub fn new(inner: T, ctx: UiContext) -> Self {
        Self { inner, ctx }
    }
}

impl<T: Transport> Transport for ProgressTransport<T> {
    fn get(&self, url: &Url) -> CacheResult<Download> {
        let download = self.inner.get(url)?;
        let label = url
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .filter(|name| !name.is_empty())
            .unwrap_or("download")
            .to_string();

        let progress = DownloadProgress::new(&self.ctx, &label, download.content_length);
        Ok(Download {
            reader: progress.wrap(download.reader),
            content_length: download.content_length,
        })
    }
}
