//! Progress tracking for transfers

use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use tracing::debug;

/// Capacity of the progress channel
pub const PROGRESS_CHANNEL_CAPACITY: usize = 100;

/// Create the progress channel carrying percentage levels
pub fn progress_channel() -> (mpsc::Sender<u8>, mpsc::Receiver<u8>) {
    mpsc::channel(PROGRESS_CHANNEL_CAPACITY)
}

/// Turns byte counts into whole percentage levels.
///
/// Every level from 1 to 100 is reported exactly once, in order, whatever
/// the chunk sizes. Without a known positive length nothing is reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressAccumulator {
    content_length: Option<u64>,
    written: u64,
    level: u8,
}

impl ProgressAccumulator {
    /// Create an accumulator for a body of the given length
    pub fn new(content_length: Option<u64>) -> Self {
        Self {
            content_length: content_length.filter(|len| *len > 0),
            written: 0,
            level: 0,
        }
    }

    /// Total number of bytes recorded so far
    pub fn written(&self) -> u64 {
        self.written
    }

    /// Highest level reported so far
    pub fn level(&self) -> u8 {
        self.level
    }

    /// Record `n` more bytes and return the levels to publish.
    ///
    /// The next level is due as soon as the floored percentage reaches the
    /// last published one.
    pub fn advance(&mut self, n: u64) -> Vec<u8> {
        self.written = self.written.saturating_add(n);
        let Some(total) = self.content_length else {
            return Vec::new();
        };
        if n == 0 {
            return Vec::new();
        }

        let percent = u128::from(self.written) * 100 / u128::from(total);
        let mut levels = Vec::new();
        while self.level < 100 && percent >= u128::from(self.level) {
            self.level += 1;
            levels.push(self.level);
        }
        levels
    }
}

/// State of one media transfer
#[derive(Debug)]
pub struct TransferSession {
    destination: PathBuf,
    source_url: String,
    accumulator: ProgressAccumulator,
    progress: mpsc::Sender<u8>,
}

impl TransferSession {
    pub fn new(
        destination: impl Into<PathBuf>,
        source_url: impl Into<String>,
        content_length: Option<u64>,
        progress: mpsc::Sender<u8>,
    ) -> Self {
        Self {
            destination: destination.into(),
            source_url: source_url.into(),
            accumulator: ProgressAccumulator::new(content_length),
            progress,
        }
    }

    pub fn destination(&self) -> &Path {
        &self.destination
    }

    pub fn source_url(&self) -> &str {
        &self.source_url
    }

    pub fn written(&self) -> u64 {
        self.accumulator.written()
    }

    /// Record a written chunk and publish the levels it completes.
    ///
    /// Waits while the channel is full. A dropped receiver is not an error.
    pub async fn record(&mut self, n: u64) {
        for level in self.accumulator.advance(n) {
            if self.progress.send(level).await.is_err() {
                debug!("Progress receiver dropped at {}%", level);
            }
        }
    }
}

/// Format bytes as human-readable string
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    const THRESHOLD: f64 = 1024.0;

    if bytes == 0 {
        return "0 B".to_string();
    }

    let bytes_f64 = bytes as f64;
    let exp = (bytes_f64.ln() / THRESHOLD.ln()).floor() as usize;
    let exp = exp.min(UNITS.len() - 1);

    if exp == 0 {
        format!("{} {}", bytes, UNITS[exp])
    } else {
        format!("{:.1} {}", bytes_f64 / THRESHOLD.powi(exp as i32), UNITS[exp])
    }
}
