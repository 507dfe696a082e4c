//! Output formatting and progress display

use crate::cli::args::VerbosityLevel;
use crate::core::progress::format_bytes;
use crate::core::video_info::{ItagInfo, StreamDescriptor};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Output formatter for ytdr
pub struct OutputFormatter {
    verbosity: VerbosityLevel,
}

impl OutputFormatter {
    /// Create a new output formatter
    pub fn new(verbosity: VerbosityLevel) -> Self {
        Self { verbosity }
    }

    fn is_quiet(&self) -> bool {
        self.verbosity == VerbosityLevel::Quiet
    }

    /// Create a percentage progress bar, `None` in quiet mode
    pub fn create_progress_bar(&self) -> Option<ProgressBar> {
        if self.is_quiet() {
            return None;
        }

        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos:>3}% {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-");

        let progress_bar = ProgressBar::new(100);
        progress_bar.set_style(style);
        progress_bar.set_message("Downloading...");
        Some(progress_bar)
    }

    /// Print info message
    pub fn info(&self, message: &str) {
        if !self.is_quiet() {
            println!("ℹ️  {}", message);
        }
    }

    /// Print success message
    pub(crate) fn success(&self, message: &str) {
        if !self.is_quiet() {
            println!("✅ {}", message);
        }
    }

    /// Print error message
    pub fn error(&self, message: &str) {
        eprintln!("❌ {}", message.red());
    }

    /// Print the stream table of a video
    pub fn print_itag_info(&self, info: &ItagInfo) {
        println!("📹 {}", info.title.bold());
        println!("👤 {}", info.author);
        println!("📊 {} streams available", info.itags.len());
        println!();
        println!(
            "  {:<6} {:<12} {}",
            "itag".bold(),
            "quality".bold(),
            "mime type".bold()
        );
        for row in &info.itags {
            println!("  {:<6} {:<12} {}", row.itag, row.quality, row.mime_type);
        }
    }

    /// Print the stream about to be downloaded
    pub fn print_download_start(&self, stream: &StreamDescriptor) {
        if self.is_quiet() {
            return;
        }

        println!("🚀 Starting download...");
        println!("📹 {}", stream.title);
        println!(
            "📋 itag={} | {} | {}",
            stream.itag, stream.quality, stream.mime_type
        );
        println!();
    }

    /// Print download complete message
    pub fn print_download_complete(&self, output_path: &Path, size: Option<u64>, duration: Duration) {
        if self.is_quiet() {
            return;
        }

        println!();
        self.success(&"Download completed!".green().to_string());
        match size {
            Some(size) => println!("💾 Saved to: {} ({})", output_path.display(), format_bytes(size)),
            None => println!("💾 Saved to: {}", output_path.display()),
        }
        println!("⏱️  Time: {}", humantime::format_duration(round_to_secs(duration)));
    }
}

fn round_to_secs(duration: Duration) -> Duration {
    Duration::from_secs(duration.as_secs())
}

/// Drive `progress_bar` from the percentage channel until the sender closes
pub fn spawn_progress_consumer(
    mut progress: mpsc::Receiver<u8>,
    progress_bar: Option<ProgressBar>,
) -> JoinHandle<Option<u8>> {
    tokio::spawn(async move {
        let mut last = None;
        while let Some(percent) = progress.recv().await {
            if let Some(bar) = &progress_bar {
                bar.set_position(u64::from(percent));
            }
            last = Some(percent);
        }
        if let Some(bar) = &progress_bar {
            bar.finish_with_message("Done");
        }
        last
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_progress_bar_quiet_mode() {
        let formatter = OutputFormatter::new(VerbosityLevel::Quiet);
        assert!(formatter.create_progress_bar().is_none());
    }

    #[test]
    fn test_create_progress_bar_normal_mode() {
        let formatter = OutputFormatter::new(VerbosityLevel::Normal);
        let bar = formatter.create_progress_bar().unwrap();
        assert_eq!(bar.length(), Some(100));
    }

    #[test]
    fn test_round_to_secs() {
        assert_eq!(round_to_secs(Duration::from_millis(2500)), Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_progress_consumer_tracks_last_level() {
        let (tx, rx) = mpsc::channel(100);
        let bar = ProgressBar::hidden();
        bar.set_length(100);
        let handle = spawn_progress_consumer(rx, Some(bar.clone()));

        for percent in 1..=100u8 {
            tx.send(percent).await.unwrap();
        }
        drop(tx);

        assert_eq!(handle.await.unwrap(), Some(100));
        assert_eq!(bar.position(), 100);
    }

    #[tokio::test]
    async fn test_progress_consumer_without_events() {
        let (tx, rx) = mpsc::channel::<u8>(100);
        drop(tx);
        assert_eq!(spawn_progress_consumer(rx, None).await.unwrap(), None);
    }

    #[test]
    fn test_print_functions_do_not_panic() {
        let stream = StreamDescriptor {
            quality: "medium".to_string(),
            mime_type: "video/mp4".to_string(),
            url: "http://example.com/18".to_string(),
            itag: 18,
            title: "Test".to_string(),
            author: "Tester".to_string(),
        };
        let info = ItagInfo::from_catalog(std::slice::from_ref(&stream)).unwrap();

        for verbosity in [VerbosityLevel::Quiet, VerbosityLevel::Normal] {
            let formatter = OutputFormatter::new(verbosity);
            formatter.print_itag_info(&info);
            formatter.print_download_start(&stream);
            formatter.print_download_complete(Path::new("/tmp/test.mp4"), Some(2048), Duration::from_secs(3));
            formatter.info("info");
            formatter.success("done");
        }
    }
}
