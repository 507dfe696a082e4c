//! # ytdr - video stream resolver and downloader
//!
//! Resolves a video page URL (or a bare video id) into the list of streams the
//! site offers and downloads one of them while reporting progress.
//!
//! ## Features
//!
//! - Video id extraction from arbitrary URL shapes
//! - Metadata decoding with per-stream degradation
//! - Signature cipher resolution for protected streams
//! - SOCKS5 proxy support
//! - Gapless percentage progress events
//!
//! ## Example
//!
//! ```rust,no_run
//! use ytdr::{Downloader, StreamSelection};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut downloader = Downloader::new();
//!     let mut progress = downloader.take_progress_receiver().expect("receiver");
//!     tokio::spawn(async move {
//!         while let Some(percent) = progress.recv().await {
//!             println!("{}%", percent);
//!         }
//!     });
//!
//!     downloader.decode_url("https://www.youtube.com/watch?v=rFejpH_tAHM").await?;
//!     let path = downloader
//!         .start_download(None, None, &StreamSelection::default())
//!         .await?;
//!     println!("Saved to {}", path.display());
//!
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod core;
pub mod download;
pub mod error;
pub mod platform;
pub mod utils;

// Re-export main types
pub use self::core::{Downloader, ItagInfo, StreamDescriptor, StreamSelection, TransferSession, VideoId};
pub use error::YtdrError;

/// Result type alias for ytdr operations
pub type Result<T> = std::result::Result<T, YtdrError>;
