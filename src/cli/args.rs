//! Command line argument parsing

use crate::core::video_info::StreamSelection;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// ytdr - download videos from a video page URL or id
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Video URL or video id
    pub url: String,

    /// Output directory (default: ~/Movies/youtubedr)
    #[arg(short, long, value_name = "DIR")]
    pub directory: Option<PathBuf>,

    /// Output file name (default: video title)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<String>,

    /// Quality label to download (e.g. 'hd720', 'medium'), first stream if absent
    #[arg(short, long, value_name = "QUALITY")]
    pub quality: Option<String>,

    /// Itag to download, fails if the video has no such stream
    #[arg(short, long, value_name = "ITAG")]
    pub itag: Option<u32>,

    /// SOCKS5 proxy address (host:port)
    #[arg(short = 'x', long, value_name = "ADDR")]
    pub proxy: Option<String>,

    /// Print the available streams and exit
    #[arg(long)]
    pub info: bool,

    /// Print the selected stream URL and exit (no download)
    #[arg(short = 'g', long)]
    pub print_url: bool,

    /// Connect timeout (e.g., 30s, 1m)
    #[arg(long, value_name = "DURATION", default_value = "30s")]
    pub connect_timeout: humantime::Duration,

    /// Disable progress output
    #[arg(long)]
    pub no_progress: bool,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Quiet output (only errors)
    #[arg(long)]
    pub quiet: bool,
}

impl Args {
    /// Get connect timeout as Duration
    pub fn connect_timeout_duration(&self) -> Duration {
        self.connect_timeout.into()
    }

    /// Stream selection requested on the command line
    pub fn selection(&self) -> StreamSelection {
        StreamSelection {
            itag: self.itag,
            quality: self.quality.clone(),
        }
    }

    /// Get output verbosity level
    pub fn verbosity_level(&self) -> VerbosityLevel {
        if self.quiet {
            VerbosityLevel::Quiet
        } else if self.verbose {
            VerbosityLevel::Verbose
        } else {
            VerbosityLevel::Normal
        }
    }
}

/// Output verbosity level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerbosityLevel {
    /// Quiet (only errors)
    Quiet,
    /// Normal
    Normal,
    /// Verbose (debug info)
    Verbose,
}

impl VerbosityLevel {
    /// Default log filter directive for this level
    pub fn log_filter(self) -> &'static str {
        match self {
            VerbosityLevel::Quiet => "error",
            VerbosityLevel::Normal => "info",
            VerbosityLevel::Verbose => "debug",
        }
    }
}
