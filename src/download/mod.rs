//! Media transfer for ytdr

pub mod downloader;

pub use downloader::*;
