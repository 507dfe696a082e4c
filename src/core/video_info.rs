//! Video information structures

use serde::{Deserialize, Serialize};
use std::fmt;

/// Canonical video identifier.
///
/// Only produced by [`crate::utils::url::extract_video_id`], so every value
/// is at least 10 characters long and free of URL delimiters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct VideoId(String);

impl VideoId {
    pub(crate) fn from_validated(id: String) -> Self {
        Self(id)
    }

    /// Get the ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for VideoId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A resolved, downloadable stream
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamDescriptor {
    /// Quality label (e.g., "hd720", "medium")
    pub quality: String,
    /// MIME type including codecs parameter
    pub mime_type: String,
    /// Directly fetchable URL
    pub url: String,
    /// Format tag (itag)
    pub itag: u32,
    /// Video title
    pub title: String,
    /// Video author/channel name
    pub author: String,
}

impl StreamDescriptor {
    /// Get file extension (with leading dot) for this stream
    pub fn extension(&self) -> &'static str {
        crate::utils::mime::pick_ideal_file_extension(&self.mime_type)
    }
}

/// Stream selection criteria.
///
/// An itag is an exact-match contract; a quality is a hint that falls back
/// to the first stream when nothing matches.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamSelection {
    /// Required itag
    pub itag: Option<u32>,
    /// Preferred quality label
    pub quality: Option<String>,
}

impl StreamSelection {
    /// Select by itag
    pub fn itag(itag: u32) -> Self {
        Self {
            itag: Some(itag),
            quality: None,
        }
    }

    /// Select by quality label
    pub fn quality(quality: &str) -> Self {
        Self {
            itag: None,
            quality: Some(quality.to_string()),
        }
    }
}

/// Summary of the available streams for one video
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItagInfo {
    pub title: String,
    pub author: String,
    pub itags: Vec<Itag>,
}

/// One row of [`ItagInfo`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Itag {
    pub itag: u32,
    pub quality: String,
    pub mime_type: String,
}

impl ItagInfo {
    /// Build a summary from a stream catalog, `None` when the catalog is empty
    pub fn from_catalog(catalog: &[StreamDescriptor]) -> Option<Self> {
        let first = catalog.first()?;
        Some(Self {
            title: first.title.clone(),
            author: first.author.clone(),
            itags: catalog
                .iter()
                .map(|stream| Itag {
                    itag: stream.itag,
                    quality: stream.quality.clone(),
                    mime_type: stream.mime_type.clone(),
                })
                .collect(),
        })
    }
}
