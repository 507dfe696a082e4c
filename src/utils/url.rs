//! URL utilities for extracting video IDs from video platform URLs

use crate::core::video_info::VideoId;
use crate::error::YtdrError;
use regex::Regex;
use tracing::debug;

/// Token that marks the input as a URL of the video platform
const SITE_TOKEN: &str = "youtu";

/// Characters that mark the input as URL-like
const URL_MARKERS: &[char] = &['"', '?', '&', '/', '<', '%', '='];

/// Characters that can never appear in a video ID
const FORBIDDEN_CHARS: &[char] = &['?', '&', '/', '<', '%', '='];

/// Minimum accepted video ID length in bytes
pub const MIN_VIDEO_ID_LEN: usize = 10;

/// Extract video ID from a video platform URL or a bare ID.
///
/// Patterns are applied most specific first and each one narrows the
/// candidate left by the previous one.
pub fn extract_video_id(input: &str) -> Result<VideoId, YtdrError> {
    let mut candidate = input.to_string();

    if candidate.contains(SITE_TOKEN) || candidate.contains(URL_MARKERS) {
        let patterns = [
            Regex::new(r#"(?:v|embed|watch\?v)(?:=|/)([^"&?/=%]{11})"#)?,
            Regex::new(r#"(?:=|/)([^"&?/=%]{11})"#)?,
            Regex::new(r#"([^"&?/=%]{11})"#)?,
        ];

        for pattern in &patterns {
            if let Some(narrowed) = pattern
                .captures(&candidate)
                .and_then(|captures| captures.get(1))
                .map(|m| m.as_str().to_string())
            {
                candidate = narrowed;
            }
        }
    }

    debug!("Found video id: '{}'", candidate);

    if candidate.contains(FORBIDDEN_CHARS) {
        return Err(YtdrError::InvalidCharacters(candidate));
    }
    if candidate.len() < MIN_VIDEO_ID_LEN {
        return Err(YtdrError::TooShort(candidate));
    }

    Ok(VideoId::from_validated(candidate))
}
