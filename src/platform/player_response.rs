//! Metadata response decoding

use crate::error::YtdrError;
use serde::{Deserialize, Deserializer};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Player response embedded in the metadata answer
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PlayerResponse {
    #[serde(rename = "playabilityStatus", default, deserialize_with = "null_as_default")]
    pub playability_status: PlayabilityStatus,
    #[serde(rename = "streamingData", default, deserialize_with = "null_as_default")]
    pub streaming_data: StreamingData,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PlayabilityStatus {
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: String,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct StreamingData {
    /// Muxed formats (audio and video in one file)
    #[serde(default, deserialize_with = "null_as_default")]
    pub formats: Vec<FormatData>,
    /// Adaptive formats (audio or video only)
    #[serde(rename = "adaptiveFormats", default, deserialize_with = "null_as_default")]
    pub adaptive_formats: Vec<FormatData>,
}

/// One format entry of the player response.
///
/// A `null` field reads as its empty value so that a single bad entry is
/// left to the catalog builder instead of failing the whole decode.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct FormatData {
    #[serde(default, deserialize_with = "null_as_default")]
    pub itag: u32,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(rename = "mimeType", default, deserialize_with = "null_as_default")]
    pub mime_type: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub quality: String,
    #[serde(rename = "signatureCipher", default)]
    pub signature_cipher: Option<String>,
    /// Older name of `signatureCipher`
    #[serde(default)]
    pub cipher: Option<String>,
}

impl FormatData {
    /// Non-empty cipher blob, `signatureCipher` first
    pub fn cipher_blob(&self) -> Option<&str> {
        [&self.signature_cipher, &self.cipher]
            .into_iter()
            .filter_map(|blob| blob.as_deref())
            .find(|blob| !blob.is_empty())
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Decoded metadata answer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedResponse {
    pub player_response: PlayerResponse,
    pub title: String,
    pub author: String,
}

/// Parse the URL-encoded envelope, keeping the first value of repeated keys
pub fn parse_envelope(raw: &str) -> HashMap<String, String> {
    let mut fields = HashMap::new();
    for (key, value) in url::form_urlencoded::parse(raw.trim().as_bytes()) {
        fields
            .entry(key.into_owned())
            .or_insert_with(|| value.into_owned());
    }
    fields
}

/// Decode the raw metadata answer.
///
/// Status and stream map checks come first; a player response that is not
/// valid JSON is reported as [`YtdrError::MalformedPlayerResponse`].
pub fn decode(raw: &str) -> Result<DecodedResponse, YtdrError> {
    let answer = parse_envelope(raw);

    match answer.get("status").map(String::as_str) {
        None => return Err(YtdrError::MissingStatus),
        Some("fail") => {
            let reason = answer
                .get("reason")
                .cloned()
                .unwrap_or_else(|| "no reason given".to_string());
            return Err(YtdrError::ServerReportedFailure { reason });
        }
        Some("ok") => {}
        Some(status) => {
            return Err(YtdrError::UnexpectedStatus {
                status: status.to_string(),
            })
        }
    }

    let stream_map = answer
        .get("player_response")
        .ok_or(YtdrError::MissingStreamMap)?;

    let (title, author) = video_title_author(stream_map);

    let player_response: PlayerResponse =
        serde_json::from_str(stream_map).map_err(YtdrError::MalformedPlayerResponse)?;

    if player_response.playability_status.status == "UNPLAYABLE" {
        let reason = player_response
            .playability_status
            .reason
            .clone()
            .unwrap_or_default();
        warn!("Video is unplayable: {}", reason);
        return Err(YtdrError::Unplayable { reason });
    }

    Ok(DecodedResponse {
        player_response,
        title,
        author,
    })
}

/// Best-effort lookup of `videoDetails.title` and `videoDetails.author`.
///
/// Any parse failure or shape mismatch yields empty strings.
pub fn video_title_author(player_response: &str) -> (String, String) {
    let value: serde_json::Value = match serde_json::from_str(player_response) {
        Ok(value) => value,
        Err(e) => {
            debug!("Could not read video details: {}", e);
            return (String::new(), String::new());
        }
    };

    let details = value.get("videoDetails");
    let title = details.and_then(|d| d.get("title")).and_then(|t| t.as_str());
    let author = details.and_then(|d| d.get("author")).and_then(|a| a.as_str());

    match (title, author) {
        (Some(title), Some(author)) => (title.to_string(), author.to_string()),
        _ => (String::new(), String::new()),
    }
}
