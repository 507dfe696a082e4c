//! Error types for ytdr

use thiserror::Error;

/// Main error type for ytdr operations
#[derive(Debug, Error)]
pub enum YtdrError {
    #[error("Invalid characters in video id: '{0}'")]
    InvalidCharacters(String),

    #[error("Video id '{0}' is too short (minimum length is 10)")]
    TooShort(String),

    #[error("Can't connect to the proxy {address}: {reason}")]
    ProxyUnavailable { address: String, reason: String },

    #[error("Metadata request failed with status code {0}")]
    MetadataStatus(u16),

    #[error("'fail' response status found in the server's answer, reason: '{reason}'")]
    ServerReportedFailure { reason: String },

    #[error("Non-success response status found in the server's answer (status: '{status}')")]
    UnexpectedStatus { status: String },

    #[error("No response status found in the server's answer")]
    MissingStatus,

    #[error("No stream map found in the server's answer")]
    MissingStreamMap,

    #[error("Player response data has changed: {0}")]
    MalformedPlayerResponse(#[source] serde_json::Error),

    #[error("Cannot playback and download, reason: {reason}")]
    Unplayable { reason: String },

    #[error("Cannot decode stream info at position {position}")]
    DecodingStreamInfo { position: usize },

    #[error("Cipher not found")]
    CipherNotFound,

    #[error("Cipher decode failed: {0}")]
    CipherDecodeFailed(String),

    #[error("No stream list found in the server's answer")]
    EmptyCatalog,

    #[error("Invalid itag value {0}, please specify a correct value")]
    ItagNotFound(u32),

    #[error("Non 200 status code received: {0}")]
    TransferStatus(u16),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("URL parsing error: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("Regex error: {0}")]
    RegexError(#[from] regex::Error),
}

impl YtdrError {
    /// Check if error was caused by a malformed identifier
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            YtdrError::InvalidCharacters(_) | YtdrError::TooShort(_)
        )
    }

    /// Check if error was reported by (or caused by) the remote metadata service
    pub fn is_upstream_error(&self) -> bool {
        matches!(
            self,
            YtdrError::MetadataStatus(_)
                | YtdrError::ServerReportedFailure { .. }
                | YtdrError::UnexpectedStatus { .. }
                | YtdrError::MissingStatus
                | YtdrError::MissingStreamMap
                | YtdrError::MalformedPlayerResponse(_)
                | YtdrError::Unplayable { .. }
        )
    }

    /// Check if error only affects a single catalog entry
    pub fn is_skippable(&self) -> bool {
        matches!(self, YtdrError::DecodingStreamInfo { .. })
    }

    /// Check if error signals an upstream format change rather than bad input
    pub fn is_fatal(&self) -> bool {
        matches!(self, YtdrError::MalformedPlayerResponse(_))
    }
}
