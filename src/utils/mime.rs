//! MIME type utilities for determining file extensions

/// Extension used when the MIME type is unknown or malformed
pub const DEFAULT_EXTENSION: &str = ".mov";

/// Strip parameters (e.g. `; codecs="..."`) and normalize a MIME type
pub fn essence(mime_type: &str) -> String {
    mime_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_lowercase()
}

/// Get file extension (with leading dot) from a MIME type.
///
/// Uses a canonical table; anything outside of it gets [`DEFAULT_EXTENSION`].
pub fn pick_ideal_file_extension(mime_type: &str) -> &'static str {
    match essence(mime_type).as_str() {
        // Video formats
        "video/quicktime" => ".mov",
        "video/x-msvideo" => ".avi",
        "video/x-matroska" => ".mkv",
        "video/mpeg" => ".mpeg",
        "video/webm" => ".webm",
        "video/3gpp2" => ".3g2",
        "video/x-flv" => ".flv",
        "video/3gpp" => ".3gp",
        "video/mp4" => ".mp4",
        "video/ogg" => ".ogv",
        "video/mp2t" => ".ts",

        // Audio formats
        "audio/mp4" => ".m4a",
        "audio/webm" => ".weba",
        "audio/mpeg" => ".mp3",
        "audio/ogg" => ".ogg",
        "audio/wav" | "audio/x-wav" => ".wav",
        "audio/flac" => ".flac",
        "audio/aac" | "audio/x-aac" => ".aac",
        "audio/opus" => ".opus",

        _ => DEFAULT_EXTENSION,
    }
}
