//! Stream catalog building and stream selection

use crate::core::video_info::{StreamDescriptor, StreamSelection};
use crate::error::YtdrError;
use crate::platform::cipher::CipherResolver;
use crate::platform::player_response::{FormatData, PlayerResponse};
use tracing::debug;

/// Build the ordered stream catalog: muxed formats first, then adaptive ones.
///
/// Entries without a MIME type are skipped. Any other entry error aborts
/// the whole build, and an empty result is an error.
pub async fn build_catalog(
    player_response: &PlayerResponse,
    title: &str,
    author: &str,
    cipher: &dyn CipherResolver,
) -> Result<Vec<StreamDescriptor>, YtdrError> {
    let streaming_data = &player_response.streaming_data;
    let entries = streaming_data
        .formats
        .iter()
        .enumerate()
        .chain(streaming_data.adaptive_formats.iter().enumerate());

    let mut streams = Vec::with_capacity(
        streaming_data.formats.len() + streaming_data.adaptive_formats.len(),
    );
    for (position, format) in entries {
        let stream = match parse_stream(title, author, position, format, cipher).await {
            Ok(stream) => stream,
            Err(e) if e.is_skippable() => {
                debug!("{}", e);
                continue;
            }
            Err(e) => return Err(e),
        };

        debug!(
            "Title: {} Author: {} Stream found: quality '{}', format '{}', itag '{}'",
            title, author, stream.quality, stream.mime_type, stream.itag
        );
        streams.push(stream);
    }

    if streams.is_empty() {
        return Err(YtdrError::EmptyCatalog);
    }
    Ok(streams)
}

async fn parse_stream(
    title: &str,
    author: &str,
    position: usize,
    format: &FormatData,
    cipher: &dyn CipherResolver,
) -> Result<StreamDescriptor, YtdrError> {
    if format.mime_type.is_empty() {
        return Err(YtdrError::DecodingStreamInfo { position });
    }

    let url = match format.url.as_deref().filter(|url| !url.is_empty()) {
        Some(url) => url.to_string(),
        None => {
            let blob = format.cipher_blob().ok_or(YtdrError::CipherNotFound)?;
            cipher.resolve(blob).await?
        }
    };

    Ok(StreamDescriptor {
        quality: format.quality.clone(),
        mime_type: format.mime_type.clone(),
        url,
        itag: format.itag,
        title: title.to_string(),
        author: author.to_string(),
    })
}

/// Select a stream from the catalog.
///
/// An itag must match exactly; a quality label falls back to the first
/// stream, which is also the default.
pub fn select_stream<'a>(
    catalog: &'a [StreamDescriptor],
    selection: &StreamSelection,
) -> Result<&'a StreamDescriptor, YtdrError> {
    let first = catalog.first().ok_or(YtdrError::EmptyCatalog)?;

    if let Some(itag) = selection.itag {
        return catalog
            .iter()
            .find(|stream| stream.itag == itag)
            .ok_or(YtdrError::ItagNotFound(itag));
    }

    if let Some(quality) = &selection.quality {
        return Ok(catalog
            .iter()
            .find(|stream| &stream.quality == quality)
            .unwrap_or(first));
    }

    Ok(first)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::cipher::{CipherOp, SignatureCipher};
    use crate::platform::player_response::StreamingData;
    use async_trait::async_trait;

    struct FailingCipher;

    #[async_trait]
    impl CipherResolver for FailingCipher {
        async fn resolve(&self, _cipher: &str) -> Result<String, YtdrError> {
            Err(YtdrError::CipherDecodeFailed("boom".to_string()))
        }
    }

    fn direct(itag: u32, mime_type: &str, quality: &str) -> FormatData {
        FormatData {
            itag,
            url: Some(format!("http://example.com/{}", itag)),
            mime_type: mime_type.to_string(),
            quality: quality.to_string(),
            ..FormatData::default()
        }
    }

    fn ciphered(itag: u32, blob: &str) -> FormatData {
        FormatData {
            itag,
            signature_cipher: Some(blob.to_string()),
            mime_type: "video/mp4".to_string(),
            quality: "hd720".to_string(),
            ..FormatData::default()
        }
    }

    fn payload(formats: Vec<FormatData>, adaptive_formats: Vec<FormatData>) -> PlayerResponse {
        PlayerResponse {
            streaming_data: StreamingData {
                formats,
                adaptive_formats,
            },
            ..PlayerResponse::default()
        }
    }

    fn reverse_cipher() -> SignatureCipher {
        SignatureCipher::new(vec![CipherOp::Reverse])
    }

    #[tokio::test]
    async fn test_build_catalog_skips_empty_mime() {
        let payload = payload(
            vec![direct(18, "video/mp4", "medium"), direct(43, "", "medium")],
            vec![direct(137, "video/mp4", "hd1080")],
        );
        let catalog = build_catalog(&payload, "Title", "Author", &reverse_cipher())
            .await
            .unwrap();

        let itags: Vec<u32> = catalog.iter().map(|s| s.itag).collect();
        assert_eq!(itags, vec![18, 137]);
        assert_eq!(catalog[0].title, "Title");
        assert_eq!(catalog[0].author, "Author");
        assert_eq!(catalog[0].url, "http://example.com/18");
    }

    #[tokio::test]
    async fn test_build_catalog_muxed_before_adaptive() {
        let payload = payload(
            vec![direct(22, "video/mp4", "hd720"), direct(18, "video/mp4", "medium")],
            vec![direct(140, "audio/mp4", "tiny"), direct(137, "video/mp4", "hd1080")],
        );
        let catalog = build_catalog(&payload, "", "", &reverse_cipher())
            .await
            .unwrap();
        let itags: Vec<u32> = catalog.iter().map(|s| s.itag).collect();
        assert_eq!(itags, vec![22, 18, 140, 137]);
    }

    #[tokio::test]
    async fn test_build_catalog_resolves_cipher() {
        let payload = payload(
            vec![ciphered(22, "s=abc&sp=sig&url=http%3A%2F%2Fexample.com%2F22")],
            vec![],
        );
        let catalog = build_catalog(&payload, "", "", &reverse_cipher())
            .await
            .unwrap();
        assert_eq!(catalog[0].url, "http://example.com/22?sig=cba");
    }

    #[tokio::test]
    async fn test_build_catalog_prefers_direct_url() {
        let mut format = ciphered(22, "s=abc&url=http%3A%2F%2Fexample.com%2Fciphered");
        format.url = Some("http://example.com/direct".to_string());
        let payload = payload(vec![format], vec![]);

        let catalog = build_catalog(&payload, "", "", &FailingCipher).await.unwrap();
        assert_eq!(catalog[0].url, "http://example.com/direct");
    }

    #[tokio::test]
    async fn test_build_catalog_cipher_not_found() {
        let mut format = direct(22, "video/mp4", "hd720");
        format.url = None;
        let payload = payload(vec![format, direct(18, "video/mp4", "medium")], vec![]);

        let err = build_catalog(&payload, "", "", &reverse_cipher())
            .await
            .unwrap_err();
        assert!(matches!(err, YtdrError::CipherNotFound));
    }

    #[tokio::test]
    async fn test_build_catalog_cipher_error_aborts() {
        let payload = payload(
            vec![direct(18, "video/mp4", "medium")],
            vec![ciphered(137, "s=abc&url=x")],
        );
        let err = build_catalog(&payload, "", "", &FailingCipher)
            .await
            .unwrap_err();
        assert!(matches!(err, YtdrError::CipherDecodeFailed(_)));
    }

    #[tokio::test]
    async fn test_build_catalog_skips_null_mime_entry() {
        let raw = r#"{
            "streamingData": {
                "formats": [{"itag": 18, "url": "http://example.com/18", "mimeType": "video/mp4", "quality": "medium"}],
                "adaptiveFormats": [{"itag": 999, "mimeType": null}]
            }
        }"#;
        let payload: PlayerResponse = serde_json::from_str(raw).unwrap();

        let catalog = build_catalog(&payload, "", "", &reverse_cipher())
            .await
            .unwrap();
        let itags: Vec<u32> = catalog.iter().map(|s| s.itag).collect();
        assert_eq!(itags, vec![18]);
    }

    #[tokio::test]
    async fn test_build_catalog_legacy_cipher_key() {
        let format = FormatData {
            cipher: Some("s=abc&url=http%3A%2F%2Fexample.com%2F22".to_string()),
            signature_cipher: Some(String::new()),
            ..direct(22, "video/mp4", "hd720")
        };
        let payload = payload(vec![FormatData { url: None, ..format }], vec![]);

        let catalog = build_catalog(&payload, "", "", &reverse_cipher())
            .await
            .unwrap();
        assert_eq!(catalog[0].url, "http://example.com/22?signature=cba");
    }

    #[tokio::test]
    async fn test_build_catalog_empty() {
        let err = build_catalog(&payload(vec![], vec![]), "", "", &reverse_cipher())
            .await
            .unwrap_err();
        assert!(matches!(err, YtdrError::EmptyCatalog));

        let only_invalid = payload(vec![direct(18, "", "medium")], vec![direct(140, "", "tiny")]);
        let err = build_catalog(&only_invalid, "", "", &reverse_cipher())
            .await
            .unwrap_err();
        assert!(matches!(err, YtdrError::EmptyCatalog));
    }

    #[tokio::test]
    async fn test_build_catalog_is_deterministic() {
        let payload = payload(
            vec![
                direct(22, "video/mp4", "hd720"),
                ciphered(18, "s=xyz&url=http%3A%2F%2Fexample.com%2F18"),
            ],
            vec![direct(140, "audio/mp4", "tiny"), direct(0, "", "")],
        );
        let first = build_catalog(&payload, "T", "A", &reverse_cipher())
            .await
            .unwrap();
        let second = build_catalog(&payload, "T", "A", &reverse_cipher())
            .await
            .unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), 3);
    }

    fn catalog() -> Vec<StreamDescriptor> {
        [(22, "hd720"), (18, "medium"), (137, "hd1080")]
            .iter()
            .map(|(itag, quality)| StreamDescriptor {
                quality: quality.to_string(),
                mime_type: "video/mp4".to_string(),
                url: format!("http://example.com/{}", itag),
                itag: *itag,
                title: String::new(),
                author: String::new(),
            })
            .collect()
    }

    #[test]
    fn test_select_stream_by_itag() {
        let catalog = catalog();
        let stream = select_stream(&catalog, &StreamSelection::itag(137)).unwrap();
        assert_eq!(stream, &catalog[2]);

        let err = select_stream(&catalog, &StreamSelection::itag(999)).unwrap_err();
        assert!(matches!(err, YtdrError::ItagNotFound(999)));
    }

    #[test]
    fn test_select_stream_by_quality() {
        let catalog = catalog();
        let stream = select_stream(&catalog, &StreamSelection::quality("medium")).unwrap();
        assert_eq!(stream.itag, 18);

        let stream = select_stream(&catalog, &StreamSelection::quality("hd2160")).unwrap();
        assert_eq!(stream, &catalog[0]);
    }

    #[test]
    fn test_select_stream_itag_takes_precedence() {
        let catalog = catalog();
        let selection = StreamSelection {
            itag: Some(999),
            quality: Some("medium".to_string()),
        };
        assert!(matches!(
            select_stream(&catalog, &selection),
            Err(YtdrError::ItagNotFound(999))
        ));
    }

    #[test]
    fn test_select_stream_default_and_empty() {
        let catalog = catalog();
        let stream = select_stream(&catalog, &StreamSelection::default()).unwrap();
        assert_eq!(stream.itag, 22);

        assert!(matches!(
            select_stream(&[], &StreamSelection::default()),
            Err(YtdrError::EmptyCatalog)
        ));
    }
}
