//! Streaming media transfer

use crate::core::progress::TransferSession;
use crate::core::video_info::StreamDescriptor;
use crate::error::YtdrError;
use crate::platform::client::VideoClient;
use futures_util::StreamExt;
use std::path::Path;
use tokio::fs::{DirBuilder, File};
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Downloads a resolved stream into a local file
#[derive(Debug, Clone)]
pub struct StreamDownloader {
    video_client: VideoClient,
}

impl StreamDownloader {
    /// Create a downloader sharing the session's HTTP client
    pub fn new(video_client: VideoClient) -> Self {
        Self { video_client }
    }

    /// Transfer `stream` to `output_path`, publishing percentages on `progress`.
    ///
    /// Parent directories are created and an existing file is overwritten.
    pub async fn download(
        &self,
        stream: &StreamDescriptor,
        output_path: &Path,
        progress: mpsc::Sender<u8>,
    ) -> Result<(), YtdrError> {
        if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            create_dir_all(parent).await?;
        }

        let mut file = File::create(output_path).await?;
        info!("Download to file={}", output_path.display());

        let response = self.video_client.media_request(&stream.url).send().await?;
        let status = response.status();
        if status != reqwest::StatusCode::OK {
            warn!("Media request returned status {}", status);
            return Err(YtdrError::TransferStatus(status.as_u16()));
        }

        let content_length = response.content_length();
        debug!("Content length: {:?}", content_length);

        let mut session = TransferSession::new(output_path, &stream.url, content_length, progress);
        let mut body = response.bytes_stream();
        while let Some(chunk) = body.next().await {
            let chunk = chunk?;
            file.write_all(&chunk).await?;
            session.record(chunk.len() as u64).await;
        }

        file.flush().await?;
        info!(
            "Download completed: {} bytes from {} written to {}",
            session.written(),
            session.source_url(),
            session.destination().display()
        );
        Ok(())
    }
}

async fn create_dir_all(path: &Path) -> Result<(), YtdrError> {
    let mut builder = DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    builder.mode(0o755);
    builder.create(path).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::progress::progress_channel;
    use tempfile::TempDir;

    fn stream_for(url: String) -> StreamDescriptor {
        StreamDescriptor {
            quality: "medium".to_string(),
            mime_type: "video/mp4".to_string(),
            url,
            itag: 18,
            title: "Test".to_string(),
            author: "Tester".to_string(),
        }
    }

    async fn drain(mut rx: mpsc::Receiver<u8>) -> Vec<u8> {
        let mut levels = Vec::new();
        while let Some(level) = rx.recv().await {
            levels.push(level);
        }
        levels
    }

    #[tokio::test]
    async fn test_download_writes_file_and_reports_progress() {
        let mut server = mockito::Server::new_async().await;
        let body = vec![7u8; 1000];
        let mock = server
            .mock("GET", "/videoplayback")
            .with_status(200)
            .with_header("content-length", "1000")
            .with_body(body.clone())
            .create_async()
            .await;

        let dir = TempDir::new().unwrap();
        let output = dir.path().join("nested").join("deeper").join("video.mp4");
        let downloader = StreamDownloader::new(VideoClient::new().unwrap());
        let (tx, rx) = progress_channel();
        let consumer = tokio::spawn(drain(rx));

        downloader
            .download(&stream_for(format!("{}/videoplayback", server.url())), &output, tx)
            .await
            .unwrap();

        assert_eq!(tokio::fs::read(&output).await.unwrap(), body);
        assert_eq!(consumer.await.unwrap(), (1..=100).collect::<Vec<u8>>());
        mock.assert_async().await;
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_created_directories_are_0755() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("a").join("b");
        create_dir_all(&nested).await.unwrap();

        let mode = std::fs::metadata(&nested).unwrap().permissions().mode();
        // umask may only clear bits
        assert_eq!(mode & 0o777 & !0o755, 0);
    }

    #[tokio::test]
    async fn test_download_overwrites_existing_file() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/videoplayback")
            .with_status(200)
            .with_body("new")
            .create_async()
            .await;

        let dir = TempDir::new().unwrap();
        let output = dir.path().join("video.mp4");
        tokio::fs::write(&output, "previous, longer content").await.unwrap();

        let downloader = StreamDownloader::new(VideoClient::new().unwrap());
        let (tx, _rx) = progress_channel();
        downloader
            .download(&stream_for(format!("{}/videoplayback", server.url())), &output, tx)
            .await
            .unwrap();

        assert_eq!(tokio::fs::read_to_string(&output).await.unwrap(), "new");
    }

    #[tokio::test]
    async fn test_download_non_200() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/videoplayback")
            .with_status(403)
            .create_async()
            .await;

        let dir = TempDir::new().unwrap();
        let output = dir.path().join("video.mp4");
        let downloader = StreamDownloader::new(VideoClient::new().unwrap());
        let (tx, rx) = progress_channel();

        let err = downloader
            .download(&stream_for(format!("{}/videoplayback", server.url())), &output, tx)
            .await
            .unwrap_err();

        assert!(matches!(err, YtdrError::TransferStatus(403)));
        assert!(drain(rx).await.is_empty());
    }

    #[tokio::test]
    async fn test_download_unknown_length_emits_nothing() {
        let mut server = mockito::Server::new_async().await;
        let body = vec![1u8; 4096];
        let sent = body.clone();
        let _mock = server
            .mock("GET", "/videoplayback")
            .with_status(200)
            .with_chunked_body(move |w| w.write_all(&sent))
            .create_async()
            .await;

        let dir = TempDir::new().unwrap();
        let output = dir.path().join("video.mp4");
        let downloader = StreamDownloader::new(VideoClient::new().unwrap());
        let (tx, rx) = progress_channel();

        downloader
            .download(&stream_for(format!("{}/videoplayback", server.url())), &output, tx)
            .await
            .unwrap();

        assert_eq!(tokio::fs::read(&output).await.unwrap(), body);
        assert!(drain(rx).await.is_empty());
    }
}
