//! Main downloader implementation

use crate::core::progress::progress_channel;
use crate::core::video_info::{ItagInfo, StreamDescriptor, StreamSelection, VideoId};
use crate::download::StreamDownloader;
use crate::error::YtdrError;
use crate::platform::cipher::{CipherResolver, PlayerScriptCipher};
use crate::platform::client::{HttpClientConfig, VideoClient};
use crate::platform::formats::{build_catalog, select_stream};
use crate::platform::player_response;
use crate::utils::{extract_video_id, output_file_name};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{mpsc, OnceCell};
use tracing::{debug, info};

/// Default output directory below the home directory
pub const DEFAULT_OUTPUT_SUBDIR: &str = "Movies/youtubedr";

/// Default output directory (`<home>/Movies/youtubedr`)
pub fn default_output_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(DEFAULT_OUTPUT_SUBDIR)
}

/// One resolution and download session.
///
/// The HTTP client is built on first use and shared by the metadata
/// request, the cipher script requests and the transfer. Use one session
/// per concurrent transfer.
pub struct Downloader {
    http_config: HttpClientConfig,
    client: OnceCell<VideoClient>,
    cipher: Option<Arc<dyn CipherResolver>>,
    video_id: Option<VideoId>,
    title: String,
    author: String,
    catalog: Vec<StreamDescriptor>,
    progress_tx: mpsc::Sender<u8>,
    progress_rx: Option<mpsc::Receiver<u8>>,
}

impl Downloader {
    /// Create a new session with default options
    pub fn new() -> Self {
        let (progress_tx, progress_rx) = progress_channel();
        Self {
            http_config: HttpClientConfig::default(),
            client: OnceCell::new(),
            cipher: None,
            video_id: None,
            title: String::new(),
            author: String::new(),
            catalog: Vec::new(),
            progress_tx,
            progress_rx: Some(progress_rx),
        }
    }

    /// Route all requests through a SOCKS5 proxy
    pub fn with_socks5_proxy(mut self, address: impl Into<String>) -> Self {
        self.http_config.socks5_proxy = Some(address.into());
        self
    }

    /// Set HTTP client configuration
    pub fn with_http_config(mut self, config: HttpClientConfig) -> Self {
        self.http_config = config;
        self
    }

    /// Use a custom cipher resolver instead of the player script one
    pub fn with_cipher(mut self, cipher: Arc<dyn CipherResolver>) -> Self {
        self.cipher = Some(cipher);
        self
    }

    /// Take the progress receiver. Only the first call returns it.
    pub fn take_progress_receiver(&mut self) -> Option<mpsc::Receiver<u8>> {
        self.progress_rx.take()
    }

    /// HTTP client of this session, built on first use
    pub async fn client(&self) -> Result<&VideoClient, YtdrError> {
        self.client
            .get_or_try_init(|| async { VideoClient::with_config(self.http_config.clone()) })
            .await
    }

    /// Resolve a URL (or bare id) into the stream catalog
    pub async fn decode_url(&mut self, url: &str) -> Result<(), YtdrError> {
        let video_id = extract_video_id(url)?;

        let client = self.client().await?.clone();
        let raw = client.fetch_metadata(&video_id).await?;
        let decoded = player_response::decode(&raw)?;

        let cipher: Arc<dyn CipherResolver> = match &self.cipher {
            Some(cipher) => Arc::clone(cipher),
            None => Arc::new(PlayerScriptCipher::new(client, video_id.clone())),
        };
        let catalog = build_catalog(
            &decoded.player_response,
            &decoded.title,
            &decoded.author,
            cipher.as_ref(),
        )
        .await?;
        debug!("Catalog holds {} streams", catalog.len());

        self.video_id = Some(video_id);
        self.title = decoded.title;
        self.author = decoded.author;
        self.catalog = catalog;
        Ok(())
    }

    pub fn video_id(&self) -> Option<&VideoId> {
        self.video_id.as_ref()
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn author(&self) -> &str {
        &self.author
    }

    /// Streams resolved by the last [`Downloader::decode_url`] call
    pub fn catalog(&self) -> &[StreamDescriptor] {
        &self.catalog
    }

    /// Title, author and the itag of every stream
    pub fn itag_info(&self) -> Option<ItagInfo> {
        ItagInfo::from_catalog(&self.catalog)
    }

    /// Select a stream from the catalog
    pub fn select(&self, selection: &StreamSelection) -> Result<&StreamDescriptor, YtdrError> {
        select_stream(&self.catalog, selection)
    }

    /// Download the selected stream and return the written file path.
    ///
    /// `output_dir` defaults to [`default_output_dir`] and `output_file` to
    /// the sanitized title with an extension matching the stream's MIME type.
    pub async fn start_download(
        &self,
        output_dir: Option<&Path>,
        output_file: Option<&str>,
        selection: &StreamSelection,
    ) -> Result<PathBuf, YtdrError> {
        let stream = self.select(selection)?;

        let directory = output_dir
            .map(Path::to_path_buf)
            .unwrap_or_else(default_output_dir);
        let file_name = output_file_name(output_file, &stream.title, stream.extension())?;
        let output_path = directory.join(file_name);

        info!("Download url={}", stream.url);
        let client = self.client().await?.clone();
        StreamDownloader::new(client)
            .download(stream, &output_path, self.progress_tx.clone())
            .await?;

        Ok(output_path)
    }
}

impl Default for Downloader {
    fn default() -> Self {
        Self::new()
    }
}
