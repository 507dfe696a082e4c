//! HTTP client for video platform API requests

use crate::core::video_info::VideoId;
use crate::error::YtdrError;
use reqwest::{Client, ClientBuilder};
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

/// Default metadata endpoint
pub const DEFAULT_METADATA_ENDPOINT: &str = "https://youtube.com/get_video_info";

/// Default base URL of watch pages
pub const DEFAULT_WATCH_BASE: &str = "https://www.youtube.com";

/// Embed URL prefix sent as context along with the metadata request
pub const EMBED_URL_PREFIX: &str = "https://youtube.googleapis.com/v/";

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Connect timeout. reqwest bounds TCP dial and TLS handshake together,
    /// so this is the budget for both.
    pub connect_timeout: Duration,
    /// How long an idle pooled connection is kept
    pub idle_timeout: Duration,
    /// TCP keep-alive interval
    pub tcp_keepalive: Duration,
    /// SOCKS5 proxy address (`host:port` or `socks5://host:port`)
    pub socks5_proxy: Option<String>,
    /// User agent string
    pub user_agent: Option<String>,
    /// Metadata endpoint URL
    pub metadata_endpoint: String,
    /// Base URL used to build watch page URLs
    pub watch_base: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(60),
            tcp_keepalive: Duration::from_secs(30),
            socks5_proxy: None,
            user_agent: None,
            metadata_endpoint: DEFAULT_METADATA_ENDPOINT.to_string(),
            watch_base: DEFAULT_WATCH_BASE.to_string(),
        }
    }
}

/// Normalize a SOCKS5 proxy address into a proxy URL
pub fn socks5_proxy_url(address: &str) -> Result<String, YtdrError> {
    let unavailable = |reason: &str| YtdrError::ProxyUnavailable {
        address: address.to_string(),
        reason: reason.to_string(),
    };

    let address = address.trim();
    if address.is_empty() {
        return Err(unavailable("empty proxy address"));
    }

    let proxy_url = if address.contains("://") {
        address.to_string()
    } else {
        format!("socks5://{}", address)
    };

    let parsed = Url::parse(&proxy_url).map_err(|e| unavailable(&e.to_string()))?;
    match parsed.scheme() {
        "socks5" | "socks5h" => {}
        other => return Err(unavailable(&format!("unsupported proxy scheme '{}'", other))),
    }
    if parsed.host_str().is_none() || parsed.port().is_none() {
        return Err(unavailable("proxy address must be host:port"));
    }

    Ok(proxy_url)
}

/// Video platform HTTP client.
///
/// Built once per session and shared by the metadata request, the cipher
/// script requests and the media transfer.
#[derive(Debug, Clone)]
pub struct VideoClient {
    client: Client,
    config: HttpClientConfig,
}

impl VideoClient {
    /// Create a new client with default configuration
    pub fn new() -> Result<Self, YtdrError> {
        Self::with_config(HttpClientConfig::default())
    }

    /// Create a new client with custom configuration
    pub fn with_config(config: HttpClientConfig) -> Result<Self, YtdrError> {
        let mut builder = ClientBuilder::new()
            .connect_timeout(config.connect_timeout)
            .pool_idle_timeout(config.idle_timeout)
            .tcp_keepalive(config.tcp_keepalive)
            .gzip(true)
            .brotli(true);

        if let Some(user_agent) = &config.user_agent {
            builder = builder.user_agent(user_agent);
        }

        if let Some(address) = &config.socks5_proxy {
            let proxy_url = socks5_proxy_url(address)?;
            let proxy = reqwest::Proxy::all(&proxy_url).map_err(|e| {
                YtdrError::ProxyUnavailable {
                    address: address.clone(),
                    reason: e.to_string(),
                }
            })?;
            builder = builder.proxy(proxy);
            info!("Using http with proxy {}", address);
        }

        let client = builder.build().map_err(|e| match &config.socks5_proxy {
            Some(address) => YtdrError::ProxyUnavailable {
                address: address.clone(),
                reason: e.to_string(),
            },
            None => YtdrError::Http(e),
        })?;

        Ok(Self { client, config })
    }

    /// Get the underlying HTTP client
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Get the client configuration
    pub fn config(&self) -> &HttpClientConfig {
        &self.config
    }

    /// Build the metadata request URL for a video
    pub fn metadata_url(&self, video_id: &VideoId) -> Result<Url, YtdrError> {
        let eurl = format!("{}{}", EMBED_URL_PREFIX, video_id);
        let url = Url::parse_with_params(
            &self.config.metadata_endpoint,
            &[("video_id", video_id.as_str()), ("eurl", eurl.as_str())],
        )?;
        Ok(url)
    }

    /// Build the watch page URL for a video
    pub fn watch_url(&self, video_id: &VideoId) -> String {
        format!(
            "{}/watch?v={}",
            self.config.watch_base.trim_end_matches('/'),
            video_id
        )
    }

    /// Fetch the raw metadata response body for a video
    pub async fn fetch_metadata(&self, video_id: &VideoId) -> Result<String, YtdrError> {
        let url = self.metadata_url(video_id)?;
        debug!("url: {}", url);

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if status != reqwest::StatusCode::OK {
            warn!("Metadata request returned status {}", status);
            return Err(YtdrError::MetadataStatus(status.as_u16()));
        }

        Ok(response.text().await?)
    }

    /// Fetch a text document (watch page, player script)
    pub async fn fetch_text(&self, url: &str) -> Result<String, YtdrError> {
        debug!("Fetching {}", url);
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if status != reqwest::StatusCode::OK {
            warn!("Request to {} returned status {}", url, status);
            return Err(YtdrError::TransferStatus(status.as_u16()));
        }
        Ok(response.text().await?)
    }

    /// Create a GET request for media content
    pub fn media_request(&self, url: &str) -> reqwest::RequestBuilder {
        self.client.get(url)
    }
}
