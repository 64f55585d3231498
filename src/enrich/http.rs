//! HTTP image backend
//!
//! This module handles:
//! - Building the HTTP client used for image downloads
//! - Writing downloaded images to disk
//! - Requesting captions from an HTTP captioning service

use crate::enrich::traits::{EnrichError, EnrichResult, ImageBackend};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::Client;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// User agent sent with image and caption requests
const USER_AGENT: &str = concat!("feed-sweep/", env!("CARGO_PKG_VERSION"));

/// Builds an HTTP client for media requests
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client() -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(30))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Body returned by the captioning service
#[derive(Debug, Deserialize)]
struct CaptionResponse {
    caption: String,
}

/// Downloads images over HTTP and captions them through an HTTP service
///
/// The captioning service receives `{"image": "<base64>"}` and answers
/// `{"caption": "..."}`.
pub struct HttpImageBackend {
    client: Client,
    caption_endpoint: Option<String>,
}

impl HttpImageBackend {
    /// Creates a backend, optionally with a captioning endpoint
    pub fn new(caption_endpoint: Option<String>) -> EnrichResult<Self> {
        Ok(Self {
            client: build_http_client()?,
            caption_endpoint,
        })
    }
}

#[async_trait]
impl ImageBackend for HttpImageBackend {
    async fn download(&self, url: &str, dest: &Path) -> EnrichResult<PathBuf> {
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(EnrichError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let bytes = response.bytes().await?;

        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(dest, &bytes).await?;

        tracing::debug!("Saved {} ({} bytes) to {}", url, bytes.len(), dest.display());
        Ok(dest.to_path_buf())
    }

    async fn caption(&self, path: &Path) -> EnrichResult<String> {
        let Some(endpoint) = &self.caption_endpoint else {
            return Err(EnrichError::CaptionUnavailable(
                "no caption endpoint configured".to_string(),
            ));
        };

        let bytes = tokio::fs::read(path).await?;
        let body = serde_json::json!({ "image": STANDARD.encode(&bytes) });

        let response = self.client.post(endpoint).json(&body).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(EnrichError::Status {
                url: endpoint.clone(),
                status: status.as_u16(),
            });
        }

        let parsed: CaptionResponse = response
            .json()
            .await
            .map_err(|e| EnrichError::Decode(e.to_string()))?;

        let caption = parsed.caption.trim();
        if caption.is_empty() {
            return Err(EnrichError::CaptionUnavailable(
                "service returned an empty caption".to_string(),
            ));
        }

        Ok(caption.to_string())
    }

    fn captions_enabled(&self) -> bool {
        self.caption_endpoint.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_download_writes_file() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/media/a.jpg"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"JPEGDATA".to_vec()))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("nested").join("a.jpg");
        let backend = HttpImageBackend::new(None).unwrap();

        let saved = backend
            .download(&format!("{}/media/a.jpg", server.uri()), &dest)
            .await
            .unwrap();

        assert_eq!(saved, dest);
        assert_eq!(std::fs::read(&dest).unwrap(), b"JPEGDATA");
    }

    #[tokio::test]
    async fn test_download_rejects_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("missing.jpg");
        let backend = HttpImageBackend::new(None).unwrap();

        let result = backend
            .download(&format!("{}/media/missing.jpg", server.uri()), &dest)
            .await;

        assert!(matches!(result, Err(EnrichError::Status { status: 404, .. })));
        assert!(!dest.exists());
    }

    #[tokio::test]
    async fn test_caption_posts_base64() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/caption"))
            .and(body_json(serde_json::json!({ "image": STANDARD.encode(b"PNG") })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "caption": " a cat on a sofa " })),
            )
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let image = dir.path().join("cat.png");
        std::fs::write(&image, b"PNG").unwrap();

        let backend = HttpImageBackend::new(Some(format!("{}/caption", server.uri()))).unwrap();
        assert!(backend.captions_enabled());

        let caption = backend.caption(&image).await.unwrap();
        assert_eq!(caption, "a cat on a sofa");
    }

    #[tokio::test]
    async fn test_caption_without_endpoint() {
        let backend = HttpImageBackend::new(None).unwrap();
        assert!(!backend.captions_enabled());

        let result = backend.caption(Path::new("unused.png")).await;
        assert!(matches!(result, Err(EnrichError::CaptionUnavailable(_))));
    }

    #[tokio::test]
    async fn test_caption_bad_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let image = dir.path().join("x.png");
        std::fs::write(&image, b"PNG").unwrap();

        let backend = HttpImageBackend::new(Some(server.uri())).unwrap();
        let result = backend.caption(&image).await;
        assert!(matches!(result, Err(EnrichError::Decode(_))));
    }
}
