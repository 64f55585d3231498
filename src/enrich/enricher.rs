//! Per-image enrichment for collected posts

use crate::config::EnrichmentConfig;
use crate::enrich::http::HttpImageBackend;
use crate::enrich::traits::{EnrichResult, ImageBackend};
use crate::output::ImageRef;
use crate::url::image_extension;
use futures::stream::{self, StreamExt};
use std::path::PathBuf;
use std::sync::Arc;

/// Turns image URLs into [`ImageRef`] records with a local copy and caption
///
/// Enrichment never fails: a failed download leaves `local_path` and
/// `caption` empty, a failed caption leaves only `caption` empty.
#[derive(Clone)]
pub struct ImageEnricher {
    backend: Arc<dyn ImageBackend>,
    image_dir: PathBuf,
    username: String,
    max_concurrent: usize,
}

impl ImageEnricher {
    /// Creates an enricher over an arbitrary backend
    ///
    /// # Arguments
    ///
    /// * `backend` - Download and caption implementation
    /// * `image_dir` - Directory that images are written to
    /// * `username` - Crawled account, used as the file name prefix
    /// * `max_concurrent` - Downloads in flight for one post (at least 1)
    pub fn new(
        backend: Arc<dyn ImageBackend>,
        image_dir: impl Into<PathBuf>,
        username: &str,
        max_concurrent: usize,
    ) -> Self {
        Self {
            backend,
            image_dir: image_dir.into(),
            username: username.to_string(),
            max_concurrent: max_concurrent.max(1),
        }
    }

    /// Creates an enricher backed by HTTP downloads and the configured
    /// captioning endpoint
    pub fn from_config(config: &EnrichmentConfig, username: &str) -> EnrichResult<Self> {
        let backend = HttpImageBackend::new(config.caption_endpoint.clone())?;
        Ok(Self::new(
            Arc::new(backend),
            &config.image_dir,
            username,
            config.max_concurrent_downloads,
        ))
    }

    /// Deterministic destination for one image
    ///
    /// `<image-dir>/<username>_post<post_index>_img<image_index>.<ext>`
    pub fn local_path(&self, url: &str, post_index: usize, image_index: usize) -> PathBuf {
        self.image_dir.join(format!(
            "{}_post{}_img{}.{}",
            self.username,
            post_index,
            image_index,
            image_extension(url)
        ))
    }

    /// Downloads and captions one image
    pub async fn enrich(&self, url: &str, post_index: usize, image_index: usize) -> ImageRef {
        let mut image = ImageRef::unenriched(url);
        let dest = self.local_path(url, post_index, image_index);

        let saved = match self.backend.download(url, &dest).await {
            Ok(path) => path,
            Err(e) => {
                tracing::warn!("Failed to download image {}: {}", url, e);
                return image;
            }
        };
        image.local_path = Some(saved.to_string_lossy().into_owned());

        if self.backend.captions_enabled() {
            match self.backend.caption(&saved).await {
                Ok(caption) => image.caption = Some(caption),
                Err(e) => tracing::warn!("Failed to caption {}: {}", saved.display(), e),
            }
        }

        image
    }

    /// Enriches every image of one post
    ///
    /// Up to `max_concurrent` images are fetched at once; the result keeps
    /// the order of `urls`.
    pub async fn enrich_all(&self, post_index: usize, urls: &[String]) -> Vec<ImageRef> {
        stream::iter(urls.iter().enumerate())
            .map(|(image_index, url)| self.enrich(url, post_index, image_index))
            .buffered(self.max_concurrent)
            .collect()
            .await
    }
}
