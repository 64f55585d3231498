//! Feed item extraction
//!
//! This module turns the currently rendered feed items into post records:
//! - Reading each item's text body and skipping blank or already seen ones
//! - Collecting the item's image sources as absolute URLs
//! - Handing the images to the enricher, if one is configured

use crate::config::SelectorConfig;
use crate::crawler::read::first_text;
use crate::enrich::ImageEnricher;
use crate::output::{ImageRef, Post};
use crate::session::DomAccessor;
use crate::state::Deduplicator;
use crate::url::resolve_image_url;
use url::Url;

/// Extracts unseen posts from the visible feed
pub struct PostExtractor<'a> {
    selectors: &'a SelectorConfig,
    base_url: &'a Url,
    enricher: Option<&'a ImageEnricher>,
}

impl<'a> PostExtractor<'a> {
    /// Creates an extractor
    ///
    /// # Arguments
    ///
    /// * `selectors` - Container and sub-element selectors
    /// * `base_url` - URL that relative image sources resolve against
    /// * `enricher` - Optional image downloader and captioner
    pub fn new(
        selectors: &'a SelectorConfig,
        base_url: &'a Url,
        enricher: Option<&'a ImageEnricher>,
    ) -> Self {
        Self {
            selectors,
            base_url,
            enricher,
        }
    }

    /// Returns the posts visible on the page that `seen` does not know yet
    ///
    /// Returned posts are recorded in `seen`. An item whose text cannot be
    /// read is skipped, and an image whose source cannot be read is dropped
    /// from its post; neither ends the batch.
    ///
    /// # Arguments
    ///
    /// * `dom` - The page showing the feed
    /// * `seen` - Texts collected so far in this crawl
    /// * `next_index` - Document position the first new post will take
    pub async fn extract<D: DomAccessor>(
        &self,
        dom: &D,
        seen: &mut Deduplicator,
        next_index: usize,
    ) -> Vec<Post> {
        let containers = match dom.query_selector_all(&self.selectors.post_container).await {
            Ok(containers) => containers,
            Err(e) => {
                tracing::debug!("Failed to list feed items: {}", e);
                return Vec::new();
            }
        };

        let mut posts = Vec::new();

        for container in &containers {
            let text = match first_text(dom, Some(container), &self.selectors.post_text).await {
                Ok(Some(text)) => text,
                Ok(None) => continue,
                Err(e) => {
                    tracing::debug!("Skipping feed item: {}", e);
                    continue;
                }
            };

            if !seen.insert(&text) {
                continue;
            }

            let urls = self.image_urls(dom, container).await;
            let post_index = next_index + posts.len();

            let images = match self.enricher {
                Some(enricher) => enricher.enrich_all(post_index, &urls).await,
                None => urls.into_iter().map(ImageRef::unenriched).collect(),
            };

            posts.push(Post::new(text, images));
        }

        posts
    }

    /// Absolute image URLs inside one feed item, in document order
    async fn image_urls<D: DomAccessor>(&self, dom: &D, container: &D::Handle) -> Vec<String> {
        let images = match dom.query_within(container, &self.selectors.post_image).await {
            Ok(images) => images,
            Err(e) => {
                tracing::debug!("Failed to list images: {}", e);
                return Vec::new();
            }
        };

        let mut urls = Vec::new();
        for image in &images {
            match dom.read_attribute(image, "src").await {
                Ok(Some(src)) => {
                    if let Some(url) = resolve_image_url(&src, self.base_url) {
                        urls.push(url);
                    }
                }
                Ok(None) => {}
                Err(e) => tracing::debug!("Failed to read image source: {}", e),
            }
        }
        urls
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::ReplaySession;

    fn item(text: &str, images: &[&str]) -> String {
        let imgs: String = images
            .iter()
            .map(|src| format!(r#"<div data-testid="tweetPhoto"><img src="{}"></div>"#, src))
            .collect();
        format!(
            r#"<article data-testid="tweet"><div data-testid="tweetText">{}</div>{}</article>"#,
            text, imgs
        )
    }

    fn page(items: &[String]) -> String {
        format!("<html><body>{}</body></html>", items.concat())
    }

    fn base() -> Url {
        Url::parse("https://x.com/someone").unwrap()
    }

    #[tokio::test]
    async fn test_extracts_text_and_images() {
        let dom = ReplaySession::new(vec![page(&[
            item("first", &["https://pbs.example.com/media/1?format=jpg", "/rel.png"]),
            item("second", &[]),
        ])])
        .unwrap();
        let selectors = SelectorConfig::default();
        let base = base();
        let mut seen = Deduplicator::new();

        let posts = PostExtractor::new(&selectors, &base, None)
            .extract(&dom, &mut seen, 0)
            .await;

        assert_eq!(posts.len(), 2);
        assert_eq!(posts[0].text, "first");
        assert_eq!(posts[0].image_count, 2);
        assert_eq!(posts[0].images[1].url, "https://x.com/rel.png");
        assert!(posts[0].images[0].local_path.is_none());
        assert_eq!(posts[1].image_count, 0);
        assert_eq!(seen.len(), 2);
    }

    #[tokio::test]
    async fn test_skips_seen_and_empty() {
        let dom = ReplaySession::new(vec![page(&[
            item("old", &[]),
            item("   ", &[]),
            item("new", &[]),
            item("new", &[]),
            r#"<article data-testid="tweet"><p>no text body</p></article>"#.to_string(),
        ])])
        .unwrap();
        let selectors = SelectorConfig::default();
        let base = base();
        let mut seen = Deduplicator::new();
        seen.record("old");

        let posts = PostExtractor::new(&selectors, &base, None)
            .extract(&dom, &mut seen, 1)
            .await;

        let texts: Vec<_> = posts.iter().map(|p| p.text.as_str()).collect();
        assert_eq!(texts, vec!["new"]);
    }

    #[tokio::test]
    async fn test_drops_unusable_image_sources() {
        let dom = ReplaySession::new(vec![page(&[item(
            "post",
            &["data:image/png;base64,AAAA", "", "https://pbs.example.com/ok.jpg"],
        )])])
        .unwrap();
        let selectors = SelectorConfig::default();
        let base = base();
        let mut seen = Deduplicator::new();

        let posts = PostExtractor::new(&selectors, &base, None)
            .extract(&dom, &mut seen, 0)
            .await;

        assert_eq!(posts[0].image_count, 1);
        assert_eq!(posts[0].images[0].url, "https://pbs.example.com/ok.jpg");
    }

    #[tokio::test]
    async fn test_invalid_container_selector_yields_nothing() {
        let dom = ReplaySession::new(vec![page(&[item("post", &[])])]).unwrap();
        let selectors = SelectorConfig {
            post_container: "article[".to_string(),
            ..SelectorConfig::default()
        };
        let base = base();
        let mut seen = Deduplicator::new();

        let posts = PostExtractor::new(&selectors, &base, None)
            .extract(&dom, &mut seen, 0)
            .await;

        assert!(posts.is_empty());
        assert!(seen.is_empty());
    }
}
