//! Profile header extraction

use crate::config::SelectorConfig;
use crate::crawler::read::text_or_default;
use crate::output::Profile;
use crate::session::DomAccessor;

/// Reads the profile header shown above the feed
pub struct ProfileExtractor<'a> {
    selectors: &'a SelectorConfig,
    settle_ms: u64,
}

impl<'a> ProfileExtractor<'a> {
    pub fn new(selectors: &'a SelectorConfig, settle_ms: u64) -> Self {
        Self {
            selectors,
            settle_ms,
        }
    }

    /// Extracts the profile of `username`
    ///
    /// Waits `settle_ms` for the header to render, then reads name, handle
    /// and bio independently. A field that cannot be read keeps its default:
    /// empty for name and bio, `@<username>` for the handle. Never fails.
    ///
    /// # Arguments
    ///
    /// * `dom` - The page showing the profile
    /// * `username` - Account name without a leading '@'
    /// * `profile_url` - URL the page was loaded from
    pub async fn extract<D: DomAccessor>(
        &self,
        dom: &D,
        username: &str,
        profile_url: &str,
    ) -> Profile {
        if let Err(e) = dom.wait_ms(self.settle_ms).await {
            tracing::debug!("Profile settle wait failed: {}", e);
        }

        let fallback = Profile::fallback(username, profile_url);

        let name = text_or_default(dom, None, &self.selectors.profile_name, &fallback.name).await;
        let handle =
            text_or_default(dom, None, &self.selectors.profile_handle, &fallback.handle).await;
        let bio = text_or_default(dom, None, &self.selectors.profile_bio, &fallback.bio).await;

        tracing::info!("Profile: {} ({})", name, handle);

        Profile {
            name,
            handle,
            bio,
            profile_url: fallback.profile_url,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::ReplaySession;

    const HEADER: &str = r#"<html><body>
        <div data-testid="UserName">
          <div><span><span>Jane Doe</span></span></div>
          <div><span><span>@jane</span></span></div>
        </div>
        <div data-testid="UserDescription"><span>Writes about birds.</span></div>
    </body></html>"#;

    #[tokio::test]
    async fn test_extracts_header() {
        let dom = ReplaySession::new(vec![HEADER.to_string()]).unwrap();
        let selectors = SelectorConfig::default();

        let profile = ProfileExtractor::new(&selectors, 500)
            .extract(&dom, "jane", "https://x.com/jane")
            .await;

        assert_eq!(profile.name, "Jane Doe");
        assert_eq!(profile.handle, "@jane");
        assert_eq!(profile.bio, "Writes about birds.");
        assert_eq!(profile.profile_url, "https://x.com/jane");
        assert_eq!(dom.waited_ms(), 500);
    }

    #[tokio::test]
    async fn test_missing_header_uses_defaults() {
        let dom = ReplaySession::new(vec!["<html><body></body></html>".to_string()]).unwrap();
        let selectors = SelectorConfig::default();

        let profile = ProfileExtractor::new(&selectors, 0)
            .extract(&dom, "u", "https://x.com/u")
            .await;

        assert_eq!(profile, Profile::fallback("u", "https://x.com/u"));
        assert_eq!(profile.handle, "@u");
        assert_eq!(profile.name, "");
        assert_eq!(profile.bio, "");
    }

    #[tokio::test]
    async fn test_partial_header() {
        let dom = ReplaySession::new(vec![
            r#"<html><body><div data-testid="UserDescription"><span>bio only</span></div></body></html>"#
                .to_string(),
        ])
        .unwrap();
        let selectors = SelectorConfig::default();

        let profile = ProfileExtractor::new(&selectors, 0)
            .extract(&dom, "u", "https://x.com/u")
            .await;

        assert_eq!(profile.name, "");
        assert_eq!(profile.handle, "@u");
        assert_eq!(profile.bio, "bio only");
    }
}
