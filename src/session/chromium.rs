//! Live browser sessions over the Chrome DevTools Protocol
//!
//! A session is either launched fresh (isolated profile, headless by default)
//! or attached to a browser that is already running with
//! `--remote-debugging-port`, which is how an authenticated profile is reused.

use crate::session::traits::{DomAccessor, SessionError, SessionResult};
use async_trait::async_trait;
use chromiumoxide::error::CdpError;
use chromiumoxide::{Browser, BrowserConfig, Element, Page};
use futures::StreamExt;
use std::time::Duration;
use tokio::task::JoinHandle;

/// How many times to poll for tabs after attaching
const ATTACH_PAGE_POLLS: u32 = 10;

/// Delay between tab polls after attaching
const ATTACH_PAGE_POLL_DELAY: Duration = Duration::from_millis(200);

/// A running browser and the task that pumps its protocol events
pub struct ChromiumSession {
    browser: Browser,
    handler: JoinHandle<()>,
    attached: bool,
}

impl ChromiumSession {
    /// Launches a new browser with an isolated profile
    pub async fn launch(headless: bool) -> SessionResult<Self> {
        let mut builder = BrowserConfig::builder();
        if !headless {
            builder = builder.with_head();
        }
        let config = builder.build().map_err(SessionError::Launch)?;

        let (browser, handler) = Browser::launch(config)
            .await
            .map_err(|e| SessionError::Launch(e.to_string()))?;

        tracing::info!("Launched browser (headless: {})", headless);

        Ok(Self {
            browser,
            handler: spawn_handler(handler),
            attached: false,
        })
    }

    /// Attaches to a browser exposing a DevTools endpoint
    ///
    /// `endpoint` may be the HTTP address (`http://127.0.0.1:9222`) or the
    /// browser's websocket debugger URL.
    pub async fn attach(endpoint: &str) -> SessionResult<Self> {
        let (mut browser, handler) =
            Browser::connect(endpoint)
                .await
                .map_err(|e| SessionError::Attach {
                    endpoint: endpoint.to_string(),
                    message: e.to_string(),
                })?;
        let handler = spawn_handler(handler);

        // Existing tabs are only visible once their targets have been fetched
        browser
            .fetch_targets()
            .await
            .map_err(|e| SessionError::Attach {
                endpoint: endpoint.to_string(),
                message: e.to_string(),
            })?;

        tracing::info!("Attached to browser at {}", endpoint);

        Ok(Self {
            browser,
            handler,
            attached: true,
        })
    }

    /// Returns the page to crawl with
    ///
    /// An attached session reuses its first open tab so that the existing
    /// login state applies; a launched session opens a blank tab.
    pub async fn open_page(&self) -> SessionResult<ChromiumPage> {
        if !self.attached {
            let page = self
                .browser
                .new_page("about:blank")
                .await
                .map_err(protocol)?;
            return Ok(ChromiumPage { page });
        }

        for _ in 0..ATTACH_PAGE_POLLS {
            let pages = self.browser.pages().await.map_err(protocol)?;
            if let Some(page) = pages.into_iter().next() {
                return Ok(ChromiumPage { page });
            }
            tokio::time::sleep(ATTACH_PAGE_POLL_DELAY).await;
        }

        Err(SessionError::NoPage)
    }

    /// Shuts the session down
    ///
    /// A launched browser is closed; an attached browser is left running and
    /// only the protocol connection is dropped.
    pub async fn close(mut self) {
        if !self.attached {
            if let Err(e) = self.browser.close().await {
                tracing::warn!("Failed to close browser cleanly: {}", e);
            }
            let _ = self.browser.wait().await;
        }
        self.handler.abort();
    }
}

fn spawn_handler(mut handler: chromiumoxide::Handler) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = handler.next().await {
            if let Err(e) = event {
                tracing::debug!("Browser event error: {}", e);
            }
        }
    })
}

fn protocol(e: CdpError) -> SessionError {
    SessionError::Protocol(e.to_string())
}

/// One browser tab exposed as a [`DomAccessor`]
#[derive(Clone)]
pub struct ChromiumPage {
    page: Page,
}

#[async_trait]
impl DomAccessor for ChromiumPage {
    type Handle = Element;

    async fn navigate_to(&self, url: &str) -> SessionResult<()> {
        self.page
            .goto(url)
            .await
            .map_err(|e| SessionError::Navigation {
                url: url.to_string(),
                message: e.to_string(),
            })?;
        Ok(())
    }

    async fn query_selector(&self, selector: &str) -> SessionResult<Option<Element>> {
        // find_element reports "no match" as an error, find_elements does not
        let elements = self.page.find_elements(selector).await.map_err(protocol)?;
        Ok(elements.into_iter().next())
    }

    async fn query_selector_all(&self, selector: &str) -> SessionResult<Vec<Element>> {
        self.page.find_elements(selector).await.map_err(protocol)
    }

    async fn query_within(&self, scope: &Element, selector: &str) -> SessionResult<Vec<Element>> {
        scope.find_elements(selector).await.map_err(protocol)
    }

    async fn read_text(&self, handle: &Element) -> SessionResult<String> {
        let text = handle.inner_text().await.map_err(protocol)?;
        Ok(text.unwrap_or_default())
    }

    async fn read_attribute(&self, handle: &Element, name: &str) -> SessionResult<Option<String>> {
        handle.attribute(name).await.map_err(protocol)
    }

    async fn scroll_by(&self, dx: i64, dy: i64) -> SessionResult<()> {
        self.page
            .evaluate(format!("window.scrollBy({}, {})", dx, dy))
            .await
            .map_err(protocol)?;
        Ok(())
    }

    async fn wait_ms(&self, duration_ms: u64) -> SessionResult<()> {
        tokio::time::sleep(Duration::from_millis(duration_ms)).await;
        Ok(())
    }
}
