use serde::Deserialize;

/// Main configuration structure for feed-sweep
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub target: TargetConfig,
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub selectors: SelectorConfig,
    /// Image enrichment; absent means images are recorded by URL only
    pub enrichment: Option<EnrichmentConfig>,
    #[serde(default)]
    pub output: OutputConfig,
}

/// The profile to crawl
#[derive(Debug, Clone, Deserialize)]
pub struct TargetConfig {
    /// Account name, with or without a leading '@'
    pub username: String,

    /// Site root that profile URLs are built from
    #[serde(rename = "base-url", default = "default_base_url")]
    pub base_url: String,
}

/// Scroll loop tuning
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Settle delay after each scroll (milliseconds)
    #[serde(rename = "scroll-delay-ms", default = "default_scroll_delay_ms")]
    pub scroll_delay_ms: u64,

    /// Consecutive empty cycles that end the crawl
    #[serde(rename = "max-idle-scrolls", default = "default_max_idle_scrolls")]
    pub max_idle_scrolls: u32,

    /// Vertical scroll distance per cycle (pixels)
    #[serde(rename = "scroll-increment", default = "default_scroll_increment")]
    pub scroll_increment: i64,

    /// How long to wait for the profile or feed to first appear (milliseconds)
    #[serde(rename = "page-load-timeout-ms", default = "default_page_load_timeout_ms")]
    pub page_load_timeout_ms: u64,

    /// Extra wait before reading the profile header (milliseconds)
    #[serde(rename = "profile-settle-ms", default = "default_profile_settle_ms")]
    pub profile_settle_ms: u64,

    /// Overall deadline for the crawl (seconds)
    #[serde(rename = "max-crawl-secs", default)]
    pub max_crawl_secs: Option<u64>,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            scroll_delay_ms: default_scroll_delay_ms(),
            max_idle_scrolls: default_max_idle_scrolls(),
            scroll_increment: default_scroll_increment(),
            page_load_timeout_ms: default_page_load_timeout_ms(),
            profile_settle_ms: default_profile_settle_ms(),
            max_crawl_secs: None,
        }
    }
}

/// How the browser session is obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionMode {
    /// Launch a fresh, isolated browser
    #[default]
    Launch,
    /// Attach to a running browser's DevTools endpoint
    Attach,
    /// Replay saved HTML snapshots
    Replay,
}

/// Browser session configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    #[serde(default)]
    pub mode: SessionMode,

    /// Run the launched browser without a window
    #[serde(default = "default_true")]
    pub headless: bool,

    /// DevTools endpoint for attach mode
    pub endpoint: Option<String>,

    /// Snapshot directory for replay mode
    #[serde(rename = "replay-dir")]
    pub replay_dir: Option<String>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            mode: SessionMode::default(),
            headless: true,
            endpoint: None,
            replay_dir: None,
        }
    }
}

/// CSS selectors for the profile header and feed items
#[derive(Debug, Clone, Deserialize)]
pub struct SelectorConfig {
    #[serde(rename = "profile-name", default = "default_profile_name")]
    pub profile_name: String,

    #[serde(rename = "profile-handle", default = "default_profile_handle")]
    pub profile_handle: String,

    #[serde(rename = "profile-bio", default = "default_profile_bio")]
    pub profile_bio: String,

    /// One element per feed item
    #[serde(rename = "post-container", default = "default_post_container")]
    pub post_container: String,

    /// Text body, relative to the container
    #[serde(rename = "post-text", default = "default_post_text")]
    pub post_text: String,

    /// Image elements, relative to the container
    #[serde(rename = "post-image", default = "default_post_image")]
    pub post_image: String,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            profile_name: default_profile_name(),
            profile_handle: default_profile_handle(),
            profile_bio: default_profile_bio(),
            post_container: default_post_container(),
            post_text: default_post_text(),
            post_image: default_post_image(),
        }
    }
}

/// Image download and captioning
#[derive(Debug, Clone, Deserialize)]
pub struct EnrichmentConfig {
    /// Directory that downloaded images are written to
    #[serde(rename = "image-dir", default = "default_image_dir")]
    pub image_dir: String,

    /// HTTP endpoint that returns a caption for an image
    #[serde(rename = "caption-endpoint")]
    pub caption_endpoint: Option<String>,

    /// Maximum downloads in flight for one post
    #[serde(
        rename = "max-concurrent-downloads",
        default = "default_max_concurrent_downloads"
    )]
    pub max_concurrent_downloads: usize,
}

/// Output configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OutputConfig {
    /// Path of the JSON document; defaults to `<username>_data.json`
    #[serde(rename = "document-path")]
    pub document_path: Option<String>,

    /// Top-level key to nest the document under
    #[serde(rename = "source-key")]
    pub source_key: Option<String>,
}

fn default_base_url() -> String {
    "https://x.com".to_string()
}

fn default_scroll_delay_ms() -> u64 {
    2000
}

fn default_max_idle_scrolls() -> u32 {
    5
}

fn default_scroll_increment() -> i64 {
    2500
}

fn default_page_load_timeout_ms() -> u64 {
    15_000
}

fn default_profile_settle_ms() -> u64 {
    500
}

fn default_true() -> bool {
    true
}

fn default_profile_name() -> String {
    r#"div[data-testid="UserName"] span span"#.to_string()
}

fn default_profile_handle() -> String {
    r#"div[data-testid="UserName"] > div + div span span"#.to_string()
}

fn default_profile_bio() -> String {
    r#"div[data-testid="UserDescription"] span"#.to_string()
}

fn default_post_container() -> String {
    r#"article[data-testid="tweet"]"#.to_string()
}

fn default_post_text() -> String {
    r#"div[data-testid="tweetText"]"#.to_string()
}

fn default_post_image() -> String {
    r#"div[data-testid="tweetPhoto"] img"#.to_string()
}

fn default_image_dir() -> String {
    "images".to_string()
}

fn default_max_concurrent_downloads() -> usize {
    4
}

impl Config {
    /// The target username with any leading '@' removed
    pub fn username(&self) -> String {
        crate::url::normalize_username(&self.target.username)
    }

    /// Where the finished document is written
    pub fn document_path(&self) -> String {
        self.output
            .document_path
            .clone()
            .unwrap_or_else(|| format!("{}_data.json", self.username()))
    }
}
