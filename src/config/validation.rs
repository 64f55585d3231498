use crate::config::types::{
    Config, CrawlerConfig, EnrichmentConfig, OutputConfig, SelectorConfig, SessionConfig,
    SessionMode, TargetConfig,
};
use crate::ConfigError;
use scraper::Selector;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_target_config(&config.target)?;
    validate_crawler_config(&config.crawler)?;
    validate_session_config(&config.session)?;
    validate_selector_config(&config.selectors)?;
    if let Some(enrichment) = &config.enrichment {
        validate_enrichment_config(enrichment)?;
    }
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates the crawl target
fn validate_target_config(config: &TargetConfig) -> Result<(), ConfigError> {
    let username = crate::url::normalize_username(&config.username);

    if username.is_empty() {
        return Err(ConfigError::Validation(
            "username cannot be empty".to_string(),
        ));
    }

    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.' || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "username must contain only letters, digits, '_', '.' or '-', got '{}'",
            username
        )));
    }

    // "." and ".." would turn the profile URL into a path traversal
    if username.chars().all(|c| c == '.') {
        return Err(ConfigError::Validation(format!(
            "username cannot consist only of dots, got '{}'",
            username
        )));
    }

    let base = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base-url: {}", e)))?;

    if base.scheme() != "http" && base.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "base-url '{}' must use HTTP or HTTPS",
            config.base_url
        )));
    }

    Ok(())
}

/// Validates scroll loop tuning
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.scroll_delay_ms < 100 {
        return Err(ConfigError::Validation(format!(
            "scroll-delay-ms must be >= 100ms, got {}ms",
            config.scroll_delay_ms
        )));
    }

    if config.max_idle_scrolls < 1 || config.max_idle_scrolls > 1000 {
        return Err(ConfigError::Validation(format!(
            "max-idle-scrolls must be between 1 and 1000, got {}",
            config.max_idle_scrolls
        )));
    }

    if config.scroll_increment <= 0 {
        return Err(ConfigError::Validation(format!(
            "scroll-increment must be positive, got {}",
            config.scroll_increment
        )));
    }

    if config.page_load_timeout_ms < 1000 {
        return Err(ConfigError::Validation(format!(
            "page-load-timeout-ms must be >= 1000ms, got {}ms",
            config.page_load_timeout_ms
        )));
    }

    if config.max_crawl_secs == Some(0) {
        return Err(ConfigError::Validation(
            "max-crawl-secs must be positive when set".to_string(),
        ));
    }

    Ok(())
}

/// Validates that each session mode has what it needs
fn validate_session_config(config: &SessionConfig) -> Result<(), ConfigError> {
    match config.mode {
        SessionMode::Launch => Ok(()),
        SessionMode::Attach => {
            let endpoint = config.endpoint.as_deref().ok_or_else(|| {
                ConfigError::Validation("attach mode requires session.endpoint".to_string())
            })?;

            let url = Url::parse(endpoint)
                .map_err(|e| ConfigError::InvalidUrl(format!("Invalid endpoint: {}", e)))?;

            if !matches!(url.scheme(), "http" | "https" | "ws" | "wss") {
                return Err(ConfigError::InvalidUrl(format!(
                    "endpoint '{}' must be an http(s) or ws(s) URL",
                    endpoint
                )));
            }

            Ok(())
        }
        SessionMode::Replay => match config.replay_dir.as_deref() {
            Some(dir) if !dir.is_empty() => Ok(()),
            _ => Err(ConfigError::Validation(
                "replay mode requires session.replay-dir".to_string(),
            )),
        },
    }
}

/// Validates that no selector is blank
fn validate_selector_config(config: &SelectorConfig) -> Result<(), ConfigError> {
    let selectors = [
        ("profile-name", &config.profile_name),
        ("profile-handle", &config.profile_handle),
        ("profile-bio", &config.profile_bio),
        ("post-container", &config.post_container),
        ("post-text", &config.post_text),
        ("post-image", &config.post_image),
    ];

    for (name, selector) in selectors {
        if selector.trim().is_empty() {
            return Err(ConfigError::InvalidSelector(format!(
                "{} cannot be empty",
                name
            )));
        }

        if let Err(e) = Selector::parse(selector) {
            return Err(ConfigError::InvalidSelector(format!(
                "{} '{}' is not a valid CSS selector: {:?}",
                name, selector, e
            )));
        }
    }

    Ok(())
}

/// Validates image enrichment settings
fn validate_enrichment_config(config: &EnrichmentConfig) -> Result<(), ConfigError> {
    if config.image_dir.is_empty() {
        return Err(ConfigError::Validation(
            "image-dir cannot be empty".to_string(),
        ));
    }

    if config.max_concurrent_downloads < 1 || config.max_concurrent_downloads > 32 {
        return Err(ConfigError::Validation(format!(
            "max-concurrent-downloads must be between 1 and 32, got {}",
            config.max_concurrent_downloads
        )));
    }

    if let Some(endpoint) = &config.caption_endpoint {
        Url::parse(endpoint).map_err(|e| {
            ConfigError::InvalidUrl(format!("Invalid caption-endpoint: {}", e))
        })?;
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.document_path.as_deref() == Some("") {
        return Err(ConfigError::Validation(
            "document-path cannot be empty".to_string(),
        ));
    }

    if config.source_key.as_deref() == Some("") {
        return Err(ConfigError::Validation(
            "source-key cannot be empty".to_string(),
        ));
    }

    Ok(())
}
