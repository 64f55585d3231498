use crate::UrlError;
use url::Url;

/// Normalizes a username as typed by a user
///
/// Surrounding whitespace, a leading `@` and trailing slashes are removed.
///
/// # Examples
///
/// ```
/// use feed_sweep::url::normalize_username;
///
/// assert_eq!(normalize_username("  @someone/ "), "someone");
/// ```
pub fn normalize_username(raw: &str) -> String {
    raw.trim()
        .trim_start_matches('@')
        .trim_end_matches('/')
        .to_string()
}

/// Builds the canonical profile URL for a username
///
/// # Arguments
///
/// * `base_url` - Site root, e.g. `https://x.com`
/// * `username` - Normalized username
///
/// # Returns
///
/// * `Ok(String)` - `<base>/<username>`
/// * `Err(UrlError)` - The base URL is malformed or not HTTP(S)
pub fn profile_url(base_url: &str, username: &str) -> Result<String, UrlError> {
    let base = Url::parse(base_url).map_err(|e| UrlError::Parse(e.to_string()))?;

    if base.scheme() != "http" && base.scheme() != "https" {
        return Err(UrlError::InvalidScheme(base.scheme().to_string()));
    }

    if base.host_str().is_none() {
        return Err(UrlError::MissingDomain);
    }

    Ok(format!("{}/{}", base_url.trim_end_matches('/'), username))
}
