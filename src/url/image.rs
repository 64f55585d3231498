use url::Url;

/// Extension used when an image URL does not reveal its format
const DEFAULT_EXTENSION: &str = "jpg";

/// Resolves an image `src` attribute to an absolute URL
///
/// Returns None if the source should not be downloaded:
/// - empty sources
/// - `data:` and `blob:` URIs (inline or page-local content)
/// - sources that do not resolve to HTTP(S)
pub fn resolve_image_url(src: &str, base_url: &Url) -> Option<String> {
    let src = src.trim();

    if src.is_empty() || src.starts_with("data:") || src.starts_with("blob:") {
        return None;
    }

    match base_url.join(src) {
        Ok(absolute) if absolute.scheme() == "http" || absolute.scheme() == "https" => {
            Some(absolute.to_string())
        }
        _ => None,
    }
}

/// Picks a file extension for a downloaded image
///
/// Media CDNs commonly serve `/media/<id>?format=jpg&name=small`, so an
/// explicit `format` query parameter wins over the path suffix.
pub fn image_extension(image_url: &str) -> String {
    let Ok(url) = Url::parse(image_url) else {
        return DEFAULT_EXTENSION.to_string();
    };

    let from_query = url
        .query_pairs()
        .find(|(key, _)| key == "format")
        .map(|(_, value)| value.into_owned());

    let from_path = url
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .and_then(|name| name.rsplit_once('.'))
        .map(|(_, ext)| ext.to_string());

    from_query
        .or(from_path)
        .map(|ext| ext.to_ascii_lowercase())
        .filter(|ext| {
            !ext.is_empty() && ext.len() <= 5 && ext.chars().all(|c| c.is_ascii_alphanumeric())
        })
        .unwrap_or_else(|| DEFAULT_EXTENSION.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_url() -> Url {
        Url::parse("https://x.com/someone").unwrap()
    }

    #[test]
    fn test_resolve_absolute() {
        assert_eq!(
            resolve_image_url("https://pbs.example.com/media/a.png", &base_url()),
            Some("https://pbs.example.com/media/a.png".to_string())
        );
    }

    #[test]
    fn test_resolve_relative() {
        assert_eq!(
            resolve_image_url("/media/a.png", &base_url()),
            Some("https://x.com/media/a.png".to_string())
        );
    }

    #[test]
    fn test_skip_inline_sources() {
        assert_eq!(resolve_image_url("", &base_url()), None);
        assert_eq!(resolve_image_url("data:image/png;base64,AAAA", &base_url()), None);
        assert_eq!(resolve_image_url("blob:https://x.com/123", &base_url()), None);
    }

    #[test]
    fn test_extension_from_query() {
        assert_eq!(
            image_extension("https://pbs.example.com/media/abc?format=png&name=small"),
            "png"
        );
    }

    #[test]
    fn test_extension_from_path() {
        assert_eq!(image_extension("https://cdn.example.com/a/b/photo.JPEG"), "jpeg");
    }

    #[test]
    fn test_extension_fallback() {
        assert_eq!(image_extension("https://cdn.example.com/media/abc"), "jpg");
        assert_eq!(image_extension("not a url"), "jpg");
        assert_eq!(image_extension("https://cdn.example.com/a.toolongext"), "jpg");
    }
}
