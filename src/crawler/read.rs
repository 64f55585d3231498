//! Read-or-default helpers for element lookups
//!
//! Feed markup is rendered and re-rendered by the page while it is being
//! read, so a missing element or a failed read is expected and never fatal.

use crate::session::{DomAccessor, SessionResult};

/// Returns the value of a lookup, or `default` if it found nothing or failed
///
/// Failures are logged at debug level with `what` naming the lookup.
pub fn or_default<T>(what: &str, result: SessionResult<Option<T>>, default: T) -> T {
    match result {
        Ok(Some(value)) => value,
        Ok(None) => {
            tracing::debug!("No {} found, using default", what);
            default
        }
        Err(e) => {
            tracing::debug!("Failed to read {}: {}", what, e);
            default
        }
    }
}

/// Reads the trimmed text of the first element matching `selector`
///
/// With a `scope`, the lookup is restricted to that element's descendants.
/// Returns None if nothing matches or any step of the read fails.
pub async fn first_text<D: DomAccessor>(
    dom: &D,
    scope: Option<&D::Handle>,
    selector: &str,
) -> SessionResult<Option<String>> {
    let handle = match scope {
        Some(scope) => dom.query_within(scope, selector).await?.into_iter().next(),
        None => dom.query_selector(selector).await?,
    };

    let Some(handle) = handle else {
        return Ok(None);
    };

    let text = dom.read_text(&handle).await?;
    Ok(Some(text.trim().to_string()))
}

/// Reads the trimmed text under `selector`, or `default` on any failure
pub async fn text_or_default<D: DomAccessor>(
    dom: &D,
    scope: Option<&D::Handle>,
    selector: &str,
    default: &str,
) -> String {
    or_default(
        selector,
        first_text(dom, scope, selector).await,
        default.to_string(),
    )
}
