//! Socket endpoint resolution.

use crate::{TransportError, TransportResult};
use url::Url;

/// Resolve a socket target against the page origin.
///
/// URLs already carrying a `ws:`/`wss:` scheme (any case) are used as is.
/// `http(s)` URLs switch to the matching socket scheme; other absolute URLs
/// are returned unchanged for the connector to accept or reject. Anything
/// else is a site-relative path and is promoted to `wss://` when the origin is served
/// over https, `ws://` otherwise.
pub fn resolve_socket_url(target: &str, origin: &Url) -> TransportResult<Url> {
    let target = target.trim();

    if has_scheme(target, "ws:") || has_scheme(target, "wss:") {
        return parse(target);
    }

    if has_scheme(target, "http:") || has_scheme(target, "https:") {
        let mut url = parse(target)?;
        let scheme = if url.scheme() == "https" { "wss" } else { "ws" };
        url.set_scheme(scheme)
            .map_err(|_| TransportError::InvalidUrl(target.to_string()))?;
        return Ok(url);
    }

    if is_absolute(target) {
        return parse(target);
    }

    let scheme = if origin.scheme() == "https" { "wss" } else { "ws" };
    let host = origin
        .host_str()
        .ok_or_else(|| TransportError::InvalidUrl(format!("origin has no host: {origin}")))?;
    let authority = match origin.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    };
    let separator = if target.starts_with('/') { "" } else { "/" };

    parse(&format!("{scheme}://{authority}{separator}{target}"))
}

fn has_scheme(target: &str, scheme: &str) -> bool {
    target
        .get(..scheme.len())
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case(scheme))
}

/// `scheme://...` with an RFC 3986 scheme.
fn is_absolute(target: &str) -> bool {
    match target.split_once("://") {
        Some((scheme, _)) => {
            let mut chars = scheme.chars();
            chars.next().is_some_and(|c| c.is_ascii_alphabetic())
                && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        }
        None => false,
    }
}

fn parse(raw: &str) -> TransportResult<Url> {
    Url::parse(raw).map_err(|e| TransportError::InvalidUrl(format!("{raw}: {e}")))
}
