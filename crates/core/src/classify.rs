//! Resource classification.
//!
//! Decides which requests may be answered from the cache. Only `GET`
//! requests for URLs ending in a known static-asset extension qualify.
//! Matching is on the raw URL string, so a query string or fragment after
//! the extension makes the URL ineligible.

/// File extensions treated as cacheable static assets.
pub const CACHEABLE_EXTENSIONS: &[&str] =
    &[".js", ".css", ".png", ".jpg", ".jpeg", ".gif", ".svg", ".woff", ".woff2", ".ttf"];

/// Content type used when the extension has no specific mapping.
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Whether `url` names a cache-eligible static resource.
pub fn is_cache_eligible(url: &str) -> bool {
    if url.is_empty() {
        return false;
    }
    let lower = url.to_lowercase();
    CACHEABLE_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

/// Whether a request method may be served from the cache.
///
/// An absent method means `GET`.
pub fn is_cache_eligible_method(method: Option<&str>) -> bool {
    method.is_none_or(|m| m.eq_ignore_ascii_case("GET"))
}

/// Content type synthesized for a cache hit on `url`.
pub fn content_type_for(url: &str) -> &'static str {
    let lower = url.to_lowercase();
    let ext = match lower.rfind('.') {
        Some(idx) => &lower[idx + 1..],
        None => return DEFAULT_CONTENT_TYPE,
    };

    match ext {
        "js" => "application/javascript",
        "css" => "text/css",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        _ => DEFAULT_CONTENT_TYPE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eligible_extensions() {
        for url in [
            "https://example.com/app.js",
            "https://example.com/site.css",
            "https://cdn.example.com/img/logo.PNG",
            "https://example.com/a.jpg",
            "https://example.com/a.jpeg",
            "https://example.com/a.gif",
            "https://example.com/icon.svg",
            "https://example.com/font.woff",
            "https://example.com/font.woff2",
            "https://example.com/font.ttf",
        ] {
            assert!(is_cache_eligible(url), "{url} should be eligible");
        }
    }

    #[test]
    fn test_ineligible_urls() {
        assert!(!is_cache_eligible(""));
        assert!(!is_cache_eligible("https://example.com/api/data"));
        assert!(!is_cache_eligible("https://example.com/index.html"));
        assert!(!is_cache_eligible("https://example.com/app.js?v=3"));
        assert!(!is_cache_eligible("https://example.com/app.json"));
    }

    #[test]
    fn test_classification_is_idempotent() {
        for url in ["", "https://example.com/app.js", "not a url", "\u{0}.css", "ﬀ.JS"] {
            assert_eq!(is_cache_eligible(url), is_cache_eligible(url));
        }
    }

    #[test]
    fn test_method_eligibility() {
        assert!(is_cache_eligible_method(None));
        assert!(is_cache_eligible_method(Some("GET")));
        assert!(is_cache_eligible_method(Some("get")));
        assert!(!is_cache_eligible_method(Some("POST")));
        assert!(!is_cache_eligible_method(Some("PUT")));
        assert!(!is_cache_eligible_method(Some("HEAD")));
    }

    #[test]
    fn test_content_type_mapping() {
        assert_eq!(content_type_for("https://example.com/app.js"), "application/javascript");
        assert_eq!(content_type_for("https://example.com/site.CSS"), "text/css");
        assert_eq!(content_type_for("https://example.com/a.png"), "image/png");
        assert_eq!(content_type_for("https://example.com/a.jpg"), "image/jpeg");
        assert_eq!(content_type_for("https://example.com/a.jpeg"), "image/jpeg");
        assert_eq!(content_type_for("https://example.com/a.gif"), "image/gif");
        assert_eq!(content_type_for("https://example.com/a.svg"), "image/svg+xml");
        assert_eq!(content_type_for("https://example.com/font.woff2"), DEFAULT_CONTENT_TYPE);
        assert_eq!(content_type_for("no-extension"), DEFAULT_CONTENT_TYPE);
    }
}
