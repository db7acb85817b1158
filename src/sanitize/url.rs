use once_cell::sync::Lazy;
use regex::Regex;

/// Protocol prefixes that are rejected outright, lowercased for comparison.
const DANGEROUS_PREFIXES: &[&str] = &[
    "javascript:",
    "vbscript:",
    "data:text/html",
    "data:application/javascript",
    "data:text/javascript",
];

static ALLOWED_SCHEME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(https?|ftp|mailto):").expect("valid allowed scheme regex"));
static ANY_SCHEME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^[a-z]+:").expect("valid scheme prefix regex"));

/// Sanitizes a URL that may use a malicious protocol handler.
///
/// Policy, applied to the trimmed input:
/// - dangerous protocol prefixes (`javascript:`, `vbscript:`, executable
///   `data:` types) → empty string;
/// - `http`, `https`, `ftp`, and `mailto` URLs pass through unchanged;
/// - input with no scheme at all is assumed to be a host path and gets
///   `https://` prepended;
/// - any other scheme is rejected with an empty string.
///
/// This fails closed: anything unusable as a navigable link becomes `""`
/// rather than an error.
pub fn sanitize_url(url: &str) -> String {
    let clean = url.trim();
    if clean.is_empty() {
        return String::new();
    }

    let lower = clean.to_lowercase();
    if DANGEROUS_PREFIXES.iter().any(|p| lower.starts_with(p)) {
        tracing::debug!("rejected URL with dangerous protocol prefix");
        return String::new();
    }

    if ALLOWED_SCHEME.is_match(clean) {
        return clean.to_owned();
    }

    if !ANY_SCHEME.is_match(clean) {
        return format!("https://{clean}");
    }

    tracing::debug!("rejected URL with disallowed scheme");
    String::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_https_passes_through() {
        assert_eq!(sanitize_url("https://example.com"), "https://example.com");
        assert_eq!(
            sanitize_url("http://example.com/feed.xml"),
            "http://example.com/feed.xml"
        );
    }

    #[test]
    fn test_ftp_and_mailto_allowed() {
        assert_eq!(sanitize_url("ftp://files.example.com"), "ftp://files.example.com");
        assert_eq!(sanitize_url("mailto:editor@example.com"), "mailto:editor@example.com");
    }

    #[test]
    fn test_javascript_rejected() {
        assert_eq!(sanitize_url("javascript:alert(1)"), "");
        assert_eq!(sanitize_url("JavaScript:alert(1)"), "");
    }

    #[test]
    fn test_vbscript_rejected() {
        assert_eq!(sanitize_url("vbscript:MsgBox(1)"), "");
    }

    #[test]
    fn test_executable_data_urls_rejected() {
        assert_eq!(sanitize_url("data:text/html,<script>x</script>"), "");
        assert_eq!(sanitize_url("data:application/javascript,alert(1)"), "");
        assert_eq!(sanitize_url("data:text/javascript,alert(1)"), "");
    }

    #[test]
    fn test_schemeless_gets_https() {
        assert_eq!(sanitize_url("example.com/feed"), "https://example.com/feed");
    }

    #[test]
    fn test_other_schemes_rejected() {
        assert_eq!(sanitize_url("gopher://x"), "");
        assert_eq!(sanitize_url("file:///etc/passwd"), "");
    }

    #[test]
    fn test_empty_and_whitespace() {
        assert_eq!(sanitize_url(""), "");
        assert_eq!(sanitize_url("   "), "");
    }

    #[test]
    fn test_input_trimmed() {
        assert_eq!(sanitize_url("  https://example.com  "), "https://example.com");
        assert_eq!(sanitize_url("\tjavascript:alert(1)\n"), "");
    }
}
