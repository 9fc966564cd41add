//! Small helpers shared by the config, connectivity and remote layers.

use crate::error::{Error, Result};

const BODY_EXCERPT_CHARS: usize = 180;

/// Trim `value`, treating blank text as absent.
pub fn non_blank(value: Option<String>) -> Option<String> {
    let value = value?;
    let value = value.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Validate a configured endpoint. Returns it trimmed and without trailing
/// slashes; `field` names the setting in the error.
pub fn parse_endpoint_url(raw: &str, field: &str) -> Result<String> {
    let url = raw.trim();
    if url.is_empty() {
        return Err(Error::Config(format!("'{field}' must not be empty")));
    }
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(Error::Config(format!(
            "'{field}' must include http:// or https://"
        )));
    }
    Ok(url.trim_end_matches('/').to_string())
}

/// Leading part of a remote response body, for rejection reports.
pub fn body_excerpt(body: &str) -> String {
    body.trim().chars().take(BODY_EXCERPT_CHARS).collect()
}

/// Wall-clock milliseconds, the unit of `updated_at` and `created_at`.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_blank_trims_and_drops_empty() {
        assert_eq!(non_blank(None), None);
        assert_eq!(non_blank(Some(" \t ".to_string())), None);
        assert_eq!(non_blank(Some(" 250 ".to_string())), Some("250".to_string()));
    }

    #[test]
    fn endpoint_url_requires_http_scheme() {
        assert_eq!(
            parse_endpoint_url(" https://api.example.com/ ", "remote_url").unwrap(),
            "https://api.example.com"
        );
        assert!(parse_endpoint_url("http://localhost:8080", "remote_url").is_ok());

        let error = parse_endpoint_url("ftp://example.com", "remote_url").unwrap_err();
        assert!(error.to_string().contains("'remote_url'"));
        assert!(parse_endpoint_url("  ", "reachability_url").is_err());
    }

    #[test]
    fn body_excerpt_bounds_rejection_bodies() {
        let body = "x".repeat(500);
        assert_eq!(body_excerpt(&body).len(), BODY_EXCERPT_CHARS);
        assert_eq!(body_excerpt("  unavailable \n"), "unavailable");
    }
}
