use reqwest::Url;

use crate::errors::GeoError;

/// Normalize a submitted address into an absolute http(s) URL.
///
/// A missing scheme gets `https://`. Anything that still fails to parse, or
/// uses another scheme, is a validation error.
pub fn normalize_url(raw: &str) -> Result<String, GeoError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(GeoError::Validation("url must not be empty".into()));
    }

    let candidate = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    };

    let parsed = Url::parse(&candidate)
        .map_err(|e| GeoError::Validation(format!("invalid url '{}': {}", trimmed, e)))?;

    match parsed.scheme() {
        "http" | "https" => {}
        other => {
            return Err(GeoError::Validation(format!("unsupported url scheme '{}'", other)));
        }
    }
    if parsed.host_str().map_or(true, str::is_empty) {
        return Err(GeoError::Validation(format!("url '{}' has no host", trimmed)));
    }

    Ok(parsed.to_string())
}

pub fn hostname(url: &str) -> Option<String> {
    Url::parse(url).ok()?.host_str().map(|h| h.to_string())
}

/// `scheme://host[:port]/<path>` for sidecar files such as robots.txt.
pub fn origin_path(url: &str, path: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    parsed.join(path).ok().map(|u| u.to_string())
}
