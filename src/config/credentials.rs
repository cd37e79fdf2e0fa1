//! Secrets in config files may be written inline or as `$VAR` references.

use tracing::debug;

/// Expand a configured secret. `$NAME` reads `NAME` from `env`; an unset or
/// empty reference yields `None` so the caller can try its next source.
pub fn expand_secret<F>(raw: &str, env: F) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    let raw = raw.trim();
    match raw.strip_prefix('$') {
        Some(name) => {
            let value = env(name);
            if value.is_none() {
                debug!(var = %name, "Secret reference not set");
            }
            value
        }
        None if raw.is_empty() => None,
        None => Some(raw.to_string()),
    }
}

/// Render a secret for terminal output.
pub fn mask_secret(secret: &str) -> String {
    if secret.chars().count() < 8 {
        return "****".to_string();
    }
    let head: String = secret.chars().take(4).collect();
    format!("{head}****")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(name: &str) -> Option<String> {
        (name == "PSI_KEY").then(|| "from-env".to_string())
    }

    #[test]
    fn test_inline_secret_kept() {
        assert_eq!(expand_secret(" sk-inline ", env).as_deref(), Some("sk-inline"));
        assert_eq!(expand_secret("", env), None);
    }

    #[test]
    fn test_reference_reads_lookup() {
        assert_eq!(expand_secret("$PSI_KEY", env).as_deref(), Some("from-env"));
        assert_eq!(expand_secret("$MISSING", env), None);
    }

    #[test]
    fn test_mask_secret() {
        assert_eq!(mask_secret("AIzaSyExampleKey"), "AIza****");
        assert_eq!(mask_secret("short"), "****");
    }
}
