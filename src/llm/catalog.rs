/// Static facts about a provider geoscope knows how to call.
#[derive(Debug)]
pub struct KnownProvider {
    pub id: &'static str,
    /// Environment variable consulted when the config carries no key.
    pub key_var: &'static str,
    pub model: &'static str,
    pub api_base: &'static str,
}

/// Known providers, in the order a chain tries them when none are configured.
pub static KNOWN_PROVIDERS: &[KnownProvider] = &[
    KnownProvider {
        id: "openai",
        key_var: "OPENAI_API_KEY",
        model: "gpt-4o-mini",
        api_base: "https://api.openai.com/v1",
    },
    KnownProvider {
        id: "gemini",
        key_var: "GEMINI_API_KEY",
        model: "gemini-1.5-flash",
        api_base: "https://generativelanguage.googleapis.com/v1beta",
    },
];

pub fn lookup(id: &str) -> Option<&'static KnownProvider> {
    KNOWN_PROVIDERS.iter().find(|p| p.id.eq_ignore_ascii_case(id))
}

/// Model used when the config names a provider but no model.
pub fn fallback_model(id: &str) -> &'static str {
    lookup(id).map_or(KNOWN_PROVIDERS[0].model, |p| p.model)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_ignores_case() {
        assert_eq!(lookup("Gemini").map(|p| p.key_var), Some("GEMINI_API_KEY"));
        assert!(lookup("anthropic").is_none());
    }

    #[test]
    fn test_fallback_model_for_unknown_id() {
        assert_eq!(fallback_model("gemini"), "gemini-1.5-flash");
        assert_eq!(fallback_model("other"), "gpt-4o-mini");
    }
}
