use serde::{Deserialize, Serialize};

/// Token accounting reported by a provider, when it reports any.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt: Option<u64>,
    pub completion: Option<u64>,
}

/// Raw text returned by one provider call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Completion {
    pub text: String,
    pub model: String,
    #[serde(default)]
    pub usage: TokenUsage,
}
