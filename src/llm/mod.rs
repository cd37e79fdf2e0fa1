pub mod catalog;
pub mod chain;
pub mod gemini;
pub mod json;
pub mod openai;
pub mod provider;
pub mod router;
pub mod types;

pub use chain::{ProviderChain, ProviderOutcome};
pub use provider::AiProvider;
pub use router::{build_chain, create_provider};
pub use types::{Completion, TokenUsage};
