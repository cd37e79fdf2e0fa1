pub mod agenda;
pub mod ai;
pub mod generative;
pub mod market;
pub mod narrative;
pub mod performance;
pub mod scoring;

pub use agenda::run_agenda;
pub use ai::{AnalysisService, LlmAnalysisService};
pub use generative::run_generative;
pub use market::run_market;
pub use narrative::run_narrative;
pub use performance::{PageSpeedClient, PerformanceProbe};
pub use scoring::run_scoring;

/// A stage result plus the fallback warnings collected while producing it.
#[derive(Debug, Clone)]
pub struct StageOutput<T> {
    pub value: T,
    pub warnings: Vec<String>,
}

impl<T> StageOutput<T> {
    pub fn new(value: T, warnings: Vec<String>) -> Self {
        Self { value, warnings }
    }
}
