pub mod orchestrator;
pub mod stage;

pub use orchestrator::AnalysisOrchestrator;
pub use stage::{StageName, STAGES};
