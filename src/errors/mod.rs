pub mod types;
pub mod classification;
pub mod retry;

pub use types::GeoError;
pub use classification::ErrorClassification;
pub use retry::{AttemptPolicy, with_attempts};
