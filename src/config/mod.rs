pub mod credentials;
pub mod parser;
pub mod schema;
pub mod settings;
pub mod types;

pub use types::*;
pub use parser::{parse_config, parse_config_str};
pub use settings::{
    AnalysisSettings, AppConfig, BrowserMode, FetchSettings, LlmSettings, PageSpeedSettings,
    ProviderSettings, ServerSettings, StoreConfig,
};

use std::path::Path;

use crate::errors::GeoError;

/// Parse the optional config file and resolve it against the environment.
pub async fn load(path: Option<&Path>) -> Result<AppConfig, GeoError> {
    let raw = match path {
        Some(path) => parse_config(path).await?,
        None => GeoConfig::default(),
    };
    Ok(AppConfig::resolve(&raw))
}
