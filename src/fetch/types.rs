use serde_json::Value;

use crate::models::{FetchVia, ScrapeMeta};

/// A page acquired by a [`super::ContentFetcher`].
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedPage {
    pub html: String,
    /// Rendered visible text.
    pub content: String,
    pub robots_txt: Option<String>,
    pub llms_txt: Option<String>,
    pub performance: Option<Value>,
    pub via: FetchVia,
}

impl FetchedPage {
    pub fn meta(&self) -> ScrapeMeta {
        ScrapeMeta {
            robots_txt: self.robots_txt.clone(),
            llms_txt: self.llms_txt.clone(),
            performance: self.performance.clone(),
            via: self.via,
        }
    }
}

/// Output of one local browser render.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedPage {
    pub html: String,
    pub text: String,
    pub performance: Option<Value>,
}
