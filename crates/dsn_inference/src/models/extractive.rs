use std::fmt;

use async_trait::async_trait;
use dsn_core::{InferenceModel, Result};

use crate::text::fallback_summary;

/// Offline model: extractive summaries, no translation.
#[derive(Default)]
pub struct ExtractiveModel;

impl fmt::Debug for ExtractiveModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractiveModel").finish()
    }
}

impl ExtractiveModel {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl InferenceModel for ExtractiveModel {
    fn name(&self) -> &str {
        "Extractive"
    }

    fn is_remote(&self) -> bool {
        false
    }

    async fn translate(&self, text: &str, _target: &str) -> Result<String> {
        Ok(text.to_string())
    }

    async fn summarize(&self, title: &str, content: &str) -> Result<String> {
        Ok(fallback_summary(title, content))
    }
}
