use async_trait::async_trait;

use crate::Result;

#[async_trait]
pub trait InferenceModel: Send + Sync {
    fn name(&self) -> &str;

    /// Whether calls go to a remote API. Remote calls are rate limited and
    /// count towards the failure kill switch.
    fn is_remote(&self) -> bool {
        true
    }

    /// Translate `text` into the `target` language (ISO 639-1 code)
    async fn translate(&self, text: &str, target: &str) -> Result<String>;

    /// Summarize an article into a short paragraph
    async fn summarize(&self, title: &str, content: &str) -> Result<String>;
}
