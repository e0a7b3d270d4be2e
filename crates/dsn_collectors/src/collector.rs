use async_trait::async_trait;
use dsn_core::{Article, Result, SourceConfig};

#[async_trait]
pub trait Collector: Send + Sync {
    /// The source this collector reads from
    fn source(&self) -> &SourceConfig;

    /// Fetch up to `limit` raw articles. Scores are left at zero; scoring
    /// belongs to the filter pipeline.
    async fn collect(&self, limit: usize) -> Result<Vec<Article>>;

    fn id(&self) -> &str {
        &self.source().id
    }
}
