use async_trait::async_trait;
use chrono::NaiveDate;

use crate::types::{Article, DailyDocument, DateSummary};
use crate::Result;

#[async_trait]
pub trait ArticleStorage: Send + Sync {
    /// Persist the articles for `date`, merging with what is already stored
    /// for that day. Returns the document as written.
    async fn save_daily(&self, date: NaiveDate, articles: &[Article]) -> Result<DailyDocument>;

    /// Load the document stored for `date`, if any
    async fn load_daily(&self, date: NaiveDate) -> Result<Option<DailyDocument>>;

    /// Load the most recent document
    async fn load_latest(&self) -> Result<Option<DailyDocument>>;

    /// All stored dates, newest first
    async fn list_dates(&self) -> Result<Vec<DateSummary>>;

    /// Look an article up by id in the latest document
    async fn find_article(&self, id: &str) -> Result<Option<Article>> {
        Ok(self
            .load_latest()
            .await?
            .and_then(|doc| doc.find(id).cloned()))
    }
}
