use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use dsn_core::{Article, ArticleStorage, DailyDocument, DateSummary, Result};
use tokio::sync::RwLock;

use crate::merge_by_url;

/// Daily documents kept in process memory; nothing survives a restart.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStorage {
    days: Arc<RwLock<BTreeMap<NaiveDate, DailyDocument>>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage pre-filled with the given documents
    pub fn with_documents(documents: impl IntoIterator<Item = DailyDocument>) -> Self {
        let days = documents.into_iter().map(|doc| (doc.date, doc)).collect();
        Self {
            days: Arc::new(RwLock::new(days)),
        }
    }
}

#[async_trait]
impl ArticleStorage for InMemoryStorage {
    async fn save_daily(&self, date: NaiveDate, articles: &[Article]) -> Result<DailyDocument> {
        let mut days = self.days.write().await;
        let existing = days.get(&date).map(|doc| doc.articles.as_slice()).unwrap_or(&[]);
        let document = DailyDocument::new(date, merge_by_url(articles, existing));
        days.insert(date, document.clone());
        Ok(document)
    }

    async fn load_daily(&self, date: NaiveDate) -> Result<Option<DailyDocument>> {
        Ok(self.days.read().await.get(&date).cloned())
    }

    async fn load_latest(&self) -> Result<Option<DailyDocument>> {
        Ok(self.days.read().await.values().next_back().cloned())
    }

    async fn list_dates(&self) -> Result<Vec<DateSummary>> {
        Ok(self
            .days
            .read()
            .await
            .values()
            .rev()
            .map(|doc| DateSummary {
                date: doc.date,
                count: doc.articles.len(),
            })
            .collect())
    }
}
