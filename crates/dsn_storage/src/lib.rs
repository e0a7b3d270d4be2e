use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use dsn_core::{Article, ArticleStorage, Result};

pub mod backends;

pub use backends::*;

/// Which backend holds the daily documents
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum StorageKind {
    #[default]
    Json,
    Memory,
}

impl fmt::Display for StorageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageKind::Json => write!(f, "json"),
            StorageKind::Memory => write!(f, "memory"),
        }
    }
}

pub async fn create_storage(kind: StorageKind, data_dir: &Path) -> Result<Arc<dyn ArticleStorage>> {
    match kind {
        StorageKind::Json => Ok(Arc::new(JsonFileStorage::new(data_dir).await?)),
        StorageKind::Memory => Ok(Arc::new(InMemoryStorage::new())),
    }
}

/// Merge a fresh batch into what is already stored for the same day.
///
/// Fresh articles win on URL conflicts, articles without a URL are dropped
/// and the result is sorted by score, highest first.
pub fn merge_by_url(fresh: &[Article], existing: &[Article]) -> Vec<Article> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut merged: Vec<Article> = Vec::with_capacity(fresh.len() + existing.len());

    for article in fresh.iter().chain(existing) {
        if article.url.is_empty() || !seen.insert(article.url.as_str()) {
            continue;
        }
        merged.push(article.clone());
    }

    merged.sort_by(|a, b| b.score.total_cmp(&a.score));
    merged
}

pub mod prelude {
    pub use super::backends::*;
    pub use super::{create_storage, StorageKind};
    pub use dsn_core::ArticleStorage;
}
