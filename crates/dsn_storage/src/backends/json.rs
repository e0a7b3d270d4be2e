use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::NaiveDate;
use dsn_core::{Article, ArticleStorage, DailyDocument, DateSummary, Error, Result};
use tokio::fs;
use tracing::{debug, info, warn};

use crate::merge_by_url;

const LATEST_FILE: &str = "articles.json";
const HISTORY_PREFIX: &str = "articles_";

/// Daily documents as pretty-printed JSON files under one directory.
///
/// `articles.json` always holds the most recently saved day and
/// `articles_YYYY-MM-DD.json` keeps one file per day.
#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    data_dir: PathBuf,
}

impl JsonFileStorage {
    pub async fn new(data_dir: impl AsRef<Path>) -> Result<Self> {
        let data_dir = data_dir.as_ref().to_path_buf();
        fs::create_dir_all(&data_dir).await?;
        debug!("JSON storage at {}", data_dir.display());
        Ok(Self { data_dir })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn latest_path(&self) -> PathBuf {
        self.data_dir.join(LATEST_FILE)
    }

    pub fn history_path(&self, date: NaiveDate) -> PathBuf {
        self.data_dir
            .join(format!("{}{}.json", HISTORY_PREFIX, date.format("%Y-%m-%d")))
    }

    async fn read_document(path: &Path) -> Result<Option<DailyDocument>> {
        let raw = match fs::read_to_string(path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let document = serde_json::from_str(&raw).map_err(|e| {
            Error::Storage(format!("Failed to parse {}: {}", path.display(), e))
        })?;
        Ok(Some(document))
    }

    async fn write_document(path: &Path, document: &DailyDocument) -> Result<()> {
        let json = serde_json::to_string_pretty(document)?;
        fs::write(path, json).await?;
        Ok(())
    }

    fn date_from_file_name(name: &str) -> Option<NaiveDate> {
        let date = name.strip_prefix(HISTORY_PREFIX)?.strip_suffix(".json")?;
        NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()
    }
}

#[async_trait]
impl ArticleStorage for JsonFileStorage {
    async fn save_daily(&self, date: NaiveDate, articles: &[Article]) -> Result<DailyDocument> {
        let existing = match self.load_daily(date).await {
            Ok(doc) => doc.map(|d| d.articles).unwrap_or_default(),
            Err(e) => {
                warn!("Ignoring unreadable document for {}: {}", date, e);
                Vec::new()
            }
        };

        let document = DailyDocument::new(date, merge_by_url(articles, &existing));
        Self::write_document(&self.latest_path(), &document).await?;
        let history = self.history_path(date);
        Self::write_document(&history, &document).await?;

        info!(
            "Saved {} articles for {} ({})",
            document.articles.len(),
            date,
            history.display()
        );
        Ok(document)
    }

    async fn load_daily(&self, date: NaiveDate) -> Result<Option<DailyDocument>> {
        if let Some(doc) = Self::read_document(&self.history_path(date)).await? {
            return Ok(Some(doc));
        }
        // a latest file written without its history copy
        Ok(Self::read_document(&self.latest_path())
            .await?
            .filter(|doc| doc.date == date))
    }

    async fn load_latest(&self) -> Result<Option<DailyDocument>> {
        if let Some(doc) = Self::read_document(&self.latest_path()).await? {
            return Ok(Some(doc));
        }
        match self.list_dates().await?.first() {
            Some(summary) => self.load_daily(summary.date).await,
            None => Ok(None),
        }
    }

    async fn list_dates(&self) -> Result<Vec<DateSummary>> {
        let mut counts: BTreeMap<NaiveDate, usize> = BTreeMap::new();

        let mut entries = fs::read_dir(&self.data_dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            let Some(date) = name.to_str().and_then(Self::date_from_file_name) else {
                continue;
            };
            match Self::read_document(&entry.path()).await {
                Ok(Some(doc)) => {
                    counts.insert(date, doc.articles.len());
                }
                Ok(None) => {}
                Err(e) => warn!("Skipping {}: {}", entry.path().display(), e),
            }
        }

        if let Ok(Some(doc)) = Self::read_document(&self.latest_path()).await {
            counts.entry(doc.date).or_insert(doc.articles.len());
        }

        Ok(counts
            .into_iter()
            .rev()
            .map(|(date, count)| DateSummary { date, count })
            .collect())
    }
}
