use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Editorial tier a source belongs to. Drives the base score and the quota
/// each tier gets in the final list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceCategory {
    News,
    Blog,
    Company,
}

impl SourceCategory {
    pub const ALL: [SourceCategory; 3] = [Self::News, Self::Blog, Self::Company];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::News => "news",
            Self::Blog => "blog",
            Self::Company => "company",
        }
    }
}

impl fmt::Display for SourceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceCategory {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "news" => Ok(Self::News),
            "blog" => Ok(Self::Blog),
            "company" => Ok(Self::Company),
            other => Err(format!("Unknown source category: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub url: String,
    pub source_id: String,
    #[serde(default)]
    pub source: String,
    /// Raw ISO 8601 timestamp as delivered by the feed. Empty when the feed
    /// had none.
    #[serde(default)]
    pub published: String,
    #[serde(default)]
    pub score: f64,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub needs_translation: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collected_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translated_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translated_content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

impl Article {
    pub fn new(
        source_id: impl Into<String>,
        title: impl Into<String>,
        content: impl Into<String>,
        url: impl Into<String>,
        published: impl Into<String>,
    ) -> Self {
        let source_id = source_id.into();
        let url = url.into();
        Self {
            id: Self::make_id(&source_id, &url),
            title: title.into(),
            content: content.into(),
            url,
            source: source_id.clone(),
            source_id,
            published: published.into(),
            score: 0.0,
            tags: BTreeSet::new(),
            needs_translation: false,
            collected_at: None,
            translated_title: None,
            translated_content: None,
            summary: None,
        }
    }

    /// `<source_id>_<first 12 hex chars of sha256(url)>`
    pub fn make_id(source_id: &str, url: &str) -> String {
        let digest = Sha256::digest(url.as_bytes());
        let hex: String = digest.iter().take(6).map(|b| format!("{:02x}", b)).collect();
        format!("{}_{}", source_id, hex)
    }

    pub fn with_score(mut self, score: f64) -> Self {
        self.score = score;
        self
    }

    /// Title and content joined the way every keyword rule reads them.
    pub fn combined_text(&self) -> String {
        format!("{} {}", self.title, self.content)
    }

    pub fn display_title(&self) -> &str {
        self.translated_title.as_deref().unwrap_or(&self.title)
    }
}

/// One persisted day: `{ "date": "2025-10-05", "articles": [...] }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyDocument {
    pub date: NaiveDate,
    pub articles: Vec<Article>,
}

impl DailyDocument {
    pub fn new(date: NaiveDate, articles: Vec<Article>) -> Self {
        Self { date, articles }
    }

    pub fn find(&self, id: &str) -> Option<&Article> {
        self.articles.iter().find(|a| a.id == id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DateSummary {
    pub date: NaiveDate,
    pub count: usize,
}
