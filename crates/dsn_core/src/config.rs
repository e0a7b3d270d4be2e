//! Run configuration.
//!
//! Everything is built once at startup and handed to each component by
//! reference. All structs deserialize with defaults, so a config file only
//! needs the keys it overrides.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::types::SourceCategory;
use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaBounds {
    pub min: usize,
    pub max: usize,
}

impl QuotaBounds {
    pub const fn new(min: usize, max: usize) -> Self {
        Self { min, max }
    }
}

/// Extra points for very recent articles, added on top of the keyword score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FreshnessBonus {
    pub within_day: f64,
    pub within_week: f64,
}

impl Default for FreshnessBonus {
    fn default() -> Self {
        Self {
            within_day: 10.0,
            within_week: 5.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    pub base_score_per_tier: BTreeMap<SourceCategory, f64>,
    pub default_base_score: f64,
    pub priority_keywords: BTreeMap<String, f64>,
    pub exclude_patterns: Vec<String>,
    pub exclude_penalty: f64,
    pub min_score_threshold: f64,
    pub max_article_age_days: i64,
    pub min_publish_year: i32,
    pub final_article_count: usize,
    pub category_ratios: BTreeMap<SourceCategory, f64>,
    pub category_min_max: BTreeMap<SourceCategory, QuotaBounds>,
    pub duplicate_title_similarity_threshold: f64,
    pub required_keywords: Vec<String>,
    pub excluded_keywords: Vec<String>,
    pub supplementary_keywords: Vec<String>,
    pub source_categories: BTreeMap<String, SourceCategory>,
    pub freshness_bonus: Option<FreshnessBonus>,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for FilterConfig {
    fn default() -> Self {
        let base_score_per_tier = BTreeMap::from([
            (SourceCategory::News, 60.0),
            (SourceCategory::Blog, 55.0),
            (SourceCategory::Company, 50.0),
        ]);

        let priority_keywords = [
            ("방법", 15.0),
            ("가이드", 20.0),
            ("분석", 15.0),
            ("비교", 15.0),
            ("구현", 20.0),
            ("LLM", 20.0),
            ("시계열", 15.0),
            ("method", 15.0),
            ("guide", 20.0),
            ("analysis", 15.0),
            ("comparison", 15.0),
            ("implementation", 20.0),
            ("time series", 15.0),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();

        let category_ratios = BTreeMap::from([
            (SourceCategory::News, 0.5),
            (SourceCategory::Blog, 0.3),
            (SourceCategory::Company, 0.2),
        ]);

        let category_min_max = BTreeMap::from([
            (SourceCategory::News, QuotaBounds::new(3, 5)),
            (SourceCategory::Blog, QuotaBounds::new(2, 3)),
            (SourceCategory::Company, QuotaBounds::new(1, 2)),
        ]);

        Self {
            base_score_per_tier,
            default_base_score: 50.0,
            priority_keywords,
            exclude_patterns: strings(&[
                "추천해주세요",
                "어떻게 생각",
                "감탄사",
                "recommend",
                "what do you think",
            ]),
            exclude_penalty: 30.0,
            min_score_threshold: 70.0,
            max_article_age_days: 60,
            min_publish_year: 2025,
            final_article_count: 10,
            category_ratios,
            category_min_max,
            duplicate_title_similarity_threshold: 0.8,
            required_keywords: strings(&[
                "ai",
                "artificial intelligence",
                "machine learning",
                "ml",
                "deep learning",
                "data science",
                "llm",
                "gpt",
                "neural network",
                "인공지능",
                "머신러닝",
                "딥러닝",
                "데이터사이언스",
            ]),
            excluded_keywords: strings(&[
                "frontend",
                "front-end",
                "css",
                "jquery",
                "wordpress",
                "react native",
                "hiring",
                "프론트엔드",
                "웹 퍼블리싱",
                "채용",
            ]),
            supplementary_keywords: strings(&[
                "statistics",
                "data analysis",
                "big data",
                "analytics",
                "pandas",
                "numpy",
                "scikit-learn",
                "tensorflow",
                "pytorch",
                "keras",
                "jupyter",
                "visualization",
                "nlp",
                "computer vision",
                "transformer",
                "통계학",
                "데이터분석",
                "빅데이터",
                "시각화",
                "예측모델",
                "데이터",
                "분석",
                "예측",
                "모델링",
                "기계학습",
                "신경망",
                "알고리즘",
            ]),
            source_categories: BTreeMap::new(),
            freshness_bonus: None,
        }
    }
}

impl FilterConfig {
    pub fn category_of(&self, source_id: &str) -> Option<SourceCategory> {
        self.source_categories.get(source_id).copied()
    }

    pub fn validate(&self) -> Result<()> {
        for (category, ratio) in &self.category_ratios {
            if !(0.0..=1.0).contains(ratio) {
                return Err(Error::Config(format!(
                    "Ratio for {} must be within [0, 1], got {}",
                    category, ratio
                )));
            }
        }
        for (category, bounds) in &self.category_min_max {
            if bounds.min > bounds.max {
                return Err(Error::Config(format!(
                    "Quota bounds for {} have min {} > max {}",
                    category, bounds.min, bounds.max
                )));
            }
        }
        if !(0.0..=1.0).contains(&self.duplicate_title_similarity_threshold) {
            return Err(Error::Config(format!(
                "Title similarity threshold must be within [0, 1], got {}",
                self.duplicate_title_similarity_threshold
            )));
        }
        if self.max_article_age_days < 0 {
            return Err(Error::Config("max_article_age_days must not be negative".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceConfig {
    pub id: String,
    pub name: String,
    pub feed_url: String,
    pub category: SourceCategory,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default = "default_max_content_chars")]
    pub max_content_chars: usize,
    #[serde(default = "default_max_articles")]
    pub max_articles: usize,
}

fn default_language() -> String {
    "en".to_string()
}

fn default_max_content_chars() -> usize {
    2000
}

fn default_max_articles() -> usize {
    10
}

impl SourceConfig {
    fn new(
        id: &str,
        name: &str,
        feed_url: &str,
        category: SourceCategory,
        language: &str,
        tags: &[&str],
        max_articles: usize,
    ) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            feed_url: feed_url.to_string(),
            category,
            language: language.to_string(),
            tags: strings(tags),
            max_content_chars: default_max_content_chars(),
            max_articles,
        }
    }

    pub fn is_english(&self) -> bool {
        self.language.eq_ignore_ascii_case("en")
    }
}

pub fn default_sources() -> Vec<SourceConfig> {
    use SourceCategory::*;
    vec![
        SourceConfig::new(
            "techcrunch_ai",
            "TechCrunch AI",
            "https://techcrunch.com/category/artificial-intelligence/feed/",
            News,
            "en",
            &["뉴스", "해외", "AI"],
            10,
        ),
        SourceConfig::new(
            "mit_tech_review",
            "MIT Technology Review",
            "https://www.technologyreview.com/topic/artificial-intelligence/feed/",
            News,
            "en",
            &["뉴스", "해외", "심층", "AI"],
            10,
        ),
        SourceConfig::new(
            "wired_ai",
            "WIRED AI",
            "https://www.wired.com/feed/tag/ai/latest/rss",
            News,
            "en",
            &["뉴스", "해외", "AI", "기술"],
            10,
        ),
        SourceConfig::new(
            "tech42",
            "Tech42",
            "https://tech42.co.kr/feed/",
            News,
            "ko",
            &["뉴스", "국내", "스타트업", "AI"],
            10,
        ),
        SourceConfig::new(
            "towards_data_science",
            "Towards Data Science",
            "https://towardsdatascience.com/feed",
            Blog,
            "en",
            &["블로그", "튜토리얼", "실용"],
            8,
        ),
        SourceConfig::new(
            "analytics_vidhya",
            "Analytics Vidhya",
            "https://www.analyticsvidhya.com/blog/feed/",
            Blog,
            "en",
            &["블로그", "실습", "교육"],
            8,
        ),
        SourceConfig::new(
            "kdnuggets",
            "KDnuggets",
            "https://www.kdnuggets.com/feed",
            Blog,
            "en",
            &["블로그", "리소스", "뉴스"],
            8,
        ),
        SourceConfig::new(
            "neptune_ai",
            "Neptune.ai Blog",
            "https://neptune.ai/blog/rss.xml",
            Blog,
            "en",
            &["블로그", "MLOps", "꿀팁"],
            8,
        ),
        SourceConfig::new(
            "google_ai",
            "Google AI Blog",
            "https://ai.googleblog.com/feeds/posts/default",
            Company,
            "en",
            &["기업블로그", "연구", "Google"],
            5,
        ),
        SourceConfig::new(
            "openai_blog",
            "OpenAI Blog",
            "https://openai.com/blog/rss.xml",
            Company,
            "en",
            &["기업블로그", "최신기술", "OpenAI"],
            5,
        ),
        SourceConfig::new(
            "naver_d2",
            "NAVER D2",
            "https://d2.naver.com/helloworld.rss",
            Company,
            "ko",
            &["기업블로그", "국내", "NAVER"],
            5,
        ),
        SourceConfig::new(
            "kakao_tech",
            "Kakao Tech Blog",
            "https://tech.kakao.com/rss.xml",
            Company,
            "ko",
            &["기업블로그", "국내", "Kakao"],
            5,
        ),
    ]
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceSettings {
    /// Never written back to disk
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub target_language: String,
    pub summary_sentences: usize,
    pub translate_delay_ms: u64,
    pub summarize_delay_ms: u64,
}

impl Default for InferenceSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "gemini-pro".to_string(),
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            target_language: "ko".to_string(),
            summary_sentences: 3,
            translate_delay_ms: 500,
            summarize_delay_ms: 1500,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectionSettings {
    pub request_timeout_secs: u64,
    pub request_delay_ms: u64,
    pub user_agent: String,
}

impl Default for CollectionSettings {
    fn default() -> Self {
        Self {
            request_timeout_secs: 30,
            request_delay_ms: 1000,
            user_agent: "Mozilla/5.0 (compatible; dsn-aggregator/0.1; +https://github.com)"
                .to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub sources: Vec<SourceConfig>,
    pub filter: FilterConfig,
    pub inference: InferenceSettings,
    pub collection: CollectionSettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            sources: default_sources(),
            filter: FilterConfig::default(),
            inference: InferenceSettings::default(),
            collection: CollectionSettings::default(),
        }
    }
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: AppConfig = serde_json::from_str(&raw)?;
        config.filter.validate()?;
        tracing::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Filter settings with every configured source's category folded into
    /// the source → category table. Explicit table entries win.
    pub fn filter_config(&self) -> FilterConfig {
        let mut filter = self.filter.clone();
        for source in &self.sources {
            filter
                .source_categories
                .entry(source.id.clone())
                .or_insert(source.category);
        }
        filter
    }

    pub fn source(&self, id: &str) -> Option<&SourceConfig> {
        self.sources.iter().find(|s| s.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_filter_config_is_valid() {
        assert!(FilterConfig::default().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_inverted_bounds() {
        let mut config = FilterConfig::default();
        config
            .category_min_max
            .insert(SourceCategory::Blog, QuotaBounds::new(4, 2));
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_validate_rejects_ratio_above_one() {
        let mut config = FilterConfig::default();
        config.category_ratios.insert(SourceCategory::News, 1.5);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_filter_config_merges_source_categories() {
        let mut app = AppConfig::default();
        app.filter
            .source_categories
            .insert("naver_d2".to_string(), SourceCategory::Blog);
        let filter = app.filter_config();

        assert_eq!(filter.category_of("techcrunch_ai"), Some(SourceCategory::News));
        assert_eq!(filter.category_of("kdnuggets"), Some(SourceCategory::Blog));
        // explicit entry is kept
        assert_eq!(filter.category_of("naver_d2"), Some(SourceCategory::Blog));
        assert_eq!(filter.category_of("unknown"), None);
    }

    #[test]
    fn test_load_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"data_dir": "/tmp/dsn", "filter": {{"min_score_threshold": 80, "category_min_max": {{"news": {{"min": 1, "max": 2}}}}}}}}"#
        )
        .unwrap();

        let config = AppConfig::load(file.path()).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/tmp/dsn"));
        assert_eq!(config.filter.min_score_threshold, 80.0);
        assert_eq!(
            config.filter.category_min_max.get(&SourceCategory::News),
            Some(&QuotaBounds::new(1, 2))
        );
        assert_eq!(config.filter.max_article_age_days, 60);
        assert_eq!(config.sources.len(), default_sources().len());
    }

    #[test]
    fn test_api_key_is_not_serialized() {
        let mut settings = InferenceSettings::default();
        settings.api_key = Some("secret".to_string());
        let json = serde_json::to_string(&settings).unwrap();
        assert!(!json.contains("secret"));
    }
}
