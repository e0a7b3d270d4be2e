use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dsn_core::config::CollectionSettings;
use dsn_core::{Article, Error, Result, SourceConfig};
use feed_rs::model::Entry;
use reqwest::Client;
use scraper::Html;
use url::Url;

use crate::collector::Collector;
use crate::logging::Logger;

/// Visible text of an HTML fragment with whitespace collapsed
pub fn html_to_text(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    fragment
        .root_element()
        .text()
        .collect::<Vec<_>>()
        .join(" ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn truncate_chars(text: String, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((i, _)) => text[..i].to_string(),
        None => text,
    }
}

fn entry_link(entry: &Entry) -> Option<String> {
    let candidate = entry
        .links
        .first()
        .map(|l| l.href.clone())
        .or_else(|| entry.id.starts_with("http").then(|| entry.id.clone()))?;
    Url::parse(&candidate).ok().map(|u| u.to_string())
}

/// RSS 2.0 / Atom feed reader for one source.
pub struct RssCollector {
    source: SourceConfig,
    client: Client,
    logger: Logger,
}

impl RssCollector {
    pub fn new(source: SourceConfig, settings: &CollectionSettings) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .user_agent(settings.user_agent.clone())
            .build()?;
        let logger = Logger::new()
            .with_prefix(source.category.as_str())
            .with_prefix(source.id.clone());
        Ok(Self {
            source,
            client,
            logger,
        })
    }

    async fn fetch(&self) -> Result<Vec<u8>> {
        let response = self.client.get(&self.source.feed_url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Collection(format!(
                "{} returned {}",
                self.source.feed_url, status
            )));
        }
        Ok(response.bytes().await?.to_vec())
    }

    /// Turn a raw feed document into articles, keeping feed order
    pub fn parse_feed(&self, bytes: &[u8], now: DateTime<Utc>) -> Result<Vec<Article>> {
        let feed = feed_rs::parser::parse(bytes)
            .map_err(|e| Error::Feed(format!("{}: {}", self.source.id, e)))?;

        let total = feed.entries.len();
        let articles: Vec<Article> = feed
            .entries
            .into_iter()
            .filter_map(|entry| self.to_article(entry, now))
            .collect();

        self.logger
            .debug(&format!("{} of {} entries usable", articles.len(), total));
        Ok(articles)
    }

    fn to_article(&self, entry: Entry, now: DateTime<Utc>) -> Option<Article> {
        let title = entry
            .title
            .as_ref()
            .map(|t| html_to_text(&t.content))
            .filter(|t| !t.is_empty());
        let Some(title) = title else {
            self.logger.debug("Skipping entry without title");
            return None;
        };
        let Some(url) = entry_link(&entry) else {
            self.logger.debug(&format!("Skipping entry without link: {}", title));
            return None;
        };

        let raw_content = entry
            .summary
            .as_ref()
            .map(|s| s.content.clone())
            .or_else(|| entry.content.as_ref().and_then(|c| c.body.clone()))
            .unwrap_or_default();
        let content = truncate_chars(html_to_text(&raw_content), self.source.max_content_chars);

        let published = entry
            .published
            .or(entry.updated)
            .map(|dt| dt.to_rfc3339())
            .unwrap_or_default();

        let mut article = Article::new(&self.source.id, title, content, url, published);
        article.source = self.source.name.clone();
        article.tags = self.source.tags.iter().cloned().collect();
        article.needs_translation = self.source.is_english();
        article.collected_at = Some(now);
        Some(article)
    }
}

#[async_trait]
impl Collector for RssCollector {
    fn source(&self) -> &SourceConfig {
        &self.source
    }

    async fn collect(&self, limit: usize) -> Result<Vec<Article>> {
        self.logger.info(&format!("Fetching {}", self.source.feed_url));
        let bytes = self.fetch().await?;
        let mut articles = self.parse_feed(&bytes, Utc::now())?;
        articles.truncate(limit);
        self.logger.info(&format!("Collected {} articles", articles.len()));
        Ok(articles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use dsn_core::SourceCategory;

    const RSS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
<channel>
  <title>AI News</title>
  <link>https://news.example.com</link>
  <description>Test feed</description>
  <item>
    <title>OpenAI ships a new reasoning model</title>
    <link>https://news.example.com/reasoning</link>
    <description><![CDATA[<p>The <b>model</b> improves   math &amp; code.</p>]]></description>
    <pubDate>Sun, 05 Oct 2025 09:30:00 GMT</pubDate>
    <guid>https://news.example.com/reasoning</guid>
  </item>
  <item>
    <title>Undated post about LLM evaluation</title>
    <link>https://news.example.com/eval</link>
    <description>Plain text body</description>
  </item>
  <item>
    <description>Item without a title</description>
    <link>https://news.example.com/untitled</link>
  </item>
</channel>
</rss>"#;

    const ATOM: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Company Blog</title>
  <id>urn:uuid:60a76c80-d399-11d9-b93C-0003939e0af6</id>
  <updated>2025-10-06T10:00:00Z</updated>
  <entry>
    <title>Serving LLMs at scale</title>
    <id>https://blog.example.com/serving</id>
    <link href="https://blog.example.com/serving"/>
    <updated>2025-10-06T10:00:00Z</updated>
    <content type="html">&lt;p&gt;We cut latency in half.&lt;/p&gt;</content>
  </entry>
</feed>"#;

    fn source(language: &str, max_content_chars: usize) -> SourceConfig {
        SourceConfig {
            id: "techcrunch_ai".to_string(),
            name: "TechCrunch AI".to_string(),
            feed_url: "https://news.example.com/feed".to_string(),
            category: SourceCategory::News,
            language: language.to_string(),
            tags: vec!["뉴스".to_string(), "AI".to_string()],
            max_content_chars,
            max_articles: 10,
        }
    }

    fn collector(language: &str, max_content_chars: usize) -> RssCollector {
        RssCollector::new(source(language, max_content_chars), &CollectionSettings::default()).unwrap()
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 10, 10, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_html_to_text() {
        assert_eq!(html_to_text("<p>Hello <b>world</b></p>\n<p>again</p>"), "Hello world again");
        assert_eq!(html_to_text("plain   text"), "plain text");
        assert_eq!(html_to_text("a &amp; b"), "a & b");
    }

    #[test]
    fn test_parse_rss() {
        let articles = collector("en", 2000).parse_feed(RSS.as_bytes(), now()).unwrap();

        assert_eq!(articles.len(), 2);
        let first = &articles[0];
        assert_eq!(first.title, "OpenAI ships a new reasoning model");
        assert_eq!(first.url, "https://news.example.com/reasoning");
        assert_eq!(first.content, "The model improves math & code.");
        assert_eq!(first.source_id, "techcrunch_ai");
        assert_eq!(first.source, "TechCrunch AI");
        assert_eq!(first.score, 0.0);
        assert!(first.needs_translation);
        assert!(first.tags.contains("AI"));
        assert_eq!(first.collected_at, Some(now()));
        assert_eq!(
            DateTime::parse_from_rfc3339(&first.published).unwrap(),
            Utc.with_ymd_and_hms(2025, 10, 5, 9, 30, 0).unwrap()
        );
        assert!(first.id.starts_with("techcrunch_ai_"));

        // no date stays empty and is rejected later by the recency filter
        assert_eq!(articles[1].published, "");
    }

    #[test]
    fn test_parse_atom_uses_updated_and_content() {
        let articles = collector("ko", 2000).parse_feed(ATOM.as_bytes(), now()).unwrap();

        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].content, "We cut latency in half.");
        assert!(articles[0].published.starts_with("2025-10-06T10:00:00"));
        assert!(!articles[0].needs_translation);
    }

    #[test]
    fn test_content_is_truncated() {
        let body = "x".repeat(3000);
        let feed = RSS.replace("Plain text body", &body);
        let articles = collector("en", 2000).parse_feed(feed.as_bytes(), now()).unwrap();
        assert_eq!(articles[1].content.chars().count(), 2000);
    }

    #[test]
    fn test_garbage_is_a_feed_error() {
        let result = collector("en", 2000).parse_feed(b"<html>not a feed", now());
        assert!(matches!(result, Err(Error::Feed(_))));
    }
}
