use std::collections::BTreeMap;
use std::time::Duration;

use dsn_core::{AppConfig, Article, Result, SourceCategory};
use tokio::time::sleep;
use tracing::{info, warn};

use crate::collector::Collector;
use crate::logging::Logger;
use crate::rss::RssCollector;

type BoxedCollector = Box<dyn Collector>;

#[derive(Debug, Default)]
pub struct CollectionReport {
    pub articles: Vec<Article>,
    pub per_source: BTreeMap<String, usize>,
    pub per_category: BTreeMap<SourceCategory, usize>,
    /// `(source id, error)` for every source that failed
    pub failed: Vec<(String, String)>,
}

impl CollectionReport {
    pub fn total(&self) -> usize {
        self.articles.len()
    }
}

/// Runs every collector one after the other, pausing between sources. A
/// failing source is logged and skipped.
pub struct CollectorManager {
    collectors: Vec<BoxedCollector>,
    delay: Duration,
}

impl CollectorManager {
    pub fn new(collectors: Vec<BoxedCollector>, delay: Duration) -> Self {
        Self { collectors, delay }
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let collectors = config
            .sources
            .iter()
            .map(|source| {
                RssCollector::new(source.clone(), &config.collection)
                    .map(|c| Box::new(c) as BoxedCollector)
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(
            collectors,
            Duration::from_millis(config.collection.request_delay_ms),
        ))
    }

    pub fn add_collector(&mut self, collector: BoxedCollector) {
        self.collectors.push(collector);
    }

    pub fn collectors(&self) -> &[BoxedCollector] {
        &self.collectors
    }

    pub async fn collect_all(&self) -> CollectionReport {
        let mut report = CollectionReport::default();
        info!("===== Collecting from {} sources =====", self.collectors.len());

        for (i, collector) in self.collectors.iter().enumerate() {
            if i > 0 && !self.delay.is_zero() {
                sleep(self.delay).await;
            }

            let source = collector.source();
            let logger = Logger::new()
                .with_prefix(source.category.as_str())
                .with_prefix(source.id.clone());

            match collector.collect(source.max_articles).await {
                Ok(articles) => {
                    logger.info(&format!("{} articles", articles.len()));
                    report.per_source.insert(source.id.clone(), articles.len());
                    *report.per_category.entry(source.category).or_default() += articles.len();
                    report.articles.extend(articles);
                }
                Err(e) => {
                    logger.error(&format!("Collection failed: {}", e));
                    report.failed.push((source.id.clone(), e.to_string()));
                }
            }
        }

        if !report.failed.is_empty() {
            warn!("{} sources failed", report.failed.len());
        }
        info!(
            "===== Collected {} articles ({} sources ok) =====",
            report.total(),
            report.per_source.len()
        );
        report
    }
}
