use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use dsn_core::{Article, FilterConfig, SourceCategory};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::dedup::Deduplicator;
use crate::quota::{sort_by_score_desc, QuotaAllocator};
use crate::recency::{parse_published, RecencyFilter};
use crate::scorer::{freshness_bonus, Scorer};
use crate::topic::KeywordGate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Collected,
    RecencyFiltered,
    TopicFiltered,
    ScoreThresholded,
    Deduplicated,
    Allocated,
    Final,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Collected => "collected",
            Stage::RecencyFiltered => "recency filtered",
            Stage::TopicFiltered => "topic filtered",
            Stage::ScoreThresholded => "score thresholded",
            Stage::Deduplicated => "deduplicated",
            Stage::Allocated => "allocated",
            Stage::Final => "final",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoreStats {
    pub min: f64,
    pub max: f64,
    pub avg: f64,
}

impl ScoreStats {
    pub fn of(articles: &[Article]) -> Option<Self> {
        if articles.is_empty() {
            return None;
        }
        let scores = articles.iter().map(|a| a.score);
        let min = scores.clone().fold(f64::INFINITY, f64::min);
        let max = scores.clone().fold(f64::NEG_INFINITY, f64::max);
        let avg = scores.sum::<f64>() / articles.len() as f64;
        Some(Self { min, max, avg })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Nothing came in; every stage was skipped
    NoArticles,
    Completed,
}

#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    pub status: RunStatus,
    pub stages: Vec<(Stage, usize)>,
    pub per_category: BTreeMap<SourceCategory, usize>,
    pub uncategorized: usize,
    pub scored: Option<ScoreStats>,
    pub output: Option<ScoreStats>,
}

impl PipelineReport {
    fn new(status: RunStatus) -> Self {
        Self {
            status,
            stages: Vec::new(),
            per_category: BTreeMap::new(),
            uncategorized: 0,
            scored: None,
            output: None,
        }
    }

    fn record(&mut self, stage: Stage, count: usize) {
        if let Some((previous, before)) = self.stages.last() {
            info!("{} → {}: {} → {}", previous, stage, before, count);
        }
        self.stages.push((stage, count));
    }

    pub fn count_at(&self, stage: Stage) -> Option<usize> {
        self.stages.iter().find(|(s, _)| *s == stage).map(|(_, n)| *n)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FilterRun {
    pub articles: Vec<Article>,
    pub report: PipelineReport,
}

impl FilterRun {
    pub fn is_empty(&self) -> bool {
        self.articles.is_empty()
    }
}

/// Turns a raw collected batch into the final article list.
pub struct Pipeline {
    config: FilterConfig,
    recency: RecencyFilter,
    gate: KeywordGate,
    scorer: Scorer,
    dedup: Deduplicator,
    allocator: QuotaAllocator,
}

impl Pipeline {
    pub fn new(config: FilterConfig) -> Self {
        Self {
            recency: RecencyFilter::new(&config),
            gate: KeywordGate::new(&config),
            scorer: Scorer::new(&config),
            dedup: Deduplicator::new(&config),
            allocator: QuotaAllocator::new(&config),
            config,
        }
    }

    pub fn config(&self) -> &FilterConfig {
        &self.config
    }

    pub fn scorer(&self) -> &Scorer {
        &self.scorer
    }

    pub fn run(&self, raw: Vec<Article>, now: DateTime<Utc>) -> FilterRun {
        if raw.is_empty() {
            warn!("No articles produced this run; skipping filtering");
            let mut report = PipelineReport::new(RunStatus::NoArticles);
            report.stages.push((Stage::Collected, 0));
            return FilterRun {
                articles: Vec::new(),
                report,
            };
        }

        info!("===== Filtering {} articles =====", raw.len());
        let mut report = PipelineReport::new(RunStatus::Completed);
        report.record(Stage::Collected, raw.len());

        let recent = self.filter_recent(raw, now);
        report.record(Stage::RecencyFiltered, recent.len());

        let on_topic = self.filter_topic(recent);
        report.record(Stage::TopicFiltered, on_topic.len());

        let scored = self.score_all(on_topic, now);
        report.scored = ScoreStats::of(&scored);
        let kept = self.apply_threshold(scored);
        report.record(Stage::ScoreThresholded, kept.len());

        let unique = self.dedup.deduplicate(kept);
        report.record(Stage::Deduplicated, unique.len());

        let (categorized, uncategorized) = self.categorize(unique);
        report.uncategorized = uncategorized;
        let allocation = self.allocator.allocate(categorized);
        report.per_category = allocation.per_category;
        report.record(Stage::Allocated, allocation.articles.len());

        let mut articles = allocation.articles;
        sort_by_score_desc(&mut articles);
        report.output = ScoreStats::of(&articles);
        report.record(Stage::Final, articles.len());

        if let Some(stats) = &report.output {
            info!(
                "===== Filtering done: {} articles, avg score {:.1} =====",
                articles.len(),
                stats.avg
            );
        }

        FilterRun { articles, report }
    }

    fn filter_recent(&self, articles: Vec<Article>, now: DateTime<Utc>) -> Vec<Article> {
        articles
            .into_iter()
            .filter(|a| {
                let verdict = self.recency.check(&a.published, now);
                if !verdict.is_recent() {
                    debug!("Dropped as not recent ({:?}): {}", verdict, a.title);
                }
                verdict.is_recent()
            })
            .collect()
    }

    fn filter_topic(&self, articles: Vec<Article>) -> Vec<Article> {
        articles
            .into_iter()
            .filter(|a| {
                let verdict = self.gate.check(&a.title, &a.content);
                if !verdict.passes() {
                    debug!("Dropped as off-topic ({:?}): {}", verdict, a.title);
                }
                verdict.passes()
            })
            .collect()
    }

    fn score_all(&self, articles: Vec<Article>, now: DateTime<Utc>) -> Vec<Article> {
        articles
            .into_iter()
            .map(|mut a| {
                let mut breakdown = self.scorer.breakdown(&a.title, &a.content, &a.source_id);
                if let (Some(bonus), Ok(published)) =
                    (&self.config.freshness_bonus, parse_published(&a.published))
                {
                    breakdown = breakdown.with_bonus("freshness", freshness_bonus(published, now, bonus));
                }
                a.score = breakdown.total();
                a
            })
            .collect()
    }

    fn apply_threshold(&self, articles: Vec<Article>) -> Vec<Article> {
        let threshold = self.config.min_score_threshold;
        articles
            .into_iter()
            .filter(|a| {
                if a.score < threshold {
                    debug!("Dropped below threshold ({} < {}): {}", a.score, threshold, a.title);
                }
                a.score >= threshold
            })
            .collect()
    }

    fn categorize(&self, articles: Vec<Article>) -> (BTreeMap<SourceCategory, Vec<Article>>, usize) {
        let mut categorized: BTreeMap<SourceCategory, Vec<Article>> = BTreeMap::new();
        let mut uncategorized = 0;
        for article in articles {
            match self.config.category_of(&article.source_id) {
                Some(category) => categorized.entry(category).or_default().push(article),
                None => {
                    debug!("No category for source {}: {}", article.source_id, article.title);
                    uncategorized += 1;
                }
            }
        }
        (categorized, uncategorized)
    }
}
