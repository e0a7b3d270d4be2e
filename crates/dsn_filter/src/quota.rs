use std::collections::BTreeMap;

use dsn_core::{Article, FilterConfig, QuotaBounds, SourceCategory};
use serde::Serialize;
use tracing::info;

#[derive(Debug, Clone, Default, Serialize)]
pub struct Allocation {
    pub articles: Vec<Article>,
    pub per_category: BTreeMap<SourceCategory, usize>,
}

pub(crate) fn sort_by_score_desc(articles: &mut [Article]) {
    articles.sort_by(|a, b| b.score.total_cmp(&a.score));
}

/// Splits the final list across source tiers. Quotas are upper bounds: a
/// tier with fewer articles than its target contributes what it has.
#[derive(Debug, Clone)]
pub struct QuotaAllocator {
    target_total: usize,
    ratios: BTreeMap<SourceCategory, f64>,
    bounds: BTreeMap<SourceCategory, QuotaBounds>,
}

impl QuotaAllocator {
    pub fn new(config: &FilterConfig) -> Self {
        Self::with_targets(
            config.final_article_count,
            config.category_ratios.clone(),
            config.category_min_max.clone(),
        )
    }

    pub fn with_targets(
        target_total: usize,
        ratios: BTreeMap<SourceCategory, f64>,
        bounds: BTreeMap<SourceCategory, QuotaBounds>,
    ) -> Self {
        Self {
            target_total,
            ratios,
            bounds,
        }
    }

    /// `clamp(round(target_total * ratio), min, max)`
    pub fn target_count(&self, category: SourceCategory) -> usize {
        let ratio = self.ratios.get(&category).copied().unwrap_or(0.0);
        let raw = (self.target_total as f64 * ratio).round() as usize;
        match self.bounds.get(&category) {
            Some(bounds) => raw.clamp(bounds.min, bounds.max),
            None => raw,
        }
    }

    pub fn allocate(&self, categorized: BTreeMap<SourceCategory, Vec<Article>>) -> Allocation {
        let mut allocation = Allocation::default();

        for (category, mut articles) in categorized {
            let target = self.target_count(category);
            sort_by_score_desc(&mut articles);
            articles.truncate(target);
            info!(
                "Quota {}: {} selected (target {})",
                category,
                articles.len(),
                target
            );
            allocation.per_category.insert(category, articles.len());
            allocation.articles.extend(articles);
        }

        sort_by_score_desc(&mut allocation.articles);
        allocation
    }
}
