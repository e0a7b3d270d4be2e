use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use dsn_core::config::FreshnessBonus;
use dsn_core::{FilterConfig, SourceCategory};
use tracing::debug;

/// Itemized score: where every point came from.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreBreakdown {
    pub base: f64,
    pub bonuses: Vec<(String, f64)>,
    pub penalties: Vec<(String, f64)>,
}

impl ScoreBreakdown {
    pub fn with_bonus(mut self, label: impl Into<String>, points: f64) -> Self {
        if points != 0.0 {
            self.bonuses.push((label.into(), points));
        }
        self
    }

    /// Sum of every item, clamped at zero
    pub fn total(&self) -> f64 {
        let bonus: f64 = self.bonuses.iter().map(|(_, p)| p).sum();
        let penalty: f64 = self.penalties.iter().map(|(_, p)| p).sum();
        (self.base + bonus - penalty).max(0.0)
    }
}

/// Additive relevance score: tier base + priority keywords - exclusion
/// patterns. Keyword tables are lowercased once at construction.
#[derive(Debug, Clone)]
pub struct Scorer {
    base_score_per_tier: BTreeMap<SourceCategory, f64>,
    default_base_score: f64,
    source_categories: BTreeMap<String, SourceCategory>,
    priority_keywords: Vec<(String, f64)>,
    exclude_patterns: Vec<String>,
    exclude_penalty: f64,
}

impl Scorer {
    pub fn new(config: &FilterConfig) -> Self {
        Self {
            base_score_per_tier: config.base_score_per_tier.clone(),
            default_base_score: config.default_base_score,
            source_categories: config.source_categories.clone(),
            priority_keywords: config
                .priority_keywords
                .iter()
                .map(|(k, v)| (k.to_lowercase(), *v))
                .collect(),
            exclude_patterns: config
                .exclude_patterns
                .iter()
                .map(|p| p.to_lowercase())
                .collect(),
            exclude_penalty: config.exclude_penalty,
        }
    }

    pub fn base_score(&self, source_id: &str) -> f64 {
        self.source_categories
            .get(source_id)
            .and_then(|category| self.base_score_per_tier.get(category))
            .copied()
            .unwrap_or(self.default_base_score)
    }

    pub fn breakdown(&self, title: &str, content: &str, source_id: &str) -> ScoreBreakdown {
        let text = format!("{} {}", title, content).to_lowercase();

        let bonuses = self
            .priority_keywords
            .iter()
            .filter(|(keyword, _)| text.contains(keyword.as_str()))
            .map(|(keyword, bonus)| (keyword.clone(), *bonus))
            .collect();

        let penalties = self
            .exclude_patterns
            .iter()
            .filter(|pattern| text.contains(pattern.as_str()))
            .map(|pattern| (pattern.clone(), self.exclude_penalty))
            .collect();

        ScoreBreakdown {
            base: self.base_score(source_id),
            bonuses,
            penalties,
        }
    }

    pub fn score(&self, title: &str, content: &str, source_id: &str) -> f64 {
        let breakdown = self.breakdown(title, content, source_id);
        let total = breakdown.total();
        debug!(
            "Scored {}: base {} + {:?} - {:?} = {}",
            source_id, breakdown.base, breakdown.bonuses, breakdown.penalties, total
        );
        total
    }
}

/// Points for recency on top of the keyword score; zero past a week or for
/// future timestamps.
pub fn freshness_bonus(published: DateTime<Utc>, now: DateTime<Utc>, bonus: &FreshnessBonus) -> f64 {
    let hours = (now - published).num_hours();
    match hours {
        h if h < 0 => 0.0,
        h if h < 24 => bonus.within_day,
        h if h < 24 * 7 => bonus.within_week,
        _ => 0.0,
    }
}
