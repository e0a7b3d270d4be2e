use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use dsn_core::config::InferenceSettings;
use dsn_core::{Article, InferenceModel};
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::{debug, error, info, warn};

use crate::text::{clip_for_translation, fallback_summary, is_mostly_korean, simple_summary, MIN_SUMMARY_INPUT};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EnrichmentStats {
    pub translated: usize,
    pub translation_failures: usize,
    pub summarized: usize,
    pub summary_fallbacks: usize,
    pub cache_hits: usize,
    pub api_requests: usize,
    pub api_errors: usize,
    pub killswitch_active: bool,
}

impl EnrichmentStats {
    pub fn error_rate(&self) -> f64 {
        if self.api_requests == 0 {
            0.0
        } else {
            self.api_errors as f64 / self.api_requests as f64
        }
    }
}

/// Stops remote calls once too many of them fail. Only evaluated after
/// `min_requests` calls so a bad first request does not trip it.
#[derive(Debug, Clone)]
pub struct KillSwitch {
    threshold: f64,
    min_requests: usize,
    requests: usize,
    errors: usize,
    tripped: bool,
}

impl Default for KillSwitch {
    fn default() -> Self {
        Self::new(0.5, 10)
    }
}

impl KillSwitch {
    pub fn new(threshold: f64, min_requests: usize) -> Self {
        Self {
            threshold,
            min_requests,
            requests: 0,
            errors: 0,
            tripped: false,
        }
    }

    pub fn record(&mut self, ok: bool) {
        self.requests += 1;
        if !ok {
            self.errors += 1;
        }
        if !self.tripped && self.requests > self.min_requests && self.error_rate() >= self.threshold {
            self.tripped = true;
            error!(
                "Kill switch tripped: API error rate {:.0}% ({}/{})",
                self.error_rate() * 100.0,
                self.errors,
                self.requests
            );
        }
    }

    pub fn error_rate(&self) -> f64 {
        if self.requests == 0 {
            0.0
        } else {
            self.errors as f64 / self.requests as f64
        }
    }

    pub fn is_tripped(&self) -> bool {
        self.tripped
    }

    pub fn reset(&mut self) {
        *self = Self::new(self.threshold, self.min_requests);
    }
}

enum Translation {
    NotNeeded,
    Done(String),
    Failed,
}

/// Adds translations and summaries to the final article list.
///
/// Every failure degrades to something usable: the original text for
/// translations, an extractive summary for summaries.
pub struct Enricher {
    model: Arc<dyn InferenceModel>,
    target_language: String,
    translate_delay: Duration,
    summarize_delay: Duration,
    cache: HashMap<String, String>,
    killswitch: KillSwitch,
    stats: EnrichmentStats,
}

impl Enricher {
    pub fn new(model: Arc<dyn InferenceModel>, settings: &InferenceSettings) -> Self {
        Self {
            model,
            target_language: settings.target_language.clone(),
            translate_delay: Duration::from_millis(settings.translate_delay_ms),
            summarize_delay: Duration::from_millis(settings.summarize_delay_ms),
            cache: HashMap::new(),
            killswitch: KillSwitch::default(),
            stats: EnrichmentStats::default(),
        }
    }

    pub fn model_name(&self) -> &str {
        self.model.name()
    }

    pub fn stats(&self) -> EnrichmentStats {
        EnrichmentStats {
            api_requests: self.killswitch.requests,
            api_errors: self.killswitch.errors,
            killswitch_active: self.killswitch.is_tripped(),
            ..self.stats.clone()
        }
    }

    pub fn reset_killswitch(&mut self) {
        info!("Kill switch reset");
        self.killswitch.reset();
    }

    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    fn cache_key(kind: &str, parts: &[&str]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(kind.as_bytes());
        for part in parts {
            hasher.update([0u8]);
            hasher.update(part.as_bytes());
        }
        hasher
            .finalize()
            .iter()
            .map(|b| format!("{:02x}", b))
            .collect()
    }

    async fn pause(delay: Duration) {
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }

    async fn translate_text(&mut self, text: &str) -> Translation {
        if text.trim().is_empty() || is_mostly_korean(text) {
            return Translation::NotNeeded;
        }

        let key = Self::cache_key("translate", &[self.target_language.as_str(), text]);
        if let Some(cached) = self.cache.get(&key) {
            self.stats.cache_hits += 1;
            return Translation::Done(cached.clone());
        }
        if self.killswitch.is_tripped() {
            return Translation::Failed;
        }

        let result = self
            .model
            .translate(clip_for_translation(text), &self.target_language)
            .await;
        Self::pause(self.translate_delay).await;

        match result {
            Ok(translated) if !translated.trim().is_empty() => {
                self.killswitch.record(true);
                self.cache.insert(key, translated.clone());
                Translation::Done(translated)
            }
            Ok(_) => {
                self.killswitch.record(false);
                warn!("Empty translation from {}", self.model.name());
                Translation::Failed
            }
            Err(e) => {
                self.killswitch.record(false);
                warn!("Translation failed: {}", e);
                Translation::Failed
            }
        }
    }

    /// Fill `translated_title` and `translated_content`. Korean text is left
    /// alone; failures keep the original text.
    pub async fn translate_article(&mut self, article: &mut Article) {
        if !self.model.is_remote() {
            return;
        }

        let title = self.translate_text(&article.title).await;
        let content = self.translate_text(&article.content).await;

        let mut failed = false;
        match title {
            Translation::Done(t) => article.translated_title = Some(t),
            Translation::Failed => failed = true,
            Translation::NotNeeded => {}
        }
        match content {
            Translation::Done(c) => article.translated_content = Some(c),
            Translation::Failed => failed = true,
            Translation::NotNeeded => {}
        }

        if failed {
            self.stats.translation_failures += 1;
        } else if article.translated_title.is_some() || article.translated_content.is_some() {
            self.stats.translated += 1;
        }
    }

    pub async fn summarize_text(&mut self, title: &str, content: &str) -> String {
        if content.trim().is_empty() {
            return title.to_string();
        }

        let key = Self::cache_key("summary", &[title, content]);
        if let Some(cached) = self.cache.get(&key) {
            debug!("Summary cache hit: {}", title);
            self.stats.cache_hits += 1;
            return cached.clone();
        }

        let summary = if !self.model.is_remote() {
            match self.model.summarize(title, content).await {
                Ok(summary) => summary,
                Err(_) => fallback_summary(title, content),
            }
        } else if self.killswitch.is_tripped() {
            self.stats.summary_fallbacks += 1;
            fallback_summary(title, content)
        } else if content.chars().count() < MIN_SUMMARY_INPUT {
            simple_summary(title, content)
        } else {
            let result = self.model.summarize(title, content).await;
            Self::pause(self.summarize_delay).await;
            match result {
                Ok(summary) if !summary.trim().is_empty() => {
                    self.killswitch.record(true);
                    summary
                }
                other => {
                    self.killswitch.record(false);
                    if let Err(e) = other {
                        warn!("Summary failed for {}: {}", title, e);
                    }
                    self.stats.summary_fallbacks += 1;
                    fallback_summary(title, content)
                }
            }
        };

        self.stats.summarized += 1;
        self.cache.insert(key, summary.clone());
        summary
    }

    /// Translate the articles flagged for translation, then summarize every
    /// article. Order and length of `articles` are preserved.
    pub async fn enrich(&mut self, articles: Vec<Article>) -> Vec<Article> {
        let total = articles.len();
        let to_translate = articles.iter().filter(|a| a.needs_translation).count();
        info!(
            "Enriching {} articles with {} ({} to translate)",
            total,
            self.model.name(),
            to_translate
        );

        let mut enriched = Vec::with_capacity(total);
        for (i, mut article) in articles.into_iter().enumerate() {
            if article.needs_translation {
                self.translate_article(&mut article).await;
            }
            let summary = self.summarize_text(&article.title, &article.content).await;
            article.summary = Some(summary);
            enriched.push(article);

            if (i + 1) % 5 == 0 {
                info!("Enrichment progress: {}/{}", i + 1, total);
            }
        }

        let stats = self.stats();
        info!(
            "Enrichment done: {} translated, {} summarized ({} fallbacks), API error rate {:.0}%",
            stats.translated,
            stats.summarized,
            stats.summary_fallbacks,
            stats.error_rate() * 100.0
        );
        if stats.killswitch_active {
            warn!("Kill switch is active; summaries fell back to extracts");
        }
        enriched
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use dsn_core::{Error, Result};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use crate::models::ExtractiveModel;

    #[derive(Default)]
    struct ScriptedModel {
        fail: bool,
        summaries: AtomicUsize,
        translations: Mutex<Vec<usize>>,
    }

    #[async_trait]
    impl InferenceModel for ScriptedModel {
        fn name(&self) -> &str {
            "Scripted"
        }

        async fn translate(&self, text: &str, target: &str) -> Result<String> {
            self.translations.lock().unwrap().push(text.chars().count());
            if self.fail {
                return Err(Error::Inference("boom".to_string()));
            }
            Ok(format!("[{}] {}", target, text))
        }

        async fn summarize(&self, _title: &str, _content: &str) -> Result<String> {
            self.summaries.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(Error::Inference("boom".to_string()));
            }
            Ok("첫째 문장. 둘째 문장. 셋째 문장.".to_string())
        }
    }

    fn settings() -> InferenceSettings {
        InferenceSettings {
            translate_delay_ms: 0,
            summarize_delay_ms: 0,
            ..InferenceSettings::default()
        }
    }

    const LONG: &str = "Large language models are trained on web-scale corpora. \
                        Instruction tuning aligns them with user intent. Evaluation remains hard.";

    fn article(n: usize, title: &str, content: &str, needs_translation: bool) -> Article {
        let mut a = Article::new("kdnuggets", title, content, format!("https://kd.com/{}", n), "2025-10-05");
        a.needs_translation = needs_translation;
        a
    }

    #[test]
    fn test_killswitch_needs_enough_requests() {
        let mut switch = KillSwitch::default();
        for _ in 0..10 {
            switch.record(false);
        }
        assert!(!switch.is_tripped());
        switch.record(false);
        assert!(switch.is_tripped());

        switch.reset();
        assert!(!switch.is_tripped());
        for i in 0..11 {
            switch.record(i % 2 == 0);
        }
        // 5 errors out of 11
        assert!(!switch.is_tripped());
    }

    #[tokio::test]
    async fn test_translates_flagged_articles_only() {
        let model = Arc::new(ScriptedModel::default());
        let mut enricher = Enricher::new(model.clone(), &settings());

        let out = enricher
            .enrich(vec![
                article(1, "Scaling laws revisited", LONG, true),
                article(2, "머신러닝 구현 가이드", "한국어 본문입니다. 이미 한국어로 작성된 글입니다. 번역이 필요 없습니다.", false),
            ])
            .await;

        assert_eq!(out[0].translated_title.as_deref(), Some("[ko] Scaling laws revisited"));
        assert!(out[0].translated_content.is_some());
        assert!(out[1].translated_title.is_none());
        assert_eq!(out[0].summary.as_deref(), Some("첫째 문장. 둘째 문장. 셋째 문장."));
        assert!(out.iter().all(|a| a.summary.is_some()));
        assert_eq!(enricher.stats().translated, 1);
    }

    #[tokio::test]
    async fn test_long_content_is_clipped_before_translation() {
        let model = Arc::new(ScriptedModel::default());
        let mut enricher = Enricher::new(model.clone(), &settings());
        let mut a = article(1, "Long read", &"word ".repeat(500), true);

        enricher.translate_article(&mut a).await;

        let lengths = model.translations.lock().unwrap().clone();
        assert_eq!(lengths, vec!["Long read".len(), 1000]);
    }

    #[tokio::test]
    async fn test_summaries_are_cached() {
        let model = Arc::new(ScriptedModel::default());
        let mut enricher = Enricher::new(model.clone(), &settings());

        let first = enricher.summarize_text("RLHF", LONG).await;
        let second = enricher.summarize_text("RLHF", LONG).await;

        assert_eq!(first, second);
        assert_eq!(model.summaries.load(Ordering::SeqCst), 1);
        assert_eq!(enricher.stats().cache_hits, 1);
    }

    #[tokio::test]
    async fn test_short_content_skips_the_api() {
        let model = Arc::new(ScriptedModel::default());
        let mut enricher = Enricher::new(model.clone(), &settings());

        let summary = enricher.summarize_text("GPT-5", "Released today.").await;

        assert_eq!(summary, "GPT-5. Released today.");
        assert_eq!(model.summaries.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_failures_fall_back_and_trip_killswitch() {
        let model = Arc::new(ScriptedModel {
            fail: true,
            ..ScriptedModel::default()
        });
        let mut enricher = Enricher::new(model.clone(), &settings());

        let articles = (0..15)
            .map(|i| article(i, &format!("Paper {}", i), &format!("{} Variant {}.", LONG, i), false))
            .collect();
        let out = enricher.enrich(articles).await;

        assert_eq!(out.len(), 15);
        assert_eq!(
            out[0].summary.as_deref(),
            Some("Large language models are trained on web-scale corpora. Instruction tuning aligns them with user intent.")
        );
        // the switch trips on the 11th failure; later articles never reach the model
        assert_eq!(model.summaries.load(Ordering::SeqCst), 11);
        let stats = enricher.stats();
        assert!(stats.killswitch_active);
        assert_eq!(stats.summary_fallbacks, 15);
        assert_eq!(stats.api_errors, 11);
    }

    #[tokio::test]
    async fn test_failed_translation_keeps_original() {
        let model = Arc::new(ScriptedModel {
            fail: true,
            ..ScriptedModel::default()
        });
        let mut enricher = Enricher::new(model, &settings());
        let mut a = article(1, "Mixture of experts", LONG, true);

        enricher.translate_article(&mut a).await;

        assert!(a.translated_title.is_none());
        assert_eq!(a.display_title(), "Mixture of experts");
        assert_eq!(enricher.stats().translation_failures, 1);
    }

    #[tokio::test]
    async fn test_offline_model_never_translates() {
        let mut enricher = Enricher::new(Arc::new(ExtractiveModel::new()), &settings());
        let out = enricher.enrich(vec![article(1, "Agents in production", LONG, true)]).await;

        assert!(out[0].translated_title.is_none());
        assert_eq!(
            out[0].summary.as_deref(),
            Some("Large language models are trained on web-scale corpora. Instruction tuning aligns them with user intent.")
        );
        assert_eq!(enricher.stats().api_requests, 0);
    }
}
