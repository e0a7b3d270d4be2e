use dsn_core::{Article, FilterConfig};
use tracing::{debug, info};

/// Lowercase, drop punctuation, collapse whitespace. Letters of any script
/// survive, so Korean titles compare the same way English ones do.
pub fn normalize_title(title: &str) -> String {
    title
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace() || *c == '_')
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Edit-distance ratio between two normalized titles, in [0, 1]
pub fn title_similarity(a: &str, b: &str) -> f64 {
    strsim::normalized_levenshtein(&normalize_title(a), &normalize_title(b))
}

#[derive(Debug, Clone, Copy)]
pub struct Deduplicator {
    threshold: f64,
}

impl Deduplicator {
    pub fn new(config: &FilterConfig) -> Self {
        Self::with_threshold(config.duplicate_title_similarity_threshold)
    }

    pub fn with_threshold(threshold: f64) -> Self {
        Self { threshold }
    }

    fn same_url(a: &Article, b: &Article) -> bool {
        !a.url.is_empty() && a.url == b.url
    }

    fn similar_title(&self, a: &Article, b: &Article) -> bool {
        let (ta, tb) = (normalize_title(&a.title), normalize_title(&b.title));
        if ta.is_empty() || tb.is_empty() {
            return false;
        }
        strsim::normalized_levenshtein(&ta, &tb) >= self.threshold
    }

    pub fn is_duplicate(&self, a: &Article, b: &Article) -> bool {
        Self::same_url(a, b) || self.similar_title(a, b)
    }

    /// Keep one article per duplicate group, the highest scored. A candidate
    /// is compared with every accepted article. It survives only if it beats
    /// all of its matches, taking the slot of the first one; the other
    /// matches are removed so no two accepted articles stay duplicates.
    pub fn deduplicate(&self, articles: Vec<Article>) -> Vec<Article> {
        let total = articles.len();
        let mut unique: Vec<Article> = Vec::with_capacity(total);

        for candidate in articles {
            let matches: Vec<usize> = unique
                .iter()
                .enumerate()
                .filter(|(_, a)| self.is_duplicate(a, &candidate))
                .map(|(i, _)| i)
                .collect();

            let Some(&first) = matches.first() else {
                unique.push(candidate);
                continue;
            };

            let best = matches
                .iter()
                .map(|&i| unique[i].score)
                .fold(f64::NEG_INFINITY, f64::max);
            if candidate.score <= best {
                debug!("Duplicate dropped ({} <= {}): {}", candidate.score, best, candidate.title);
                continue;
            }

            debug!(
                "Duplicate replaced {} article(s) ({} > {}): {}",
                matches.len(),
                candidate.score,
                best,
                candidate.title
            );
            for &i in matches[1..].iter().rev() {
                unique.remove(i);
            }
            unique[first] = candidate;
        }

        info!("Deduplication: {} → {}", total, unique.len());
        unique
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article(id: &str, title: &str, url: &str, score: f64) -> Article {
        let mut a = Article::new("kdnuggets", title, "", url, "2025-10-01T00:00:00Z").with_score(score);
        a.id = id.to_string();
        a
    }

    #[test]
    fn test_normalize_title() {
        assert_eq!(normalize_title("  Hello,   World!! "), "hello world");
        assert_eq!(normalize_title("LLM: 시계열 분석?"), "llm 시계열 분석");
    }

    #[test]
    fn test_same_url_keeps_higher_score() {
        let dedup = Deduplicator::with_threshold(0.8);
        let out = dedup.deduplicate(vec![
            article("a", "First take", "https://x.com/post", 60.0),
            article("b", "Completely different words", "https://x.com/post", 80.0),
        ]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].id, "b");
    }

    #[test]
    fn test_lower_scored_duplicate_is_dropped() {
        let dedup = Deduplicator::with_threshold(0.8);
        let out = dedup.deduplicate(vec![
            article("a", "OpenAI releases new model", "https://a.com/1", 90.0),
            article("b", "OpenAI releases new model!", "https://b.com/2", 75.0),
        ]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].id, "a");
    }

    #[test]
    fn test_empty_urls_are_not_duplicates() {
        let dedup = Deduplicator::with_threshold(0.8);
        let out = dedup.deduplicate(vec![
            article("a", "Graph neural networks explained", "", 80.0),
            article("b", "Vector databases compared", "", 80.0),
        ]);
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn test_empty_titles_do_not_match_each_other() {
        let dedup = Deduplicator::with_threshold(0.8);
        let out = dedup.deduplicate(vec![
            article("a", "!!!", "https://a.com/1", 80.0),
            article("b", "", "https://b.com/2", 80.0),
        ]);
        assert_eq!(out.len(), 2);
    }

    fn assert_no_duplicate_pairs(dedup: &Deduplicator, out: &[Article]) {
        for (i, a) in out.iter().enumerate() {
            for b in &out[i + 1..] {
                assert!(!dedup.is_duplicate(a, b), "{} and {} are duplicates", a.id, b.id);
            }
        }
    }

    #[test]
    fn test_candidate_matching_by_url_and_title_replaces_both() {
        let dedup = Deduplicator::with_threshold(0.8);
        let out = dedup.deduplicate(vec![
            article("a", "Fine-tuning small models", "https://a.com/1", 70.0),
            article("b", "A field report on GPU pricing", "https://b.com/2", 70.0),
            // title looks like "a", url is "b"'s
            article("c", "Fine-tuning small models!", "https://b.com/2", 95.0),
        ]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].id, "c");
        assert_no_duplicate_pairs(&dedup, &out);
    }

    #[test]
    fn test_candidate_similar_to_two_accepted_titles() {
        let dedup = Deduplicator::with_threshold(0.8);
        // "a" and "b" are not similar to each other, "c" is similar to both
        let out = dedup.deduplicate(vec![
            article("a", "Deep learning for tabular data 2025", "https://a.com/1", 70.0),
            article("x", "Vector databases compared", "https://x.com/1", 75.0),
            article("b", "New deep learning for tabular data", "https://b.com/1", 80.0),
            article("c", "Deep learning for tabular data", "https://c.com/1", 90.0),
        ]);
        assert_eq!(out.iter().map(|a| a.id.as_str()).collect::<Vec<_>>(), vec!["c", "x"]);
        assert_no_duplicate_pairs(&dedup, &out);
    }

    #[test]
    fn test_candidate_losing_to_any_match_is_dropped() {
        let dedup = Deduplicator::with_threshold(0.8);
        let out = dedup.deduplicate(vec![
            article("a", "Fine-tuning small models", "https://a.com/1", 90.0),
            article("b", "A field report on GPU pricing", "https://b.com/2", 60.0),
            article("c", "Fine-tuning small models!", "https://b.com/2", 80.0),
        ]);
        assert_eq!(out.iter().map(|a| a.id.as_str()).collect::<Vec<_>>(), vec!["a", "b"]);
        assert_no_duplicate_pairs(&dedup, &out);
    }

    #[test]
    fn test_replacement_keeps_position() {
        let dedup = Deduplicator::with_threshold(0.8);
        let out = dedup.deduplicate(vec![
            article("a", "Alpha", "https://a.com/1", 70.0),
            article("b", "Bravo", "https://b.com/1", 70.0),
            article("c", "Alpha again", "https://a.com/1", 99.0),
        ]);
        assert_eq!(out.iter().map(|a| a.id.as_str()).collect::<Vec<_>>(), vec!["c", "b"]);
    }
}
