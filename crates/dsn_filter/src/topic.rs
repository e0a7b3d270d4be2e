use dsn_core::FilterConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TopicVerdict {
    Required(String),
    Supplementary(String),
    Excluded(String),
    NoKeyword,
}

impl TopicVerdict {
    pub fn passes(&self) -> bool {
        matches!(self, TopicVerdict::Required(_) | TopicVerdict::Supplementary(_))
    }
}

/// Keeps AI/ML articles and drops generic software-engineering content.
/// Exclusion is checked first and wins over any domain keyword.
#[derive(Debug, Clone)]
pub struct KeywordGate {
    required: Vec<String>,
    excluded: Vec<String>,
    supplementary: Vec<String>,
}

fn lowered(items: &[String]) -> Vec<String> {
    items.iter().map(|s| s.to_lowercase()).collect()
}

fn first_match<'a>(keywords: &'a [String], text: &str) -> Option<&'a String> {
    keywords.iter().find(|k| text.contains(k.as_str()))
}

impl KeywordGate {
    pub fn new(config: &FilterConfig) -> Self {
        Self {
            required: lowered(&config.required_keywords),
            excluded: lowered(&config.excluded_keywords),
            supplementary: lowered(&config.supplementary_keywords),
        }
    }

    pub fn check(&self, title: &str, content: &str) -> TopicVerdict {
        let text = format!("{} {}", title, content).to_lowercase();

        if let Some(k) = first_match(&self.excluded, &text) {
            return TopicVerdict::Excluded(k.clone());
        }
        if let Some(k) = first_match(&self.required, &text) {
            return TopicVerdict::Required(k.clone());
        }
        if let Some(k) = first_match(&self.supplementary, &text) {
            return TopicVerdict::Supplementary(k.clone());
        }
        TopicVerdict::NoKeyword
    }

    pub fn passes(&self, title: &str, content: &str) -> bool {
        self.check(title, content).passes()
    }
}

/// Topic check with the default keyword tables
pub fn passes_topic_filter(title: &str, content: &str) -> bool {
    KeywordGate::new(&FilterConfig::default()).passes(title, content)
}
