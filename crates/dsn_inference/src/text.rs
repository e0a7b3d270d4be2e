//! Plain-text helpers shared by the models and the enricher.

/// Text longer than this is clipped before translation
pub const TRANSLATION_CLIP_TRIGGER: usize = 2000;
/// How much of an over-long text is sent for translation
pub const TRANSLATION_CLIP_LEN: usize = 1000;
/// Content shorter than this gets a title-based summary instead of an API call
pub const MIN_SUMMARY_INPUT: usize = 50;

const WEAK_OPENERS: [&str; 5] = ["the", "a", "an", "this", "that"];

/// Split on sentence terminators. ASCII terminators only count when followed
/// by whitespace or the end of the text, so "3.5" and "e.g" stay intact.
pub fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        let boundary = match c {
            '。' | '！' | '？' => true,
            '.' | '!' | '?' => chars.peek().map_or(true, |(_, next)| next.is_whitespace()),
            _ => false,
        };
        if boundary {
            let sentence = text[start..i].trim();
            if !sentence.is_empty() {
                sentences.push(sentence);
            }
            start = i + c.len_utf8();
        }
    }

    let rest = text[start..].trim();
    if !rest.is_empty() {
        sentences.push(rest);
    }
    sentences
}

pub fn count_sentences(text: &str) -> usize {
    split_sentences(text).len()
}

fn is_meaningful(sentence: &str) -> bool {
    if sentence.chars().count() <= 10 {
        return false;
    }
    let first_word = sentence
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .to_lowercase();
    !WEAK_OPENERS.contains(&first_word.as_str())
}

/// Extractive summary: the first two meaningful sentences of the content.
pub fn fallback_summary(title: &str, content: &str) -> String {
    if content.trim().is_empty() {
        return title.to_string();
    }

    let meaningful: Vec<&str> = split_sentences(content)
        .into_iter()
        .filter(|s| is_meaningful(s))
        .collect();

    match meaningful.as_slice() {
        [] => format!("{}. 자세한 내용은 원문을 참조하세요.", title),
        [only] => format!("{}. {}에 대한 추가 정보는 원문을 참조하세요.", only, title),
        [first, second, ..] => format!("{}. {}.", first, second),
    }
}

/// Summary for content too short to be worth an API call
pub fn simple_summary(title: &str, content: &str) -> String {
    let head: String = content.trim().chars().take(100).collect();
    format!("{}. {}", title, head)
}

/// The part of `text` that is sent for translation
pub fn clip_for_translation(text: &str) -> &str {
    if text.chars().count() <= TRANSLATION_CLIP_TRIGGER {
        return text;
    }
    match text.char_indices().nth(TRANSLATION_CLIP_LEN) {
        Some((i, _)) => &text[..i],
        None => text,
    }
}

fn is_hangul(c: char) -> bool {
    ('가'..='힣').contains(&c)
}

/// More than 30% of the letters are Hangul. Text without letters counts as
/// Korean, there is nothing to translate.
pub fn is_mostly_korean(text: &str) -> bool {
    let (korean, total) = text.chars().fold((0usize, 0usize), |(k, t), c| {
        if is_hangul(c) {
            (k + 1, t + 1)
        } else if c.is_ascii_alphabetic() {
            (k, t + 1)
        } else {
            (k, t)
        }
    });
    total == 0 || korean as f64 / total as f64 > 0.3
}
