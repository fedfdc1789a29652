use regex::Regex;
use std::sync::OnceLock;

static SENTENCE_END: OnceLock<Regex> = OnceLock::new();

fn sentence_end() -> &'static Regex {
    SENTENCE_END
        .get_or_init(|| Regex::new(r"[.!?]\s+").expect("valid sentence boundary pattern"))
}

/// Splits on `.`, `!` or `?` followed by whitespace, dropping fragments shorter than
/// `min_chars` characters.
pub(crate) fn split_sentences(text: &str, min_chars: usize) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut start = 0;

    for boundary in sentence_end().find_iter(text) {
        // keep the terminating punctuation
        sentences.push(&text[start..boundary.start() + 1]);
        start = boundary.end();
    }
    sentences.push(&text[start..]);

    sentences
        .into_iter()
        .map(str::trim)
        .filter(|sentence| sentence.chars().count() >= min_chars)
        .map(str::to_string)
        .collect()
}
