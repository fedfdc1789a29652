use regex::Regex;
use std::sync::OnceLock;

static PAGE_MARKERS: OnceLock<Vec<Regex>> = OnceLock::new();

fn page_markers() -> &'static [Regex] {
    PAGE_MARKERS.get_or_init(|| {
        const PATTERNS: &[&str] = &[
            r"(?i)\bpage\s+\d+\s*(?:of|/)\s*\d+\b",
            r"(?i)\bpage\s+\d+\b",
            r"(?i)\bpg\.?\s*\d+\s+of\s+\d+\b",
        ];
        PATTERNS
            .iter()
            .map(|pattern| Regex::new(pattern).expect("valid page marker pattern"))
            .collect()
    })
}

/// Cleans OCR output into a single line of printable text.
///
/// Whitespace runs become one space, control and zero-width characters are dropped and
/// "Page N" running headers are removed. Total and idempotent.
pub fn normalize(raw: &str) -> String {
    let printable: String = raw
        .chars()
        .filter_map(|c| {
            if c.is_whitespace() {
                Some(' ')
            } else if is_invisible(c) {
                None
            } else {
                Some(c)
            }
        })
        .collect();

    let mut text = collapse_whitespace(&printable);
    loop {
        let stripped = strip_page_markers(&text);
        if stripped == text {
            break;
        }
        text = collapse_whitespace(&stripped);
    }
    text
}

fn is_invisible(c: char) -> bool {
    c.is_control()
        || matches!(
            c,
            '\u{feff}' | '\u{200b}' | '\u{200c}' | '\u{200d}' | '\u{2060}' | '\u{00ad}' | '\u{fffd}'
        )
}

fn collapse_whitespace(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn strip_page_markers(value: &str) -> String {
    page_markers()
        .iter()
        .fold(value.to_string(), |text, marker| {
            marker.replace_all(&text, " ").into_owned()
        })
}
