use regex::{Regex, RegexBuilder};

fn word_pattern(words: &[&str]) -> Option<Regex> {
    let alternatives: Vec<String> = words
        .iter()
        .map(|w| w.trim())
        .filter(|w| !w.is_empty())
        .map(regex::escape)
        .collect();
    if alternatives.is_empty() {
        return None;
    }
    RegexBuilder::new(&alternatives.join("|")).case_insensitive(true).build().ok()
}

fn floor_boundary(text: &str, mut idx: usize) -> usize {
    while idx > 0 && !text.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}

fn ceil_boundary(text: &str, mut idx: usize) -> usize {
    while idx < text.len() && !text.is_char_boundary(idx) {
        idx += 1;
    }
    idx
}

/// A window of `text` around the first case-insensitive occurrence of any of
/// `words`, or its first `width` characters when none occurs. Newlines are flattened.
pub fn snippet(text: &str, words: &[&str], width: usize) -> String {
    let hit = word_pattern(words).and_then(|re| re.find(text).map(|m| m.start()));
    let window = match hit {
        Some(idx) => {
            let start = floor_boundary(text, idx.saturating_sub(width / 3));
            let end = ceil_boundary(text, (start + width).min(text.len()));
            &text[start..end]
        }
        None => {
            let end = text.char_indices().nth(width).map(|(i, _)| i).unwrap_or(text.len());
            &text[..end]
        }
    };
    let flat = window.replace(['\n', '\r'], " ");
    if window.len() < text.len() {
        format!("{}...", flat.trim())
    } else {
        flat.trim().to_string()
    }
}

/// Wrap case-insensitive occurrences of `words` in `<em>` tags.
pub fn highlight(text: &str, words: &[&str]) -> String {
    match word_pattern(words) {
        Some(re) => re.replace_all(text, |caps: &regex::Captures| format!("<em>{}</em>", &caps[0])).into_owned(),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn falls_back_to_prefix() {
        assert_eq!(snippet("fakultas teknik elektro", &["bandung"], 8), "fakultas...");
        assert_eq!(snippet("pendek", &[], 80), "pendek");
    }

    #[test]
    fn centers_on_first_match() {
        let text = "aaaa bbbb cccc semarang dddd";
        let s = snippet(text, &["SEMARANG"], 12);
        assert!(s.contains("semarang"), "{s}");
    }

    #[test]
    fn respects_char_boundaries() {
        let text = "ééééééé café ééééé";
        let s = snippet(text, &["café"], 5);
        assert!(s.contains("caf"));
    }

    #[test]
    fn highlights_case_insensitively() {
        assert_eq!(highlight("Rust and rust", &["rust"]), "<em>Rust</em> and <em>rust</em>");
        assert_eq!(highlight("a.b", &["."]), "a<em>.</em>b");
    }
}
