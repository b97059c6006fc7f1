//! Text clean-up applied by the dataset loader and the text pipeline.

/// Hard cut to the first `max_chars` characters; never splits a code point.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

fn is_kept(c: char) -> bool {
    c.is_ascii_alphanumeric() || c.is_whitespace() || ".,!?;:'\"()".contains(c)
}

/// Replaces anything outside ASCII letters, digits and basic punctuation with
/// a space, then collapses whitespace runs.
pub fn clean_text(text: &str) -> String {
    let replaced: String = text
        .chars()
        .map(|c| if is_kept(c) { c } else { ' ' })
        .collect();
    replaced.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn has_min_words(text: &str, min_words: usize) -> bool {
    !text.is_empty() && text.split_whitespace().count() >= min_words
}
