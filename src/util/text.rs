//! Small text helpers for log output.

/// Truncate to at most `max_bytes`, backing off to a char boundary.
pub fn preview(text: &str, max_bytes: usize) -> &str {
    if text.len() <= max_bytes {
        return text;
    }
    let mut end = max_bytes;
    while end > 0 && !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

/// Like [`preview`] but marks elided output.
pub fn preview_marked(text: &str, max_bytes: usize) -> String {
    let head = preview(text, max_bytes);
    if head.len() < text.len() {
        format!("{head}...")
    } else {
        head.to_string()
    }
}
