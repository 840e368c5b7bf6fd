pub fn truncate_utf8_prefix(value: &str, max_bytes: usize) -> String {
    if max_bytes == 0 {
        return String::new();
    }
    if value.len() <= max_bytes {
        return value.to_string();
    }
    let mut end = max_bytes;
    while end > 0 && !value.is_char_boundary(end) {
        end -= 1;
    }
    value[..end].to_string()
}

pub fn truncate_chars(value: &str, max_chars: usize) -> String {
    match value.char_indices().nth(max_chars) {
        Some((end, _)) => value[..end].to_string(),
        None => value.to_string(),
    }
}

pub fn preview_body(body: &[u8], max_bytes: usize) -> String {
    let text = String::from_utf8_lossy(body);
    let preview = truncate_utf8_prefix(&text, max_bytes);
    if preview.len() < text.len() {
        format!("{}...", preview)
    } else {
        preview
    }
}

#[cfg(test)]
mod tests {
    use super::{preview_body, truncate_chars, truncate_utf8_prefix};

    #[test]
    fn truncate_utf8_prefix_does_not_split_utf8() {
        assert_eq!(truncate_utf8_prefix("a\u{1F600}b", 2), "a");
        assert_eq!(truncate_utf8_prefix("a\u{1F600}b", 5), "a\u{1F600}");
    }

    #[test]
    fn truncate_chars_counts_characters() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("abc", 3), "abc");
        assert_eq!(truncate_chars("abc", 10), "abc");
    }

    #[test]
    fn preview_marks_cut_bodies() {
        assert_eq!(preview_body(b"abcdef", 3), "abc...");
        assert_eq!(preview_body(b"abc", 3), "abc");
    }
}
