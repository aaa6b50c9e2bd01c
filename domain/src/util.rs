//! Shared utility functions.

/// Shorten `s` to at most `max_chars` characters for log output.
///
/// Newlines are flattened to spaces and an ellipsis is appended when the
/// text was cut. Works on `char`s, so multi-byte text is never split.
pub fn preview(s: &str, max_chars: usize) -> String {
    let flat: String = s
        .chars()
        .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
        .collect();
    if flat.chars().count() <= max_chars {
        return flat;
    }
    let mut cut: String = flat.chars().take(max_chars).collect();
    cut.push('…');
    cut
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preview_short_text_unchanged() {
        assert_eq!(preview("hi", 10), "hi");
    }

    #[test]
    fn preview_cuts_and_marks() {
        assert_eq!(preview("hello world", 5), "hello…");
    }

    #[test]
    fn preview_flattens_newlines() {
        assert_eq!(preview("a\nb\r\nc", 10), "a b  c");
    }

    #[test]
    fn preview_multibyte() {
        assert_eq!(preview("あのね", 2), "あの…");
        assert_eq!(preview("⚠️ Error", 20), "⚠️ Error");
    }
}
