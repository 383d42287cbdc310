//! String helpers shared by the normalizer, config and verification output

/// Marker appended to text cut by [`truncate_chars`]
pub const TRUNCATION_MARKER: &str = "...";

/// Truncate `text` to at most `max_chars` scalar values, appending
/// [`TRUNCATION_MARKER`] when anything was cut.
///
/// Counting is done on `char`s, never on bytes, so multi-byte SQL text is
/// never split inside a code point.
///
/// # Example
/// ```ignore
/// assert_eq!(truncate_chars("abcdef", 3), "abc...");
/// assert_eq!(truncate_chars("abc", 3), "abc");
/// ```
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => format!("{}{}", &text[..byte_idx], TRUNCATION_MARKER),
        None => text.to_string(),
    }
}

/// Mask a secret for display, keeping only a short prefix
pub fn mask_secret(value: &str, visible: usize) -> String {
    if value.chars().count() <= visible {
        return "***".to_string();
    }
    let prefix: String = value.chars().take(visible).collect();
    format!("{}***", prefix)
}

/// Trim-and-filter helpers for optional configuration values
pub trait StringExt {
    /// Trimmed value, `None` when empty
    fn clean(&self) -> Option<String>;
}

impl StringExt for str {
    #[inline]
    fn clean(&self) -> Option<String> {
        let trimmed = self.trim();
        if trimmed.is_empty() { None } else { Some(trimmed.to_string()) }
    }
}

impl StringExt for String {
    #[inline]
    fn clean(&self) -> Option<String> {
        self.as_str().clean()
    }
}

impl<T: AsRef<str>> StringExt for Option<T> {
    #[inline]
    fn clean(&self) -> Option<String> {
        self.as_ref().and_then(|s| s.as_ref().clean())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_keeps_short_text() {
        let text = "SELECT a FROM t";
        assert_eq!(truncate_chars(text, 200), text);

        let exact = "x".repeat(200);
        assert_eq!(truncate_chars(&exact, 200), exact);
    }

    #[test]
    fn test_truncate_long_text_to_exact_length() {
        let text = "y".repeat(201);
        let truncated = truncate_chars(&text, 200);
        assert_eq!(truncated.chars().count(), 200 + TRUNCATION_MARKER.chars().count());
        assert!(truncated.ends_with(TRUNCATION_MARKER));
        assert_eq!(&truncated[..200], "y".repeat(200));
    }

    #[test]
    fn test_truncate_counts_chars_not_bytes() {
        // 3 bytes per char
        let text = "查".repeat(250);
        let truncated = truncate_chars(&text, 200);
        let body = truncated.strip_suffix(TRUNCATION_MARKER).unwrap();
        assert_eq!(body.chars().count(), 200);
    }

    #[test]
    fn test_mask_secret() {
        assert_eq!(mask_secret("abc", 10), "***");
        assert_eq!(mask_secret("ya29.a0AfH6SMBxyz", 4), "ya29***");
    }

    #[test]
    fn test_clean() {
        assert_eq!("  ".clean(), None);
        assert_eq!(" us ".clean(), Some("us".to_string()));
        assert_eq!(Some("").clean(), None);
        assert_eq!(None::<String>.clean(), None);
    }
}
