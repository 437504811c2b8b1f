//! Head-tail truncation.
//!
//! Long free text keeps its beginning (titles, signatures, the setup) and
//! its end (the most recent lines, the conclusion) and drops the middle,
//! which is the least informative part of logs and documents alike.

/// Marker inserted where the middle was removed.
pub const TRUNCATION_MARKER: &str = "\n...TRUNCATED...\n";

/// Truncate `text` to at most `cap` characters, keeping a head and a tail
/// around a single [`TRUNCATION_MARKER`].
///
/// Text at or under the cap is returned unchanged. Caps too small to fit
/// the marker degrade to a plain prefix cut. Splits always land on UTF-8
/// character boundaries.
#[must_use]
pub fn truncate_middle(text: &str, cap: usize) -> String {
    let total = text.chars().count();
    if total <= cap {
        return text.to_string();
    }

    let marker_len = TRUNCATION_MARKER.chars().count();
    if cap <= marker_len {
        return text.chars().take(cap).collect();
    }

    let keep = cap - marker_len;
    let head = keep / 2;
    let tail = keep - head;

    let prefix: String = text.chars().take(head).collect();
    let suffix_start = total - tail;
    let suffix: String = text.chars().skip(suffix_start).collect();

    format!("{}{}{}", prefix, TRUNCATION_MARKER, suffix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_is_unchanged() {
        assert_eq!(truncate_middle("hello", 100), "hello");
        assert_eq!(truncate_middle("hello", 5), "hello");
    }

    #[test]
    fn test_output_never_exceeds_cap() {
        let text = "x".repeat(500);
        for cap in [10, 50, 100, 499] {
            let out = truncate_middle(&text, cap);
            assert!(out.chars().count() <= cap, "cap {} exceeded", cap);
        }
    }

    #[test]
    fn test_keeps_head_and_tail() {
        let text: String = (0..100).map(|i| format!("line {}\n", i)).collect();
        let out = truncate_middle(&text, 120);
        assert!(out.starts_with("line 0"));
        assert!(out.trim_end().ends_with("line 99"));
        assert_eq!(out.matches("...TRUNCATED...").count(), 1);
    }

    #[test]
    fn test_tiny_cap_degrades_to_prefix() {
        let out = truncate_middle(&"abcdefghij".repeat(10), 5);
        assert_eq!(out, "abcde");
        assert!(!out.contains("TRUNCATED"));
    }

    #[test]
    fn test_multibyte_boundary_safety() {
        let text = "日本語のテキスト".repeat(50);
        let out = truncate_middle(&text, 40);
        // Would panic on a byte-slice implementation; char-based never does.
        assert!(out.chars().count() <= 40);
        assert!(out.contains("...TRUNCATED..."));
    }
}
