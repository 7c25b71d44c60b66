//! Small helpers for logging model and API responses.
//!
//! Under test this module also hosts [`http_stub`], a one-shot local HTTP
//! server the client tests point at.

/// Shorten a string for a log line.
///
/// Cuts at the last character boundary at or below `max` bytes and appends
/// how many bytes were dropped.
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log(&"a".repeat(500), 10), "aaaaaaaaaa…(+490 bytes)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}…(+{} bytes)", &s[..cut], s.len() - cut)
}

/// Whether a JSON error means the document simply ended early.
///
/// Model output that hits the token limit stops mid-object; that case is
/// logged differently from output that is well-formed but wrong.
pub fn looks_truncated(e: &serde_json::Error) -> bool {
    use serde_json::error::Category;
    matches!(e.classify(), Category::Eof)
}
