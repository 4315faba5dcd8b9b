//! Shared utilities

/// Truncate a string to `max` characters, appending "..." if truncated.
/// Operates on Unicode char boundaries, not bytes.
pub fn truncate_chars(s: &str, max: usize) -> String {
    let mut chars = s.chars();
    let truncated: String = chars.by_ref().take(max).collect();
    if chars.next().is_some() {
        format!("{}...", truncated)
    } else {
        truncated
    }
}

/// Human readable byte count
pub fn format_size(bytes: usize) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;

    let b = bytes as f64;
    if b >= MB {
        format!("{:.1} MB", b / MB)
    } else if b >= KB {
        format!("{:.1} KB", b / KB)
    } else {
        format!("{} B", bytes)
    }
}

/// What still has to be written to stdout to show `content`, given that
/// `printed` is already on screen.
///
/// Replies grow by appending, so this is normally the new suffix. `None`
/// means the text was replaced outright (e.g. by the error text) and has
/// to be printed again in full.
pub fn reply_delta<'a>(printed: &str, content: &'a str) -> Option<&'a str> {
    content.strip_prefix(printed)
}
