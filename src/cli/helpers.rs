//! Shared helper functions for CLI commands.

use crate::models::GameIndex;

/// Render games as compact ranges, e.g. `3-5, 9, 12-13`.
pub fn compress_ranges(games: &[GameIndex]) -> String {
    let mut parts = Vec::new();
    let mut iter = games.iter().map(|g| g.get());
    let Some(first) = iter.next() else {
        return String::new();
    };

    let (mut start, mut end) = (first, first);
    for n in iter {
        if n == end + 1 {
            end = n;
            continue;
        }
        parts.push(format_range(start, end));
        start = n;
        end = n;
    }
    parts.push(format_range(start, end));
    parts.join(", ")
}

fn format_range(start: u32, end: u32) -> String {
    if start == end {
        start.to_string()
    } else {
        format!("{}-{}", start, end)
    }
}

/// Truncate a string to max length, adding "..." if truncated.
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
