//! Text normalisation shared by the readers and writers

use chrono::{DateTime, SecondsFormat, Utc};

/// Maximum slug length for generated file names
const MAX_SLUG_CHARS: usize = 60;

/// Placeholder slug when nothing usable remains
const FALLBACK_SLUG: &str = "capture";

/// Marker appended to truncated text
pub const TRUNCATION_MARKER: &str = "[truncated]";

/// Replace every run of characters rejected by `keep` with a single `-`.
fn collapse_runs(input: &str, keep: impl Fn(char) -> bool) -> String {
    let mut out = String::with_capacity(input.len());
    let mut in_run = false;
    for c in input.chars() {
        if keep(c) {
            out.push(c);
            in_run = false;
        } else if !in_run {
            out.push('-');
            in_run = true;
        }
    }
    out
}

/// File-name slug: lowercase, `[a-z0-9]` runs joined by `-`, capped at 60 chars.
pub fn slugify(input: &str) -> String {
    let lowered = input.to_lowercase();
    let collapsed = collapse_runs(&lowered, |c| c.is_ascii_lowercase() || c.is_ascii_digit());
    let slug: String = collapsed.trim_matches('-').chars().take(MAX_SLUG_CHARS).collect();
    if slug.is_empty() {
        FALLBACK_SLUG.to_string()
    } else {
        slug
    }
}

/// Normalise a knowledge tag or domain to `[a-z0-9_-]+`. May return an empty string.
pub fn normalize_tag(tag: &str) -> String {
    let lowered = tag.trim().to_lowercase();
    let collapsed = collapse_runs(&lowered, |c| {
        c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-'
    });
    let trimmed = collapsed.trim_matches('-');

    let mut out = String::with_capacity(trimmed.len());
    for c in trimmed.chars() {
        if c == '-' && out.ends_with('-') {
            continue;
        }
        out.push(c);
    }
    out
}

/// Normalise an identity value read from `state.json`.
///
/// Characters outside `[a-zA-Z0-9_-]` become `-`, separators are trimmed from
/// both ends, and an all-invalid value yields `None`. Case is preserved.
pub fn normalize_slug(value: &str) -> Option<String> {
    let collapsed = collapse_runs(value.trim(), |c| {
        c.is_ascii_alphanumeric() || c == '_' || c == '-'
    });
    let trimmed = collapsed.trim_matches('-');
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// First `count` whitespace-separated words, joined by single spaces
pub fn first_words(text: &str, count: usize) -> String {
    text.split_whitespace()
        .take(count)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Cap `input` at `max_chars` characters.
///
/// Text over budget keeps `max_chars - 20` characters, drops trailing
/// whitespace and ends with a blank line plus [`TRUNCATION_MARKER`].
pub fn truncate_text(input: &str, max_chars: usize) -> String {
    if input.chars().count() <= max_chars {
        return input.to_string();
    }
    let kept: String = input.chars().take(max_chars.saturating_sub(20)).collect();
    format!("{}\n\n{}", kept.trim_end(), TRUNCATION_MARKER)
}

/// `YYYY-MM-DD`
pub fn format_ymd(date: &DateTime<Utc>) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// `HH:MM:SS`
pub fn format_time(date: &DateTime<Utc>) -> String {
    date.format("%H:%M:%S").to_string()
}

/// ISO-8601 UTC timestamp with milliseconds (`2026-01-02T03:04:05.678Z`)
pub fn format_timestamp(date: &DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Timestamp usable in a file name (`2026-01-02T03-04-05`)
pub fn file_timestamp(date: &DateTime<Utc>) -> String {
    date.format("%Y-%m-%dT%H-%M-%S").to_string()
}
