use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

static ISO_DURATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"PT(?:(\d+)H)?(?:(\d+)M)?(?:(\d+)S)?").expect("duration pattern is valid")
});

/// Formats a raw count as `1.2B`, `3.4M`, `56K` or the plain integer.
///
/// Millions and billions keep one decimal of the floating-point quotient,
/// rounded like JavaScript's `toFixed(1)`: `1_150_000` is `1.1M` because the
/// quotient is stored just below `1.15`. Thousands round half-up and are never
/// promoted, so `999_999` renders as `1000K`.
pub fn format_count(count: u64) -> String {
    if count >= 1_000_000_000 {
        return format!("{}B", to_fixed_1(count as f64 / 1e9));
    }
    if count >= 1_000_000 {
        return format!("{}M", to_fixed_1(count as f64 / 1e6));
    }
    if count >= 1_000 {
        return format!("{}K", (count + 500) / 1_000);
    }
    count.to_string()
}

/// One-decimal rendering of the exact binary value, with exact `.x5` ties
/// rounded up.
fn to_fixed_1(value: f64) -> String {
    // only multiples of 0.25 that are not multiples of 0.5 sit exactly on a tie
    if (value * 4.0).fract() == 0.0 && (value * 2.0).fract() != 0.0 {
        return format!("{:.1}", value + 0.05);
    }
    format!("{:.1}", value)
}

/// Sum of raw counts, pinned at `u64::MAX` instead of overflowing.
pub fn total_count(counts: impl IntoIterator<Item = u64>) -> u64 {
    counts.into_iter().fold(0, u64::saturating_add)
}

/// Converts an ISO-8601 duration such as `PT1H2M3S` to `1:02:03`, or `PT5M9S` to `5:09`.
///
/// Input without a `PT` section is returned unchanged.
pub fn format_duration(duration: &str) -> String {
    let Some(captures) = ISO_DURATION.captures(duration) else {
        return duration.to_string();
    };

    let part = |i: usize| -> u64 {
        captures
            .get(i)
            .and_then(|m| m.as_str().parse().ok())
            .unwrap_or(0)
    };
    let (hours, minutes, seconds) = (part(1), part(2), part(3));

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{}:{:02}", minutes, seconds)
    }
}

pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

/// The API reports counts as decimal strings.
pub fn parse_count(value: Option<&String>) -> Option<u64> {
    value.and_then(|v| v.parse::<u64>().ok())
}

pub fn parse_timestamp(value: Option<&String>) -> Option<DateTime<Utc>> {
    value
        .and_then(|dt| DateTime::parse_from_rfc3339(dt).ok())
        .map(|dt| dt.with_timezone(&Utc))
}
