//! Utility functions.
//!
//! Collection of helper functions used across the bot.

pub mod calc;
pub mod target;

use std::time::Duration;

pub use target::{Target, get_target_from_msg};

/// Escape text for Telegram HTML parse mode.
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Cut `text` to at most `max` characters, appending `...` when shortened.
pub fn truncate_text(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max).collect();
    out.push_str("...");
    out
}

/// Uptime as `1d 2h 3m 4s`; the day part is omitted while zero.
pub fn format_uptime(uptime: Duration) -> String {
    let total = uptime.as_secs();
    let (days, hours) = (total / 86_400, (total % 86_400) / 3_600);
    let (minutes, seconds) = ((total % 3_600) / 60, total % 60);

    if days > 0 {
        format!("{}d {}h {}m {}s", days, hours, minutes, seconds)
    } else {
        format!("{}h {}m {}s", hours, minutes, seconds)
    }
}

/// Compact duration such as `1h 30m 45s`, skipping zero parts.
pub fn format_time(duration: Duration) -> String {
    let total = duration.as_secs();
    let hours = total / 3_600;
    let minutes = (total % 3_600) / 60;
    let seconds = total % 60;

    let mut parts = Vec::with_capacity(3);
    if hours > 0 {
        parts.push(format!("{}h", hours));
    }
    if minutes > 0 {
        parts.push(format!("{}m", minutes));
    }
    if seconds > 0 || parts.is_empty() {
        parts.push(format!("{}s", seconds));
    }
    parts.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_html_escape() {
        assert_eq!(html_escape("<b>Tom & Jerry</b>"), "&lt;b&gt;Tom &amp; Jerry&lt;/b&gt;");
    }

    #[test]
    fn test_truncate_text() {
        assert_eq!(truncate_text("short", 100), "short");
        assert_eq!(truncate_text("abcdef", 3), "abc...");
        // counts characters, not bytes
        assert_eq!(truncate_text("🌸🌸🌸🌸", 2), "🌸🌸...");
    }

    #[test]
    fn test_format_uptime() {
        assert_eq!(format_uptime(Duration::from_secs(59)), "0h 0m 59s");
        assert_eq!(format_uptime(Duration::from_secs(3_725)), "1h 2m 5s");
        assert_eq!(format_uptime(Duration::from_secs(90_061)), "1d 1h 1m 1s");
    }

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(Duration::from_secs(5_445)), "1h 30m 45s");
        assert_eq!(format_time(Duration::from_secs(3_600)), "1h");
        assert_eq!(format_time(Duration::from_secs(61)), "1m 1s");
        assert_eq!(format_time(Duration::ZERO), "0s");
    }
}
