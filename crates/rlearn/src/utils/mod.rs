//! Formatting helpers for log lines.

use std::time::Duration;

/// Abbreviate large counts for display
pub fn abbreviate(num: u64) -> String {
    match num {
        0..=999 => num.to_string(),
        1_000..=999_999 => format!("{:.1}K", num as f64 / 1e3),
        1_000_000..=999_999_999 => format!("{:.1}M", num as f64 / 1e6),
        _ => format!("{:.1}B", num as f64 / 1e9),
    }
}

/// Format a duration as `1h 2m 3s`, dropping leading zero units
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    let (h, m, s) = (secs / 3600, (secs % 3600) / 60, secs % 60);

    if h > 0 {
        format!("{}h {}m {}s", h, m, s)
    } else if m > 0 {
        format!("{}m {}s", m, s)
    } else {
        format!("{}s", s)
    }
}

/// Steps per second, zero before any time has passed
pub fn steps_per_second(steps: u64, elapsed: Duration) -> f64 {
    let secs = elapsed.as_secs_f64();
    if secs > 0.0 {
        steps as f64 / secs
    } else {
        0.0
    }
}
