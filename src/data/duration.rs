//! Parsing and formatting of human duration strings for CLI flags.

use std::time::Duration;

use anyhow::{bail, Result};

/// Suffix to nanoseconds multiplier (order matters: longer suffixes first)
const UNITS: &[(&str, f64)] = &[
    ("ns", 1.0),
    ("µs", 1_000.0),
    ("us", 1_000.0),
    ("ms", 1_000_000.0),
    ("s", 1_000_000_000.0),
];

/// Parse duration strings like "4s", "500ms", "1.5s".
///
/// A bare number without a suffix is read as milliseconds, so `--interval
/// 1000` and `--interval 1s` mean the same thing.
pub fn parse_duration(s: &str) -> Result<Duration> {
    let s = s.trim();

    for (suffix, multiplier) in UNITS {
        if let Some(val_str) = s.strip_suffix(suffix) {
            let val: f64 = val_str.parse()?;
            if val < 0.0 {
                bail!("Duration cannot be negative: {}", s);
            }
            return Ok(Duration::from_nanos((val * multiplier) as u64));
        }
    }

    // No suffix: milliseconds
    if let Ok(ms) = s.parse::<f64>() {
        if ms < 0.0 {
            bail!("Duration cannot be negative: {}", s);
        }
        return Ok(Duration::from_nanos((ms * 1_000_000.0) as u64));
    }

    bail!("Unknown duration format: {}", s)
}

/// Format a duration for display in logs.
pub fn format_duration(d: Duration) -> String {
    let millis = d.as_millis();
    if millis == 0 {
        format!("{}µs", d.as_micros())
    } else if millis < 1_000 {
        format!("{}ms", millis)
    } else {
        format!("{:.2}s", d.as_secs_f64())
    }
}
