//! Common utilities and helpers

use std::time::Duration;

pub mod logging;
pub mod path;

/// Elapsed time as shown in run summaries: `4.21s` under a minute,
/// `MM:SS.mmm` or `HH:MM:SS.mmm` beyond
pub fn format_duration(duration: Duration) -> String {
    let total_seconds = duration.as_secs();
    if total_seconds < 60 {
        return format!("{:.2}s", duration.as_secs_f64());
    }

    let (hours, minutes, seconds) = (
        total_seconds / 3600,
        (total_seconds % 3600) / 60,
        total_seconds % 60,
    );
    let millis = duration.subsec_millis();
    match hours {
        0 => format!("{:02}:{:02}.{:03}", minutes, seconds, millis),
        _ => format!("{:02}:{:02}:{:02}.{:03}", hours, minutes, seconds, millis),
    }
}

/// Byte count in binary units
pub fn format_file_size(size: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
    if size < 1024 {
        return format!("{} B", size);
    }

    let mut value = size as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit + 1 < UNITS.len() {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.2} {}", value, UNITS[unit])
}
