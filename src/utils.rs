use std::time::Duration;

use humansize::{format_size, FormatSizeOptions, WINDOWS};

/// Format a byte count with 1024 scaling and B/KB/MB/... labels
pub fn format_file_size(size: u64) -> String {
    let options = FormatSizeOptions::from(WINDOWS).decimal_places(1);
    // humansize only ships the SI "kB" spelling for the kilo label
    let formatted = format_size(size, options);
    match formatted.strip_suffix(" kB") {
        Some(value) => format!("{} KB", value),
        None => formatted,
    }
}

/// Format duration in human-readable format
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs < 60 {
        format!("{:.1}s", duration.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}

/// Calculate the percentage of one number relative to another
pub fn calculate_percentage(part: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        (part as f64 / total as f64) * 100.0
    }
}
