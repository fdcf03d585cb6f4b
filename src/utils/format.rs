//! Display helpers shared by the CLI output.

use chrono::{DateTime, Local, TimeZone, Utc};

const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];

/// Human-readable size in base-1024 units, rounded to two decimals.
pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let rounded = (value * 100.0).round() / 100.0;
    format!("{} {}", rounded, UNITS[unit])
}

/// Render fractional epoch seconds (as returned in `expires_at`) in local time.
pub fn format_epoch_seconds(secs: f64) -> String {
    let millis = (secs * 1000.0).round() as i64;
    format_epoch_millis(millis)
}

/// Render epoch milliseconds (as returned in `last_modified`) in local time.
pub fn format_epoch_millis(millis: i64) -> String {
    match Utc.timestamp_millis_opt(millis).single() {
        Some(utc) => local_string(utc),
        None => format!("invalid timestamp ({})", millis),
    }
}

fn local_string(utc: DateTime<Utc>) -> String {
    utc.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_file_size() {
        assert_eq!(format_file_size(0), "0 Bytes");
        assert_eq!(format_file_size(1), "1 Bytes");
        assert_eq!(format_file_size(1023), "1023 Bytes");
        assert_eq!(format_file_size(1024), "1 KB");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(1024 * 1024), "1 MB");
        assert_eq!(format_file_size(5 * 1024 * 1024 * 1024), "5 GB");
        assert_eq!(format_file_size(2048 * 1024 * 1024 * 1024), "2048 GB");
    }

    #[test]
    fn test_format_epoch_round_trips_through_local_time() {
        let rendered = format_epoch_seconds(1_700_000_000.0);
        let expected = Utc
            .timestamp_opt(1_700_000_000, 0)
            .unwrap()
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M:%S")
            .to_string();
        assert_eq!(rendered, expected);
        assert_eq!(format_epoch_millis(1_700_000_000_000), expected);
    }
}
