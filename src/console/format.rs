/* src/console/format.rs */

use std::time::Duration;

const SI_SUFFIXES: [&str; 7] = ["B", "kB", "MB", "GB", "TB", "PB", "EB"];

/// Human readable size in base-1000 units: "7 B", "2.0 kB", "13 MB".
pub fn format_bytes(bytes: u64) -> String {
    if bytes < 10 {
        return format!("{} B", bytes);
    }

    let mut exp = 0;
    let mut unit = 1u64;
    while exp < SI_SUFFIXES.len() - 1 && bytes / unit >= 1000 {
        unit *= 1000;
        exp += 1;
    }

    let value = ((bytes as f64 / unit as f64) * 10.0 + 0.5).floor() / 10.0;
    if value < 10.0 {
        format!("{:.1} {}", value, SI_SUFFIXES[exp])
    } else {
        format!("{:.0} {}", value, SI_SUFFIXES[exp])
    }
}

/// Whole seconds only: "0s", "45s", "2m5s", "1h0m5s".
pub fn format_uptime(duration: Duration) -> String {
    let total = duration.as_secs();
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;

    if hours > 0 {
        format!("{}h{}m{}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m{}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}

pub fn connection_line(age: Duration, bytes: u64, rate: u64, remote: &str) -> String {
    format!(
        "{:>11}: {:>7}: {:>7}/sec {}",
        format_uptime(age),
        format_bytes(bytes),
        format_bytes(rate),
        remote
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bytes_use_si_units() {
        assert_eq!(format_bytes(0), "0 B");
        assert_eq!(format_bytes(9), "9 B");
        assert_eq!(format_bytes(999), "999 B");
        assert_eq!(format_bytes(1000), "1.0 kB");
        assert_eq!(format_bytes(2048), "2.0 kB");
        assert_eq!(format_bytes(12_600), "13 kB");
        assert_eq!(format_bytes(5_300_000), "5.3 MB");
        assert_eq!(format_bytes(u64::MAX), "18 EB");
    }

    #[test]
    fn uptime_truncates_to_seconds() {
        assert_eq!(format_uptime(Duration::from_millis(900)), "0s");
        assert_eq!(format_uptime(Duration::from_secs(45)), "45s");
        assert_eq!(format_uptime(Duration::from_secs(125)), "2m5s");
        assert_eq!(format_uptime(Duration::from_secs(3605)), "1h0m5s");
    }

    #[test]
    fn connection_line_is_column_aligned() {
        let line = connection_line(Duration::from_secs(65), 2048, 1000, "10.0.0.5:4444");
        assert_eq!(line, "       1m5s:  2.0 kB:  1.0 kB/sec 10.0.0.5:4444");
    }
}
