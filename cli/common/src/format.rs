//! Number formatting for the run summary.

const UNITS: [&str; 4] = ["KB", "MB", "GB", "TB"];

/// Format a byte count with binary units.
///
/// ```
/// use dl_cli_common::format_bytes;
///
/// assert_eq!(format_bytes(500), "500 bytes");
/// assert_eq!(format_bytes(1536), "1.50 KB");
/// assert_eq!(format_bytes(1_073_741_824), "1.00 GB");
/// ```
pub fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        return format!("{} bytes", bytes);
    }

    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    format!("{:.2} {}", value, UNITS[unit])
}

/// Group digits in thousands.
///
/// ```
/// use dl_cli_common::format_number;
///
/// assert_eq!(format_number(1234567), "1,234,567");
/// ```
pub fn format_number(n: u64) -> String {
    let digits = n.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);

    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    grouped
}

/// Per-second rate of `count` over `secs`, or `None` for an empty interval.
pub fn format_rate(count: u64, secs: f64, unit: &str) -> Option<String> {
    if secs <= 0.0 || count == 0 {
        return None;
    }
    Some(format!("{:.1} {}/sec", count as f64 / secs, unit))
}
