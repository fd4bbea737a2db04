const UNITS: [&str; 9] = ["B", "KB", "MB", "GB", "TB", "PB", "EB", "ZB", "YB"];

/// Binary (1024-based) human readable size, two decimals above 10 bytes
pub fn format_size(bytes: u64) -> String {
    if bytes < 10 {
        return format!("{bytes} B");
    }
    let index = unit_index(bytes);
    let value = bytes as f64 / 1024f64.powi(index as i32);
    format!("{value:.2} {}", UNITS[index])
}

/// floor(log1024(bytes)), clamped to the unit table
fn unit_index(bytes: u64) -> usize {
    let mut index = 0;
    let mut remaining = bytes;
    while remaining >= 1024 && index < UNITS.len() - 1 {
        remaining /= 1024;
        index += 1;
    }
    index
}

#[test]
fn test_small_counts_are_exact() {
    for b in 0..10 {
        assert_eq!(format_size(b), format!("{b} B"));
    }
}

#[test]
fn test_two_decimals() {
    assert_eq!(format_size(10), "10.00 B");
    assert_eq!(format_size(1023), "1023.00 B");
    assert_eq!(format_size(1024), "1.00 KB");
    assert_eq!(format_size(1536), "1.50 KB");
    assert_eq!(format_size(1_048_576), "1.00 MB");
    assert_eq!(format_size(1_073_741_824), "1.00 GB");
    assert_eq!(format_size(5 * 1_099_511_627_776 / 2), "2.50 TB");
}

#[test]
fn test_largest_values_stay_in_table() {
    assert_eq!(unit_index(u64::MAX), 6);
    assert_eq!(format_size(u64::MAX), "16.00 EB");
}
