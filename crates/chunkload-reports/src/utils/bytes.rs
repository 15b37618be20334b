const UNITS: [&str; 8] = ["", "Ki", "Mi", "Gi", "Ti", "Pi", "Ei", "Zi"];

/// Largest unit; anything past `1024 Zi` keeps scaling in it
const LAST_UNIT: &str = "Yi";

/// Render a byte count with binary prefixes and one decimal, e.g. `1.5KiB`
pub fn format_bytes(n: u64) -> String {
    format_size(n as f64)
}

pub fn format_size(mut value: f64) -> String {
    for unit in UNITS {
        if value.abs() < 1024.0 {
            return format!("{:.1}{}B", value, unit);
        }
        value /= 1024.0;
    }
    format!("{:.1}{}B", value, LAST_UNIT)
}
