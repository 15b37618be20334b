const SCALES: [(usize, &str); 3] = [(1_000_000_000, "B"), (1_000_000, "M"), (1_000, "K")];

/// Short row count for the progress lines: `1.0M`, `2.5K`, `789`
pub fn format_numbers(n: usize) -> String {
    SCALES
        .iter()
        .find(|(scale, _)| n >= *scale)
        .map(|(scale, suffix)| format!("{:.1}{}", n as f64 / *scale as f64, suffix))
        .unwrap_or_else(|| n.to_string())
}
