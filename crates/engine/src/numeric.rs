//! Cell parsing and rounding policy shared by the transformation stages.

/// Parse a cell as a decimal. Unparseable cells degrade to 0.0; upstream
/// manifests carry stray text in numeric columns and the flow treats those
/// as empty rather than failing the run.
pub fn parse_decimal(cell: &str) -> f64 {
    cell.trim().parse().unwrap_or(0.0)
}

/// Round to three decimal places, ties to even. This is the weight
/// contract; monetary caps floor instead (see the limiter) and the two
/// must stay distinct.
pub fn round3(value: f64) -> f64 {
    format!("{value:.3}").parse().unwrap_or(0.0)
}

/// Shortest display form for a numeric cell: whole numbers render without
/// a decimal point.
pub fn format_number(value: f64) -> String {
    format!("{value}")
}
