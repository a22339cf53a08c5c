use profgen::profiling::OpTimingRow;

/// Fixed-width table of per-operator means, one row per operator plus a
/// total line.
pub fn format_table(rows: &[OpTimingRow], calls: usize) -> String {
    let name_width = rows
        .iter()
        .map(|row| row.name.chars().count())
        .max()
        .unwrap_or(0)
        .max("operator".len());

    let mut out = String::new();
    out.push_str(&format!(
        "{:<name_width$}  {:>12}  {:>7}\n",
        "operator", "mean_us", "share"
    ));
    out.push_str(&format!("{}\n", "-".repeat(name_width + 23)));
    for row in rows {
        out.push_str(&format!(
            "{:<name_width$}  {:>12.3}  {:>6.2}%\n",
            row.name, row.mean_us, row.percent
        ));
    }
    let total: f64 = rows.iter().map(|row| row.mean_us).sum();
    out.push_str(&format!(
        "{:<name_width$}  {:>12.3}  ({calls} calls)\n",
        "total", total
    ));
    out
}
