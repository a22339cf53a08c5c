#[path = "../src/summary.rs"]
mod summary;

use profgen::profiling::summary_rows;
use profgen::ProfilerResult;
use summary::format_table;

#[test]
fn table_lists_slowest_operator_first_with_total() {
    let averages: ProfilerResult = [("Relu_1", 5.0), ("Conv_0", 15.0)]
        .into_iter()
        .map(|(name, micros)| (name.to_string(), micros))
        .collect();
    let table = format_table(&summary_rows(&averages), 3);
    let lines: Vec<&str> = table.lines().collect();

    assert_eq!(lines.len(), 5);
    assert!(lines[0].starts_with("operator"));
    assert!(lines[2].starts_with("Conv_0"));
    assert!(lines[2].ends_with("75.00%"));
    assert!(lines[3].starts_with("Relu_1"));
    assert!(lines[3].ends_with("25.00%"));
    assert!(lines[4].contains("20.000"));
    assert!(lines[4].ends_with("(3 calls)"));
}

#[test]
fn empty_history_prints_header_and_zero_total() {
    let table = format_table(&[], 0);
    assert_eq!(table.lines().count(), 3);
    assert!(table.contains("(0 calls)"));
}

#[test]
fn column_width_counts_characters_not_bytes() {
    let averages: ProfilerResult = [("Faltung_größer", 4.0), ("Relu_1", 1.0)]
        .into_iter()
        .map(|(name, micros)| (name.to_string(), micros))
        .collect();
    let table = format_table(&summary_rows(&averages), 1);
    let lines: Vec<&str> = table.lines().collect();
    let width = "Faltung_größer".chars().count() + 23;
    assert_eq!(lines[0].chars().count(), width);
    assert_eq!(lines[1].chars().count(), width);
    assert_eq!(lines[2].chars().count(), lines[3].chars().count());
}
