/// Render `(key, value)` rows as an ASCII table with an outline border:
/// keys left-aligned, values right-aligned, no header.
///
/// ```
/// use jp2rt_models::report::table::outline_table;
///
/// let table = outline_table(&[("r2 mean".to_string(), "0.8123".to_string())]);
/// assert_eq!(table, "+---------+--------+\n| r2 mean | 0.8123 |\n+---------+--------+\n");
/// ```
pub fn outline_table(rows: &[(String, String)]) -> String {
    let key_width = rows.iter().map(|(k, _)| k.chars().count()).max().unwrap_or(0);
    let value_width = rows.iter().map(|(_, v)| v.chars().count()).max().unwrap_or(0);
    let border = format!("+{}+{}+\n", "-".repeat(key_width + 2), "-".repeat(value_width + 2));

    let mut out = border.clone();
    for (key, value) in rows {
        out.push_str(&format!(
            "| {:<kw$} | {:>vw$} |\n",
            key,
            value,
            kw = key_width,
            vw = value_width
        ));
    }
    out.push_str(&border);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outline_alignment() {
        let rows = vec![
            ("r2 mean".to_string(), "0.8000".to_string()),
            ("q0".to_string(), "-12.5000".to_string()),
        ];
        let table = outline_table(&rows);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "+---------+----------+");
        assert_eq!(lines[1], "| r2 mean |   0.8000 |");
        assert_eq!(lines[2], "| q0      | -12.5000 |");
        assert_eq!(lines[3], lines[0]);
    }

    #[test]
    fn test_empty_table() {
        assert_eq!(outline_table(&[]), "+--+--+\n+--+--+\n");
    }
}
