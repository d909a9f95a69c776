/// Convert a 1-based column index to its spreadsheet letter label.
/// 1 -> "A", 26 -> "Z", 27 -> "AA", 703 -> "AAA".
pub fn column_label(index: usize) -> String {
    if index == 0 {
        return String::new();
    }
    let mut n = index;
    let mut label = String::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        label.insert(0, (b'A' + rem as u8) as char);
        n = (n - 1) / 26;
    }
    label
}

/// Parse a letter label back to its 1-based column index.
/// Returns None for empty input or non-alphabetic characters.
pub fn parse_column_label(label: &str) -> Option<usize> {
    if label.is_empty() {
        return None;
    }
    let mut index = 0usize;
    for ch in label.chars() {
        let upper = ch.to_ascii_uppercase();
        if !upper.is_ascii_uppercase() {
            return None;
        }
        index = index * 26 + (upper as usize - 'A' as usize + 1);
    }
    Some(index)
}
