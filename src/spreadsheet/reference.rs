//! Conversion between zero-based `(row, col)` indexes and A1-style references

/// Formats a zero-based position as an A1 reference, e.g. `(0, 27)` → `"AB1"`.
pub(crate) fn index_to_reference(row: usize, col: usize) -> String {
    format!("{}{}", index_to_column(col), row + 1)
}

/// Column letters for a zero-based column index.
pub(crate) fn index_to_column(col: usize) -> String {
    let mut letters = Vec::new();
    let mut remain = col + 1;
    while remain > 0 {
        let offset = (remain - 1) % 26;
        letters.push(b'A' + offset as u8);
        remain = (remain - 1) / 26;
    }
    letters.reverse();
    String::from_utf8_lossy(&letters).into_owned()
}

/// Parses an A1 reference (`"C12"`, `"$C$12"`) into zero-based `(row, col)`.
pub(crate) fn reference_to_index(reference: &str) -> Option<(usize, usize)> {
    let reference = reference.trim().replace('$', "");
    let split = reference.find(|c: char| c.is_ascii_digit())?;
    let (letters, digits) = reference.split_at(split);
    if letters.is_empty() || !letters.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }

    let col = letters.chars().try_fold(0usize, |acc, c| {
        let value = c.to_ascii_uppercase() as usize - 'A' as usize + 1;
        acc.checked_mul(26)?.checked_add(value)
    })?;
    let row = digits.parse::<usize>().ok()?;
    if row == 0 {
        return None;
    }
    Some((row - 1, col - 1))
}
