//! A1-style cell references

/// Rows in a worksheet
pub(crate) const MAX_ROWS: usize = 1_048_576;

/// Columns in a worksheet (`XFD`)
pub(crate) const MAX_COLUMNS: usize = 16_384;

/// Parse an A1-style reference (`"B12"`, `"$AA$3"`) into zero-based
/// `(row, column)` indices; references outside the sheet are `None`
pub(crate) fn parse_cell_ref(reference: &str) -> Option<(usize, usize)> {
    let reference = reference.trim().replace('$', "");
    let split = reference.find(|c: char| c.is_ascii_digit())?;
    let (letters, digits) = reference.split_at(split);

    let col = column_index(letters)?;
    let row = row_index(digits)?;
    Some((row, col))
}

/// Parse a one-based row number (`"12"`) into a zero-based row index
pub(crate) fn row_index(digits: &str) -> Option<usize> {
    let row: usize = digits.trim().parse().ok()?;
    if row == 0 || row > MAX_ROWS {
        return None;
    }
    Some(row - 1)
}

/// Convert column letters (`"A"`, `"AB"`) to a zero-based column index
pub(crate) fn column_index(letters: &str) -> Option<usize> {
    if letters.is_empty() {
        return None;
    }
    let mut index = 0usize;
    for c in letters.chars() {
        if !c.is_ascii_alphabetic() {
            return None;
        }
        let digit = (c.to_ascii_uppercase() as u8 - b'A') as usize + 1;
        index = index.checked_mul(26)?.checked_add(digit)?;
        if index > MAX_COLUMNS {
            return None;
        }
    }
    Some(index - 1)
}
