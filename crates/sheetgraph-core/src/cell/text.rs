//! Text cleaning applied to string cells at load time

/// Clean a raw string cell
///
/// Surrounding whitespace is trimmed, then trailing commas are removed. The
/// result may be empty, in which case callers store [`CellValue::Empty`].
///
/// [`CellValue::Empty`]: crate::CellValue::Empty
pub fn clean_text(raw: &str) -> &str {
    raw.trim().trim_end_matches(',')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_text() {
        assert_eq!(clean_text("  glc, eth, "), "glc, eth");
        assert_eq!(clean_text("a,,"), "a");
        assert_eq!(clean_text(" , "), "");
        assert_eq!(clean_text("plain"), "plain");
    }
}
