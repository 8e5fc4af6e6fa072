//! Column naming helpers

/// Offset between a zero-based data row index and the row number a user sees
/// in a spreadsheet application: one for 1-based numbering, one for the header.
pub const SPREADSHEET_ROW_OFFSET: usize = 2;

/// Normalize a column name to its canonical form
///
/// Spaces are replaced by underscores so that column names declared in a
/// mapping and column names read from a sheet compare equal.
///
/// ```
/// use sheetgraph_core::column::normalize_name;
///
/// assert_eq!(normalize_name("well id"), "well_id");
/// assert_eq!(normalize_name("name"), "name");
/// ```
pub fn normalize_name(name: &str) -> String {
    name.replace(' ', "_")
}

/// Turn raw header cells into usable, unique column names
///
/// Blank headers become `Unnamed: <index>`; repeated headers get a `.1`,
/// `.2`, ... suffix in order of appearance.
///
/// ```
/// use sheetgraph_core::column::header_names;
///
/// let names = header_names(["id", "", "id"]);
/// assert_eq!(names, vec!["id", "Unnamed: 1", "id.1"]);
/// ```
pub fn header_names<I, S>(raw: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut names: Vec<String> = Vec::new();
    for (index, header) in raw.into_iter().enumerate() {
        let header = header.as_ref().trim();
        let base = if header.is_empty() {
            format!("Unnamed: {}", index)
        } else {
            header.to_string()
        };

        let mut name = base.clone();
        let mut suffix = 1;
        while names.contains(&name) {
            name = format!("{}.{}", base, suffix);
            suffix += 1;
        }
        names.push(name);
    }
    names
}

/// Convert a zero-based data row index to its spreadsheet row number
pub fn spreadsheet_row(index: usize) -> usize {
    index + SPREADSHEET_ROW_OFFSET
}
