//! Cell value types

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Represents the value stored in a cell
///
/// The variant is decided once, when a tabular source is loaded. Everything
/// downstream (type checking, schema building, graph population) classifies
/// cells by matching on this closed set instead of inspecting raw text again.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    /// Empty cell (no value)
    Empty,

    /// Boolean value (TRUE/FALSE)
    Boolean(bool),

    /// Whole number
    Integer(i64),

    /// Floating point number
    Float(f64),

    /// String value
    String(SharedString),
}

/// The runtime kind of a non-empty cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CellKind {
    Integer,
    Float,
    String,
    Boolean,
}

impl CellKind {
    /// Raw type name used in diagnostics
    pub fn name(&self) -> &'static str {
        match self {
            CellKind::Integer => "integer",
            CellKind::Float => "float",
            CellKind::String => "string",
            CellKind::Boolean => "boolean",
        }
    }

    /// Integers and floats are mutually compatible numeric kinds
    pub fn is_numeric(&self) -> bool {
        matches!(self, CellKind::Integer | CellKind::Float)
    }
}

impl fmt::Display for CellKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl CellValue {
    /// Create a new string value
    pub fn string<S: Into<String>>(s: S) -> Self {
        CellValue::String(SharedString::new(s.into()))
    }

    /// Check if the cell is empty
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    /// Check if the cell holds an integer or a float
    pub fn is_numeric(&self) -> bool {
        matches!(self, CellValue::Integer(_) | CellValue::Float(_))
    }

    /// Get the runtime kind of the cell, `None` for empty cells
    pub fn kind(&self) -> Option<CellKind> {
        match self {
            CellValue::Empty => None,
            CellValue::Boolean(_) => Some(CellKind::Boolean),
            CellValue::Integer(_) => Some(CellKind::Integer),
            CellValue::Float(_) => Some(CellKind::Float),
            CellValue::String(_) => Some(CellKind::String),
        }
    }

    /// Try to get the value as a string
    pub fn as_string(&self) -> Option<&str> {
        match self {
            CellValue::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Get the type name for error messages
    pub fn type_name(&self) -> &'static str {
        self.kind().map_or("empty", |k| k.name())
    }

    /// Split the textual form of the cell into comma-separated tokens
    ///
    /// Tokens are trimmed and empty tokens are dropped. An empty cell yields
    /// no tokens.
    pub fn tokens(&self) -> Vec<String> {
        if self.is_empty() {
            return Vec::new();
        }
        self.to_string()
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect()
    }
}

impl Default for CellValue {
    fn default() -> Self {
        CellValue::Empty
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => write!(f, ""),
            CellValue::Boolean(b) => write!(f, "{}", b),
            CellValue::Integer(n) => write!(f, "{}", n),
            CellValue::Float(n) => write!(f, "{}", n),
            CellValue::String(s) => write!(f, "{}", s.as_str()),
        }
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Boolean(b)
    }
}

impl From<i32> for CellValue {
    fn from(n: i32) -> Self {
        CellValue::Integer(n as i64)
    }
}

impl From<i64> for CellValue {
    fn from(n: i64) -> Self {
        CellValue::Integer(n)
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        if n.is_nan() {
            CellValue::Empty
        } else {
            CellValue::Float(n)
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::string(s)
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::string(s)
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(CellValue::Empty, Into::into)
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for CellValue {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            CellValue::Empty => serializer.serialize_none(),
            CellValue::Boolean(b) => serializer.serialize_bool(*b),
            CellValue::Integer(n) => serializer.serialize_i64(*n),
            CellValue::Float(n) => serializer.serialize_f64(*n),
            CellValue::String(s) => serializer.serialize_str(s.as_str()),
        }
    }
}

/// Interned string for memory efficiency
///
/// Strings are often repeated across cells (e.g., "Yes", "No", identifiers).
/// Using Arc<str> allows sharing the same string data across multiple cells.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SharedString(Arc<str>);

impl SharedString {
    /// Create a new shared string
    pub fn new<S: AsRef<str>>(s: S) -> Self {
        SharedString(Arc::from(s.as_ref()))
    }

    /// Get the string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Get the length of the string
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if the string is empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for SharedString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

impl fmt::Display for SharedString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for SharedString {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SharedString {
    fn from(s: &str) -> Self {
        SharedString::new(s)
    }
}

impl From<String> for SharedString {
    fn from(s: String) -> Self {
        SharedString::new(s)
    }
}

/// String pool for deduplicating strings
///
/// When reading large sheets, many cells often contain the same string values
/// (foreign keys in particular). The pool ensures each unique string is stored
/// only once in memory.
#[derive(Debug, Default)]
pub struct StringPool {
    strings: HashMap<Arc<str>, SharedString>,
}

impl StringPool {
    /// Create a new empty string pool
    pub fn new() -> Self {
        Self::default()
    }

    /// Get or create a shared string
    pub fn intern<S: AsRef<str>>(&mut self, s: S) -> SharedString {
        let s = s.as_ref();
        if let Some(shared) = self.strings.get(s) {
            shared.clone()
        } else {
            let arc: Arc<str> = Arc::from(s);
            let shared = SharedString(arc.clone());
            self.strings.insert(arc, shared.clone());
            shared
        }
    }

    /// Intern a string and wrap it in a cell value
    pub fn string_value<S: AsRef<str>>(&mut self, s: S) -> CellValue {
        CellValue::String(self.intern(s))
    }

    /// Get the number of unique strings in the pool
    pub fn len(&self) -> usize {
        self.strings.len()
    }

    /// Check if the pool is empty
    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_value_conversions() {
        assert_eq!(CellValue::from(42), CellValue::Integer(42));
        assert_eq!(CellValue::from(3.5), CellValue::Float(3.5));
        assert_eq!(CellValue::from(true), CellValue::Boolean(true));
        assert_eq!(CellValue::from(f64::NAN), CellValue::Empty);
        assert_eq!(CellValue::from(None::<i64>), CellValue::Empty);

        let s = CellValue::from("hello");
        assert_eq!(s.as_string(), Some("hello"));
    }

    #[test]
    fn test_cell_kind() {
        assert_eq!(CellValue::Empty.kind(), None);
        assert_eq!(CellValue::Integer(1).kind(), Some(CellKind::Integer));
        assert_eq!(CellValue::Float(1.5).type_name(), "float");
        assert_eq!(CellValue::string("x").type_name(), "string");
        assert_eq!(CellValue::Boolean(false).type_name(), "boolean");
        assert!(CellKind::Integer.is_numeric());
        assert!(CellKind::Float.is_numeric());
        assert!(!CellKind::Boolean.is_numeric());
    }

    #[test]
    fn test_display_is_token_text() {
        assert_eq!(CellValue::Integer(5).to_string(), "5");
        assert_eq!(CellValue::Float(5.0).to_string(), "5");
        assert_eq!(CellValue::Float(2.5).to_string(), "2.5");
        assert_eq!(CellValue::Boolean(true).to_string(), "true");
        assert_eq!(CellValue::Empty.to_string(), "");
    }

    #[test]
    fn test_tokens() {
        assert_eq!(
            CellValue::from("A, B,  C").tokens(),
            vec!["A".to_string(), "B".to_string(), "C".to_string()]
        );
        assert_eq!(CellValue::from(" , ,").tokens(), Vec::<String>::new());
        assert_eq!(CellValue::Integer(7).tokens(), vec!["7".to_string()]);
        assert!(CellValue::Empty.tokens().is_empty());
    }

    #[test]
    fn test_string_pool() {
        let mut pool = StringPool::new();

        let s1 = pool.intern("hello");
        let s2 = pool.intern("hello");
        let s3 = pool.intern("world");

        assert!(Arc::ptr_eq(&s1.0, &s2.0));
        assert!(!Arc::ptr_eq(&s1.0, &s3.0));
        assert_eq!(pool.len(), 2);
    }
}
