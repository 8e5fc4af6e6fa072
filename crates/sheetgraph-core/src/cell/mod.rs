//! Cell values

mod text;
mod value;

pub use text::clean_text;
pub use value::{CellKind, CellValue, SharedString, StringPool};
