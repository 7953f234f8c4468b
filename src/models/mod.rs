//! Data models for OneDrive items and the photos served to the gallery

mod drive_item;
mod photo;

pub use drive_item::*;
pub use photo::*;

/// Trimmed value, or `None` when absent or blank.
pub fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

/// Trimmed value, or `default` when absent or blank.
pub fn text_or(value: Option<&str>, default: &str) -> String {
    non_blank(value).unwrap_or(default).to_string()
}
