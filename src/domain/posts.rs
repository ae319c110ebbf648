//! Text rules shared by posts and comments.

use time::{format_description::FormatItem, macros::format_description};

use super::error::DomainError;

/// Number of characters a post contributes to its preview label.
pub const PREVIEW_CHARS: usize = 15;

pub const DISPLAY_DATE_FORMAT: &[FormatItem<'static>] =
    format_description!("[day padding:none] [month repr:short] [year], [hour]:[minute]");

/// Validate required free text, returning it trimmed of surrounding whitespace.
pub fn normalize_text(field: &'static str, input: &str) -> Result<String, DomainError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(DomainError::empty(field));
    }
    Ok(trimmed.to_string())
}

pub fn preview(text: &str) -> String {
    text.chars().take(PREVIEW_CHARS).collect()
}
