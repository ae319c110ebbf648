use super::error::DomainError;

pub const TITLE_MAX_CHARS: usize = 200;

pub fn validate_title(input: &str) -> Result<String, DomainError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(DomainError::empty("title"));
    }
    if trimmed.chars().count() > TITLE_MAX_CHARS {
        return Err(DomainError::too_long("title", TITLE_MAX_CHARS));
    }
    Ok(trimmed.to_string())
}

pub fn validate_description(input: &str) -> Result<String, DomainError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(DomainError::empty("description"));
    }
    Ok(trimmed.to_string())
}
