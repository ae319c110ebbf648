use super::error::DomainError;

pub const USERNAME_MAX_CHARS: usize = 150;
const USERNAME_ALLOWED: &str = "letters, digits and @.+-_";

pub fn validate_username(input: &str) -> Result<String, DomainError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(DomainError::empty("username"));
    }
    if trimmed.chars().count() > USERNAME_MAX_CHARS {
        return Err(DomainError::too_long("username", USERNAME_MAX_CHARS));
    }
    if !trimmed
        .chars()
        .all(|ch| ch.is_alphanumeric() || matches!(ch, '@' | '.' | '+' | '-' | '_'))
    {
        return Err(DomainError::charset("username", USERNAME_ALLOWED));
    }
    Ok(trimmed.to_string())
}
