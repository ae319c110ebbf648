//! Utilities for generating deterministic, URL-safe group slugs.
//!
//! Titles are transliterated and slugified by the `slug` crate, so inputs like
//! "Café Society" become `cafe-society`. Explicit slugs supplied by an
//! administrator are validated instead of rewritten. Uniqueness is checked by a
//! caller-provided predicate so the generation logic stays pure.

use std::future::Future;

use slug::slugify;
use thiserror::Error;

const MAX_SUFFIX_ATTEMPTS: usize = 32;
pub const SLUG_MAX_CHARS: usize = 50;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SlugError {
    #[error("slug source text is empty")]
    EmptyInput,
    #[error("failed to derive slug from `{input}`")]
    Unrepresentable { input: String },
    #[error("slug `{slug}` may only contain latin letters, digits, hyphens and underscores")]
    InvalidCharacters { slug: String },
    #[error("slug must be at most 50 characters")]
    TooLong,
    #[error("exhausted attempts to find a unique slug for `{base}`")]
    Exhausted { base: String },
}

#[derive(Debug, Error)]
pub enum SlugAsyncError<E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    #[error(transparent)]
    Slug(#[from] SlugError),
    #[error(transparent)]
    Predicate(E),
}

/// Derive a base slug from the provided human-readable text.
pub fn derive_slug(input: &str) -> Result<String, SlugError> {
    if input.trim().is_empty() {
        return Err(SlugError::EmptyInput);
    }

    let mut candidate = slugify(input);
    if candidate.chars().count() > SLUG_MAX_CHARS {
        candidate = candidate.chars().take(SLUG_MAX_CHARS).collect();
        candidate = candidate.trim_end_matches('-').to_string();
    }

    if candidate.is_empty() {
        return Err(SlugError::Unrepresentable {
            input: input.to_string(),
        });
    }

    Ok(candidate)
}

/// Check an explicitly supplied slug without rewriting it.
pub fn validate_slug(input: &str) -> Result<String, SlugError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(SlugError::EmptyInput);
    }
    if trimmed.chars().count() > SLUG_MAX_CHARS {
        return Err(SlugError::TooLong);
    }
    if !trimmed
        .chars()
        .all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_')
    {
        return Err(SlugError::InvalidCharacters {
            slug: trimmed.to_string(),
        });
    }
    Ok(trimmed.to_string())
}

/// Produce a slug that does not collide according to the awaited predicate.
///
/// `is_unique` must resolve to `true` when the candidate is free. Collisions
/// are retried with a monotonic suffix (`-2`, `-3`, ...).
pub async fn generate_unique_slug_async<F, Fut, E>(
    input: &str,
    mut is_unique: F,
) -> Result<String, SlugAsyncError<E>>
where
    F: FnMut(&str) -> Fut,
    Fut: Future<Output = Result<bool, E>>,
    E: std::error::Error + Send + Sync + 'static,
{
    let base = derive_slug(input)?;

    if is_unique(&base).await.map_err(SlugAsyncError::Predicate)? {
        return Ok(base);
    }

    for attempt in 2..=MAX_SUFFIX_ATTEMPTS + 1 {
        let candidate = format!("{base}-{attempt}");
        if is_unique(&candidate)
            .await
            .map_err(SlugAsyncError::Predicate)?
        {
            return Ok(candidate);
        }
    }

    Err(SlugAsyncError::Slug(SlugError::Exhausted { base }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derive_slug_transliterates_accents() {
        let slug = derive_slug("Café Society").expect("slug");
        assert_eq!(slug, "cafe-society");
    }

    #[test]
    fn derive_slug_rejects_blank_and_symbol_only_input() {
        assert_eq!(derive_slug("   "), Err(SlugError::EmptyInput));
        assert!(matches!(
            derive_slug("!!!"),
            Err(SlugError::Unrepresentable { .. })
        ));
    }

    #[test]
    fn validate_slug_keeps_explicit_value() {
        assert_eq!(validate_slug("test_slug-1").as_deref(), Ok("test_slug-1"));
        assert!(matches!(
            validate_slug("with space"),
            Err(SlugError::InvalidCharacters { .. })
        ));
    }

    #[tokio::test]
    async fn generate_unique_slug_async_appends_counter() {
        use std::sync::Arc;
        use tokio::sync::Mutex;

        let existing = Arc::new(Mutex::new(vec!["cats".to_string(), "cats-2".to_string()]));

        let slug = generate_unique_slug_async("Cats", |candidate| {
            let existing = existing.clone();
            let candidate = candidate.to_string();
            async move {
                let guard = existing.lock().await;
                Ok::<bool, std::convert::Infallible>(!guard.contains(&candidate))
            }
        })
        .await
        .expect("unique slug");

        assert_eq!(slug, "cats-3");
    }
}
