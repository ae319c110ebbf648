use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("`{field}` must not be empty")]
    Empty { field: &'static str },
    #[error("`{field}` must be at most {max} characters")]
    TooLong { field: &'static str, max: usize },
    #[error("`{field}` contains characters outside {allowed}")]
    Charset {
        field: &'static str,
        allowed: &'static str,
    },
}

impl DomainError {
    pub fn empty(field: &'static str) -> Self {
        Self::Empty { field }
    }

    pub fn too_long(field: &'static str, max: usize) -> Self {
        Self::TooLong { field, max }
    }

    pub fn charset(field: &'static str, allowed: &'static str) -> Self {
        Self::Charset { field, allowed }
    }

    /// Name of the offending input field.
    pub fn field(&self) -> &'static str {
        match self {
            Self::Empty { field } | Self::TooLong { field, .. } | Self::Charset { field, .. } => {
                field
            }
        }
    }
}
