//! Error types for schema building and casting

use thiserror::Error;

/// Result type for hashcast operations
pub type Result<T> = std::result::Result<T, CastError>;

/// Errors surfaced to callers of the builder and the caster.
///
/// Every variant carries the complete, path-qualified message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CastError {
    /// Schema references a converter name that is not registered
    #[error("{0}")]
    CasterNotFound(String),

    /// Malformed schema definition, options or top-level input
    #[error("{0}")]
    Argument(String),

    /// Required attribute absent from input
    #[error("{0}")]
    MissingAttribute(String),

    /// Input key without a matching attribute in strict mode
    #[error("{0}")]
    UnexpectedAttribute(String),

    /// Value present but could not be converted
    #[error("{0}")]
    Casting(String),
}

/// Discriminant of [`CastError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    CasterNotFound,
    Argument,
    MissingAttribute,
    UnexpectedAttribute,
    Casting,
}

impl CastError {
    pub(crate) fn caster_not_found(name: &str) -> Self {
        CastError::CasterNotFound(format!("caster with name '{}' is not found", name))
    }

    pub(crate) fn argument(message: impl Into<String>) -> Self {
        CastError::Argument(message.into())
    }

    pub(crate) fn missing(path: &str) -> Self {
        CastError::MissingAttribute(format!("{} should be given", path))
    }

    pub(crate) fn unexpected(path: &str) -> Self {
        CastError::UnexpectedAttribute(format!("{} is not valid attribute name", path))
    }

    pub(crate) fn casting(path: &str, reason: &ConversionError) -> Self {
        CastError::Casting(format!("{} {}", path, reason))
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            CastError::CasterNotFound(_) => ErrorKind::CasterNotFound,
            CastError::Argument(_) => ErrorKind::Argument,
            CastError::MissingAttribute(_) => ErrorKind::MissingAttribute,
            CastError::UnexpectedAttribute(_) => ErrorKind::UnexpectedAttribute,
            CastError::Casting(_) => ErrorKind::Casting,
        }
    }

    /// The human-readable message
    pub fn message(&self) -> &str {
        match self {
            CastError::CasterNotFound(m)
            | CastError::Argument(m)
            | CastError::MissingAttribute(m)
            | CastError::UnexpectedAttribute(m)
            | CastError::Casting(m) => m,
        }
    }
}

/// Failure reported by a single converter.
///
/// Holds only the reason (`should be a string, but was Hash`); the engine
/// prefixes the attribute path when turning it into [`CastError::Casting`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct ConversionError(pub String);

impl ConversionError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self(reason.into())
    }

    /// `should be a <expected>, but was <Type>`
    pub fn unexpected_type(expected: &str, value: &crate::Value) -> Self {
        Self(format!("should be {}, but was {}", expected, value.type_name()))
    }
}
