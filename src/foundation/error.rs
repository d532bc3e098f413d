/// Convenience result type used across kinopath.
pub type KinoResult<T> = Result<T, KinoError>;

/// Top-level error taxonomy used by kernel APIs.
///
/// Frequent, expected outcomes (a projector that does not converge, a configuration in
/// collision) are plain values and never reach this type. Everything here is either a failed
/// construction or a programming error surfaced to the immediate caller.
#[derive(thiserror::Error, Debug)]
pub enum KinoError {
    /// Invalid caller-provided data (intervals, sizes, settings).
    #[error("validation error: {0}")]
    Validation(String),

    /// An endpoint of a new path could not be projected onto its constraints.
    #[error("projection error: {0}")]
    Projection(String),

    /// Structural misuse of an API, such as attaching constraints twice.
    #[error("precondition violated: {0}")]
    Precondition(String),

    /// The requested capability is not provided by this path shape.
    #[error("not implemented: {0}")]
    NotImplemented(String),

    /// A configuration surface references something that does not exist.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Wrapped lower-level error from dependencies.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl KinoError {
    /// Build a [`KinoError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`KinoError::Projection`] value.
    pub fn projection(msg: impl Into<String>) -> Self {
        Self::Projection(msg.into())
    }

    /// Build a [`KinoError::Precondition`] value.
    pub fn precondition(msg: impl Into<String>) -> Self {
        Self::Precondition(msg.into())
    }

    /// Build a [`KinoError::NotImplemented`] value.
    pub fn not_implemented(msg: impl Into<String>) -> Self {
        Self::NotImplemented(msg.into())
    }

    /// Build a [`KinoError::Configuration`] value.
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// True for [`KinoError::Projection`].
    pub fn is_projection(&self) -> bool {
        matches!(self, Self::Projection(_))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
