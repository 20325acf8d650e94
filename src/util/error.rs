//! Error types for the NWB library.

use thiserror::Error;

/// Main error type for NWB operations.
#[derive(Error, Debug)]
pub enum Error {
    /// No spec declared for a field anywhere in a type's ancestor chain
    #[error("No spec for field '{field}' on type {type_tag}")]
    SpecNotFound { type_tag: &'static str, field: String },

    /// No placement rule for a parent/child type pair
    #[error("No known location for {child} under {parent}")]
    UnknownPlacement { parent: &'static str, child: &'static str },

    /// Container's parent chain does not terminate at a file root
    #[error("Container '{0}' is not reachable from a file root")]
    OrphanContainer(String),

    /// Name already taken at this level of a group or namespace
    #[error("Name '{0}' already exists at this level")]
    DuplicateName(String),

    /// Two render contributions disagree about output shape
    #[error("Conflicting definitions for '{0}' while merging render output")]
    MergeConflict(String),

    /// Render-time access to a field the container does not carry
    #[error("Container '{container}' has no field '{field}'")]
    MissingField { container: String, field: String },

    /// Container already has an owner
    #[error("Container '{0}' is already attached to a parent")]
    AlreadyAttached(String),

    /// Epoch window with stop before start
    #[error("Invalid interval: stop {stop} < start {start}")]
    InvalidInterval { start: f64, stop: f64 },

    /// Link whose target cannot be bound
    #[error("Link target '{0}' cannot be resolved")]
    UnresolvedLink(String),

    /// Storage backend failure
    #[error("Backend error: {0}")]
    Backend(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a backend error from a string.
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }
}

/// Result type alias for NWB operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let e = Error::DuplicateName("series1".into());
        assert!(e.to_string().contains("series1"));

        let e = Error::UnknownPlacement { parent: "Epoch", child: "Module" };
        assert!(e.to_string().contains("Epoch"));
        assert!(e.to_string().contains("Module"));

        let e = Error::InvalidInterval { start: 2.0, stop: 1.0 };
        assert!(e.to_string().contains("2"));
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "test");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }
}
