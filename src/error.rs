//! Error taxonomy for module location, parsing, and structural queries.
//!
//! One crate-wide [`Error`] enum; every query-layer operation returns its
//! error to the immediate caller. Errors are `Clone` because a package's
//! parse failure is sticky: the same error is replayed on every later access
//! without re-attempting the parse.

use std::sync::Arc;

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

/// All failure modes of the engine.
#[derive(Clone, Debug, Error)]
pub enum Error {
    /// A pattern, package, type, interface, or symbol does not exist.
    #[error("not found: {0}")]
    NotFound(Arc<str>),

    /// An import path resolved to more than one candidate package.
    #[error("import path '{path}' resolved to {count} candidate packages")]
    AmbiguousResolution { path: Arc<str>, count: usize },

    /// A source file failed to parse. Sticky for the owning package.
    #[error("{file}:{line}:{col}: {message}")]
    ParseFailure {
        file: Arc<str>,
        /// 1-indexed line, as displayed to users.
        line: u32,
        /// 1-indexed column.
        col: u32,
        message: Arc<str>,
    },

    /// An import path was resolved through a package that never declares it.
    #[error("package '{package}' does not declare an import of '{path}'")]
    UndeclaredImport { package: Arc<str>, path: Arc<str> },

    /// Embedded-field (or interface-embedding) resolution looped back on
    /// itself. The payload is the `<import path>:<type>` where the loop
    /// closed.
    #[error("embedding cycle detected at '{0}'")]
    CycleDetected(Arc<str>),

    /// A type expression the structural layer cannot interpret in this
    /// position, e.g. a func or channel type where a named type was
    /// expected.
    #[error("unsupported type shape: {0}")]
    UnsupportedShape(Arc<str>),

    /// A source file could not be read.
    #[error("failed to read {path}: {message}")]
    Io { path: Arc<str>, message: Arc<str> },

    /// A locator produced metadata for this path but flagged it as
    /// partially failed (its `error` field was set).
    #[error("failed to locate '{path}': {message}")]
    Locate { path: Arc<str>, message: Arc<str> },

    /// A package query ran after its owning loader was dropped.
    #[error("loader was dropped while its packages were still in use")]
    LoaderReleased,

    /// Aggregate of per-pattern failures from a multi-pattern load.
    #[error("{} pattern(s) failed to load", .0.len())]
    Load(Vec<Error>),
}

impl Error {
    /// Shorthand for a [`Error::NotFound`] with a formatted description.
    pub(crate) fn not_found(what: impl Into<Arc<str>>) -> Self {
        Error::NotFound(what.into())
    }

    /// True for [`Error::NotFound`], which several callers branch on.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_parse_failure() {
        let err = Error::ParseFailure {
            file: Arc::from("a/b.go"),
            line: 3,
            col: 7,
            message: Arc::from("expected type"),
        };
        assert_eq!(err.to_string(), "a/b.go:3:7: expected type");
    }

    #[test]
    fn test_display_load_counts_failures() {
        let err = Error::Load(vec![Error::not_found("x"), Error::not_found("y")]);
        assert_eq!(err.to_string(), "2 pattern(s) failed to load");
    }

    #[test]
    fn test_errors_are_cloneable() {
        let err = Error::UndeclaredImport {
            package: Arc::from("example.com/app"),
            path: Arc::from("example.com/dep"),
        };
        let copy = err.clone();
        assert_eq!(err.to_string(), copy.to_string());
    }

    #[test]
    fn test_is_not_found() {
        assert!(Error::not_found("z").is_not_found());
        assert!(!Error::LoaderReleased.is_not_found());
    }
}
