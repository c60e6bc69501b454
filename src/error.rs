//! Error types for the generation control engine

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while driving a generation run
#[derive(Debug, Error)]
pub enum GeneratorError {
    /// Outlet name could not be resolved through the registry
    #[error("Outlet not found: {0}")]
    OutletNotFound(String),

    /// Required option is not set in the unit or its parent configuration
    #[error("Required option not set: {0}")]
    OptionNotSet(String),

    /// Path expression could not be parsed
    #[error("Malformed path expression: {0}")]
    MalformedPath(String),

    /// Token parameter contains an unterminated `${` placeholder
    #[error("Unterminated ${{ token in: {0}")]
    UnterminatedToken(String),

    /// More than one element matched where at most one is allowed
    #[error("Ambiguous match for path {path}: {count} elements matched, expected at most one")]
    AmbiguousMatch {
        /// Path expression that matched ambiguously
        path: String,
        /// Number of elements the expression matched
        count: usize,
    },

    /// No element matched and the action does not accept an unset result
    #[error("No element matched path: {0}")]
    NoMatch(String),

    /// Attribute is missing on a resolved element and the action does not
    /// accept an unset result
    #[error("Attribute {attribute} not set on element at {path}")]
    AttributeNotSet {
        /// Resolved path of the element that was inspected
        path: String,
        /// Attribute key that was missing
        attribute: String,
    },

    /// Outlet results of incompatible kinds were concatenated
    #[error("Incompatible outlet results: {0}")]
    ResultKindMismatch(String),

    /// Merge strategy was applied to a result kind it cannot reconcile
    #[error("Merge strategy cannot handle {0}")]
    MergeUnsupported(String),

    /// I/O failure on a target or snapshot file
    #[error("I/O error on {path}: {source}")]
    TargetIo {
        /// File the operation failed on
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// I/O error without a file association
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
