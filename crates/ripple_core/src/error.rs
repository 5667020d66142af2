//! Error taxonomy shared by the source buffer, the analysis engine and the
//! CLI collaborator.

use std::path::PathBuf;

/// Errors produced anywhere in the ripple engine.
#[derive(Debug, thiserror::Error)]
pub enum RippleError {
    /// Filesystem read failed while appending a file to the source buffer.
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// `appendFile` resolved outside the configured root.
    #[error("path escapes configured root: {path}")]
    PathEscape { path: PathBuf },

    /// The parser rejected the concatenated source buffer.
    #[error("syntax error in {path} at line {line}: {message}")]
    SyntaxError {
        path: String,
        line: u32,
        message: String,
    },

    /// A requested (path, line) has no matching nodes, or a seed could not
    /// be located.
    #[error("not found: {0}")]
    NotFound(String),

    /// Malformed input to a core operation: an out-of-range `firstLine`, a
    /// configuration field referencing something that does not exist, or an
    /// AST node kind `nameOf` does not know how to name.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// An HTML file was registered for extraction more than once.
    #[error("duplicate handle for {path}")]
    DuplicateHandle { path: PathBuf },
}

/// Result alias used throughout the ripple crates.
pub type RippleResult<T> = Result<T, RippleError>;
