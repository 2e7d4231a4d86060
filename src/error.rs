use thiserror::Error;

/// Result type for retarget operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the retargeting engine
///
/// Missing type information is never an error: passes report it through
/// [`crate::types::Verdict::Unknown`] and leave the member alone. These variants
/// cover the infrastructure around the passes.
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error at line {line}, column {column}: {message}")]
    Parse {
        line: usize,
        column: usize,
        message: String,
    },

    #[error("Lexical error: {message}")]
    Lexical { message: String },

    #[error("Unresolved type: {name}")]
    UnresolvedType { name: String },

    #[error("Template error: {message}")]
    Template { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl Error {
    /// Create a parse error with location information
    pub fn parse_error(line: usize, column: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            line,
            column,
            message: message.into(),
        }
    }

    /// Create a lexical error
    pub fn lexical_error(message: impl Into<String>) -> Self {
        Self::Lexical { message: message.into() }
    }

    /// Create a template splicing error
    pub fn template_error(message: impl Into<String>) -> Self {
        Self::Template { message: message.into() }
    }

    pub fn unresolved_type(name: impl Into<String>) -> Self {
        Self::UnresolvedType { name: name.into() }
    }

    pub fn config_error(message: impl Into<String>) -> Self {
        Self::Config { message: message.into() }
    }
}
