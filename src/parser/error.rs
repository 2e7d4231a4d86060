use crate::ast::Location;
use crate::error::Error;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum ParseError {
    /// Unexpected token encountered
    UnexpectedToken {
        expected: String,
        found: String,
        location: Location,
    },

    /// Unexpected end of input
    UnexpectedEndOfInput { expected: String, location: Location },

    /// Syntax the parser does not support or cannot make sense of
    InvalidSyntax { message: String, location: Location },

    /// Lexical error
    LexicalError { message: String, location: Location },
}

impl ParseError {
    pub fn unexpected_token(expected: &str, found: &str, location: Location) -> Self {
        ParseError::UnexpectedToken {
            expected: expected.to_string(),
            found: found.to_string(),
            location,
        }
    }

    pub fn unexpected_end_of_input(expected: &str, location: Location) -> Self {
        ParseError::UnexpectedEndOfInput {
            expected: expected.to_string(),
            location,
        }
    }

    pub fn invalid_syntax(message: impl Into<String>, location: Location) -> Self {
        ParseError::InvalidSyntax {
            message: message.into(),
            location,
        }
    }

    pub fn location(&self) -> Location {
        match self {
            ParseError::UnexpectedToken { location, .. }
            | ParseError::UnexpectedEndOfInput { location, .. }
            | ParseError::InvalidSyntax { location, .. }
            | ParseError::LexicalError { location, .. } => *location,
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::UnexpectedToken { expected, found, .. } => {
                write!(f, "expected {}, found '{}'", expected, found)
            }
            ParseError::UnexpectedEndOfInput { expected, .. } => {
                write!(f, "unexpected end of input, expected {}", expected)
            }
            ParseError::InvalidSyntax { message, .. } => write!(f, "{}", message),
            ParseError::LexicalError { message, .. } => write!(f, "{}", message),
        }
    }
}

impl std::error::Error for ParseError {}

impl From<ParseError> for Error {
    fn from(err: ParseError) -> Self {
        match err {
            ParseError::LexicalError { message, .. } => Error::lexical_error(message),
            other => {
                let location = other.location();
                Error::parse_error(location.line, location.column, other.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_into_crate_error_with_position() {
        let err: Error = ParseError::unexpected_token("';'", "}", Location::new(3, 7, 40)).into();
        assert_eq!(
            err.to_string(),
            "Parse error at line 3, column 7: expected ';', found '}'"
        );
    }
}
