use std::fmt;

use crate::diagnostics::Diagnostic;
use crate::location::Location;

/// Codes attached to diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    LexicalError,
    SyntaxError,
    InvalidArguments,
    FeatureNotSupported,
    /// Part of the statement was accepted but has no effect.
    FeatureIgnored,
    InvalidBindVariable,
}

impl ErrorCode {
    /// Stable numeric code.
    pub const fn code(&self) -> i64 {
        match self {
            Self::LexicalError => 1001,
            Self::SyntaxError => 1002,
            Self::InvalidArguments => 1003,
            Self::FeatureNotSupported => 1004,
            Self::FeatureIgnored => 1005,
            Self::InvalidBindVariable => 1006,
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::LexicalError => "Lexical Error",
            Self::SyntaxError => "Syntax Error",
            Self::InvalidArguments => "Invalid Arguments",
            Self::FeatureNotSupported => "Feature Not Supported",
            Self::FeatureIgnored => "Feature Ignored",
            Self::InvalidBindVariable => "Invalid Bind Variable",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A failed parse.
///
/// Carries the error diagnostic that halted the parse, and every diagnostic
/// collected up to that point.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{diagnostic}")]
pub struct ParseError {
    pub diagnostic: Diagnostic,
    pub diagnostics: Vec<Diagnostic>,
}

impl ParseError {
    pub fn new(diagnostic: Diagnostic) -> Self {
        ParseError {
            diagnostic,
            diagnostics: Vec::new(),
        }
    }

    pub fn location(&self) -> Location {
        self.diagnostic.location
    }

    pub fn code(&self) -> ErrorCode {
        self.diagnostic.code
    }

    pub fn with_diagnostics(mut self, diagnostics: Vec<Diagnostic>) -> Self {
        self.diagnostics = diagnostics;
        self
    }
}

pub type Result<T, E = ParseError> = std::result::Result<T, E>;
