use std::fmt;

use tracing::{debug, trace};

use crate::errors::{ErrorCode, ParseError};
use crate::location::Location;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub location: Location,
    pub message: String,
    pub code: ErrorCode,
    /// Text of the offending token, if known.
    pub token: Option<String>,
}

impl Diagnostic {
    /// Render the diagnostic with the statement line it points at, and a
    /// caret under the column.
    pub fn render(&self, stmt: &str) -> String {
        let mut out = self.to_string();
        let line_idx = self.location.line.saturating_sub(1) as usize;
        if let Some(line) = stmt.lines().nth(line_idx) {
            let pad = self.location.col.saturating_sub(1) as usize;
            out.push('\n');
            out.push_str(line);
            out.push('\n');
            out.push_str(&" ".repeat(pad));
            out.push('^');
        }
        out
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.code, self.location, self.message)?;
        if let Some(token) = &self.token {
            write!(f, ", near '{token}'")?;
        }
        Ok(())
    }
}

/// Accumulates diagnostics while processing a statement.
///
/// A single error marks the statement as failed, but collection continues
/// until the caller stops.
#[derive(Debug, Default)]
pub struct ProcessContext {
    diagnostics: Vec<Diagnostic>,
    /// Code of the first error recorded.
    error_code: Option<ErrorCode>,
    /// Second pass over already processed text. Warnings were raised on the
    /// first pass.
    reparsed: bool,
}

impl ProcessContext {
    pub fn new(reparsed: bool) -> Self {
        ProcessContext {
            diagnostics: Vec::new(),
            error_code: None,
            reparsed,
        }
    }

    pub fn reparsed(&self) -> bool {
        self.reparsed
    }

    /// Record a non-fatal diagnostic.
    pub fn warn(&mut self, location: Location, message: impl Into<String>, code: ErrorCode) {
        let message = message.into();
        if self.reparsed {
            trace!(%location, %message, "suppressing warning on reparse");
            return;
        }
        debug!(%location, %message, ?code, "parse warning");
        self.diagnostics.push(Diagnostic {
            severity: Severity::Warning,
            location,
            message,
            code,
            token: None,
        });
    }

    /// Record an error, returning a failure carrying the same diagnostic.
    pub fn error(
        &mut self,
        location: Location,
        message: impl Into<String>,
        code: ErrorCode,
        token: Option<&str>,
    ) -> ParseError {
        let diagnostic = Diagnostic {
            severity: Severity::Error,
            location,
            message: message.into(),
            code,
            token: token.map(|t| t.to_string()),
        };
        debug!(%diagnostic, "parse error");

        if self.error_code.is_none() {
            self.error_code = Some(code);
        }
        self.diagnostics.push(diagnostic.clone());

        ParseError::new(diagnostic)
    }

    pub fn has_errors(&self) -> bool {
        self.error_code.is_some()
    }

    pub fn error_code(&self) -> Option<ErrorCode> {
        self.error_code
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Warning)
    }

    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }
}
