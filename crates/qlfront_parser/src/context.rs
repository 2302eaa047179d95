use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::sync::Arc;

use crate::ast::BindVar;
use crate::diagnostics::{Diagnostic, ProcessContext};
use crate::errors::{ErrorCode, ParseError};
use crate::location::Location;
use crate::mem::{MemReservation, MemTracker};

pub const DEFAULT_READ_SIZE: usize = 4096;

/// Options for a single parse.
#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// Second pass over text that was already parsed once.
    pub reparsed: bool,
    /// Log every token produced by the tokenizer.
    pub trace_scanning: bool,
    /// Log grammar productions.
    pub trace_parsing: bool,
    /// Max bytes the tokenizer pulls per read.
    pub read_size: usize,
    pub mem_tracker: Option<Arc<MemTracker>>,
}

impl Default for ParseOptions {
    fn default() -> Self {
        ParseOptions {
            reparsed: false,
            trace_scanning: false,
            trace_parsing: false,
            read_size: DEFAULT_READ_SIZE,
            mem_tracker: None,
        }
    }
}

/// Statement text with a scan cursor.
#[derive(Debug)]
pub struct StatementBuffer {
    text: String,
    offset: usize,
    reparsed: bool,
}

impl StatementBuffer {
    pub fn new(text: impl Into<String>, reparsed: bool) -> Self {
        StatementBuffer {
            text: text.into(),
            offset: 0,
            reparsed,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn reparsed(&self) -> bool {
        self.reparsed
    }

    /// Return up to `max_size` bytes from the cursor and advance past them.
    ///
    /// Returns an empty slice once the statement is exhausted, and keeps
    /// doing so on later calls.
    pub fn read(&mut self, max_size: usize) -> &[u8] {
        let start = self.offset;
        let end = start + max_size.min(self.text.len() - start);
        self.offset = end;
        &self.text.as_bytes()[start..end]
    }

    /// Copy up to `buf.len()` bytes into `buf`, returning the count.
    pub fn read_into(&mut self, buf: &mut [u8]) -> usize {
        let data = self.read(buf.len());
        let n = data.len();
        buf[..n].copy_from_slice(data);
        n
    }
}

/// State for parsing a single statement.
///
/// Owns the statement buffer the scanner reads from, the bind variables
/// found so far, and the diagnostics. A context is used by exactly one parse.
#[derive(Debug)]
pub struct ParseContext {
    stmt: StatementBuffer,
    process: ProcessContext,
    /// Bind variables keyed by byte position in the statement.
    bind_variables: BTreeMap<usize, BindVar>,
    trace_scanning: bool,
    trace_parsing: bool,
    read_size: usize,
    _reservation: Option<MemReservation>,
}

impl ParseContext {
    pub fn new(stmt: impl Into<String>, opts: &ParseOptions) -> Self {
        let stmt = StatementBuffer::new(stmt, opts.reparsed);
        let reservation = opts
            .mem_tracker
            .as_ref()
            .map(|tracker| MemReservation::new(tracker.clone(), stmt.len()));

        ParseContext {
            process: ProcessContext::new(opts.reparsed),
            stmt,
            bind_variables: BTreeMap::new(),
            trace_scanning: opts.trace_scanning,
            trace_parsing: opts.trace_parsing,
            read_size: opts.read_size.max(1),
            _reservation: reservation,
        }
    }

    pub fn stmt(&self) -> &str {
        self.stmt.text()
    }

    pub fn reparsed(&self) -> bool {
        self.stmt.reparsed()
    }

    pub fn read(&mut self, max_size: usize) -> &[u8] {
        self.stmt.read(max_size)
    }

    pub fn read_into(&mut self, buf: &mut [u8]) -> usize {
        self.stmt.read_into(buf)
    }

    pub fn read_size(&self) -> usize {
        self.read_size
    }

    pub fn trace_scanning(&self) -> bool {
        self.trace_scanning
    }

    pub fn trace_parsing(&self) -> bool {
        self.trace_parsing
    }

    /// Add a bind variable. Adding the same occurrence twice is a no-op.
    ///
    /// Returns true if the variable was added.
    pub fn add_bind_variable(&mut self, var: BindVar) -> bool {
        match self.bind_variables.entry(var.pos) {
            Entry::Vacant(ent) => {
                ent.insert(var);
                true
            }
            Entry::Occupied(_) => false,
        }
    }

    /// Bind variables ordered by their position in the statement.
    pub fn bind_variables(&self) -> Vec<BindVar> {
        self.bind_variables.values().cloned().collect()
    }

    pub fn warn(&mut self, location: Location, message: impl Into<String>, code: ErrorCode) {
        self.process.warn(location, message, code)
    }

    pub fn error(
        &mut self,
        location: Location,
        message: impl Into<String>,
        code: ErrorCode,
        token: Option<&str>,
    ) -> ParseError {
        self.process.error(location, message, code, token)
    }

    pub fn process(&self) -> &ProcessContext {
        &self.process
    }

    pub fn has_errors(&self) -> bool {
        self.process.has_errors()
    }

    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        self.process.take_diagnostics()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn var(pos: usize) -> BindVar {
        BindVar {
            pos,
            location: Location::new(1, pos as u32 + 1),
            name: None,
        }
    }

    #[test]
    fn reads_partition_statement() {
        let text = "select * from t where k = ?";
        let mut buf = StatementBuffer::new(text, false);

        let mut out = Vec::new();
        loop {
            let chunk = buf.read(4);
            if chunk.is_empty() {
                break;
            }
            assert!(chunk.len() <= 4);
            out.extend_from_slice(chunk);
        }

        assert_eq!(text.as_bytes(), out.as_slice());
        assert!(buf.read(4).is_empty());
        assert!(buf.read(100).is_empty());
        assert_eq!(text.len(), buf.offset());
    }

    #[test]
    fn read_into_buffer() {
        let mut buf = StatementBuffer::new("abcdef", false);
        let mut dest = [0; 4];
        assert_eq!(4, buf.read_into(&mut dest));
        assert_eq!(b"abcd", &dest);
        assert_eq!(2, buf.read_into(&mut dest));
        assert_eq!(b"ef", &dest[..2]);
        assert_eq!(0, buf.read_into(&mut dest));
    }

    #[test]
    fn bind_variables_sorted_by_position() {
        let mut ctx = ParseContext::new("", &ParseOptions::default());
        assert!(ctx.bind_variables().is_empty());

        assert!(ctx.add_bind_variable(var(20)));
        assert!(ctx.add_bind_variable(var(3)));
        assert!(ctx.add_bind_variable(var(11)));
        assert!(!ctx.add_bind_variable(var(3)));

        let positions: Vec<_> = ctx.bind_variables().iter().map(|v| v.pos).collect();
        assert_eq!(vec![3, 11, 20], positions);
    }

    #[test]
    fn statement_charged_to_tracker() {
        let tracker = MemTracker::new_root("parse");
        let opts = ParseOptions {
            mem_tracker: Some(tracker.clone()),
            ..Default::default()
        };

        let ctx = ParseContext::new("select 1", &opts);
        assert_eq!(8, tracker.consumption());
        drop(ctx);
        assert_eq!(0, tracker.consumption());
    }
}
