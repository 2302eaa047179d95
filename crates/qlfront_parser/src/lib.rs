//! Statement parsing. The parse context owns the statement text and collects
//! bind variables and diagnostics, the tokenizer and grammar consult it.
pub mod ast;
pub mod context;
pub mod diagnostics;
pub mod errors;
pub mod keywords;
pub mod location;
pub mod mem;
pub mod parser;
pub mod statement;
pub mod tokens;

pub use context::{ParseContext, ParseOptions};
pub use parser::{ParseTree, parse_statement};
