pub mod delete;
pub use delete::*;
pub mod expr;
pub use expr::*;
pub mod insert;
pub use insert::*;
pub mod select;
pub use select::*;
pub mod update;
pub use update::*;

use std::fmt;

use crate::errors::Result;
use crate::location::Location;
use crate::parser::Parser;
use crate::tokens::Token;

pub trait AstParseable: Sized {
    /// Parse an instance of Self from the provided parser.
    ///
    /// It's assumed that the parser is in the correct state for parsing Self,
    /// and if it isn't, an error should be returned.
    fn parse(parser: &mut Parser) -> Result<Self>;
}


/// Placeholder occurrence in a statement.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BindVar {
    /// Byte offset of the marker in the statement.
    pub pos: usize,
    pub location: Location,
    /// Name for `:name` markers, None for `?`.
    pub name: Option<String>,
}

impl fmt::Display for BindVar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, ":{name}"),
            None => write!(f, "?"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ident {
    pub value: String,
    pub quoted: bool,
}

impl Ident {
    pub fn new_unquoted(s: impl Into<String>) -> Self {
        Ident {
            value: s.into(),
            quoted: false,
        }
    }

    pub fn new_quoted(s: impl Into<String>) -> Self {
        Ident {
            value: s.into(),
            quoted: true,
        }
    }

    /// Name used for lookups. Unquoted identifiers are case-insensitive and
    /// fold to lowercase.
    pub fn normalized(&self) -> String {
        if self.quoted {
            self.value.clone()
        } else {
            self.value.to_lowercase()
        }
    }
}

impl AstParseable for Ident {
    fn parse(parser: &mut Parser) -> Result<Self> {
        let tok = match parser.next() {
            Some(tok) => tok.clone(),
            None => return Err(parser.end_of_statement("an identifier")),
        };

        match &tok.token {
            Token::Word(w) if w.quote.is_some() => Ok(Ident::new_quoted(w.value.clone())),
            // Keywords are reserved and can't be used as bare identifiers.
            Token::Word(w) if w.keyword.is_none() => Ok(Ident::new_unquoted(w.value.clone())),
            _ => Err(parser.unexpected(&tok, "an identifier")),
        }
    }
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.quoted {
            write!(f, "\"{}\"", self.value.replace('"', "\"\""))
        } else {
            write!(f, "{}", self.value)
        }
    }
}

/// A possibly qualified table name, `keyspace.table` or `table`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectReference(pub Vec<Ident>);

impl ObjectReference {
    /// Create an object from an iterator of strings.
    pub fn from_strings<S>(strings: impl IntoIterator<Item = S>) -> Self
    where
        S: Into<String>,
    {
        ObjectReference(strings.into_iter().map(Ident::new_unquoted).collect())
    }

    /// The unqualified name.
    pub fn base(&self) -> Option<&Ident> {
        self.0.last()
    }

    /// The qualifier, if the reference has one.
    pub fn keyspace(&self) -> Option<&Ident> {
        match self.0.len() {
            2 => self.0.first(),
            _ => None,
        }
    }
}

impl AstParseable for ObjectReference {
    fn parse(parser: &mut Parser) -> Result<Self> {
        let mut idents = vec![Ident::parse(parser)?];
        if parser.consume_token(&Token::Period) {
            idents.push(Ident::parse(parser)?);
        }
        Ok(ObjectReference(idents))
    }
}

impl fmt::Display for ObjectReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let strings: Vec<_> = self.0.iter().map(|ident| ident.to_string()).collect();
        write!(f, "{}", strings.join("."))
    }
}
