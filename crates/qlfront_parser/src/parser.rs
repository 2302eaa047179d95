use tracing::{debug, trace};

use crate::ast::{AstParseable, BindVar, Delete, Insert, Select, Update};
use crate::context::{ParseContext, ParseOptions};
use crate::diagnostics::Diagnostic;
use crate::errors::{ErrorCode, ParseError, Result};
use crate::keywords::Keyword;
use crate::location::Location;
use crate::statement::Statement;
use crate::tokens::{Token, TokenWithLocation, Tokenizer};

/// Output of a successful parse.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseTree {
    pub statement: Statement,
    /// Bind variables ordered by position in the statement.
    pub bind_variables: Vec<BindVar>,
    /// Warnings raised while parsing.
    pub diagnostics: Vec<Diagnostic>,
}

/// Parse a single statement.
///
/// On failure the returned error carries every diagnostic collected before
/// the parse stopped.
pub fn parse_statement(sql: &str, opts: &ParseOptions) -> Result<ParseTree> {
    let mut ctx = ParseContext::new(sql, opts);
    match parse(&mut ctx) {
        Ok(statement) => {
            let bind_variables = ctx.bind_variables();
            debug!(%statement, binds = bind_variables.len(), "parsed statement");
            Ok(ParseTree {
                statement,
                bind_variables,
                diagnostics: ctx.take_diagnostics(),
            })
        }
        Err(e) => Err(e.with_diagnostics(ctx.take_diagnostics())),
    }
}

/// Parse the statement held by the context.
///
/// Bind variables and diagnostics are left in the context.
pub fn parse(ctx: &mut ParseContext) -> Result<Statement> {
    let toks = Tokenizer::new(ctx).tokenize()?;
    let mut parser = Parser::new(ctx, toks);
    parser.parse_statement()
}

#[derive(Debug)]
pub struct Parser<'a> {
    ctx: &'a mut ParseContext,
    toks: Vec<TokenWithLocation>,
    /// Index of token we should process next.
    idx: usize,
}

impl<'a> Parser<'a> {
    pub fn new(ctx: &'a mut ParseContext, toks: Vec<TokenWithLocation>) -> Self {
        Parser { ctx, toks, idx: 0 }
    }

    pub fn parse_statement(&mut self) -> Result<Statement> {
        let tok = match self.peek() {
            Some(tok) => tok.clone(),
            None => {
                return Err(self.error(
                    Location::start(),
                    "Empty statement",
                    ErrorCode::SyntaxError,
                    None,
                ));
            }
        };

        let keyword = match &tok.token {
            Token::Word(w) => w.keyword,
            _ => None,
        };

        let statement = match keyword {
            Some(Keyword::SELECT) => Statement::Select(Select::parse(self)?),
            Some(Keyword::INSERT) => Statement::Insert(Insert::parse(self)?),
            Some(Keyword::UPDATE) => Statement::Update(Update::parse(self)?),
            Some(Keyword::DELETE) => Statement::Delete(Delete::parse(self)?),
            _ => return Err(self.unexpected(&tok, "SELECT, INSERT, UPDATE or DELETE")),
        };

        self.consume_token(&Token::SemiColon);
        if let Some(tok) = self.peek() {
            let tok = tok.clone();
            return Err(self.unexpected(&tok, "end of statement"));
        }

        Ok(statement)
    }

    /// Get the next token.
    pub fn next(&mut self) -> Option<&TokenWithLocation> {
        let tok = self.toks.get(self.idx)?;
        self.idx += 1;
        Some(tok)
    }

    /// Get the next token without advancing.
    pub fn peek(&self) -> Option<&TokenWithLocation> {
        self.toks.get(self.idx)
    }

    /// Location of the next token, or of the last token if there are none
    /// left.
    pub fn peek_location(&self) -> Location {
        self.peek()
            .or_else(|| self.toks.last())
            .map(|tok| tok.location)
            .unwrap_or_else(Location::start)
    }

    /// Consume the next token if it matches.
    pub fn consume_token(&mut self, token: &Token) -> bool {
        match self.peek() {
            Some(tok) if &tok.token == token => {
                self.idx += 1;
                true
            }
            _ => false,
        }
    }

    pub fn expect_token(&mut self, token: &Token) -> Result<()> {
        match self.peek() {
            Some(tok) if &tok.token == token => {
                self.idx += 1;
                Ok(())
            }
            Some(tok) => {
                let tok = tok.clone();
                Err(self.unexpected(&tok, &format!("'{token}'")))
            }
            None => Err(self.end_of_statement(&format!("'{token}'"))),
        }
    }

    /// Consume the next token if it's the given keyword.
    pub fn parse_keyword(&mut self, keyword: Keyword) -> bool {
        match self.peek() {
            Some(tok) if tok.is_keyword(keyword) => {
                self.idx += 1;
                true
            }
            _ => false,
        }
    }

    pub fn expect_keyword(&mut self, keyword: Keyword) -> Result<()> {
        if self.parse_keyword(keyword) {
            return Ok(());
        }
        let expected = format!("{keyword:?}");
        match self.peek() {
            Some(tok) => {
                let tok = tok.clone();
                Err(self.unexpected(&tok, &expected))
            }
            None => Err(self.end_of_statement(&expected)),
        }
    }

    /// Parse a comma-separated list of at least one item.
    pub fn parse_comma_separated<T>(
        &mut self,
        mut f: impl FnMut(&mut Parser<'a>) -> Result<T>,
    ) -> Result<Vec<T>> {
        let mut values = vec![f(self)?];
        while self.consume_token(&Token::Comma) {
            values.push(f(self)?);
        }
        Ok(values)
    }

    pub fn add_bind_variable(&mut self, var: BindVar) {
        if self.ctx.trace_parsing() {
            trace!(%var, pos = var.pos, "bind variable");
        }
        self.ctx.add_bind_variable(var);
    }

    pub fn warn(&mut self, location: Location, message: impl Into<String>, code: ErrorCode) {
        self.ctx.warn(location, message, code)
    }

    pub fn error(
        &mut self,
        location: Location,
        message: impl Into<String>,
        code: ErrorCode,
        token: Option<&str>,
    ) -> ParseError {
        self.ctx.error(location, message, code, token)
    }

    /// Error for a token that doesn't fit the grammar here.
    pub fn unexpected(&mut self, tok: &TokenWithLocation, expected: &str) -> ParseError {
        let token = tok.token.to_string();
        self.error(
            tok.location,
            format!("Unexpected token, expected {expected}"),
            ErrorCode::SyntaxError,
            Some(&token),
        )
    }

    /// Error for running out of tokens.
    pub fn end_of_statement(&mut self, expected: &str) -> ParseError {
        let location = self.peek_location();
        self.error(
            location,
            format!("Expected {expected}, found end of statement"),
            ErrorCode::SyntaxError,
            None,
        )
    }

    /// Log entry into a production.
    pub fn trace(&self, production: &str) {
        if self.ctx.trace_parsing() {
            trace!(production, location = %self.peek_location(), "parsing");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::Severity;

    #[test]
    fn select_with_bind() {
        let tree = parse_statement("SELECT * FROM t WHERE k = ?", &ParseOptions::default()).unwrap();
        assert!(matches!(tree.statement, Statement::Select(_)));
        assert_eq!(1, tree.bind_variables.len());
        assert_eq!(26, tree.bind_variables[0].pos);
        assert!(tree.diagnostics.is_empty());
    }

    #[test]
    fn trailing_semicolon() {
        parse_statement("delete from t;", &ParseOptions::default()).unwrap();
    }

    #[test]
    fn trailing_tokens() {
        let err = parse_statement("delete from t; x", &ParseOptions::default()).unwrap_err();
        assert_eq!(ErrorCode::SyntaxError, err.code());
        assert_eq!(Location::new(1, 16), err.location());
    }

    #[test]
    fn empty_statement() {
        let err = parse_statement("  -- nothing\n", &ParseOptions::default()).unwrap_err();
        assert_eq!(ErrorCode::SyntaxError, err.code());
        assert_eq!(Location::start(), err.location());
    }

    #[test]
    fn unknown_statement() {
        let err = parse_statement("create table t", &ParseOptions::default()).unwrap_err();
        assert_eq!(Some("create".to_string()), err.diagnostic.token);
    }

    #[test]
    fn error_carries_prior_warnings() {
        let err = parse_statement(
            "select * from t allow filtering garbage",
            &ParseOptions::default(),
        )
        .unwrap_err();

        let severities: Vec<_> = err.diagnostics.iter().map(|d| d.severity).collect();
        assert_eq!(vec![Severity::Warning, Severity::Error], severities);
    }

    #[test]
    fn error_on_second_line() {
        let err = parse_statement("select *\nfrom t wher k = 1", &ParseOptions::default())
            .unwrap_err();
        assert_eq!(Location::new(2, 8), err.location());
        insta::assert_snapshot!(err.diagnostic.render("select *\nfrom t wher k = 1"), @r"
        Syntax Error (2:8): Unexpected token, expected end of statement, near 'wher'
        from t wher k = 1
               ^
        ");
    }

    #[test]
    fn warnings_suppressed_on_reparse() {
        let sql = "select * from t allow filtering";
        let tree = parse_statement(sql, &ParseOptions::default()).unwrap();
        assert_eq!(1, tree.diagnostics.len());

        let opts = ParseOptions {
            reparsed: true,
            ..Default::default()
        };
        let tree = parse_statement(sql, &opts).unwrap();
        assert!(tree.diagnostics.is_empty());
    }
}
