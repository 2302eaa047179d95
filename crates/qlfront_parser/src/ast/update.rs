use super::{AstParseable, Expr, Ident, ObjectReference};
use crate::errors::Result;
use crate::keywords::Keyword;
use crate::parser::Parser;
use crate::tokens::Token;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub column: Ident,
    pub value: Expr,
}

impl AstParseable for Assignment {
    fn parse(parser: &mut Parser) -> Result<Self> {
        let column = Ident::parse(parser)?;
        parser.expect_token(&Token::Eq)?;
        let value = Expr::parse(parser)?;
        Ok(Assignment { column, value })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Update {
    pub table: ObjectReference,
    pub assignments: Vec<Assignment>,
    pub selection: Option<Expr>,
}

impl AstParseable for Update {
    fn parse(parser: &mut Parser) -> Result<Self> {
        parser.trace("update");
        parser.expect_keyword(Keyword::UPDATE)?;
        let table = ObjectReference::parse(parser)?;

        parser.expect_keyword(Keyword::SET)?;
        let assignments = parser.parse_comma_separated(Assignment::parse)?;

        let selection = if parser.parse_keyword(Keyword::WHERE) {
            Some(Expr::parse(parser)?)
        } else {
            None
        };

        Ok(Update {
            table,
            assignments,
            selection,
        })
    }
}
