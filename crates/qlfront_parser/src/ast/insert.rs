use super::{AstParseable, Expr, Ident, ObjectReference};
use crate::errors::{ErrorCode, Result};
use crate::keywords::Keyword;
use crate::parser::Parser;
use crate::tokens::Token;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Insert {
    pub table: ObjectReference,
    pub columns: Vec<Ident>,
    pub values: Vec<Expr>,
}

impl AstParseable for Insert {
    fn parse(parser: &mut Parser) -> Result<Self> {
        parser.trace("insert");
        parser.expect_keyword(Keyword::INSERT)?;
        parser.expect_keyword(Keyword::INTO)?;

        let table = ObjectReference::parse(parser)?;

        parser.expect_token(&Token::LeftParen)?;
        let columns = parser.parse_comma_separated(Ident::parse)?;
        parser.expect_token(&Token::RightParen)?;

        parser.expect_keyword(Keyword::VALUES)?;
        let values_location = parser.peek_location();
        parser.expect_token(&Token::LeftParen)?;
        let values = parser.parse_comma_separated(Expr::parse)?;
        parser.expect_token(&Token::RightParen)?;

        if columns.len() != values.len() {
            return Err(parser.error(
                values_location,
                format!(
                    "Column count doesn't match value count, {} columns and {} values",
                    columns.len(),
                    values.len()
                ),
                ErrorCode::InvalidArguments,
                None,
            ));
        }

        Ok(Insert {
            table,
            columns,
            values,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Literal;
    use crate::ast::testutil::{parse_ast, parse_ast_with_context};
    use crate::location::Location;

    #[test]
    fn basic() {
        let got: Insert = parse_ast("insert into t1 (c1, c2) values (1, 'a')").unwrap();
        let expected = Insert {
            table: ObjectReference::from_strings(["t1"]),
            columns: vec![Ident::new_unquoted("c1"), Ident::new_unquoted("c2")],
            values: vec![
                Expr::Literal(Literal::Number("1".to_string())),
                Expr::Literal(Literal::SingleQuotedString("a".to_string())),
            ],
        };
        assert_eq!(expected, got);
    }

    #[test]
    fn bind_markers_in_order() {
        let (got, ctx) = parse_ast_with_context::<Insert>("INSERT INTO t(k,v) VALUES (?,?)");
        got.unwrap();

        let positions: Vec<_> = ctx.bind_variables().iter().map(|v| v.pos).collect();
        assert_eq!(vec![27, 29], positions);
    }

    #[test]
    fn count_mismatch() {
        let err = parse_ast::<Insert>("insert into t (a, b) values (1)").unwrap_err();
        assert_eq!(ErrorCode::InvalidArguments, err.code());
        assert_eq!(Location::new(1, 29), err.location());
    }

    #[test]
    fn columns_required() {
        let err = parse_ast::<Insert>("insert into t values (1)").unwrap_err();
        assert_eq!(ErrorCode::SyntaxError, err.code());
    }
}
