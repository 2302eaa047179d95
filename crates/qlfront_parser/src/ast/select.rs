use super::{AstParseable, Expr, Ident, Literal, ObjectReference};
use crate::errors::{ErrorCode, Result};
use crate::keywords::Keyword;
use crate::parser::Parser;
use crate::tokens::Token;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Projection {
    /// `SELECT *`
    Wildcard,
    /// `SELECT a, b, ...`
    Columns(Vec<Ident>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Select {
    pub projection: Projection,
    pub from: ObjectReference,
    pub selection: Option<Expr>,
    /// Either a number literal or a bind marker.
    pub limit: Option<Expr>,
    pub allow_filtering: bool,
}

impl AstParseable for Select {
    fn parse(parser: &mut Parser) -> Result<Self> {
        parser.trace("select");
        parser.expect_keyword(Keyword::SELECT)?;

        let projection = if parser.consume_token(&Token::Mul) {
            Projection::Wildcard
        } else {
            Projection::Columns(parser.parse_comma_separated(Ident::parse)?)
        };

        parser.expect_keyword(Keyword::FROM)?;
        let from = ObjectReference::parse(parser)?;

        let selection = if parser.parse_keyword(Keyword::WHERE) {
            Some(Expr::parse(parser)?)
        } else {
            None
        };

        let limit = if parser.parse_keyword(Keyword::LIMIT) {
            let location = parser.peek_location();
            let expr = Expr::parse(parser)?;
            match &expr {
                Expr::Literal(Literal::Number(n)) if n.parse::<u64>().is_ok() => (),
                Expr::Placeholder(_) => (),
                other => {
                    return Err(parser.error(
                        location,
                        "LIMIT must be a non-negative integer or a bind marker",
                        ErrorCode::InvalidArguments,
                        Some(&other.to_string()),
                    ));
                }
            }
            Some(expr)
        } else {
            None
        };

        let allow_filtering = match parser.peek() {
            Some(tok) if tok.is_keyword(Keyword::ALLOW) => {
                let location = tok.location;
                parser.expect_keyword(Keyword::ALLOW)?;
                parser.expect_keyword(Keyword::FILTERING)?;
                parser.warn(
                    location,
                    "ALLOW FILTERING has no effect on system tables",
                    ErrorCode::FeatureIgnored,
                );
                true
            }
            _ => false,
        };

        Ok(Select {
            projection,
            from,
            selection,
            limit,
            allow_filtering,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::testutil::{parse_ast, parse_ast_with_context};
    use crate::ast::{BinaryOperator, BindVar};
    use crate::location::Location;

    #[test]
    fn wildcard() {
        let got: Select = parse_ast("select * from system_auth.roles").unwrap();
        let expected = Select {
            projection: Projection::Wildcard,
            from: ObjectReference::from_strings(["system_auth", "roles"]),
            selection: None,
            limit: None,
            allow_filtering: false,
        };
        assert_eq!(expected, got);
    }

    #[test]
    fn columns_where_limit() {
        let got: Select = parse_ast("SELECT role, resource FROM t WHERE role = ? LIMIT 10").unwrap();
        let expected = Select {
            projection: Projection::Columns(vec![
                Ident::new_unquoted("role"),
                Ident::new_unquoted("resource"),
            ]),
            from: ObjectReference::from_strings(["t"]),
            selection: Some(Expr::BinaryExpr {
                left: Box::new(Expr::Ident(Ident::new_unquoted("role"))),
                op: BinaryOperator::Eq,
                right: Box::new(Expr::Placeholder(BindVar {
                    pos: 42,
                    location: Location::new(1, 43),
                    name: None,
                })),
            }),
            limit: Some(Expr::Literal(Literal::Number("10".to_string()))),
            allow_filtering: false,
        };
        assert_eq!(expected, got);
    }

    #[test]
    fn limit_bind_marker() {
        let got: Select = parse_ast("select * from t limit :n").unwrap();
        assert!(matches!(got.limit, Some(Expr::Placeholder(_))));
    }

    #[test]
    fn invalid_limit() {
        let err = parse_ast::<Select>("select * from t limit 'a'").unwrap_err();
        assert_eq!(ErrorCode::InvalidArguments, err.code());
        assert_eq!(Location::new(1, 23), err.location());

        let err = parse_ast::<Select>("select * from t limit -1").unwrap_err();
        assert_eq!(ErrorCode::InvalidArguments, err.code());
    }

    #[test]
    fn allow_filtering_warns() {
        let (got, ctx) =
            parse_ast_with_context::<Select>("select * from t where a = 1 allow filtering");
        assert!(got.unwrap().allow_filtering);

        let warnings: Vec<_> = ctx.process().warnings().collect();
        assert_eq!(1, warnings.len());
        assert_eq!(ErrorCode::FeatureIgnored, warnings[0].code);
        assert_eq!(Location::new(1, 29), warnings[0].location);
        assert!(!ctx.has_errors());
    }

    #[test]
    fn missing_from() {
        let err = parse_ast::<Select>("select a b").unwrap_err();
        assert_eq!(ErrorCode::SyntaxError, err.code());
        assert_eq!(Location::new(1, 10), err.location());
    }
}
