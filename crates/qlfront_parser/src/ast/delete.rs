use super::{AstParseable, Expr, ObjectReference};
use crate::errors::Result;
use crate::keywords::Keyword;
use crate::parser::Parser;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delete {
    pub table: ObjectReference,
    pub selection: Option<Expr>,
}

impl AstParseable for Delete {
    fn parse(parser: &mut Parser) -> Result<Self> {
        parser.trace("delete");
        parser.expect_keyword(Keyword::DELETE)?;
        parser.expect_keyword(Keyword::FROM)?;
        let table = ObjectReference::parse(parser)?;

        let selection = if parser.parse_keyword(Keyword::WHERE) {
            Some(Expr::parse(parser)?)
        } else {
            None
        };

        Ok(Delete { table, selection })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::testutil::parse_ast;

    #[test]
    fn with_where() {
        let got: Delete = parse_ast("DELETE FROM ks.t WHERE k IN (1, 2)").unwrap();
        assert_eq!(ObjectReference::from_strings(["ks", "t"]), got.table);
        assert_eq!("k IN (1, 2)", got.selection.unwrap().to_string());
    }

    #[test]
    fn without_where() {
        let got: Delete = parse_ast("delete from t").unwrap();
        assert_eq!(None, got.selection);
    }
}
