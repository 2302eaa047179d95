use std::fmt;

use super::{AstParseable, BindVar, Ident};
use crate::errors::Result;
use crate::keywords::Keyword;
use crate::parser::Parser;
use crate::tokens::Token;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOperator {
    /// Equal, e.g. `a = b`
    Eq,
    /// Not equal, e.g. `a != b`
    NotEq,
    /// Less than, e.g. `a < b`
    Lt,
    /// Less equal, e.g. `a <= b`
    LtEq,
    /// Greater than, e.g. `a > b`
    Gt,
    /// Greater equal, e.g. `a >= b`
    GtEq,
    /// And, e.g. `a AND b`
    And,
}

impl fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Eq => "=",
            Self::NotEq => "!=",
            Self::Lt => "<",
            Self::LtEq => "<=",
            Self::Gt => ">",
            Self::GtEq => ">=",
            Self::And => "AND",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Literal {
    /// Unparsed number literal.
    Number(String),
    /// String literal.
    SingleQuotedString(String),
    /// Boolean literal.
    Boolean(bool),
    /// Null literal
    Null,
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::SingleQuotedString(s) => write!(f, "'{}'", s.replace('\'', "''")),
            Self::Boolean(b) => write!(f, "{b}"),
            Self::Null => write!(f, "NULL"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Expr {
    /// Column identifier.
    Ident(Ident),
    /// An expression literal.
    Literal(Literal),
    /// A bind marker, `?` or `:name`.
    Placeholder(BindVar),
    /// A binary expression.
    BinaryExpr {
        left: Box<Expr>,
        op: BinaryOperator,
        right: Box<Expr>,
    },
    /// `<expr> IN (<expr>, ...)`
    InList { expr: Box<Expr>, list: Vec<Expr> },
}

impl AstParseable for Expr {
    fn parse(parser: &mut Parser) -> Result<Self> {
        Self::parse_subexpr(parser, 0)
    }
}

impl Expr {
    const PREC_AND: u8 = 10;
    const PREC_COMPARISON: u8 = 20;

    /// Split a chain of ANDs into its conjuncts, left to right.
    pub fn conjuncts(&self) -> Vec<&Expr> {
        match self {
            Expr::BinaryExpr {
                left,
                op: BinaryOperator::And,
                right,
            } => {
                let mut out = left.conjuncts();
                out.extend(right.conjuncts());
                out
            }
            other => vec![other],
        }
    }

    fn parse_subexpr(parser: &mut Parser, precedence: u8) -> Result<Self> {
        let mut expr = Expr::parse_prefix(parser)?;

        loop {
            let next_precedence = Self::get_infix_precedence(parser);
            if precedence >= next_precedence {
                break;
            }

            expr = Self::parse_infix(parser, expr, next_precedence)?;
        }

        Ok(expr)
    }

    fn parse_prefix(parser: &mut Parser) -> Result<Self> {
        let tok = match parser.next() {
            Some(tok) => tok.clone(),
            None => return Err(parser.end_of_statement("an expression")),
        };

        let expr = match &tok.token {
            Token::Word(w) => match w.keyword {
                Some(Keyword::TRUE) => Expr::Literal(Literal::Boolean(true)),
                Some(Keyword::FALSE) => Expr::Literal(Literal::Boolean(false)),
                Some(Keyword::NULL) => Expr::Literal(Literal::Null),
                Some(_) => return Err(parser.unexpected(&tok, "an expression")),
                None => Expr::Ident(Ident {
                    value: w.value.clone(),
                    quoted: w.quote.is_some(),
                }),
            },
            Token::SingleQuotedString(s) => Expr::Literal(Literal::SingleQuotedString(s.clone())),
            Token::Number(n) => Expr::Literal(Literal::Number(n.clone())),
            Token::Minus => {
                // Only numeric literals can be negated.
                let next = match parser.next() {
                    Some(next) => next.clone(),
                    None => return Err(parser.end_of_statement("a number")),
                };
                match &next.token {
                    Token::Number(n) => Expr::Literal(Literal::Number(format!("-{n}"))),
                    _ => return Err(parser.unexpected(&next, "a number")),
                }
            }
            Token::Question => {
                let var = BindVar {
                    pos: tok.pos,
                    location: tok.location,
                    name: None,
                };
                parser.add_bind_variable(var.clone());
                Expr::Placeholder(var)
            }
            Token::NamedMarker(name) => {
                let var = BindVar {
                    pos: tok.pos,
                    location: tok.location,
                    name: Some(name.clone()),
                };
                parser.add_bind_variable(var.clone());
                Expr::Placeholder(var)
            }
            Token::LeftParen => {
                let expr = Expr::parse(parser)?;
                parser.expect_token(&Token::RightParen)?;
                expr
            }
            _ => return Err(parser.unexpected(&tok, "an expression")),
        };

        Ok(expr)
    }

    fn parse_infix(parser: &mut Parser, prefix: Expr, precedence: u8) -> Result<Self> {
        let tok = match parser.next() {
            Some(tok) => tok.clone(),
            None => return Err(parser.end_of_statement("an operator")),
        };

        let op = match &tok.token {
            Token::Eq => BinaryOperator::Eq,
            Token::Neq => BinaryOperator::NotEq,
            Token::Lt => BinaryOperator::Lt,
            Token::LtEq => BinaryOperator::LtEq,
            Token::Gt => BinaryOperator::Gt,
            Token::GtEq => BinaryOperator::GtEq,
            Token::Word(w) if w.keyword == Some(Keyword::AND) => BinaryOperator::And,
            Token::Word(w) if w.keyword == Some(Keyword::IN) => {
                parser.expect_token(&Token::LeftParen)?;
                let list = parser.parse_comma_separated(Expr::parse)?;
                parser.expect_token(&Token::RightParen)?;
                return Ok(Expr::InList {
                    expr: Box::new(prefix),
                    list,
                });
            }
            _ => return Err(parser.unexpected(&tok, "an operator")),
        };

        Ok(Expr::BinaryExpr {
            left: Box::new(prefix),
            op,
            right: Box::new(Expr::parse_subexpr(parser, precedence)?),
        })
    }

    /// Get the precedence of the next infix operator, 0 if the next token
    /// doesn't continue the expression.
    fn get_infix_precedence(parser: &mut Parser) -> u8 {
        let tok = match parser.peek() {
            Some(tok) => tok,
            None => return 0,
        };

        match &tok.token {
            Token::Eq | Token::Neq | Token::Lt | Token::LtEq | Token::Gt | Token::GtEq => {
                Self::PREC_COMPARISON
            }
            Token::Word(w) => match w.keyword {
                Some(Keyword::AND) => Self::PREC_AND,
                Some(Keyword::IN) => Self::PREC_COMPARISON,
                _ => 0,
            },
            _ => 0,
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ident(ident) => write!(f, "{ident}"),
            Self::Literal(lit) => write!(f, "{lit}"),
            Self::Placeholder(var) => write!(f, "{var}"),
            Self::BinaryExpr { left, op, right } => write!(f, "{left} {op} {right}"),
            Self::InList { expr, list } => {
                let items: Vec<_> = list.iter().map(|e| e.to_string()).collect();
                write!(f, "{expr} IN ({})", items.join(", "))
            }
        }
    }
}
