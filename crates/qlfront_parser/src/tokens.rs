use std::fmt;

use tracing::trace;

use crate::context::ParseContext;
use crate::errors::{ErrorCode, Result};
use crate::keywords::{Keyword, keyword_from_str};
use crate::location::Location;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Word(Word),
    SingleQuotedString(String),
    Number(String),
    /// Positional bind marker, `?`
    Question,
    /// Named bind marker, `:name`
    NamedMarker(String),
    /// `=`
    Eq,
    /// `!=` or `<>`
    Neq,
    /// `<`
    Lt,
    /// `<=`
    LtEq,
    /// `>`
    Gt,
    /// `>=`
    GtEq,
    Comma,
    LeftParen,
    RightParen,
    /// `*`
    Mul,
    Plus,
    Minus,
    Period,
    SemiColon,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Word(w) => write!(f, "{w}"),
            Self::SingleQuotedString(s) => write!(f, "'{s}'"),
            Self::Number(n) => write!(f, "{n}"),
            Self::Question => write!(f, "?"),
            Self::NamedMarker(name) => write!(f, ":{name}"),
            Self::Eq => write!(f, "="),
            Self::Neq => write!(f, "!="),
            Self::Lt => write!(f, "<"),
            Self::LtEq => write!(f, "<="),
            Self::Gt => write!(f, ">"),
            Self::GtEq => write!(f, ">="),
            Self::Comma => write!(f, ","),
            Self::LeftParen => write!(f, "("),
            Self::RightParen => write!(f, ")"),
            Self::Mul => write!(f, "*"),
            Self::Plus => write!(f, "+"),
            Self::Minus => write!(f, "-"),
            Self::Period => write!(f, "."),
            Self::SemiColon => write!(f, ";"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Word {
    pub value: String,
    /// Quote used for the word, if any.
    pub quote: Option<char>,
    /// Keyword this word represents. Always None for quoted words.
    pub keyword: Option<Keyword>,
}

impl fmt::Display for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.quote {
            Some(q) => write!(f, "{q}{}{q}", self.value),
            None => write!(f, "{}", self.value),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenWithLocation {
    pub token: Token,
    /// Byte offset of the token in the statement.
    pub pos: usize,
    pub location: Location,
}

impl TokenWithLocation {
    pub fn is_keyword(&self, other: Keyword) -> bool {
        match &self.token {
            Token::Word(w) => w.keyword == Some(other),
            _ => false,
        }
    }
}

/// Tokenizer pulling statement text from a parse context in bounded reads.
///
/// Text is read lazily, a token may span any number of reads. State between
/// reads is the unconsumed tail of the last read plus the current position.
#[derive(Debug)]
pub struct Tokenizer<'a> {
    ctx: &'a mut ParseContext,
    /// Bytes read from the context that haven't been consumed.
    buf: Vec<u8>,
    /// Index into `buf` of the next byte.
    idx: usize,
    /// Statement offset of `buf[0]`.
    buf_offset: usize,
    /// Context has no more bytes.
    exhausted: bool,
    line: u32,
    col: u32,
}

impl<'a> Tokenizer<'a> {
    pub fn new(ctx: &'a mut ParseContext) -> Self {
        Tokenizer {
            ctx,
            buf: Vec::new(),
            idx: 0,
            buf_offset: 0,
            exhausted: false,
            line: 1,
            col: 1,
        }
    }

    pub fn tokenize(mut self) -> Result<Vec<TokenWithLocation>> {
        let mut toks = Vec::new();
        while let Some(tok) = self.next_token()? {
            toks.push(tok);
        }
        Ok(toks)
    }

    /// Produce the next token, or None at end of input.
    pub fn next_token(&mut self) -> Result<Option<TokenWithLocation>> {
        self.skip_whitespace_and_comments()?;
        self.compact();

        let pos = self.pos();
        let location = Location::new(self.line, self.col);
        let b = match self.next_byte() {
            Some(b) => b,
            None => return Ok(None),
        };

        let token = match b {
            b'\'' => Token::SingleQuotedString(self.quoted(b'\'', location)?),
            b'"' => {
                let value = self.quoted(b'"', location)?;
                Token::Word(Word {
                    value,
                    quote: Some('"'),
                    keyword: None,
                })
            }
            b'?' => Token::Question,
            b':' => {
                let name = self.take_while(is_ident_byte);
                if name.is_empty() {
                    return Err(self.ctx.error(
                        location,
                        "Expected a name after ':'",
                        ErrorCode::LexicalError,
                        Some(":"),
                    ));
                }
                Token::NamedMarker(self.utf8(name, location)?)
            }
            b'=' => Token::Eq,
            b'!' => {
                if self.peek() == Some(b'=') {
                    self.next_byte();
                    Token::Neq
                } else {
                    return Err(self.ctx.error(
                        location,
                        "Unexpected character",
                        ErrorCode::LexicalError,
                        Some("!"),
                    ));
                }
            }
            b'<' => match self.peek() {
                Some(b'=') => {
                    self.next_byte();
                    Token::LtEq
                }
                Some(b'>') => {
                    self.next_byte();
                    Token::Neq
                }
                _ => Token::Lt,
            },
            b'>' => {
                if self.peek() == Some(b'=') {
                    self.next_byte();
                    Token::GtEq
                } else {
                    Token::Gt
                }
            }
            b',' => Token::Comma,
            b'(' => Token::LeftParen,
            b')' => Token::RightParen,
            b'*' => Token::Mul,
            b'+' => Token::Plus,
            b'-' => Token::Minus,
            b';' => Token::SemiColon,
            b'.' => {
                if self.peek().is_some_and(|b| b.is_ascii_digit()) {
                    let mut num = vec![b'.'];
                    num.extend(self.take_while(|b| b.is_ascii_digit()));
                    Token::Number(self.utf8(num, location)?)
                } else {
                    Token::Period
                }
            }
            b if b.is_ascii_digit() => {
                let mut num = vec![b];
                num.extend(self.take_while(|b| b.is_ascii_digit()));
                if self.peek() == Some(b'.') {
                    self.next_byte();
                    num.push(b'.');
                    num.extend(self.take_while(|b| b.is_ascii_digit()));
                }
                Token::Number(self.utf8(num, location)?)
            }
            b if is_ident_start(b) => {
                let mut word = vec![b];
                word.extend(self.take_while(is_ident_byte));
                let value = self.utf8(word, location)?;
                let keyword = keyword_from_str(&value);
                Token::Word(Word {
                    value,
                    quote: None,
                    keyword,
                })
            }
            other => {
                let token = (other as char).to_string();
                return Err(self.ctx.error(
                    location,
                    "Unexpected character",
                    ErrorCode::LexicalError,
                    Some(&token),
                ));
            }
        };

        if self.ctx.trace_scanning() {
            trace!(%location, %token, "scanned token");
        }

        Ok(Some(TokenWithLocation {
            token,
            pos,
            location,
        }))
    }

    /// Statement offset of the next byte.
    fn pos(&self) -> usize {
        self.buf_offset + self.idx
    }

    /// Drop consumed bytes from the buffer.
    fn compact(&mut self) {
        if self.idx > 0 {
            self.buf.drain(..self.idx);
            self.buf_offset += self.idx;
            self.idx = 0;
        }
    }

    /// Make sure at least `n` unconsumed bytes are buffered if the statement
    /// has them.
    fn fill(&mut self, n: usize) {
        while !self.exhausted && self.buf.len() - self.idx < n {
            let read_size = self.ctx.read_size();
            let chunk = self.ctx.read(read_size);
            if chunk.is_empty() {
                self.exhausted = true;
            } else {
                self.buf.extend_from_slice(chunk);
            }
        }
    }

    fn peek(&mut self) -> Option<u8> {
        self.peek_nth(0)
    }

    fn peek_nth(&mut self, n: usize) -> Option<u8> {
        self.fill(n + 1);
        self.buf.get(self.idx + n).copied()
    }

    fn next_byte(&mut self) -> Option<u8> {
        let b = self.peek()?;
        self.idx += 1;
        if b == b'\n' {
            self.line += 1;
            self.col = 1;
        } else if b & 0xC0 != 0x80 {
            // Count characters, not utf8 continuation bytes.
            self.col += 1;
        }
        Some(b)
    }

    fn take_while(&mut self, pred: impl Fn(u8) -> bool) -> Vec<u8> {
        let mut out = Vec::new();
        while let Some(b) = self.peek() {
            if !pred(b) {
                break;
            }
            out.push(b);
            self.next_byte();
        }
        out
    }

    fn skip_whitespace_and_comments(&mut self) -> Result<()> {
        loop {
            match self.peek() {
                Some(b) if b.is_ascii_whitespace() => {
                    self.next_byte();
                }
                Some(b'-') if self.peek_nth(1) == Some(b'-') => {
                    while let Some(b) = self.next_byte() {
                        if b == b'\n' {
                            break;
                        }
                    }
                }
                Some(b'/') if self.peek_nth(1) == Some(b'*') => {
                    let location = Location::new(self.line, self.col);
                    self.next_byte();
                    self.next_byte();
                    loop {
                        match self.next_byte() {
                            Some(b'*') if self.peek() == Some(b'/') => {
                                self.next_byte();
                                break;
                            }
                            Some(_) => (),
                            None => {
                                return Err(self.ctx.error(
                                    location,
                                    "Unterminated comment",
                                    ErrorCode::LexicalError,
                                    Some("/*"),
                                ));
                            }
                        }
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    /// Read the body of a quoted string or identifier. The opening quote was
    /// already consumed. A doubled quote is an escaped quote.
    fn quoted(&mut self, quote: u8, location: Location) -> Result<String> {
        let mut out = Vec::new();
        loop {
            match self.next_byte() {
                Some(b) if b == quote => {
                    if self.peek() == Some(quote) {
                        self.next_byte();
                        out.push(quote);
                    } else {
                        return self.utf8(out, location);
                    }
                }
                Some(b) => out.push(b),
                None => {
                    let token = (quote as char).to_string();
                    return Err(self.ctx.error(
                        location,
                        "Unterminated quoted string",
                        ErrorCode::LexicalError,
                        Some(&token),
                    ));
                }
            }
        }
    }

    fn utf8(&mut self, bytes: Vec<u8>, location: Location) -> Result<String> {
        String::from_utf8(bytes).map_err(|_| {
            self.ctx
                .error(location, "Invalid utf8", ErrorCode::LexicalError, None)
        })
    }
}

fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_' || b >= 0x80
}

fn is_ident_byte(b: u8) -> bool {
    is_ident_start(b) || b.is_ascii_digit()
}
