use std::fmt::Display;

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;
use tracing::trace;

#[derive(Error, Debug, Diagnostic)]
#[error("Unexpected character '{token}'")]
#[diagnostic(
    code(difgraph::lex),
    help("a formula may only contain numbers, names, `+ - * / ^`, parentheses and commas")
)]
pub struct LexError {
    #[source_code]
    src: NamedSource<String>,

    #[label("this character")]
    bad_bit: SourceSpan,

    pub token: char,
}

impl LexError {
    /// Byte offset of the offending character.
    pub fn position(&self) -> usize {
        self.bad_bit.offset()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Token<'de> {
    pub kind: TokenKind,
    pub literal: &'de str,
    pub offset: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TokenKind {
    LeftParen,
    RightParen,
    Comma,
    Minus,
    Plus,
    Star,
    Slash,
    Caret,
    Ident,
    Number(f64),
    End,
}

impl TokenKind {
    /// Short human description used in parse diagnostics.
    pub fn describe(&self) -> &'static str {
        match self {
            TokenKind::LeftParen => "`(`",
            TokenKind::RightParen => "`)`",
            TokenKind::Comma => "`,`",
            TokenKind::Minus => "`-`",
            TokenKind::Plus => "`+`",
            TokenKind::Star => "`*`",
            TokenKind::Slash => "`/`",
            TokenKind::Caret => "`^`",
            TokenKind::Ident => "a name",
            TokenKind::Number(_) => "a number",
            TokenKind::End => "end of input",
        }
    }
}

impl Display for Token<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let lit = self.literal;
        match self.kind {
            TokenKind::LeftParen => write!(f, "LEFT_PAREN {lit} null"),
            TokenKind::RightParen => write!(f, "RIGHT_PAREN {lit} null"),
            TokenKind::Comma => write!(f, "COMMA {lit} null"),
            TokenKind::Minus => write!(f, "MINUS {lit} null"),
            TokenKind::Plus => write!(f, "PLUS {lit} null"),
            TokenKind::Star => write!(f, "STAR {lit} null"),
            TokenKind::Slash => write!(f, "SLASH {lit} null"),
            TokenKind::Caret => write!(f, "CARET {lit} null"),
            TokenKind::Ident => write!(f, "IDENTIFIER {lit} null"),
            TokenKind::Number(n) => {
                if n == n.trunc() {
                    write!(f, "NUMBER {lit} {n}.0")
                } else {
                    write!(f, "NUMBER {lit} {n}")
                }
            }
            TokenKind::End => write!(f, "END  null"),
        }
    }
}

pub struct Lexer<'de> {
    filename: Option<&'de str>,
    whole: &'de str,
    rest: &'de str,
    pub byte: usize,
    finished: bool,
}

impl<'de> Lexer<'de> {
    pub fn new(filename: Option<&'de str>, input: &'de str) -> Self {
        Lexer {
            filename,
            whole: input,
            rest: input,
            byte: 0,
            finished: false,
        }
    }

    fn error(&self, token: char) -> LexError {
        LexError {
            src: NamedSource::new(self.filename.unwrap_or("<input>"), self.whole.to_string()),
            bad_bit: SourceSpan::from(self.byte - token.len_utf8()..self.byte),
            token,
        }
    }
}

/// Tokenizes a whole formula. The last token is always [`TokenKind::End`].
pub fn tokenize(text: &str) -> Result<Vec<Token<'_>>, LexError> {
    Lexer::new(None, text).collect()
}

impl<'de> Iterator for Lexer<'de> {
    type Item = Result<Token<'de>, LexError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        loop {
            let mut chars = self.rest.chars();
            let Some(c) = chars.next() else {
                self.finished = true;
                trace!(offset = self.byte, "end of input");
                return Some(Ok(Token {
                    kind: TokenKind::End,
                    literal: "",
                    offset: self.byte,
                }));
            };
            let literal = &self.rest[..c.len_utf8()];
            let offset = self.byte;
            let cur = self.rest;
            self.rest = chars.as_str();
            self.byte += c.len_utf8();

            enum Start {
                Ident,
                Number,
            }

            let process = |kind: TokenKind| {
                trace!(literal, offset, "token");
                Some(Ok(Token {
                    kind,
                    literal,
                    offset,
                }))
            };

            let started = match c {
                '(' => return process(TokenKind::LeftParen),
                ')' => return process(TokenKind::RightParen),
                ',' => return process(TokenKind::Comma),
                '-' => return process(TokenKind::Minus),
                '+' => return process(TokenKind::Plus),
                '*' => return process(TokenKind::Star),
                '/' => return process(TokenKind::Slash),
                '^' => return process(TokenKind::Caret),
                'a'..='z' | 'A'..='Z' => Start::Ident,
                '0'..='9' => Start::Number,
                '.' if self.rest.starts_with(|c: char| c.is_ascii_digit()) => Start::Number,
                ' ' | '\r' | '\t' | '\n' => continue, // Skip whitespace
                c => {
                    self.finished = true;
                    return Some(Err(self.error(c)));
                }
            };

            let end = match started {
                Start::Ident => cur
                    .find(|c: char| !c.is_ascii_alphanumeric())
                    .unwrap_or(cur.len()),
                Start::Number => {
                    let integer = cur
                        .find(|c: char| !c.is_ascii_digit())
                        .unwrap_or(cur.len());
                    // a trailing `.` without digits is not part of the number
                    match cur[integer..].strip_prefix('.') {
                        Some(fraction) => {
                            let digits = fraction
                                .find(|c: char| !c.is_ascii_digit())
                                .unwrap_or(fraction.len());
                            if digits > 0 { integer + 1 + digits } else { integer }
                        }
                        None => integer,
                    }
                }
            };

            let literal = &cur[..end];
            let extra_bytes = literal.len() - c.len_utf8();
            self.byte += extra_bytes;
            self.rest = &self.rest[extra_bytes..];

            let kind = match started {
                Start::Ident => TokenKind::Ident,
                Start::Number => match literal.parse() {
                    Ok(n) => TokenKind::Number(n),
                    Err(_) => {
                        self.finished = true;
                        self.byte = offset + c.len_utf8();
                        return Some(Err(self.error(c)));
                    }
                },
            };
            trace!(literal, offset, "token");

            return Some(Ok(Token {
                kind,
                literal,
                offset,
            }));
        }
    }
}
