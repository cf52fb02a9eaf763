use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

use crate::{
    FormulaError, Lexer,
    lex::{Token, TokenKind},
    system::{Call, Function},
};

/// Parenthesis and prefix-minus nesting accepted before giving up.
pub const MAX_DEPTH: usize = 256;

#[derive(Error, Debug, Diagnostic)]
pub enum ParseError {
    #[error("expected {expected}, found {found}")]
    #[diagnostic(code(difgraph::parse::unexpected_token))]
    UnexpectedToken {
        expected: &'static str,
        found: String,
        #[source_code]
        src: NamedSource<String>,
        #[label("here")]
        span: SourceSpan,
    },

    #[error("unknown function `{name}`")]
    #[diagnostic(
        code(difgraph::parse::unknown_function),
        help("available functions: {known}")
    )]
    UnknownFunction {
        name: String,
        known: String,
        #[source_code]
        src: NamedSource<String>,
        #[label("not a known function")]
        span: SourceSpan,
    },

    #[error("`{name}` takes {expected} argument(s), found {found}")]
    #[diagnostic(code(difgraph::parse::arity))]
    Arity {
        name: &'static str,
        expected: String,
        found: usize,
        #[source_code]
        src: NamedSource<String>,
        #[label("this call")]
        span: SourceSpan,
    },

    #[error("formula nests deeper than {limit} levels")]
    #[diagnostic(code(difgraph::parse::too_deep))]
    TooDeep {
        limit: usize,
        #[source_code]
        src: NamedSource<String>,
        #[label("here")]
        span: SourceSpan,
    },
}

impl ParseError {
    /// Byte offset the error points at. End-of-input errors point at the
    /// length of the formula.
    pub fn position(&self) -> usize {
        match self {
            ParseError::UnexpectedToken { span, .. }
            | ParseError::UnknownFunction { span, .. }
            | ParseError::Arity { span, .. }
            | ParseError::TooDeep { span, .. } => span.offset(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

impl UnaryOp {
    pub fn apply(self, operand: f64) -> f64 {
        match self {
            UnaryOp::Neg => -operand,
        }
    }
}

impl BinaryOp {
    pub fn apply(self, lhs: f64, rhs: f64) -> f64 {
        match self {
            BinaryOp::Add => lhs + rhs,
            BinaryOp::Sub => lhs - rhs,
            BinaryOp::Mul => lhs * rhs,
            BinaryOp::Div => lhs / rhs,
            BinaryOp::Pow => lhs.powf(rhs),
        }
    }
}

/// A parsed formula. Trees own their children and are never shared.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Constant(f64),
    Variable(String),
    Unary(UnaryOp, Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
    Call(Call),
}

impl Expr {
    pub fn variable(name: impl Into<String>) -> Expr {
        Expr::Variable(name.into())
    }

    pub fn neg(operand: Expr) -> Expr {
        Expr::Unary(UnaryOp::Neg, Box::new(operand))
    }

    pub fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Expr {
        Expr::Binary(op, Box::new(lhs), Box::new(rhs))
    }

    pub fn add(lhs: Expr, rhs: Expr) -> Expr {
        Expr::binary(BinaryOp::Add, lhs, rhs)
    }

    pub fn sub(lhs: Expr, rhs: Expr) -> Expr {
        Expr::binary(BinaryOp::Sub, lhs, rhs)
    }

    pub fn mul(lhs: Expr, rhs: Expr) -> Expr {
        Expr::binary(BinaryOp::Mul, lhs, rhs)
    }

    pub fn div(lhs: Expr, rhs: Expr) -> Expr {
        Expr::binary(BinaryOp::Div, lhs, rhs)
    }

    pub fn pow(lhs: Expr, rhs: Expr) -> Expr {
        Expr::binary(BinaryOp::Pow, lhs, rhs)
    }

    pub fn call(function: Function, arg: Expr) -> Expr {
        Expr::Call(Call::unary(function, arg))
    }

    /// Whether `variable` occurs anywhere in the tree.
    pub fn depends_on(&self, variable: &str) -> bool {
        match self {
            Expr::Constant(_) => false,
            Expr::Variable(name) => name == variable,
            Expr::Unary(_, operand) => operand.depends_on(variable),
            Expr::Binary(_, lhs, rhs) => lhs.depends_on(variable) || rhs.depends_on(variable),
            Expr::Call(call) => call.args().iter().any(|arg| arg.depends_on(variable)),
        }
    }
}

/// Parses a formula into an [`Expr`].
pub fn parse(text: &str) -> Result<Expr, FormulaError> {
    Ok(Parser::new(None, text)?.parse()?)
}

pub struct Parser<'de> {
    filename: Option<&'de str>,
    pub whole: &'de str,
    tokens: Vec<Token<'de>>,
    cursor: usize,
    depth: usize,
}

impl<'de> Parser<'de> {
    pub fn new(filename: Option<&'de str>, whole: &'de str) -> Result<Self, crate::lex::LexError> {
        let tokens = Lexer::new(filename, whole).collect::<Result<Vec<_>, _>>()?;
        Ok(Parser {
            filename,
            whole,
            tokens,
            cursor: 0,
            depth: 0,
        })
    }

    /// Builds a parser over tokens produced by [`crate::lex::tokenize`] for
    /// `whole`.
    pub fn from_tokens(whole: &'de str, tokens: Vec<Token<'de>>) -> Self {
        Parser {
            filename: None,
            whole,
            tokens,
            cursor: 0,
            depth: 0,
        }
    }

    pub fn parse(mut self) -> Result<Expr, ParseError> {
        let expr = self.parse_within(0)?;
        self.expect(TokenKind::End, "an operator or end of input")?;
        Ok(expr)
    }

    pub fn parse_within(&mut self, min_bp: u8) -> Result<Expr, ParseError> {
        self.parse_sized(min_bp).map(|(expr, _)| expr)
    }

    /// Parses like [`Parser::parse_within`] and also returns the height of
    /// the tree, which may not exceed [`MAX_DEPTH`].
    fn parse_sized(&mut self, min_bp: u8) -> Result<(Expr, usize), ParseError> {
        let lhs = self.advance();
        if self.depth >= MAX_DEPTH {
            return Err(self.too_deep(lhs));
        }
        self.depth += 1;
        let result = self.parse_nested(lhs, min_bp);
        self.depth -= 1;
        result
    }

    fn parse_nested(&mut self, lhs: Token<'de>, min_bp: u8) -> Result<(Expr, usize), ParseError> {
        let start = lhs;
        let (mut lhs, mut height) = match lhs {
            Token {
                kind: TokenKind::Number(n),
                ..
            } => (Expr::Constant(n), 1),
            Token {
                kind: TokenKind::Ident,
                ..
            } if self.peek().kind == TokenKind::LeftParen => self.parse_call(lhs)?,
            Token {
                kind: TokenKind::Ident,
                literal,
                ..
            } => (Expr::Variable(literal.to_string()), 1),
            Token {
                kind: TokenKind::LeftParen,
                ..
            } => {
                let inner = self.parse_sized(0)?;
                self.expect(TokenKind::RightParen, "`)`")?;
                inner
            }
            Token {
                kind: TokenKind::Minus,
                ..
            } => {
                let ((), r_bp) = prefix_binding_power(UnaryOp::Neg);
                let (rhs, rhs_height) = self.parse_sized(r_bp)?;
                (Expr::neg(rhs), rhs_height + 1)
            }
            token => return Err(self.unexpected(token, "an expression")),
        };
        if height > MAX_DEPTH {
            return Err(self.too_deep(start));
        }

        loop {
            let op = match self.peek().kind {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Sub,
                TokenKind::Star => BinaryOp::Mul,
                TokenKind::Slash => BinaryOp::Div,
                TokenKind::Caret => BinaryOp::Pow,
                _ => break,
            };
            let (l_bp, r_bp) = infix_binding_power(op);
            if l_bp < min_bp {
                break;
            }
            let operator = self.advance();
            let (rhs, rhs_height) = self.parse_sized(r_bp)?;
            // left-associative chains grow here without recursing
            height = height.max(rhs_height) + 1;
            if height > MAX_DEPTH {
                return Err(self.too_deep(operator));
            }
            lhs = Expr::binary(op, lhs, rhs);
        }

        Ok((lhs, height))
    }

    fn parse_call(&mut self, name: Token<'de>) -> Result<(Expr, usize), ParseError> {
        let Some(function) = Function::lookup(name.literal) else {
            return Err(ParseError::UnknownFunction {
                name: name.literal.to_string(),
                known: Function::names().join(", "),
                src: self.source(),
                span: span_of(&name),
            });
        };
        self.expect(TokenKind::LeftParen, "`(`")?;

        let (first, mut height) = self.parse_sized(0)?;
        let mut args = vec![first];
        while self.peek().kind == TokenKind::Comma {
            self.advance();
            let (arg, arg_height) = self.parse_sized(0)?;
            height = height.max(arg_height);
            args.push(arg);
        }
        let close = self.expect(TokenKind::RightParen, "`,` or `)`")?;

        Call::new(function, args)
            .map(|call| (Expr::Call(call), height + 1))
            .map_err(|e| ParseError::Arity {
                name: e.name,
                expected: e.expected,
                found: e.found,
                src: self.source(),
                span: SourceSpan::from(name.offset..close.offset + close.literal.len()),
            })
    }

    fn too_deep(&self, at: Token<'de>) -> ParseError {
        ParseError::TooDeep {
            limit: MAX_DEPTH,
            src: self.source(),
            span: span_of(&at),
        }
    }

    fn peek(&self) -> Token<'de> {
        self.tokens.get(self.cursor).copied().unwrap_or(Token {
            kind: TokenKind::End,
            literal: "",
            offset: self.whole.len(),
        })
    }

    fn advance(&mut self) -> Token<'de> {
        let token = self.peek();
        if self.cursor < self.tokens.len() {
            self.cursor += 1;
        }
        token
    }

    fn expect(&mut self, expected: TokenKind, error: &'static str) -> Result<Token<'de>, ParseError> {
        let token = self.advance();
        if token.kind == expected {
            Ok(token)
        } else {
            Err(self.unexpected(token, error))
        }
    }

    fn unexpected(&self, token: Token<'de>, expected: &'static str) -> ParseError {
        let found = match token.kind {
            TokenKind::End => token.kind.describe().to_string(),
            _ => format!("`{}`", token.literal),
        };
        ParseError::UnexpectedToken {
            expected,
            found,
            src: self.source(),
            span: span_of(&token),
        }
    }

    fn source(&self) -> NamedSource<String> {
        NamedSource::new(self.filename.unwrap_or("<input>"), self.whole.to_string())
    }
}

fn span_of(token: &Token<'_>) -> SourceSpan {
    SourceSpan::from(token.offset..token.offset + token.literal.len())
}

fn prefix_binding_power(op: UnaryOp) -> ((), u8) {
    match op {
        UnaryOp::Neg => ((), 5),
    }
}

fn infix_binding_power(op: BinaryOp) -> (u8, u8) {
    match op {
        BinaryOp::Add | BinaryOp::Sub => (1, 2),
        BinaryOp::Mul | BinaryOp::Div => (3, 4),
        // right associative, and binds tighter than prefix minus
        BinaryOp::Pow => (8, 7),
    }
}
