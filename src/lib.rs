//! Formula pipeline behind the tangent-line grapher: text is lexed and parsed
//! into an [`Expr`], evaluated for the curve, and differentiated, simplified
//! and formatted for the derivative.
//!
//! ```
//! use difgraph::Session;
//!
//! let session = Session::submit("x^2").unwrap();
//! assert_eq!(session.derivative_text(), "2 * x");
//! assert_eq!(session.tangent(2.0).label(), "y = 4.00x + -4.00");
//! ```

use miette::Diagnostic;
use thiserror::Error;

pub mod diff;
pub mod eval;
pub mod format;
pub mod layout;
pub mod lex;
pub mod parse;
pub mod session;
pub mod shell;
pub mod simplify;
pub mod system;

#[cfg(test)]
mod tests;

pub use diff::differentiate;
pub use eval::{Environment, EvalError, evaluate};
pub use lex::{LexError, Lexer, tokenize};
pub use parse::{Expr, ParseError, Parser, parse};
pub use session::Session;
pub use simplify::simplify;

/// Any way a formula submission can be rejected.
#[derive(Error, Debug, Diagnostic)]
pub enum FormulaError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Lex(#[from] LexError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Eval(#[from] EvalError),
}
