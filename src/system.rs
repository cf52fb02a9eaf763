//! The fixed registry of functions a formula may call.
//!
//! Calls are resolved against this registry while parsing, so an [`Expr`]
//! can never hold an unknown function.

use std::ops::RangeInclusive;

use miette::Diagnostic;
use thiserror::Error;

use crate::parse::Expr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Function {
    Sin,
    Cos,
    Tan,
    Exp,
    /// Natural logarithm, or `log(u, base)` with two arguments.
    Log,
    Sqrt,
    Abs,
}

impl Function {
    pub const ALL: [Function; 7] = [
        Function::Sin,
        Function::Cos,
        Function::Tan,
        Function::Exp,
        Function::Log,
        Function::Sqrt,
        Function::Abs,
    ];

    pub fn lookup(name: &str) -> Option<Function> {
        Function::ALL.into_iter().find(|f| f.name() == name)
    }

    pub fn name(self) -> &'static str {
        match self {
            Function::Sin => "sin",
            Function::Cos => "cos",
            Function::Tan => "tan",
            Function::Exp => "exp",
            Function::Log => "log",
            Function::Sqrt => "sqrt",
            Function::Abs => "abs",
        }
    }

    pub fn names() -> Vec<&'static str> {
        Function::ALL.iter().map(|f| f.name()).collect()
    }

    pub fn arity(self) -> RangeInclusive<usize> {
        match self {
            Function::Log => 1..=2,
            _ => 1..=1,
        }
    }

    /// Applies the function with IEEE-754 semantics: domain errors give NaN
    /// or an infinity, never a failure.
    pub fn apply(self, args: &[f64]) -> f64 {
        match (self, args) {
            (Function::Sin, [u]) => u.sin(),
            (Function::Cos, [u]) => u.cos(),
            (Function::Tan, [u]) => u.tan(),
            (Function::Exp, [u]) => u.exp(),
            (Function::Log, [u]) => u.ln(),
            (Function::Log, [u, base]) => u.ln() / base.ln(),
            (Function::Sqrt, [u]) => u.sqrt(),
            (Function::Abs, [u]) => u.abs(),
            // unreachable through `Call::new`
            _ => f64::NAN,
        }
    }
}

#[derive(Error, Debug, Diagnostic, Clone, PartialEq)]
#[error("`{name}` takes {expected} argument(s), found {found}")]
#[diagnostic(code(difgraph::arity))]
pub struct ArityError {
    pub name: &'static str,
    pub expected: String,
    pub found: usize,
}

/// A call of a registry function with an argument count the function accepts.
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    function: Function,
    args: Vec<Expr>,
}

impl Call {
    pub fn new(function: Function, args: Vec<Expr>) -> Result<Self, ArityError> {
        let arity = function.arity();
        if !arity.contains(&args.len()) {
            let expected = if arity.start() == arity.end() {
                arity.start().to_string()
            } else {
                format!("{} to {}", arity.start(), arity.end())
            };
            return Err(ArityError {
                name: function.name(),
                expected,
                found: args.len(),
            });
        }
        Ok(Call { function, args })
    }

    pub(crate) fn unary(function: Function, arg: Expr) -> Self {
        Call {
            function,
            args: vec![arg],
        }
    }

    pub fn function(&self) -> Function {
        self.function
    }

    pub fn args(&self) -> &[Expr] {
        &self.args
    }

    /// Rebuilds the call with each argument transformed; the arity is kept.
    pub(crate) fn map_args(&self, f: impl FnMut(&Expr) -> Expr) -> Call {
        Call {
            function: self.function,
            args: self.args.iter().map(f).collect(),
        }
    }
}
