use std::{borrow::Cow, collections::HashMap};

use miette::Diagnostic;
use thiserror::Error;

use crate::parse::Expr;

#[derive(Error, Debug, Diagnostic, Clone, PartialEq)]
pub enum EvalError {
    #[error("unbound variable `{name}`")]
    #[diagnostic(
        code(difgraph::eval::unbound_variable),
        help("formulas are functions of `x`; `pi` and `e` are also available")
    )]
    UnboundVariable { name: String },
}

/// Variable bindings for one evaluation.
#[derive(Debug, Clone, Default)]
pub struct Environment<'a> {
    values: HashMap<Cow<'a, str>, f64>,
}

impl<'a> Environment<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// An environment with `pi` and `e` bound.
    pub fn with_constants() -> Self {
        let mut environment = Self::new();
        environment.define("pi", std::f64::consts::PI);
        environment.define("e", std::f64::consts::E);
        environment
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }

    pub fn define(&mut self, name: impl Into<Cow<'a, str>>, value: f64) {
        self.values.insert(name.into(), value);
    }

    pub fn with(mut self, name: impl Into<Cow<'a, str>>, value: f64) -> Self {
        self.define(name, value);
        self
    }
}

/// Evaluates `expr` under `environment`.
///
/// Division by zero and domain errors follow IEEE-754 and produce infinities
/// or NaN; only a missing binding is an error.
pub fn evaluate(expr: &Expr, environment: &Environment<'_>) -> Result<f64, EvalError> {
    Ok(match expr {
        Expr::Constant(value) => *value,
        Expr::Variable(name) => {
            environment
                .get(name)
                .ok_or_else(|| EvalError::UnboundVariable { name: name.clone() })?
        }
        Expr::Unary(op, operand) => op.apply(evaluate(operand, environment)?),
        Expr::Binary(op, lhs, rhs) => {
            op.apply(evaluate(lhs, environment)?, evaluate(rhs, environment)?)
        }
        Expr::Call(call) => match call.args() {
            [arg] => call.function().apply(&[evaluate(arg, environment)?]),
            args => {
                let values = args
                    .iter()
                    .map(|arg| evaluate(arg, environment))
                    .collect::<Result<Vec<_>, _>>()?;
                call.function().apply(&values)
            }
        },
    })
}
