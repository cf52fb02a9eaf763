//! Symbolic differentiation.
//!
//! The result is a fresh, unsimplified tree; run it through
//! [`crate::simplify::simplify`] before showing it to anyone.

use crate::{
    parse::{BinaryOp, Expr, UnaryOp},
    system::{Call, Function},
};

/// Differentiates `expr` with respect to `variable`. Every other variable
/// name is treated as a constant.
pub fn differentiate(expr: &Expr, variable: &str) -> Expr {
    match expr {
        Expr::Constant(_) => Expr::Constant(0.0),

        // d(x)/dx = 1
        Expr::Variable(name) if name == variable => Expr::Constant(1.0),
        Expr::Variable(_) => Expr::Constant(0.0),

        Expr::Unary(UnaryOp::Neg, u) => Expr::neg(differentiate(u, variable)),

        Expr::Binary(op, u, v) => {
            let du = differentiate(u, variable);
            match op {
                // (u ± v)' = u' ± v'
                BinaryOp::Add | BinaryOp::Sub => {
                    Expr::binary(*op, du, differentiate(v, variable))
                }

                // (u * v)' = u' * v + u * v'
                BinaryOp::Mul => Expr::add(
                    Expr::mul(du, (**v).clone()),
                    Expr::mul((**u).clone(), differentiate(v, variable)),
                ),

                // (u / v)' = (u' * v - u * v') / v ^ 2
                BinaryOp::Div => Expr::div(
                    Expr::sub(
                        Expr::mul(du, (**v).clone()),
                        Expr::mul((**u).clone(), differentiate(v, variable)),
                    ),
                    Expr::pow((**v).clone(), Expr::Constant(2.0)),
                ),

                BinaryOp::Pow => power(u, v, du, variable),
            }
        }

        Expr::Call(call) => chain(call, variable),
    }
}

fn power(u: &Expr, v: &Expr, du: Expr, variable: &str) -> Expr {
    match (u.depends_on(variable), v.depends_on(variable)) {
        // (u ^ c)' = c * u ^ (c - 1) * u'
        (_, false) => Expr::mul(
            Expr::mul(
                v.clone(),
                Expr::pow(u.clone(), Expr::sub(v.clone(), Expr::Constant(1.0))),
            ),
            du,
        ),

        // (c ^ v)' = c ^ v * log(c) * v'
        (false, true) => Expr::mul(
            Expr::mul(
                Expr::pow(u.clone(), v.clone()),
                Expr::call(Function::Log, u.clone()),
            ),
            differentiate(v, variable),
        ),

        // (u ^ v)' = u ^ v * (v' * log(u) + v * u' / u)
        (true, true) => Expr::mul(
            Expr::pow(u.clone(), v.clone()),
            Expr::add(
                Expr::mul(
                    differentiate(v, variable),
                    Expr::call(Function::Log, u.clone()),
                ),
                Expr::div(Expr::mul(v.clone(), du), u.clone()),
            ),
        ),
    }
}

// (f(u))' = f'(u) * u'
fn chain(call: &Call, variable: &str) -> Expr {
    let (function, args) = (call.function(), call.args());
    let Some(u) = args.first() else {
        return Expr::Constant(f64::NAN);
    };
    let du = differentiate(u, variable);

    match (function, args) {
        // d(sin(u)) = cos(u) * u'
        (Function::Sin, [_]) => Expr::mul(Expr::call(Function::Cos, u.clone()), du),

        // d(cos(u)) = -sin(u) * u'
        (Function::Cos, [_]) => Expr::mul(Expr::neg(Expr::call(Function::Sin, u.clone())), du),

        // d(tan(u)) = u' / cos(u) ^ 2
        (Function::Tan, [_]) => Expr::div(
            du,
            Expr::pow(Expr::call(Function::Cos, u.clone()), Expr::Constant(2.0)),
        ),

        // d(exp(u)) = exp(u) * u'
        (Function::Exp, [_]) => Expr::mul(Expr::call(Function::Exp, u.clone()), du),

        // d(log(u)) = u' / u
        (Function::Log, [_]) => Expr::div(du, u.clone()),

        // d(log(u, b)) = u' / (u * log(b)) for a constant base
        (Function::Log, [_, base]) if !base.depends_on(variable) => Expr::div(
            du,
            Expr::mul(u.clone(), Expr::call(Function::Log, base.clone())),
        ),

        (Function::Log, [_, base]) => differentiate(
            &Expr::div(
                Expr::call(Function::Log, u.clone()),
                Expr::call(Function::Log, base.clone()),
            ),
            variable,
        ),

        // d(sqrt(u)) = u' / (2 * sqrt(u))
        (Function::Sqrt, [_]) => Expr::div(
            du,
            Expr::mul(Expr::Constant(2.0), Expr::call(Function::Sqrt, u.clone())),
        ),

        // d(abs(u)) = u / abs(u) * u'
        (Function::Abs, [_]) => Expr::mul(
            Expr::div(u.clone(), Expr::call(Function::Abs, u.clone())),
            du,
        ),

        // unreachable through `Call::new`
        _ => Expr::Constant(f64::NAN),
    }
}
