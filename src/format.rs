//! Renders an [`Expr`] back to formula text that parses to an equivalent tree.

use std::fmt::{self, Display};

use crate::parse::{BinaryOp, Expr, UnaryOp};

const ADDITIVE: u8 = 1;
const MULTIPLICATIVE: u8 = 2;
const PREFIX: u8 = 3;
const POWER: u8 = 4;
const ATOM: u8 = 5;

fn precedence(expr: &Expr) -> u8 {
    match expr {
        // negative literals print with a leading `-`
        Expr::Constant(value) if value.is_finite() && value.is_sign_negative() => PREFIX,
        Expr::Constant(_) | Expr::Variable(_) | Expr::Call(_) => ATOM,
        Expr::Unary(UnaryOp::Neg, _) => PREFIX,
        Expr::Binary(BinaryOp::Add | BinaryOp::Sub, ..) => ADDITIVE,
        Expr::Binary(BinaryOp::Mul | BinaryOp::Div, ..) => MULTIPLICATIVE,
        Expr::Binary(BinaryOp::Pow, ..) => POWER,
    }
}

/// Minimum precedence of the (left, right) operands of `op`.
fn operand_precedence(op: BinaryOp) -> (u8, u8) {
    match op {
        BinaryOp::Add | BinaryOp::Sub => (ADDITIVE, ADDITIVE + 1),
        BinaryOp::Mul | BinaryOp::Div => (MULTIPLICATIVE, MULTIPLICATIVE + 1),
        // `-x ^ 2` means `-(x ^ 2)`, so a negated base needs parentheses
        BinaryOp::Pow => (ATOM, PREFIX),
    }
}

impl Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Pow => "^",
        })
    }
}

struct Operand<'a>(&'a Expr, u8);

impl Display for Operand<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Operand(expr, min) = *self;
        if precedence(expr) < min {
            write!(f, "({expr})")
        } else {
            write!(f, "{expr}")
        }
    }
}

impl Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Constant(value) if value.is_nan() => f.write_str("(0 / 0)"),
            Expr::Constant(value) if value.is_infinite() => {
                if *value > 0.0 {
                    f.write_str("(1 / 0)")
                } else {
                    f.write_str("(-1 / 0)")
                }
            }
            Expr::Constant(value) => write!(f, "{value}"),
            Expr::Variable(name) => f.write_str(name),
            Expr::Unary(UnaryOp::Neg, operand) => write!(f, "-{}", Operand(operand, PREFIX)),
            Expr::Binary(op, lhs, rhs) => {
                let (left, right) = operand_precedence(*op);
                write!(f, "{} {op} {}", Operand(lhs, left), Operand(rhs, right))
            }
            Expr::Call(call) => {
                write!(f, "{}(", call.function().name())?;
                for (i, arg) in call.args().iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                f.write_str(")")
            }
        }
    }
}
