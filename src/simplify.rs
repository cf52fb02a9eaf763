//! Bottom-up rewriting: constant folding and identity elimination.

use tracing::{debug, trace};

use crate::parse::{BinaryOp, Expr, UnaryOp};

/// Upper bound on full passes over the tree.
pub const MAX_PASSES: usize = 32;

/// Returns a simplified copy of `expr` that evaluates to the same value
/// wherever `expr` is finite.
pub fn simplify(expr: &Expr) -> Expr {
    let mut current = merge_expr(expr);
    for pass in 1..MAX_PASSES {
        let next = merge_expr(&current);
        if next == current {
            debug!(passes = pass, result = %current, "simplified");
            return current;
        }
        trace!(pass, expr = %next, "rewrote");
        current = next;
    }
    debug!(passes = MAX_PASSES, result = %current, "simplifier hit pass limit");
    current
}

// merge the const expr
fn merge_expr(input: &Expr) -> Expr {
    match input {
        Expr::Constant(_) | Expr::Variable(_) => input.clone(),
        Expr::Unary(UnaryOp::Neg, operand) => negate(merge_expr(operand)),
        Expr::Binary(op, lhs, rhs) => merge_binary(*op, merge_expr(lhs), merge_expr(rhs)),
        Expr::Call(call) => Expr::Call(call.map_args(merge_expr)),
    }
}

fn negate(operand: Expr) -> Expr {
    match operand {
        Expr::Constant(value) if value.is_finite() => Expr::Constant(-value),
        // --u = u
        Expr::Unary(UnaryOp::Neg, inner) => *inner,
        operand => Expr::neg(operand),
    }
}

fn merge_binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Expr {
    use BinaryOp::*;
    use Expr::Constant as Number;

    match (op, lhs, rhs) {
        // non-finite results stay symbolic
        (op, Number(left), Number(right)) if op.apply(left, right).is_finite() => {
            Number(op.apply(left, right))
        }

        (Add, Number(zero), rhs) if zero == 0.0 => rhs,
        (Add | Sub, lhs, Number(zero)) if zero == 0.0 => lhs,
        (Sub, Number(zero), rhs) if zero == 0.0 => negate(rhs),

        (Mul, Number(zero), _) | (Mul, _, Number(zero)) if zero == 0.0 => Number(0.0),
        (Mul, Number(one), rhs) if one == 1.0 => rhs,
        (Mul | Div, lhs, Number(one)) if one == 1.0 => lhs,
        (Mul, Number(minus_one), rhs) if minus_one == -1.0 => negate(rhs),
        (Mul | Div, lhs, Number(minus_one)) if minus_one == -1.0 => negate(lhs),

        (Pow, lhs, Number(one)) if one == 1.0 => lhs,
        // x ^ 0 = 1, 0 ^ 0 included
        (Pow, _, Number(zero)) if zero == 0.0 => Number(1.0),

        (op, lhs, rhs) => Expr::binary(op, lhs, rhs),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{parse::parse, system::Function};

    fn simplified(text: &str) -> String {
        simplify(&parse(text).unwrap()).to_string()
    }

    #[test]
    fn folds_constants() {
        assert_eq!(simplified("1 + 2 * 3"), "7");
        assert_eq!(simplified("2 ^ 10 - x"), "1024 - x");
        assert_eq!(simplified("-(3)"), "-3");
    }

    #[test]
    fn keeps_non_finite_folds_symbolic() {
        assert_eq!(simplified("1 / 0 + x"), "1 / 0 + x");
        assert_eq!(simplified("log(0 - 1)"), "log(-1)");
    }

    #[test]
    fn additive_identities() {
        assert_eq!(simplified("x + 0"), "x");
        assert_eq!(simplified("0 + x"), "x");
        assert_eq!(simplified("x - 0"), "x");
        assert_eq!(simplified("0 - x"), "-x");
        assert_eq!(simplified("0 - -x"), "x");
    }

    #[test]
    fn multiplicative_identities() {
        assert_eq!(simplified("x * 1"), "x");
        assert_eq!(simplified("1 * x"), "x");
        assert_eq!(simplified("x * 0"), "0");
        assert_eq!(simplified("0 * sin(x)"), "0");
        assert_eq!(simplified("x / 1"), "x");
        assert_eq!(simplified("-1 * x"), "-x");
        assert_eq!(simplified("x / -1"), "-x");
    }

    #[test]
    fn power_identities() {
        assert_eq!(simplified("x ^ 1"), "x");
        assert_eq!(simplified("x ^ 0"), "1");
        assert_eq!(simplified("0 ^ 0"), "1");
        assert_eq!(simplified("(x + 0) ^ (2 - 1)"), "x");
    }

    #[test]
    fn double_negation() {
        assert_eq!(simplified("--x"), "x");
        assert_eq!(simplified("---x"), "-x");
    }

    #[test]
    fn simplifies_inside_calls() {
        assert_eq!(
            simplify(&parse("sin(x * 1 + 0)").unwrap()),
            Expr::call(Function::Sin, Expr::variable("x"))
        );
    }

    #[test]
    fn input_tree_is_untouched() {
        let expr = parse("x * 1 + 0").unwrap();
        let copy = expr.clone();
        let _ = simplify(&expr);
        assert_eq!(expr, copy);
    }

    #[test]
    fn second_pass_changes_nothing() {
        for text in ["x * 1 + 0 * x", "(x ^ 1) ^ (3 - 2)", "0 - (0 - x)", "2 * x ^ (2 - 1) * 1"] {
            let once = simplify(&parse(text).unwrap());
            assert_eq!(simplify(&once), once, "{text}");
        }
    }
}
