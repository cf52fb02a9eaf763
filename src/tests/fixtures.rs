use approx::assert_abs_diff_eq;

use crate::{FormulaError, ParseError, Session, parse};

fn derivative_of(formula: &str) -> String {
    Session::submit(formula).unwrap().derivative_text()
}

#[test]
fn x_squared() {
    let session = Session::submit("x^2").unwrap();
    assert_eq!(session.derivative_text(), "2 * x");
    assert_eq!(session.value_at(3.0), 9.0);
    assert_eq!(session.slope_at(3.0), 6.0);
}

#[test]
fn sine() {
    let session = Session::submit("sin(x)").unwrap();
    assert_eq!(session.derivative_text(), "cos(x)");
    assert_eq!(session.value_at(0.0), 0.0);
    assert_eq!(session.slope_at(0.0), 1.0);
}

#[test]
fn straight_line_has_constant_slope() {
    let session = Session::submit("2*x+1").unwrap();
    assert_eq!(session.derivative_text(), "2");
    for x in [-10.0, -0.5, 0.0, 3.0, 1e6] {
        assert_eq!(session.slope_at(x), 2.0);
    }
}

#[test]
fn reciprocal() {
    let session = Session::submit("1/x").unwrap();
    assert!(!session.value_at(0.0).is_finite());
    assert_eq!(session.derivative_text(), "-1 / x ^ 2");

    let expected = Session::submit("-1/x^2").unwrap();
    for x in [-3.0, -0.25, 0.5, 2.0, 7.0] {
        assert_eq!(session.slope_at(x), expected.value_at(x));
    }
}

#[test]
fn incomplete_formula_points_at_end_of_input() {
    let Err(FormulaError::Parse(err)) = parse("x +") else {
        panic!("`x +` should not parse");
    };
    assert_eq!(err.position(), 3);
}

#[test]
fn unknown_function() {
    let err = Session::submit("foo(x)").unwrap_err();
    assert!(matches!(
        err,
        FormulaError::Parse(ParseError::UnknownFunction { .. })
    ));
}

#[test]
fn tangent_label_at_two() {
    let tangent = Session::submit("x^2").unwrap().tangent(2.0);
    assert_eq!(tangent.slope, 4.0);
    assert_eq!(tangent.intercept, -4.0);
    assert_eq!(tangent.label(), "y = 4.00x + -4.00");
}

#[test]
fn common_derivatives() {
    let cases = [
        ("x^3", "3 * x ^ 2"),
        ("cos(x)", "-sin(x)"),
        ("tan(x)", "1 / cos(x) ^ 2"),
        ("exp(x)", "exp(x)"),
        ("log(x)", "1 / x"),
        ("sqrt(x)", "1 / (2 * sqrt(x))"),
        ("2^x", "2 ^ x * log(2)"),
        ("x*sin(x)", "sin(x) + x * cos(x)"),
        ("-x^2", "-(2 * x)"),
        ("sin(x^2)", "cos(x ^ 2) * (2 * x)"),
        ("x^x", "x ^ x * (log(x) + x / x)"),
        ("5", "0"),
    ];
    for (formula, expected) in cases {
        assert_eq!(derivative_of(formula), expected, "d/dx {formula}");
    }
}

#[test]
fn displayed_derivative_parses_back() {
    for formula in ["x^3 - 2*x", "exp(-x^2 / 2)", "log(x, 10) * sqrt(x)", "abs(x) / (1 + x^2)"] {
        let session = Session::submit(formula).unwrap();
        let redisplayed = Session::submit(&session.derivative_text()).unwrap();
        for x in [0.3, 1.0, 2.5] {
            assert_abs_diff_eq!(
                session.slope_at(x),
                redisplayed.value_at(x),
                epsilon = 1e-12
            );
        }
    }
}
