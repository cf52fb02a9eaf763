//! One accepted formula and everything derived from it.

use std::num::IntErrorKind;

use tracing::debug;

use crate::{
    FormulaError, Parser,
    diff::differentiate,
    eval::{Environment, evaluate},
    parse::Expr,
    simplify::simplify,
};

/// The variable formulas are written in.
pub const VARIABLE: &str = "x";

/// Upper bound on the number of curve samples.
pub const MAX_SAMPLES: usize = 1_000_000;

/// Where the curve and the tangent points are sampled.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplingConfig {
    pub x_min: f64,
    pub x_max: f64,
    pub step: f64,
    pub dot_min: f64,
    pub dot_max: f64,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        SamplingConfig {
            x_min: -11.0,
            x_max: 11.0,
            step: 0.1,
            dot_min: -10.0,
            dot_max: 10.0,
        }
    }
}

impl SamplingConfig {
    /// Number of samples `xs` yields, or `None` when the step is not
    /// positive, the range is reversed, or there would be more than
    /// [`MAX_SAMPLES`].
    pub fn sample_count(&self) -> Option<usize> {
        if !(self.step > 0.0) || !(self.x_max >= self.x_min) {
            return None;
        }
        let intervals = ((self.x_max - self.x_min) / self.step).round();
        if !(intervals < MAX_SAMPLES as f64) {
            return None;
        }
        Some(intervals as usize + 1)
    }

    /// Sample abscissas `x_min + i * step` up to and including `x_max`.
    /// Empty when [`SamplingConfig::sample_count`] rejects the domain.
    pub fn xs(&self) -> Vec<f64> {
        let count = self.sample_count().unwrap_or(0);
        (0..count)
            .map(|i| self.x_min + i as f64 * self.step)
            .collect()
    }

    /// `count` evenly spaced tangent points over `[dot_min, dot_max]`,
    /// rounded to integers with halves rounded up.
    pub fn tangent_points(&self, count: PointCount) -> Vec<f64> {
        let n = count.get();
        let spacing = (self.dot_max - self.dot_min) / (n - 1) as f64;
        (0..n)
            .map(|i| (self.dot_min + i as f64 * spacing + 0.5).floor())
            .collect()
    }
}

/// Number of tangent subplots, always within `[MIN, MAX]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PointCount(usize);

impl PointCount {
    pub const MIN: usize = 2;
    pub const MAX: usize = 9;

    pub fn new(n: i64) -> Self {
        PointCount(n.clamp(Self::MIN as i64, Self::MAX as i64) as usize)
    }

    /// Reads a count typed by a user from its leading integer, so `4.5`
    /// and `5abc` read as 4 and 5. Input without one, or zero, becomes
    /// the minimum.
    pub fn from_input(text: &str) -> Self {
        let text = text.trim_start();
        let (sign, unsigned) = match text.strip_prefix('-') {
            Some(rest) => (-1, rest),
            None => (1, text.strip_prefix('+').unwrap_or(text)),
        };
        let end = unsigned
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(unsigned.len());
        match unsigned[..end].parse::<i64>() {
            Ok(n) => PointCount::new(sign * n),
            Err(e) if *e.kind() == IntErrorKind::PosOverflow => PointCount::new(sign * i64::MAX),
            Err(_) => PointCount(Self::MIN),
        }
    }

    pub fn get(self) -> usize {
        self.0
    }
}

impl Default for PointCount {
    fn default() -> Self {
        PointCount(3)
    }
}

/// The tangent line of the session's function at `dot`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tangent {
    pub dot: f64,
    pub value: f64,
    pub slope: f64,
    pub intercept: f64,
}

impl Tangent {
    pub fn at(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }

    pub fn title(&self) -> String {
        format!("x = {:.2}", self.dot + 0.0)
    }

    pub fn label(&self) -> String {
        // `+ 0.0` turns a negative zero into zero so it never prints as -0.00
        format!("y = {:.2}x + {:.2}", self.slope + 0.0, self.intercept + 0.0)
    }

    pub fn line(&self, config: &SamplingConfig) -> Vec<(f64, f64)> {
        config.xs().into_iter().map(|x| (x, self.at(x))).collect()
    }
}

/// Splits sampled points into runs of finite values; non-finite samples are
/// the gaps between runs.
pub fn finite_runs(samples: &[(f64, f64)]) -> Vec<&[(f64, f64)]> {
    samples
        .split(|(_, y)| !y.is_finite())
        .filter(|run| !run.is_empty())
        .collect()
}

/// An accepted formula, its derivative, and the simplified derivative.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    source: String,
    function: Expr,
    derivative: Expr,
    simplified: Expr,
}

impl Session {
    /// Runs the whole pipeline on `formula`. Names other than `x`, `pi` and
    /// `e` are rejected here rather than at every sample.
    pub fn submit(formula: &str) -> Result<Session, FormulaError> {
        let function = Parser::new(Some("formula"), formula)?.parse()?;
        let derivative = differentiate(&function, VARIABLE);
        let simplified = simplify(&derivative);

        let at_origin = environment(0.0);
        evaluate(&function, &at_origin)?;
        evaluate(&simplified, &at_origin)?;

        debug!(formula, derivative = %simplified, "accepted formula");
        Ok(Session {
            source: formula.to_string(),
            function,
            derivative,
            simplified,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn function(&self) -> &Expr {
        &self.function
    }

    /// The derivative as the differentiator produced it.
    pub fn derivative(&self) -> &Expr {
        &self.derivative
    }

    pub fn simplified(&self) -> &Expr {
        &self.simplified
    }

    pub fn derivative_text(&self) -> String {
        self.simplified.to_string()
    }

    pub fn value_at(&self, x: f64) -> f64 {
        evaluate(&self.function, &environment(x)).unwrap_or(f64::NAN)
    }

    pub fn slope_at(&self, x: f64) -> f64 {
        evaluate(&self.simplified, &environment(x)).unwrap_or(f64::NAN)
    }

    /// `(x, f(x))` over the sampling domain. Non-finite values are kept.
    pub fn curve(&self, config: &SamplingConfig) -> Vec<(f64, f64)> {
        config
            .xs()
            .into_iter()
            .map(|x| (x, self.value_at(x)))
            .collect()
    }

    pub fn tangent(&self, dot: f64) -> Tangent {
        let value = self.value_at(dot);
        let slope = self.slope_at(dot);
        Tangent {
            dot,
            value,
            slope,
            intercept: value - slope * dot,
        }
    }

    pub fn tangents(&self, count: PointCount, config: &SamplingConfig) -> Vec<Tangent> {
        config
            .tangent_points(count)
            .into_iter()
            .map(|dot| self.tangent(dot))
            .collect()
    }
}

fn environment(x: f64) -> Environment<'static> {
    Environment::with_constants().with(VARIABLE, x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ParseError;
    use approx::assert_abs_diff_eq;

    #[test]
    fn default_domain_has_221_samples() {
        let xs = SamplingConfig::default().xs();
        assert_eq!(xs.len(), 221);
        assert_eq!(xs[0], -11.0);
        assert_abs_diff_eq!(xs[220], 11.0, epsilon = 1e-9);
        assert_abs_diff_eq!(xs[110], 0.0, epsilon = 1e-9);
    }

    #[test]
    fn bad_domains_give_no_samples() {
        let config = SamplingConfig {
            step: 0.0,
            ..SamplingConfig::default()
        };
        assert!(config.xs().is_empty());
        let config = SamplingConfig {
            x_min: 1.0,
            x_max: -1.0,
            ..SamplingConfig::default()
        };
        assert!(config.xs().is_empty());
    }

    #[test]
    fn tiny_steps_are_refused_instead_of_allocating() {
        for step in [1e-300, 1e-12, 1e-6] {
            let config = SamplingConfig {
                x_min: 0.0,
                x_max: 1.0,
                step,
                ..SamplingConfig::default()
            };
            assert_eq!(config.sample_count(), None, "step {step}");
            assert!(config.xs().is_empty());
        }

        let config = SamplingConfig {
            x_min: 0.0,
            x_max: (MAX_SAMPLES - 1) as f64,
            step: 1.0,
            ..SamplingConfig::default()
        };
        assert_eq!(config.sample_count(), Some(MAX_SAMPLES));
        assert_eq!(SamplingConfig::default().sample_count(), Some(221));
    }

    #[test]
    fn point_count_is_clamped() {
        assert_eq!(PointCount::new(0).get(), 2);
        assert_eq!(PointCount::new(5).get(), 5);
        assert_eq!(PointCount::new(40).get(), 9);
        assert_eq!(PointCount::from_input(" 4 ").get(), 4);
        assert_eq!(PointCount::from_input("lots").get(), 2);
        assert_eq!(PointCount::from_input("").get(), 2);
        assert_eq!(PointCount::default().get(), 3);
    }

    #[test]
    fn point_count_reads_leading_integer() {
        assert_eq!(PointCount::from_input("4.5").get(), 4);
        assert_eq!(PointCount::from_input("5abc").get(), 5);
        assert_eq!(PointCount::from_input("+6").get(), 6);
        assert_eq!(PointCount::from_input("0").get(), 2);
        assert_eq!(PointCount::from_input("-7").get(), 2);
        assert_eq!(PointCount::from_input("99999999999999999999").get(), 9);
        assert_eq!(PointCount::from_input("-99999999999999999999").get(), 2);
        assert_eq!(PointCount::from_input("x4").get(), 2);
    }

    #[test]
    fn tangent_points_are_rounded_half_up() {
        let config = SamplingConfig::default();
        assert_eq!(config.tangent_points(PointCount::new(2)), vec![-10.0, 10.0]);
        assert_eq!(config.tangent_points(PointCount::new(3)), vec![-10.0, 0.0, 10.0]);
        assert_eq!(
            config.tangent_points(PointCount::new(9)),
            vec![-10.0, -7.0, -5.0, -2.0, 0.0, 3.0, 5.0, 8.0, 10.0]
        );
        assert_eq!(
            config.tangent_points(PointCount::new(4)),
            vec![-10.0, -3.0, 3.0, 10.0]
        );
    }

    #[test]
    fn tangent_of_x_squared_at_two() {
        let session = Session::submit("x^2").unwrap();
        let tangent = session.tangent(2.0);
        assert_eq!(tangent.slope, 4.0);
        assert_eq!(tangent.intercept, -4.0);
        assert_eq!(tangent.label(), "y = 4.00x + -4.00");
        assert_eq!(tangent.title(), "x = 2.00");
        assert_eq!(tangent.at(2.0), 4.0);
    }

    #[test]
    fn labels_never_show_negative_zero() {
        let session = Session::submit("-x^2").unwrap();
        assert_eq!(session.tangent(0.0).label(), "y = 0.00x + 0.00");
    }

    #[test]
    fn session_keeps_every_stage() {
        let session = Session::submit("x^2").unwrap();
        assert_eq!(session.source(), "x^2");
        assert_eq!(session.function().to_string(), "x ^ 2");
        assert_eq!(session.derivative_text(), "2 * x");
        assert_ne!(session.derivative(), session.simplified());
        assert_eq!(session.value_at(3.0), 9.0);
        assert_eq!(session.slope_at(3.0), 6.0);
    }

    #[test]
    fn constants_are_available() {
        let session = Session::submit("sin(pi * x) + e").unwrap();
        assert_abs_diff_eq!(session.value_at(0.5), 1.0 + std::f64::consts::E, epsilon = 1e-12);
        assert_eq!(session.derivative_text(), "cos(pi * x) * pi");
    }

    #[test]
    fn long_sums_are_rejected_at_submission() {
        let formula = vec!["x"; 20_000].join("+");
        assert!(matches!(
            Session::submit(&formula),
            Err(FormulaError::Parse(ParseError::TooDeep { .. }))
        ));

        let session = Session::submit(&vec!["x"; 200].join("+")).unwrap();
        assert_eq!(session.slope_at(1.0), 200.0);
    }

    #[test]
    fn unknown_names_fail_at_submission() {
        assert!(matches!(Session::submit("x + y"), Err(FormulaError::Eval(_))));
    }

    #[test]
    fn curve_keeps_gaps_for_plotting() {
        let session = Session::submit("1/x").unwrap();
        let config = SamplingConfig {
            x_min: -1.0,
            x_max: 1.0,
            step: 0.5,
            ..SamplingConfig::default()
        };
        let curve = session.curve(&config);
        assert_eq!(curve.len(), 5);
        assert_eq!(curve[2], (0.0, f64::INFINITY));

        let runs = finite_runs(&curve);
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0], &[(-1.0, -1.0), (-0.5, -2.0)]);
        assert_eq!(runs[1], &[(0.5, 2.0), (1.0, 1.0)]);
    }

    #[test]
    fn tangent_line_follows_config() {
        let session = Session::submit("x").unwrap();
        let line = session.tangent(3.0).line(&SamplingConfig::default());
        assert_eq!(line.len(), 221);
        for (x, y) in line {
            assert_abs_diff_eq!(x, y, epsilon = 1e-12);
        }
    }
}
