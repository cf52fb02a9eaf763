//! The interactive front end: formula submissions and point-count changes.
//!
//! A failed submission leaves the current session on display.

use std::fmt::{self, Display};

use tracing::debug;

use crate::{
    FormulaError,
    layout::GridLayout,
    session::{PointCount, SamplingConfig, Session, finite_runs},
};

pub const DEFAULT_FORMULA: &str = "x^2";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Submit(String),
    Points(PointCount),
    Show,
    Quit,
}

impl Command {
    /// Lines starting with `:` are commands; anything else is a formula.
    pub fn parse(line: &str) -> Command {
        let line = line.trim();
        match line.split_once(char::is_whitespace) {
            Some((":points" | ":n", count)) => Command::Points(PointCount::from_input(count)),
            _ => match line {
                "" | ":show" => Command::Show,
                ":quit" | ":q" => Command::Quit,
                formula => Command::Submit(formula.to_string()),
            },
        }
    }
}

pub struct Shell {
    session: Session,
    points: PointCount,
    config: SamplingConfig,
}

impl Shell {
    pub fn new(formula: &str, points: PointCount, config: SamplingConfig) -> Result<Self, FormulaError> {
        Ok(Shell {
            session: Session::submit(formula)?,
            points,
            config,
        })
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn points(&self) -> PointCount {
        self.points
    }

    /// Replaces the session, or keeps the old one and returns the error.
    pub fn submit(&mut self, formula: &str) -> Result<&Session, FormulaError> {
        self.session = Session::submit(formula)?;
        Ok(&self.session)
    }

    pub fn set_points(&mut self, points: PointCount) {
        self.points = points;
    }

    pub fn report(&self) -> Report<'_> {
        Report {
            session: &self.session,
            points: self.points,
            config: &self.config,
            layout: false,
            samples: false,
        }
    }
}

/// What a plotting surface would show for one session.
pub struct Report<'a> {
    pub session: &'a Session,
    pub points: PointCount,
    pub config: &'a SamplingConfig,
    pub layout: bool,
    /// Append the sampled curve as `x,y` rows.
    pub samples: bool,
}

impl Report<'_> {
    pub fn with_layout(mut self) -> Self {
        self.layout = true;
        self
    }

    pub fn with_samples(mut self) -> Self {
        self.samples = true;
        self
    }
}

impl Display for Report<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Current function: f(x) = {}", self.session.source())?;
        writeln!(f, "Derivative: f'(x) = {}", self.session.derivative_text())?;

        let tangents = self.session.tangents(self.points, self.config);
        if self.layout {
            let layout = GridLayout::new(self.points);
            writeln!(
                f,
                "Grid: {} x {} ({}x{} px)",
                layout.rows, layout.columns, layout.width, layout.height
            )?;
            for (subplot, tangent) in layout.subplots.iter().zip(&tangents) {
                writeln!(
                    f,
                    "[{}] {} | {} | x in [{:.3}, {:.3}] y in [{:.3}, {:.3}]",
                    subplot.index + 1,
                    tangent.title(),
                    tangent.label(),
                    subplot.x_domain[0],
                    subplot.x_domain[1],
                    subplot.y_domain[0],
                    subplot.y_domain[1],
                )?;
            }
        } else {
            for (i, tangent) in tangents.iter().enumerate() {
                writeln!(f, "[{}] {} | {}", i + 1, tangent.title(), tangent.label())?;
            }
        }

        if self.samples {
            let curve = self.session.curve(self.config);
            debug!(
                samples = curve.len(),
                runs = finite_runs(&curve).len(),
                "sampled curve"
            );
            writeln!(f, "x,y")?;
            for (x, y) in curve {
                writeln!(f, "{x},{y}")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shell() -> Shell {
        Shell::new(DEFAULT_FORMULA, PointCount::default(), SamplingConfig::default()).unwrap()
    }

    #[test]
    fn commands() {
        assert_eq!(Command::parse("sin(x)"), Command::Submit("sin(x)".into()));
        assert_eq!(Command::parse(" :points 7 "), Command::Points(PointCount::new(7)));
        assert_eq!(Command::parse(":n 100"), Command::Points(PointCount::new(9)));
        assert_eq!(Command::parse(":quit"), Command::Quit);
        assert_eq!(Command::parse(""), Command::Show);
    }

    #[test]
    fn failed_submission_keeps_previous_session() {
        let mut shell = shell();
        shell.submit("sin(x)").unwrap();
        assert!(shell.submit("x +").is_err());
        assert!(shell.submit("foo(x)").is_err());
        assert!(shell.submit("x + y").is_err());
        assert_eq!(shell.session().source(), "sin(x)");
        assert_eq!(shell.session().derivative_text(), "cos(x)");
    }

    #[test]
    fn report_lists_every_tangent() {
        let mut shell = shell();
        shell.set_points(PointCount::new(2));
        let text = shell.report().to_string();
        assert_eq!(
            text,
            "Current function: f(x) = x^2\n\
             Derivative: f'(x) = 2 * x\n\
             [1] x = -10.00 | y = -20.00x + -100.00\n\
             [2] x = 10.00 | y = 20.00x + -100.00\n"
        );
    }

    #[test]
    fn sample_rows_keep_full_precision() {
        let shell = Shell::new(
            "x",
            PointCount::default(),
            SamplingConfig {
                x_min: 0.0,
                x_max: 0.2,
                step: 0.05,
                ..SamplingConfig::default()
            },
        )
        .unwrap();
        let text = shell.report().with_samples().to_string();
        let rows: Vec<_> = text.lines().skip_while(|line| *line != "x,y").skip(1).collect();
        assert_eq!(
            rows,
            vec![
                "0,0",
                "0.05,0.05",
                "0.1,0.1",
                "0.15000000000000002,0.15000000000000002",
                "0.2,0.2",
            ]
        );
    }

    #[test]
    fn report_omits_samples_by_default() {
        assert!(!shell().report().to_string().contains("x,y"));
    }

    #[test]
    fn report_with_layout() {
        let text = shell().report().with_layout().to_string();
        assert!(text.contains("Grid: 1 x 3 (1200x450 px)"));
        assert!(text.contains("[2] x = 0.00 | y = 0.00x + 0.00 | x in [0.383, 0.617] y in [0.050, 0.950]"));
    }
}
