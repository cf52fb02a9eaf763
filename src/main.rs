use std::io::{BufRead, Write, stdin, stdout};

use clap::{Args as ClapArgs, Parser, Subcommand};
use difgraph::{
    Lexer, Session,
    session::{MAX_SAMPLES, PointCount, SamplingConfig},
    shell::{Command, DEFAULT_FORMULA, Report, Shell},
};
use miette::{IntoDiagnostic, WrapErr, miette};
use tracing_subscriber::EnvFilter;

const SOURCE_NAME: &str = "formula";

#[derive(Parser, Debug)]
#[command(version, about = "Differentiate a formula and tabulate its tangent lines")]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print the token stream of a formula
    Tokenize { formula: String },
    /// Parse a formula and print it back fully formatted
    Parse { formula: String },
    /// Print the derivative of a formula with respect to x
    Diff {
        formula: String,
        /// Skip simplification
        #[arg(long)]
        raw: bool,
    },
    /// Evaluate a formula and its derivative at one point
    Eval {
        formula: String,
        #[arg(long, allow_negative_numbers = true)]
        at: f64,
    },
    /// Print the derivative, grid layout and tangent lines for a formula
    Plot {
        formula: String,
        #[command(flatten)]
        view: ViewArgs,
        /// Also print the sampled curve as `x,y` rows
        #[arg(long)]
        samples: bool,
    },
    /// Read formulas from stdin, one per line
    Repl {
        #[command(flatten)]
        view: ViewArgs,
    },
}

#[derive(Debug, ClapArgs)]
struct ViewArgs {
    /// Number of tangent points, clamped to 2..=9
    #[arg(long, default_value_t = 3, allow_negative_numbers = true)]
    points: i64,
    #[arg(long, default_value_t = -11.0, allow_negative_numbers = true)]
    x_min: f64,
    #[arg(long, default_value_t = 11.0, allow_negative_numbers = true)]
    x_max: f64,
    #[arg(long, default_value_t = 0.1)]
    step: f64,
}

impl ViewArgs {
    fn config(&self) -> miette::Result<SamplingConfig> {
        let config = SamplingConfig {
            x_min: self.x_min,
            x_max: self.x_max,
            step: self.step,
            ..SamplingConfig::default()
        };
        if config.sample_count().is_none() {
            return Err(miette!(
                help = format!("use a positive --step and --x-min below --x-max, with at most {MAX_SAMPLES} samples"),
                "unusable sampling domain [{}, {}] with step {}",
                self.x_min,
                self.x_max,
                self.step
            ));
        }
        Ok(config)
    }
}

fn main() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    match args.command {
        Commands::Tokenize { formula } => {
            for token in Lexer::new(Some(SOURCE_NAME), &formula) {
                println!("{}", token?);
            }
        }
        Commands::Parse { formula } => {
            let expr = difgraph::Parser::new(Some(SOURCE_NAME), &formula)?.parse()?;
            println!("{expr}");
        }
        Commands::Diff { formula, raw } => {
            let session = Session::submit(&formula)?;
            if raw {
                println!("{}", session.derivative());
            } else {
                println!("{}", session.derivative_text());
            }
        }
        Commands::Eval { formula, at } => {
            let session = Session::submit(&formula)?;
            println!("f({at}) = {}", session.value_at(at));
            println!("f'({at}) = {}", session.slope_at(at));
        }
        Commands::Plot {
            formula,
            view,
            samples,
        } => {
            let config = view.config()?;
            let session = Session::submit(&formula)?;
            let report = Report {
                session: &session,
                points: PointCount::new(view.points),
                config: &config,
                layout: true,
                samples,
            };
            print!("{report}");
        }
        Commands::Repl { view } => repl(view)?,
    }
    Ok(())
}

fn repl(view: ViewArgs) -> miette::Result<()> {
    let mut shell = Shell::new(DEFAULT_FORMULA, PointCount::new(view.points), view.config()?)?;
    print!("{}", shell.report());

    let mut out = stdout();
    for line in stdin().lock().lines() {
        let line = line.into_diagnostic().wrap_err("reading stdin failed")?;
        match Command::parse(&line) {
            Command::Quit => break,
            Command::Show => {}
            Command::Points(points) => shell.set_points(points),
            Command::Submit(formula) => {
                if let Err(e) = shell.submit(&formula) {
                    eprintln!("{:?}", miette::Report::new(e));
                }
            }
        }
        write!(out, "{}", shell.report())
            .and_then(|()| out.flush())
            .into_diagnostic()?;
    }
    Ok(())
}
