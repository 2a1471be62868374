//! Command-line front end for parsing, evaluating, and solving equations.

use algebra_solver::{
    Equation, EquationId, EquationStore, Error, Expression, SolveResult,
};
use clap::{ArgAction, Parser, Subcommand};
use serde_json::json;
use std::{
    collections::HashMap,
    io::{BufRead, BufReader},
    process::ExitCode,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "algebra-solver")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Parse, evaluate, and solve single-variable equations")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Command {
    /// Print an expression's normalized form and its variables
    Show {
        #[arg(value_name = "EXPR", allow_hyphen_values = true)]
        expression: String,
    },
    /// Evaluate an expression
    Eval {
        #[arg(value_name = "EXPR", allow_hyphen_values = true)]
        expression: String,

        /// Variable values
        #[arg(value_name = "NAME=VALUE", value_parser = parse_binding)]
        variables: Vec<(String, f64)>,
    },
    /// Solve `EXPR = 0` for one variable
    Solve {
        #[arg(value_name = "EXPR", allow_hyphen_values = true)]
        expression: String,

        /// The variable to solve for
        #[arg(short = 'x', long, default_value = "x")]
        variable: String,

        /// Values for the other variables
        #[arg(value_name = "NAME=VALUE", value_parser = parse_binding)]
        knowns: Vec<(String, f64)>,
    },
    /// Read commands from stdin against an in-memory equation store
    /// (the default)
    Session,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let output = Output { json: cli.json };

    let outcome = match cli.command.unwrap_or(Command::Session) {
        Command::Show { expression } => show(&expression, output),
        Command::Eval {
            expression,
            variables,
        } => eval(&expression, variables.into_iter().collect(), output),
        Command::Solve {
            expression,
            variable,
            knowns,
        } => solve(&expression, &variable, knowns.into_iter().collect(), output),
        Command::Session => return session(output),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", describe(&e));
            ExitCode::FAILURE
        },
    }
}

fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("algebra_solver={}", level))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn show(src: &str, output: Output) -> Result<(), Error> {
    let expr: Expression = src.parse()?;
    let variables: Vec<_> = expr.variables().into_iter().collect();

    if output.json {
        output.print_json(&json!({
            "equation": expr.to_string(),
            "variables": variables,
        }));
    } else {
        println!("{}", expr);
        println!("variables: {}", join(variables.iter()));
    }

    Ok(())
}

fn eval(
    src: &str,
    variables: HashMap<String, f64>,
    output: Output,
) -> Result<(), Error> {
    let expr: Expression = src.parse()?;
    let result = expr.evaluate(&variables)?;
    output.print_value(&expr.to_string(), &variables, result);

    Ok(())
}

fn solve(
    src: &str,
    variable: &str,
    knowns: HashMap<String, f64>,
    output: Output,
) -> Result<(), Error> {
    let expr: Expression = src.parse()?;
    let result = algebra_solver::solve(&expr, variable, &knowns)?;
    output.print_solution(&expr.to_string(), &result);

    Ok(())
}

/// Run commands from stdin, one per line.
fn session(output: Output) -> ExitCode {
    let store = EquationStore::new();
    let stdin = std::io::stdin();

    for line in BufReader::new(stdin.lock()).lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                eprintln!("Unable to read stdin: {}", e);
                return ExitCode::FAILURE;
            },
        };

        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if let Err(e) = run_session_command(&store, line, output) {
            eprintln!("{}", e);
        }
    }

    ExitCode::SUCCESS
}

fn run_session_command(
    store: &EquationStore,
    line: &str,
    output: Output,
) -> Result<(), String> {
    let mut parts = line.splitn(2, char::is_whitespace);
    let command = parts.next().unwrap_or_default();
    let rest = parts.next().unwrap_or_default().trim();

    let mut words = rest.split_whitespace();
    let mut next_id = || -> Result<EquationId, String> {
        let word = words
            .next()
            .ok_or_else(|| format!("Usage: {} <id> ...", command))?;
        word.parse()
            .map_err(|_| format!("\"{}\" is not a valid equation id", word))
    };

    match command {
        "store" => {
            let equation = store.store(rest).map_err(|e| describe(&e))?;
            output.print_stored(&equation);
        },
        "list" => output.print_list(&store.list()),
        "get" => {
            let equation = store.get(next_id()?).map_err(|e| describe(&e))?;
            output.print_equation(&equation);
        },
        "eval" => {
            let id = next_id()?;
            let variables = parse_bindings(words)?;
            let equation = store.get(id).map_err(|e| describe(&e))?;
            let result =
                store.evaluate(id, &variables).map_err(|e| describe(&e))?;
            output.print_value(&equation.infix, &variables, result);
        },
        "solve" => {
            let id = next_id()?;
            let (knowns, variable): (Vec<_>, Vec<_>) =
                words.partition(|word| word.contains('='));
            let knowns = parse_bindings(knowns.into_iter())?;
            let equation = store.get(id).map_err(|e| describe(&e))?;
            let result = store
                .solve(id, variable.first().copied(), &knowns)
                .map_err(|e| describe(&e))?;
            output.print_solution(&equation.infix, &result);
        },
        "delete" => {
            let id = next_id()?;
            store.delete(id).map_err(|e| describe(&e))?;
            output.print_deleted(id);
        },
        other => {
            return Err(format!(
                "Unknown command \"{}\" (expected store, list, get, eval, \
                 solve, or delete)",
                other
            ))
        },
    }

    Ok(())
}

/// Turn an [`Error`] into the message shown to users.
fn describe(e: &Error) -> String {
    match e {
        Error::NotFound(_) => format!("Not found: {}", e),
        e if e.is_math_error() => format!("Math error: {}", e),
        e if e.is_invalid_input() => format!("Invalid input: {}", e),
        e => format!("Invalid equation: {}", e),
    }
}

fn parse_binding(s: &str) -> Result<(String, f64), String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, found \"{}\"", s))?;
    let value = value
        .trim()
        .parse()
        .map_err(|e| format!("invalid value for \"{}\": {}", name, e))?;

    Ok((name.trim().to_string(), value))
}

fn parse_bindings<'a, I>(words: I) -> Result<HashMap<String, f64>, String>
where
    I: Iterator<Item = &'a str>,
{
    words.map(parse_binding).collect()
}

fn join<T: ToString>(items: impl Iterator<Item = T>) -> String {
    items.map(|item| item.to_string()).collect::<Vec<_>>().join(", ")
}

#[derive(Debug, Copy, Clone)]
struct Output {
    json: bool,
}

impl Output {
    fn print_json(self, value: &serde_json::Value) {
        println!("{}", value);
    }

    fn print_stored(self, equation: &Equation) {
        if self.json {
            self.print_json(&json!({
                "message": "Equation stored successfully",
                "equationId": equation.id,
            }));
        } else {
            println!("Stored equation {}: {}", equation.id, equation.infix);
        }
    }

    fn print_equation(self, equation: &Equation) {
        if self.json {
            self.print_json(&json!({
                "equationId": equation.id,
                "equation": equation.infix,
                "variables": equation.variables,
            }));
        } else {
            println!(
                "{}: {} (variables: {})",
                equation.id,
                equation.infix,
                join(equation.variables.iter())
            );
        }
    }

    fn print_list(self, equations: &[std::sync::Arc<Equation>]) {
        if self.json {
            let rows: Vec<_> = equations
                .iter()
                .map(|e| json!({ "equationId": e.id, "equation": e.infix }))
                .collect();
            self.print_json(&json!({ "equations": rows }));
        } else if equations.is_empty() {
            println!("No equations stored");
        } else {
            for equation in equations {
                println!("{}: {}", equation.id, equation.infix);
            }
        }
    }

    fn print_value(
        self,
        infix: &str,
        variables: &HashMap<String, f64>,
        result: f64,
    ) {
        if self.json {
            self.print_json(&json!({
                "equation": infix,
                "variables": variables,
                "result": result,
            }));
        } else {
            println!("{} = {}", infix, result);
        }
    }

    fn print_solution(self, infix: &str, result: &SolveResult) {
        if self.json {
            self.print_json(&json!({
                "equation": infix,
                "variable": result.variable,
                "degree": result.degree,
                "coefficients": { "a": result.a, "b": result.b, "c": result.c },
                "solutions": result.solutions,
            }));
            return;
        }

        println!("{} = 0 (degree {})", infix, result.degree);
        if result.solutions.is_empty() {
            println!("no roots ({} is unconstrained)", result.variable);
        }
        for root in &result.solutions {
            println!("{} = {}", result.variable, root);
        }
    }

    fn print_deleted(self, id: EquationId) {
        if self.json {
            self.print_json(&json!({
                "message": "Equation deleted successfully",
                "equationId": id,
            }));
        } else {
            println!("Deleted equation {}", id);
        }
    }
}
