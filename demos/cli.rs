//! Solve each equation read from stdin for `x`.
//!
//! ```console
//! $ printf 'x^2 - 5x + 6\n3x + 2\n' | cargo run --example cli
//! ```

use algebra_solver::Expression;
use std::{
    collections::HashMap,
    io::{BufRead, BufReader},
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let stdin = std::io::stdin();
    let knowns = HashMap::new();

    for line in BufReader::new(stdin.lock()).lines() {
        let line = line?;
        let expr: Expression = match line.parse() {
            Ok(expr) => expr,
            Err(e) => {
                eprintln!("Unable to parse \"{}\": {}", line, e);
                continue;
            },
        };

        match algebra_solver::solve(&expr, "x", &knowns) {
            Ok(result) => {
                let roots: Vec<_> =
                    result.solutions.iter().map(ToString::to_string).collect();
                println!("{} = 0  =>  x = {{{}}}", expr, roots.join(", "));
            },
            Err(e) => eprintln!("Unable to solve \"{}\": {}", expr, e),
        }
    }

    Ok(())
}
