//! Parse, evaluate, and solve single-variable algebraic equations.
//!
//! ```rust
//! use algebra_solver::Expression;
//! use std::collections::HashMap;
//!
//! let expr: Expression = "x^2 - 5x + 6".parse().unwrap();
//! assert_eq!(expr.to_string(), "x ^ 2 - 5 * x + 6");
//!
//! let got = algebra_solver::solve(&expr, "x", &HashMap::new()).unwrap();
//! assert_eq!(got.degree, 2);
//! assert_eq!(got.solutions.as_slice(), &[2.0, 3.0]);
//! ```

#[cfg(test)]
#[macro_use]
extern crate pretty_assertions;

pub mod algebra;
mod equations;
mod solve;

pub use algebra::{
    ops, parse, BinaryOperation, EvaluationError, Expression, Operand,
    Parameter, ParseError, Polynomial,
};
pub use equations::{Equation, EquationId, EquationStore, Error};
pub use solve::{solve, solve_polynomial, SolveError, SolveResult, Solutions};

/// Coefficients and divisors smaller than this are treated as zero.
pub const ZERO_TOLERANCE: f64 = 1e-12;
