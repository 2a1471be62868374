use crate::{
    algebra::{Expression, Parameter, Polynomial},
    ZERO_TOLERANCE,
};
use arrayvec::ArrayVec;
use serde::Serialize;
use smol_str::SmolStr;
use std::collections::HashMap;
use thiserror::Error;

/// The real roots of an equation, in ascending order when `a > 0`.
pub type Solutions = ArrayVec<[f64; 2]>;

/// Solve `expr = 0` for `variable`, substituting the values of any other
/// variables from `knowns`.
///
/// # Note
///
/// If the equation simplifies to `0 = 0` then every value of `variable` is a
/// solution, but this is reported the same way as an equation with no
/// constraint at all: a [`SolveResult`] with no `solutions`.
pub fn solve(
    expr: &Expression,
    variable: &str,
    knowns: &HashMap<String, f64>,
) -> Result<SolveResult, SolveError> {
    let variable = Parameter::named(variable);
    let poly = Polynomial::extract(expr, &variable, knowns)?;
    tracing::trace!(%variable, polynomial = %poly, "Extracted polynomial");

    solve_polynomial(variable, &poly)
}

/// Find the real roots of a polynomial of degree 2 or less.
///
/// # Note
///
/// When the `x²` terms cancel out (`|a| < 1e-12`) the remaining `bx + c` is
/// solved as a linear equation rather than dividing by `2a`. The reported
/// `degree` is still 2.
pub fn solve_polynomial(
    variable: Parameter,
    poly: &Polynomial,
) -> Result<SolveResult, SolveError> {
    let degree = poly.degree();
    let a = poly.coefficient(2);
    let b = poly.coefficient(1);
    let c = poly.coefficient(0);

    let solutions = match degree {
        0 => constant_roots(c)?,
        1 => linear_roots(b, c)?,
        // the x² terms cancelled out
        2 if a.abs() < ZERO_TOLERANCE => linear_roots(b, c)?,
        2 => quadratic_roots(a, b, c)?,
        _ => return Err(SolveError::UnsupportedDegree { degree }),
    };

    Ok(SolveResult {
        variable,
        degree,
        a,
        b,
        c,
        solutions,
    })
}

fn constant_roots(c: f64) -> Result<Solutions, SolveError> {
    if c.abs() < ZERO_TOLERANCE {
        Ok(Solutions::new())
    } else {
        Err(SolveError::NoSolution { constant: c })
    }
}

fn linear_roots(b: f64, c: f64) -> Result<Solutions, SolveError> {
    if b.abs() < ZERO_TOLERANCE {
        return Err(SolveError::InvalidLinear);
    }

    let mut solutions = Solutions::new();
    solutions.push(-c / b);
    Ok(solutions)
}

/// The quadratic formula. Repeated roots are reported twice.
fn quadratic_roots(a: f64, b: f64, c: f64) -> Result<Solutions, SolveError> {
    let discriminant = b * b - 4.0 * a * c;

    if discriminant < -ZERO_TOLERANCE {
        return Err(SolveError::NoRealRoots { discriminant });
    }

    let sqrt_part = discriminant.max(0.0).sqrt();

    let mut solutions = Solutions::new();
    solutions.push((-b - sqrt_part) / (2.0 * a));
    solutions.push((-b + sqrt_part) / (2.0 * a));
    Ok(solutions)
}

/// The outcome of solving an equation for a single variable.
///
/// `a`, `b`, and `c` are the coefficients of `ax² + bx + c = 0`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SolveResult {
    pub variable: Parameter,
    pub degree: u32,
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub solutions: Solutions,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SolveError {
    #[error("Missing known value for '{name}' while solving for '{variable}'")]
    MissingKnown { name: SmolStr, variable: SmolStr },
    #[error("Division by zero")]
    DivisionByZero,
    #[error("Division by non-constant not supported for solving")]
    UnsupportedDivision,
    #[error(
        "Exponent must be a small integer 0..={} for polynomial construction",
        crate::algebra::MAX_EXPONENT
    )]
    UnsupportedExponent { exponent: Option<f64> },
    #[error("Only linear/quadratic equations supported (found degree {degree})")]
    UnsupportedDegree { degree: u32 },
    #[error("No solution (constant {constant} != 0)")]
    NoSolution { constant: f64 },
    #[error("Invalid linear equation (b=0)")]
    InvalidLinear,
    #[error("No real roots (discriminant {discriminant} < 0)")]
    NoRealRoots { discriminant: f64 },
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn solve_str(
        src: &str,
        knowns: &[(&str, f64)],
    ) -> Result<SolveResult, SolveError> {
        let expr: Expression = src.parse().unwrap();
        let knowns = knowns.iter().map(|(k, v)| (k.to_string(), *v)).collect();

        solve(&expr, "x", &knowns)
    }

    #[test]
    fn solve_a_linear_equation() {
        let got = solve_str("3x + 2", &[]).unwrap();

        assert_eq!(got.degree, 1);
        assert_eq!(got.variable, Parameter::named("x"));
        assert_eq!((got.a, got.b, got.c), (0.0, 3.0, 2.0));
        assert_eq!(got.solutions.len(), 1);
        assert_relative_eq!(got.solutions[0], -2.0 / 3.0);
    }

    #[test]
    fn solve_a_quadratic() {
        let got = solve_str("x^2 - 5x + 6", &[]).unwrap();

        assert_eq!(got.degree, 2);
        assert_eq!(got.solutions.as_slice(), &[2.0, 3.0]);
    }

    #[test]
    fn repeated_roots_are_not_deduplicated() {
        let got = solve_str("x^2 - 4x + 4", &[]).unwrap();

        assert_eq!(got.solutions.as_slice(), &[2.0, 2.0]);
    }

    #[test]
    fn solve_using_known_values() {
        let got = solve_str("k x^2 - 8", &[("k", 2.0)]).unwrap();

        assert_eq!(got.degree, 2);
        assert_relative_eq!(got.solutions[0], -2.0);
        assert_relative_eq!(got.solutions[1], 2.0);
    }

    #[test]
    fn identity_has_no_listed_solutions() {
        let got = solve_str("x - x", &[]);

        // x - x is still a degree 1 polynomial, just with a zero coefficient
        assert_eq!(got.unwrap_err(), SolveError::InvalidLinear);

        let got = solve_str("2 - 2", &[]).unwrap();
        assert_eq!(got.degree, 0);
        assert!(got.solutions.is_empty());
    }

    #[test]
    fn cancelled_squares_fall_back_to_linear() {
        let got = solve_str("x^2 - x^2 + 2x - 4", &[]).unwrap();

        assert_eq!(got.degree, 2);
        assert_eq!(got.a, 0.0);
        assert_eq!(got.solutions.as_slice(), &[2.0]);
    }

    #[test]
    fn unsolvable_equations() {
        let inputs = vec![
            ("x^2 + 1", SolveError::NoRealRoots { discriminant: -4.0 }),
            ("x^3 + 1", SolveError::UnsupportedDegree { degree: 3 }),
            ("(x^2)^3", SolveError::UnsupportedDegree { degree: 6 }),
            ("5", SolveError::NoSolution { constant: 5.0 }),
            ("0x + 1", SolveError::InvalidLinear),
        ];

        for (src, should_be) in inputs {
            let got = solve_str(src, &[]).unwrap_err();
            assert_eq!(got, should_be, "{}", src);
        }
    }

    #[test]
    fn deeply_nested_powers_are_rejected() {
        let nested = |inner: &str, levels: usize| {
            (0..levels).fold(inner.to_string(), |acc, _| format!("({})^3", acc))
        };

        let got = solve_str(&nested("x + 1", 9), &[]).unwrap_err();
        assert_eq!(got, SolveError::UnsupportedDegree { degree: 19683 });

        let got = solve_str(&nested("x", 21), &[]).unwrap_err();
        assert_eq!(got, SolveError::UnsupportedDegree { degree: u32::MAX });
    }

    #[test]
    fn degree_is_the_highest_power_present() {
        let inputs = vec![("4", 0), ("x + y", 1), ("y x^2 + x", 2)];

        for (src, should_be) in inputs {
            let got = solve_str(src, &[("y", 3.0)]);

            match got {
                Ok(result) => assert_eq!(result.degree, should_be, "{}", src),
                Err(SolveError::NoSolution { .. }) => assert_eq!(should_be, 0),
                Err(other) => panic!("{} failed: {}", src, other),
            }
        }
    }

    #[test]
    fn error_messages() {
        assert_eq!(
            SolveError::UnsupportedExponent { exponent: None }.to_string(),
            "Exponent must be a small integer 0..=3 for polynomial construction"
        );
        assert_eq!(
            SolveError::MissingKnown {
                name: "y".into(),
                variable: "x".into()
            }
            .to_string(),
            "Missing known value for 'y' while solving for 'x'"
        );
    }
}
