//! Reducing an [`Expression`] to a polynomial in a single variable.

use crate::{
    algebra::{BinaryOperation, Expression, Operand, Parameter},
    SolveError, ZERO_TOLERANCE,
};
use std::{
    collections::{BTreeMap, HashMap},
    fmt::{self, Display, Formatter},
};

/// The largest exponent [`Polynomial::extract()`] will expand.
pub const MAX_EXPONENT: u32 = 3;

/// How far an exponent may be from a whole number and still count as one.
const INTEGER_TOLERANCE: f64 = 1e-9;

/// The highest degree [`Polynomial::extract()`] expands term by term.
const MAX_EXPANDED_DEGREE: u32 = 2;

/// A sparse polynomial in one variable, mapping each degree to its
/// coefficient.
///
/// A missing degree has a coefficient of zero. Degrees whose terms cancelled
/// out are still present, so [`Polynomial::degree()`] reports the highest
/// power that appeared in the original expression.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Polynomial {
    coefficients: BTreeMap<u32, f64>,
}

impl Polynomial {
    pub fn constant(value: f64) -> Self {
        let mut coefficients = BTreeMap::new();
        coefficients.insert(0, value);
        Polynomial { coefficients }
    }

    /// The polynomial `x`.
    pub fn linear() -> Self {
        let mut coefficients = BTreeMap::new();
        coefficients.insert(1, 1.0);
        Polynomial { coefficients }
    }

    /// Reduce `expr` to a polynomial in `variable`, substituting the value
    /// of every other variable from `knowns`.
    ///
    /// Only the algebra needed for linear and quadratic equations is
    /// supported. Division is only allowed by a constant, and exponents must
    /// be constant whole numbers between 0 and [`MAX_EXPONENT`]. Anything
    /// above degree 2 fails with [`SolveError::UnsupportedDegree`] without
    /// being expanded.
    pub fn extract(
        expr: &Expression,
        variable: &Parameter,
        knowns: &HashMap<String, f64>,
    ) -> Result<Self, SolveError> {
        match reduce(expr, variable, knowns)? {
            Reduced::Expanded(mut poly) => {
                poly.snap_to_zero();
                Ok(poly)
            },
            Reduced::TooHigh { degree } => {
                Err(SolveError::UnsupportedDegree { degree })
            },
        }
    }

    /// The highest degree present, or `0` for an empty polynomial.
    pub fn degree(&self) -> u32 {
        self.coefficients.keys().next_back().copied().unwrap_or(0)
    }

    pub fn coefficient(&self, degree: u32) -> f64 {
        self.coefficients.get(&degree).copied().unwrap_or(0.0)
    }

    /// Iterate over the `(degree, coefficient)` pairs, lowest degree first.
    pub fn terms(&self) -> impl Iterator<Item = (u32, f64)> + '_ {
        self.coefficients.iter().map(|(&d, &c)| (d, c))
    }

    /// The value of this polynomial if it is a single constant term.
    pub fn as_constant(&self) -> Option<f64> {
        match self.coefficients.len() {
            1 => self.coefficients.get(&0).copied(),
            _ => None,
        }
    }

    pub fn add(&self, other: &Polynomial) -> Polynomial {
        let mut coefficients = self.coefficients.clone();

        for (&degree, &coefficient) in &other.coefficients {
            *coefficients.entry(degree).or_insert(0.0) += coefficient;
        }

        Polynomial { coefficients }
    }

    pub fn scale(&self, factor: f64) -> Polynomial {
        Polynomial {
            coefficients: self
                .coefficients
                .iter()
                .map(|(&d, &c)| (d, c * factor))
                .collect(),
        }
    }

    /// Multiply two polynomials (the Cauchy product of their coefficients).
    pub fn mul(&self, other: &Polynomial) -> Result<Polynomial, SolveError> {
        let mut coefficients = BTreeMap::new();

        for (&d1, &c1) in &self.coefficients {
            for (&d2, &c2) in &other.coefficients {
                let degree = d1.checked_add(d2).ok_or(
                    SolveError::UnsupportedDegree { degree: u32::MAX },
                )?;
                *coefficients.entry(degree).or_insert(0.0) += c1 * c2;
            }
        }

        Ok(Polynomial { coefficients })
    }

    pub fn pow(&self, exponent: u32) -> Result<Polynomial, SolveError> {
        (0..exponent)
            .try_fold(Polynomial::constant(1.0), |acc, _| acc.mul(self))
    }

    fn snap_to_zero(&mut self) {
        for coefficient in self.coefficients.values_mut() {
            if coefficient.abs() < ZERO_TOLERANCE {
                *coefficient = 0.0;
            }
        }
    }
}

impl Display for Polynomial {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.coefficients.is_empty() {
            return write!(f, "0");
        }

        for (i, (degree, coefficient)) in
            self.coefficients.iter().rev().enumerate()
        {
            if i > 0 {
                write!(f, " + ")?;
            }

            match degree {
                0 => write!(f, "{}", coefficient)?,
                1 => write!(f, "{}x", coefficient)?,
                _ => write!(f, "{}x^{}", coefficient, degree)?,
            }
        }

        Ok(())
    }
}

/// The result of reducing a subtree.
///
/// Terms only ever disappear through `^0`, so once a subtree goes past
/// [`MAX_EXPANDED_DEGREE`] the whole expression can't be solved and only its
/// degree is tracked.
#[derive(Debug, Clone, PartialEq)]
enum Reduced {
    Expanded(Polynomial),
    TooHigh { degree: u32 },
}

impl Reduced {
    fn degree(&self) -> u32 {
        match self {
            Reduced::Expanded(poly) => poly.degree(),
            Reduced::TooHigh { degree } => *degree,
        }
    }

    fn as_constant(&self) -> Option<f64> {
        match self {
            Reduced::Expanded(poly) => poly.as_constant(),
            Reduced::TooHigh { .. } => None,
        }
    }
}

fn reduce(
    expr: &Expression,
    variable: &Parameter,
    knowns: &HashMap<String, f64>,
) -> Result<Reduced, SolveError> {
    let (left, right, op) = match expr {
        Expression::Operand(Operand::Constant { value, .. }) => {
            return Ok(Reduced::Expanded(Polynomial::constant(*value)));
        },
        Expression::Operand(Operand::Parameter(p)) if p == variable => {
            return Ok(Reduced::Expanded(Polynomial::linear()));
        },
        Expression::Operand(Operand::Parameter(p)) => {
            return knowns
                .get(p.name())
                .map(|&value| Reduced::Expanded(Polynomial::constant(value)))
                .ok_or_else(|| SolveError::MissingKnown {
                    name: p.name().into(),
                    variable: variable.name().into(),
                });
        },
        Expression::Binary { left, right, op } => (left, right, *op),
    };

    let left = reduce(left, variable, knowns)?;
    let right = reduce(right, variable, knowns)?;

    match op {
        BinaryOperation::Plus | BinaryOperation::Minus => {
            match (left, right) {
                (Reduced::Expanded(l), Reduced::Expanded(r)) => {
                    let r = if op == BinaryOperation::Minus {
                        r.scale(-1.0)
                    } else {
                        r
                    };
                    Ok(Reduced::Expanded(l.add(&r)))
                },
                (l, r) => Ok(Reduced::TooHigh {
                    degree: l.degree().max(r.degree()),
                }),
            }
        },
        BinaryOperation::Times => {
            let degree = left.degree().saturating_add(right.degree());

            match (left, right) {
                (Reduced::Expanded(l), Reduced::Expanded(r))
                    if degree <= MAX_EXPANDED_DEGREE =>
                {
                    Ok(Reduced::Expanded(l.mul(&r)?))
                },
                _ => Ok(Reduced::TooHigh { degree }),
            }
        },
        BinaryOperation::Divide => {
            let divisor =
                right.as_constant().ok_or(SolveError::UnsupportedDivision)?;

            if divisor.abs() < ZERO_TOLERANCE {
                return Err(SolveError::DivisionByZero);
            }

            match left {
                Reduced::Expanded(l) => {
                    Ok(Reduced::Expanded(l.scale(1.0 / divisor)))
                },
                too_high => Ok(too_high),
            }
        },
        BinaryOperation::Power => {
            let exponent = small_integer_exponent(&right)?;
            let degree = left.degree().saturating_mul(exponent);

            match left {
                _ if exponent == 0 => {
                    Ok(Reduced::Expanded(Polynomial::constant(1.0)))
                },
                Reduced::Expanded(l) if degree <= MAX_EXPANDED_DEGREE => {
                    Ok(Reduced::Expanded(l.pow(exponent)?))
                },
                _ => Ok(Reduced::TooHigh { degree }),
            }
        },
    }
}

fn small_integer_exponent(exponent: &Reduced) -> Result<u32, SolveError> {
    let value = exponent.as_constant();

    match value {
        Some(value) => {
            let rounded = value.round();

            if (value - rounded).abs() < INTEGER_TOLERANCE
                && rounded >= 0.0
                && rounded <= f64::from(MAX_EXPONENT)
            {
                Ok(rounded as u32)
            } else {
                Err(SolveError::UnsupportedExponent {
                    exponent: Some(value),
                })
            }
        },
        None => Err(SolveError::UnsupportedExponent { exponent: None }),
    }
}
