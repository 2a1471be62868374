use crate::algebra::{
    ops::{self, EvaluationError},
    ParseError,
};
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::{
    collections::{BTreeSet, HashMap},
    fmt::{self, Display, Formatter},
    ops::{Add, Div, Mul, Sub},
    str::FromStr,
};

/// An expression tree.
///
/// Every leaf is an [`Operand`] and every interior node is a binary
/// operation. Children are owned outright, so a tree can't contain cycles or
/// shared sub-trees.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Operand(Operand),
    /// An expression involving two operands.
    Binary {
        left: Box<Expression>,
        right: Box<Expression>,
        op: BinaryOperation,
    },
}

impl Expression {
    /// A numeric constant, rendered the way Rust formats `value`.
    pub fn constant(value: f64) -> Self {
        Expression::Operand(Operand::Constant {
            value,
            text: value.to_string().into(),
        })
    }

    pub fn parameter<S: Into<SmolStr>>(name: S) -> Self {
        Expression::Operand(Operand::Parameter(Parameter::named(name)))
    }

    pub fn binary(left: Expression, op: BinaryOperation, right: Expression) -> Self {
        Expression::Binary {
            left: Box::new(left),
            right: Box::new(right),
            op,
        }
    }

    /// Iterate over all the [`Parameter`]s in this expression, in the order
    /// they appear (duplicates included).
    pub fn params(&self) -> impl Iterator<Item = &Parameter> + '_ {
        Params { pending: vec![self] }
    }

    /// The distinct variables this expression refers to, sorted by name.
    pub fn variables(&self) -> BTreeSet<Parameter> {
        self.params().cloned().collect()
    }

    /// Evaluate the expression using a set of variable bindings.
    pub fn evaluate(
        &self,
        bindings: &HashMap<String, f64>,
    ) -> Result<f64, EvaluationError> {
        ops::evaluate(self, |p: &Parameter| bindings.get(p.name()).copied())
    }

    fn precedence(&self) -> Option<u8> {
        match self {
            Expression::Operand(_) => None,
            Expression::Binary { op, .. } => Some(op.precedence()),
        }
    }
}

impl FromStr for Expression {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> { crate::algebra::parse(s) }
}

/// A leaf in the [`Expression`] tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// A number, along with the literal text it was written as.
    Constant { value: f64, text: SmolStr },
    Parameter(Parameter),
}

impl Display for Operand {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            // integers are printed without a trailing fraction, and adding
            // 0.0 turns -0 into 0
            Operand::Constant { value, .. } if value.fract() == 0.0 => {
                write!(f, "{}", value + 0.0)
            },
            Operand::Constant { text, .. } => write!(f, "{}", text),
            Operand::Parameter(p) => write!(f, "{}", p),
        }
    }
}

/// A named variable.
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
)]
#[serde(transparent)]
pub struct Parameter {
    name: SmolStr,
}

impl Parameter {
    pub fn named<S: Into<SmolStr>>(name: S) -> Self {
        Parameter { name: name.into() }
    }

    pub fn name(&self) -> &str { &self.name }
}

impl Display for Parameter {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// An operation that can be applied to two arguments.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BinaryOperation {
    Plus,
    Minus,
    Times,
    Divide,
    Power,
}

impl BinaryOperation {
    pub fn precedence(self) -> u8 {
        match self {
            BinaryOperation::Plus | BinaryOperation::Minus => 1,
            BinaryOperation::Times | BinaryOperation::Divide => 2,
            BinaryOperation::Power => 3,
        }
    }

    pub fn is_right_associative(self) -> bool {
        self == BinaryOperation::Power
    }

    pub fn symbol(self) -> char {
        match self {
            BinaryOperation::Plus => '+',
            BinaryOperation::Minus => '-',
            BinaryOperation::Times => '*',
            BinaryOperation::Divide => '/',
            BinaryOperation::Power => '^',
        }
    }
}

impl Display for BinaryOperation {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

// define some operator overloads to make constructing an expression easier.

impl Add for Expression {
    type Output = Expression;

    fn add(self, rhs: Expression) -> Expression {
        Expression::binary(self, BinaryOperation::Plus, rhs)
    }
}

impl Sub for Expression {
    type Output = Expression;

    fn sub(self, rhs: Expression) -> Expression {
        Expression::binary(self, BinaryOperation::Minus, rhs)
    }
}

impl Mul for Expression {
    type Output = Expression;

    fn mul(self, rhs: Expression) -> Expression {
        Expression::binary(self, BinaryOperation::Times, rhs)
    }
}

impl Div for Expression {
    type Output = Expression;

    fn div(self, rhs: Expression) -> Expression {
        Expression::binary(self, BinaryOperation::Divide, rhs)
    }
}

impl Display for Expression {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Operand(operand) => write!(f, "{}", operand),
            Expression::Binary { left, right, op } => {
                let precedence = op.precedence();

                // a child with the same precedence only needs parentheses
                // when it sits on the side the operator doesn't associate
                // towards
                let wrap_left = match left.precedence() {
                    Some(p) => {
                        p < precedence
                            || (p == precedence && op.is_right_associative())
                    },
                    None => false,
                };
                let wrap_right = match right.precedence() {
                    Some(p) => {
                        p < precedence
                            || (p == precedence && !op.is_right_associative())
                    },
                    None => false,
                };

                write_child(left, wrap_left, f)?;
                write!(f, " {} ", op)?;
                write_child(right, wrap_right, f)
            },
        }
    }
}

fn write_child(
    expr: &Expression,
    parenthesize: bool,
    f: &mut Formatter<'_>,
) -> fmt::Result {
    if parenthesize {
        write!(f, "({})", expr)
    } else {
        write!(f, "{}", expr)
    }
}

/// A depth-first walk over an [`Expression`]'s parameters.
struct Params<'a> {
    pending: Vec<&'a Expression>,
}

impl<'a> Iterator for Params<'a> {
    type Item = &'a Parameter;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(expr) = self.pending.pop() {
            match expr {
                Expression::Operand(Operand::Parameter(p)) => return Some(p),
                Expression::Operand(Operand::Constant { .. }) => {},
                Expression::Binary { left, right, .. } => {
                    self.pending.push(right);
                    self.pending.push(left);
                },
            }
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display() {
        let x = || Expression::parameter("x");
        let inputs = vec![
            (Expression::constant(3.0), "3"),
            (Expression::constant(-2.5), "-2.5"),
            (Expression::constant(1.0) + Expression::constant(1.0), "1 + 1"),
            (Expression::constant(1.0) - Expression::constant(1.0), "1 - 1"),
            (Expression::constant(1.0) * Expression::constant(1.0), "1 * 1"),
            (Expression::constant(1.0) / Expression::constant(1.0), "1 / 1"),
            (
                (Expression::constant(1.0) + Expression::constant(2.0))
                    / Expression::constant(3.0),
                "(1 + 2) / 3",
            ),
            (
                Expression::constant(1.0)
                    - (Expression::constant(2.0) - Expression::constant(3.0)),
                "1 - (2 - 3)",
            ),
            (
                (Expression::constant(1.0) - Expression::constant(2.0))
                    - Expression::constant(3.0),
                "1 - 2 - 3",
            ),
            (
                Expression::binary(
                    x(),
                    BinaryOperation::Power,
                    Expression::binary(
                        Expression::constant(3.0),
                        BinaryOperation::Power,
                        Expression::constant(2.0),
                    ),
                ),
                "x ^ 3 ^ 2",
            ),
            (
                Expression::binary(
                    Expression::binary(
                        x(),
                        BinaryOperation::Power,
                        Expression::constant(3.0),
                    ),
                    BinaryOperation::Power,
                    Expression::constant(2.0),
                ),
                "(x ^ 3) ^ 2",
            ),
            (
                Expression::constant(2.0) * x() + Expression::constant(1.0),
                "2 * x + 1",
            ),
        ];

        for (expr, should_be) in inputs {
            let got = expr.to_string();
            assert_eq!(got, should_be);
        }
    }

    #[test]
    fn constants_keep_their_original_text() {
        let expr = Expression::Operand(Operand::Constant {
            value: 1.5,
            text: "1.50".into(),
        });
        assert_eq!(expr.to_string(), "1.50");

        let integral = Expression::Operand(Operand::Constant {
            value: 4.0,
            text: "4.000".into(),
        });
        assert_eq!(integral.to_string(), "4");
    }

    #[test]
    fn negative_zero_is_printed_as_zero() {
        let inputs = vec![("-0", "0"), ("-0.0", "0"), ("x * -0", "x * 0")];

        for (src, should_be) in inputs {
            let got: Expression = src.parse().unwrap();
            assert_eq!(got.to_string(), should_be, "{}", src);
        }
        assert_eq!(Expression::constant(-0.0).to_string(), "0");
    }

    #[test]
    fn variables_are_distinct_and_sorted() {
        let expr = Expression::parameter("y") * Expression::parameter("x")
            + Expression::parameter("y")
            - Expression::constant(1.0);

        let got: Vec<_> =
            expr.variables().iter().map(|p| p.to_string()).collect();

        assert_eq!(got, vec!["x", "y"]);
        assert_eq!(expr.params().count(), 3);
    }
}
