//! The symbolic algebra system.

mod expr;
pub mod ops;
mod parse;
mod polynomial;

#[cfg(test)]
mod proptests;

pub use expr::{BinaryOperation, Expression, Operand, Parameter};
pub use ops::EvaluationError;
pub use parse::{parse, ParseError};
pub use polynomial::{Polynomial, MAX_EXPONENT};
