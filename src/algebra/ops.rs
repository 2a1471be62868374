//! [`Expression`] operations.

use crate::{
    algebra::{BinaryOperation, Expression, Operand, Parameter},
    ZERO_TOLERANCE,
};
use smol_str::SmolStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvaluationError {
    #[error("Missing variable value for '{name}'")]
    MissingVariable { name: SmolStr },
    #[error("Division by zero")]
    DivisionByZero,
}

/// Numerically evaluate an [`Expression`], using `lookup_parameter_value` to
/// get the value of each [`Parameter`].
///
/// Raising a negative number to a fractional power gives `NaN`, which is
/// passed through rather than treated as an error.
pub fn evaluate<F>(
    expr: &Expression,
    lookup_parameter_value: F,
) -> Result<f64, EvaluationError>
where
    F: Fn(&Parameter) -> Option<f64>,
{
    evaluate_with(expr, &lookup_parameter_value)
}

fn evaluate_with<F>(
    expr: &Expression,
    lookup_parameter_value: &F,
) -> Result<f64, EvaluationError>
where
    F: Fn(&Parameter) -> Option<f64>,
{
    match expr {
        Expression::Operand(Operand::Constant { value, .. }) => Ok(*value),
        Expression::Operand(Operand::Parameter(p)) => lookup_parameter_value(p)
            .ok_or_else(|| EvaluationError::MissingVariable {
                name: p.name().into(),
            }),
        Expression::Binary { left, right, op } => {
            let left = evaluate_with(left, lookup_parameter_value)?;
            let right = evaluate_with(right, lookup_parameter_value)?;

            match op {
                BinaryOperation::Plus => Ok(left + right),
                BinaryOperation::Minus => Ok(left - right),
                BinaryOperation::Times => Ok(left * right),
                BinaryOperation::Divide if right.abs() < ZERO_TOLERANCE => {
                    Err(EvaluationError::DivisionByZero)
                },
                BinaryOperation::Divide => Ok(left / right),
                BinaryOperation::Power => Ok(left.powf(right)),
            }
        },
    }
}
