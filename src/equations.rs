use crate::{
    algebra::{EvaluationError, Expression, Parameter, ParseError},
    solve::{self, SolveError, SolveResult},
};
use serde::Serialize;
use std::{
    collections::{BTreeMap, BTreeSet, HashMap},
    fmt::{self, Display, Formatter},
    num::ParseIntError,
    str::FromStr,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, RwLock,
    },
};
use thiserror::Error;

/// The variable [`EquationStore::solve()`] solves for when none is given.
pub const DEFAULT_VARIABLE: &str = "x";

/// The identifier assigned to an [`Equation`] when it is stored.
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize,
)]
#[serde(transparent)]
pub struct EquationId(u64);

impl Display for EquationId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for EquationId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(EquationId)
    }
}

/// A parsed equation, along with the information we show to users.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Equation {
    pub id: EquationId,
    /// The normalized infix form, reconstructed from the expression tree.
    pub infix: String,
    pub variables: BTreeSet<Parameter>,
    #[serde(skip)]
    pub expression: Expression,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error("Equation id {0} not found")]
    NotFound(EquationId),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Evaluation(#[from] EvaluationError),
    #[error(transparent)]
    Solve(#[from] SolveError),
}

impl Error {
    /// Is this a well-formed request whose arithmetic has no answer (dividing
    /// by zero while evaluating, or a quadratic with no real roots)?
    pub fn is_math_error(&self) -> bool {
        match self {
            Error::Evaluation(EvaluationError::DivisionByZero)
            | Error::Solve(SolveError::NoRealRoots { .. }) => true,
            _ => false,
        }
    }

    /// Did the caller leave out a value the equation needs?
    pub fn is_invalid_input(&self) -> bool {
        match self {
            Error::Evaluation(EvaluationError::MissingVariable { .. }) => true,
            _ => false,
        }
    }
}

/// An in-memory collection of parsed equations.
///
/// Every stored [`Equation`] is immutable and handed out behind an [`Arc`],
/// so readers always see one complete expression tree even while other
/// threads are storing or deleting equations.
#[derive(Debug, Default)]
pub struct EquationStore {
    equations: RwLock<BTreeMap<EquationId, Arc<Equation>>>,
    last_id: AtomicU64,
}

impl EquationStore {
    pub fn new() -> Self { EquationStore::default() }

    /// Parse an equation and save it, assigning it a new [`EquationId`].
    pub fn store(&self, src: &str) -> Result<Arc<Equation>, Error> {
        let expression: Expression = src.parse()?;
        let id = EquationId(self.last_id.fetch_add(1, Ordering::SeqCst) + 1);

        let equation = Arc::new(Equation {
            id,
            infix: expression.to_string(),
            variables: expression.variables(),
            expression,
        });

        self.write().insert(id, Arc::clone(&equation));
        tracing::info!(%id, infix = %equation.infix, "Stored equation");

        Ok(equation)
    }

    pub fn get(&self, id: EquationId) -> Result<Arc<Equation>, Error> {
        match self.read().get(&id) {
            Some(equation) => Ok(Arc::clone(equation)),
            None => {
                tracing::warn!(%id, "Equation not found");
                Err(Error::NotFound(id))
            },
        }
    }

    /// All stored equations, ordered by [`EquationId`].
    pub fn list(&self) -> Vec<Arc<Equation>> {
        self.read().values().cloned().collect()
    }

    pub fn delete(&self, id: EquationId) -> Result<(), Error> {
        match self.write().remove(&id) {
            Some(_) => {
                tracing::info!(%id, "Deleted equation");
                Ok(())
            },
            None => {
                tracing::warn!(%id, "Equation not found");
                Err(Error::NotFound(id))
            },
        }
    }

    pub fn len(&self) -> usize { self.read().len() }

    pub fn is_empty(&self) -> bool { self.read().is_empty() }

    /// Evaluate a stored equation using the provided variable values.
    pub fn evaluate(
        &self,
        id: EquationId,
        variables: &HashMap<String, f64>,
    ) -> Result<f64, Error> {
        let equation = self.get(id)?;
        let result = equation.expression.evaluate(variables)?;
        tracing::debug!(%id, result, "Evaluated equation");

        Ok(result)
    }

    /// Solve a stored equation for `variable`, falling back to
    /// [`DEFAULT_VARIABLE`] when it is missing or blank.
    pub fn solve(
        &self,
        id: EquationId,
        variable: Option<&str>,
        knowns: &HashMap<String, f64>,
    ) -> Result<SolveResult, Error> {
        let variable = match variable.map(str::trim) {
            Some(v) if !v.is_empty() => v,
            _ => DEFAULT_VARIABLE,
        };
        let equation = self.get(id)?;
        let result = solve::solve(&equation.expression, variable, knowns)?;

        tracing::debug!(
            %id,
            variable,
            degree = result.degree,
            a = result.a,
            b = result.b,
            c = result.c,
            "Solved equation"
        );

        Ok(result)
    }

    // The map is only changed by single insert/remove calls, so a poisoned
    // lock still guards a consistent map.

    fn read(
        &self,
    ) -> std::sync::RwLockReadGuard<'_, BTreeMap<EquationId, Arc<Equation>>>
    {
        self.equations
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(
        &self,
    ) -> std::sync::RwLockWriteGuard<'_, BTreeMap<EquationId, Arc<Equation>>>
    {
        self.equations
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
