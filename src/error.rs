//! Error and warning types.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A fatal configuration error, reported to the caller before any generation
/// runs.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
  /// The design space contains no variables.
  #[error("design space contains no variables")]
  EmptyDesignSpace,

  /// The objective set contains no objectives.
  #[error("objective set contains no objectives")]
  EmptyObjectiveSet,

  /// Two design variables share a name.
  #[error("duplicate design variable `{0}`")]
  DuplicateVariable(String),

  /// Two objectives share a name.
  #[error("duplicate objective `{0}`")]
  DuplicateObjective(String),

  /// A variable's bounds are inverted or non-finite.
  #[error("variable `{name}` has invalid bounds [{min}, {max}]")]
  InvalidBounds {
    /// Name of the offending variable.
    name: String,
    /// Lower bound.
    min: f64,
    /// Upper bound.
    max: f64,
  },

  /// A discrete variable's step is zero, negative or non-finite.
  #[error("variable `{name}` has invalid step {step}")]
  InvalidStep {
    /// Name of the offending variable.
    name: String,
    /// The rejected step.
    step: f64,
  },

  /// A categorical variable has no options to choose from.
  #[error("categorical variable `{0}` has no options")]
  EmptyOptions(String),

  /// An objective weight lies outside `[0, 1]`.
  #[error("objective `{name}` has weight {weight} outside [0, 1]")]
  InvalidWeight {
    /// Name of the offending objective.
    name: String,
    /// The rejected weight.
    weight: f64,
  },

  /// A configuration field has a value the engines cannot run with.
  #[error("invalid configuration: {0}")]
  InvalidConfig(String),
}

/// An error produced while evaluating a single candidate. These are recovered
/// locally: the candidate is marked infeasible with the worst possible
/// fitness and the run continues.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
pub enum EvaluationError {
  /// The evaluator itself failed.
  #[error("evaluator failed: {0}")]
  Failed(String),

  /// The evaluator returned no value for a configured objective.
  #[error("evaluator returned no value for objective `{0}`")]
  MissingObjective(String),

  /// The evaluator returned NaN or an infinity.
  #[error("non-finite value for `{0}`")]
  NonFinite(String),
}

/// A non-fatal condition recovered during a run and surfaced on the result.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
pub enum Warning {
  /// A candidate's evaluation failed and it was demoted to the worst
  /// possible fitness.
  #[error("generation {generation}: candidate evaluation failed: {source}")]
  EvaluationFailed {
    /// Generation in which the failure occurred.
    generation: usize,
    /// The underlying evaluation error.
    source: EvaluationError,
  },

  /// The final population contained no feasible candidate; the best
  /// infeasible one was returned instead.
  #[error("no feasible candidate found, returning best infeasible solution")]
  NoFeasibleSolution,

  /// An objective had identical values across an entire front, contributing
  /// nothing to diversity or compromise ranking.
  #[error("objective `{0}` is constant across the front")]
  DegenerateObjective(String),
}
