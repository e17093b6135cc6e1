//! Evaluation operators and their concurrent dispatch.
//!
//! The evaluator is supplied by the caller and is completely opaque to the
//! engines: it may run a structural model, query a service, or just apply a
//! formula. Both evaluator traits are implemented by closures, so the
//! simplest callers never name them:
//!
//! ```
//! use desopt::candidate::Candidate;
//! use desopt::error::EvaluationError;
//!
//! let evaluate = |c: &Candidate| -> Result<f64, EvaluationError> {
//!   Ok(-c.gene(0).and_then(|g| g.as_number()).unwrap_or(0.0))
//! };
//! # let _ = &evaluate as &dyn desopt::evaluation::EvaluateFitness;
//! ```
//!
//! All candidates of one generation are independent, so the engines dispatch
//! the whole batch through rayon and wait on it as a barrier; an evaluator
//! that is itself I/O-bound or CPU-bound parallelizes transparently. No
//! candidate ever observes another's partial results.

use std::collections::HashMap;

use rayon::prelude::*;

use crate::candidate::Candidate;
use crate::error::{EvaluationError, Warning};
use crate::objective::ObjectiveSet;

/// Evaluates a candidate to a single scalar fitness; larger is better.
pub trait EvaluateFitness: Sync {
  /// Returns the candidate's fitness.
  fn evaluate(&self, candidate: &Candidate) -> Result<f64, EvaluationError>;
}

impl<F> EvaluateFitness for F
where
  F: Fn(&Candidate) -> Result<f64, EvaluationError> + Sync,
{
  fn evaluate(&self, candidate: &Candidate) -> Result<f64, EvaluationError> {
    self(candidate)
  }
}

/// Evaluates a candidate to a value per objective name.
///
/// The returned map must contain every name of the active
/// [`ObjectiveSet`]; missing names and non-finite values are evaluation
/// errors that demote the candidate rather than abort the run.
pub trait EvaluateObjectives: Sync {
  /// Returns the candidate's objective values keyed by objective name.
  fn evaluate(
    &self,
    candidate: &Candidate,
  ) -> Result<HashMap<String, f64>, EvaluationError>;
}

impl<F> EvaluateObjectives for F
where
  F: Fn(&Candidate) -> Result<HashMap<String, f64>, EvaluationError> + Sync,
{
  fn evaluate(
    &self,
    candidate: &Candidate,
  ) -> Result<HashMap<String, f64>, EvaluationError> {
    self(candidate)
  }
}

/// Evaluates a whole generation concurrently in fitness mode and applies the
/// results. Failed candidates are marked infeasible with `-∞` fitness, never
/// silently coerced to zero. Returns the number of evaluations dispatched.
pub(crate) fn evaluate_fitness_batch<E: EvaluateFitness>(
  population: &mut [Candidate],
  evaluator: &E,
  generation: usize,
  warnings: &mut Vec<Warning>,
) -> usize {
  let results: Vec<Result<f64, EvaluationError>> = population
    .par_iter()
    .map(|candidate| {
      evaluator.evaluate(candidate).and_then(|fitness| {
        if fitness.is_finite() {
          Ok(fitness)
        } else {
          Err(EvaluationError::NonFinite("fitness".into()))
        }
      })
    })
    .collect();

  for (candidate, result) in population.iter_mut().zip(results) {
    match result {
      Ok(fitness) => candidate.set_fitness(fitness, true),
      Err(source) => {
        log::warn!("generation {generation}: evaluation failed: {source}");
        candidate.set_fitness(f64::NEG_INFINITY, false);
        warnings.push(Warning::EvaluationFailed { generation, source });
      }
    }
  }
  population.len()
}

/// Evaluates a whole generation concurrently in multi-objective mode and
/// applies the results: objective values resolved against the fixed schema,
/// feasibility from constraint bounds, and the weighted scalar fitness used
/// for tie-breaking and reporting. Returns the number of evaluations
/// dispatched.
pub(crate) fn evaluate_objectives_batch<E: EvaluateObjectives>(
  population: &mut [Candidate],
  evaluator: &E,
  objectives: &ObjectiveSet,
  generation: usize,
  warnings: &mut Vec<Warning>,
) -> usize {
  let results: Vec<Result<Vec<f64>, EvaluationError>> = population
    .par_iter()
    .map(|candidate| {
      evaluator
        .evaluate(candidate)
        .and_then(|values| resolve_values(&values, objectives))
    })
    .collect();

  for (candidate, result) in population.iter_mut().zip(results) {
    match result {
      Ok(values) => {
        let constraints = objectives.constraint_values(&values);
        let feasible = objectives.feasible(&values);
        let fitness = objectives.weighted_fitness(&values);
        candidate.set_objectives(values, constraints, fitness, feasible);
      }
      Err(source) => {
        log::warn!("generation {generation}: evaluation failed: {source}");
        let worst = objectives.worst_values();
        let constraints = objectives.constraint_values(&worst);
        candidate.set_objectives(
          worst,
          constraints,
          f64::NEG_INFINITY,
          false,
        );
        warnings.push(Warning::EvaluationFailed { generation, source });
      }
    }
  }
  population.len()
}

/// Lays a name→value map out in objective schema order, rejecting missing
/// names and non-finite values.
fn resolve_values(
  values: &HashMap<String, f64>,
  objectives: &ObjectiveSet,
) -> Result<Vec<f64>, EvaluationError> {
  objectives
    .objectives()
    .iter()
    .map(|objective| {
      let value = values
        .get(objective.name())
        .copied()
        .ok_or_else(|| {
          EvaluationError::MissingObjective(objective.name().into())
        })?;
      if value.is_finite() {
        Ok(value)
      } else {
        Err(EvaluationError::NonFinite(objective.name().into()))
      }
    })
    .collect()
}
