//! Best-compromise selection with TOPSIS.
//!
//! Given a Pareto front no member of which beats another outright, TOPSIS
//! picks the candidate closest to the ideal point (the best observed value
//! per objective) and farthest from the anti-ideal point, after normalizing
//! and weighting each objective column.

use itertools::Itertools;

use crate::candidate::Candidate;
use crate::objective::{Direction, ObjectiveSet};
use crate::result::OptimizationResult;

/// Computes each row's relative closeness to the ideal solution, in
/// `[0, 1]`; larger is better.
///
/// Zero-norm or otherwise degenerate columns contribute zero instead of
/// raising a division fault, so constant objectives simply drop out of the
/// ranking.
pub fn closeness(rows: &[&[f64]], objectives: &ObjectiveSet) -> Vec<f64> {
  let m = rows.len();
  if m == 0 {
    return Vec::new();
  }
  let n = objectives.len();

  // weighted, norm-scaled decision matrix, column by column
  let mut weighted = vec![vec![0.0; n]; m];
  for (j, objective) in objectives.objectives().iter().enumerate() {
    let norm = rows
      .iter()
      .map(|row| row[j] * row[j])
      .sum::<f64>()
      .sqrt();
    for (i, row) in rows.iter().enumerate() {
      let scaled = if norm > 0.0 { row[j] / norm } else { 0.0 };
      weighted[i][j] = if scaled.is_finite() {
        scaled * objective.weight()
      } else {
        0.0
      };
    }
  }

  // ideal and anti-ideal points per column, respecting direction
  let mut ideal = vec![0.0; n];
  let mut anti = vec![0.0; n];
  for (j, objective) in objectives.objectives().iter().enumerate() {
    let (min, max) = match weighted.iter().map(|row| row[j]).minmax() {
      itertools::MinMaxResult::NoElements => (0.0, 0.0),
      itertools::MinMaxResult::OneElement(v) => (v, v),
      itertools::MinMaxResult::MinMax(min, max) => (min, max),
    };
    match objective.direction() {
      Direction::Minimize => {
        ideal[j] = min;
        anti[j] = max;
      }
      Direction::Maximize => {
        ideal[j] = max;
        anti[j] = min;
      }
    }
  }

  weighted
    .iter()
    .map(|row| {
      let to_ideal = distance(row, &ideal);
      let to_anti = distance(row, &anti);
      let total = to_ideal + to_anti;
      if total > 0.0 {
        to_anti / total
      } else {
        0.0
      }
    })
    .collect()
}

/// Selects the best-compromise candidate of a Pareto front. Returns `None`
/// only for an empty front. Ties resolve to the earliest candidate, so
/// re-running on an unchanged front returns the same member.
pub fn best_compromise<'a>(
  front: &'a [Candidate],
  objectives: &ObjectiveSet,
) -> Option<&'a Candidate> {
  let rows: Vec<&[f64]> = front.iter().map(Candidate::objectives).collect();
  best_index(&closeness(&rows, objectives)).map(|i| &front[i])
}

/// Selects the best-compromise result out of a multi-objective run's
/// output. Returns `None` only for an empty front.
pub fn best_compromise_result<'a>(
  results: &'a [OptimizationResult],
  objectives: &ObjectiveSet,
) -> Option<&'a OptimizationResult> {
  let rows: Vec<&[f64]> = results
    .iter()
    .map(|result| result.candidate.objectives())
    .collect();
  best_index(&closeness(&rows, objectives)).map(|i| &results[i])
}

/// Index of the first maximum closeness value.
pub(crate) fn best_index(closeness: &[f64]) -> Option<usize> {
  let mut best: Option<(usize, f64)> = None;
  for (i, &c) in closeness.iter().enumerate() {
    match best {
      Some((_, current)) if c <= current => {}
      _ => best = Some((i, c)),
    }
  }
  best.map(|(i, _)| i)
}

fn distance(a: &[f64], b: &[f64]) -> f64 {
  a.iter()
    .zip(b)
    .map(|(x, y)| (x - y) * (x - y))
    .sum::<f64>()
    .sqrt()
}
