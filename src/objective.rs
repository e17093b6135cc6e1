//! Objectives, scalarization and Pareto dominance.
//!
//! The active [`ObjectiveSet`] is fixed per run: objective order and the
//! name→index table are frozen at construction, so evaluator output is
//! resolved against a known schema and typos surface on the very first
//! evaluation instead of silently producing zeros.

use std::cmp::Ordering;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Whether an objective is to be minimized or maximized.
///
/// Internally every comparison normalizes to "lower is better"; the direction
/// only matters at the crate boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
  /// Smaller values win.
  Minimize,
  /// Larger values win.
  Maximize,
}

/// Feasibility bounds on an objective's value.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ConstraintBounds {
  /// Smallest admissible value, if bounded below.
  pub min: Option<f64>,
  /// Largest admissible value, if bounded above.
  pub max: Option<f64>,
}

impl ConstraintBounds {
  /// Whether a value satisfies these bounds.
  pub fn satisfied_by(&self, value: f64) -> bool {
    self.min.map_or(true, |m| value >= m)
      && self.max.map_or(true, |m| value <= m)
  }
}

/// One optimization criterion: a name the evaluator reports a value under, a
/// direction, a scalarization weight and optional feasibility bounds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Objective {
  name: String,
  direction: Direction,
  weight: f64,
  priority: u32,
  constraint: Option<ConstraintBounds>,
  units: Option<String>,
}

impl Objective {
  /// Creates a minimized objective with weight 1.
  pub fn minimize(name: impl Into<String>) -> Self {
    Self::new(name, Direction::Minimize)
  }

  /// Creates a maximized objective with weight 1.
  pub fn maximize(name: impl Into<String>) -> Self {
    Self::new(name, Direction::Maximize)
  }

  fn new(name: impl Into<String>, direction: Direction) -> Self {
    Self {
      name: name.into(),
      direction,
      weight: 1.0,
      priority: 0,
      constraint: None,
      units: None,
    }
  }

  /// Sets the scalarization weight, expected in `[0, 1]`.
  pub fn with_weight(mut self, weight: f64) -> Self {
    self.weight = weight;
    self
  }

  /// Sets the informational priority.
  pub fn with_priority(mut self, priority: u32) -> Self {
    self.priority = priority;
    self
  }

  /// Adds feasibility bounds on this objective's value.
  pub fn with_constraint(mut self, constraint: ConstraintBounds) -> Self {
    self.constraint = Some(constraint);
    self
  }

  /// Attaches a unit label.
  pub fn with_units(mut self, units: impl Into<String>) -> Self {
    self.units = Some(units.into());
    self
  }

  /// The objective's unique name.
  pub fn name(&self) -> &str {
    &self.name
  }

  /// The objective's direction.
  pub fn direction(&self) -> Direction {
    self.direction
  }

  /// The scalarization weight.
  pub fn weight(&self) -> f64 {
    self.weight
  }

  /// The informational priority.
  pub fn priority(&self) -> u32 {
    self.priority
  }

  /// The feasibility bounds, if any.
  pub fn constraint(&self) -> Option<&ConstraintBounds> {
    self.constraint.as_ref()
  }

  /// The unit label, if any.
  pub fn units(&self) -> Option<&str> {
    self.units.as_deref()
  }

  /// Maps a raw value to the internal "lower is better" scale.
  pub fn directed(&self, value: f64) -> f64 {
    match self.direction {
      Direction::Minimize => value,
      Direction::Maximize => -value,
    }
  }

  /// The worst representable value for this objective, used for candidates
  /// whose evaluation failed so they never look competitive.
  pub fn worst(&self) -> f64 {
    match self.direction {
      Direction::Minimize => f64::INFINITY,
      Direction::Maximize => f64::NEG_INFINITY,
    }
  }
}

/// The validated, ordered set of objectives active for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectiveSet {
  objectives: Vec<Objective>,
  index: HashMap<String, usize>,
}

impl ObjectiveSet {
  /// Builds an objective set, failing fast on an empty list, duplicate names
  /// or weights outside `[0, 1]`.
  pub fn new(objectives: Vec<Objective>) -> Result<Self, Error> {
    if objectives.is_empty() {
      return Err(Error::EmptyObjectiveSet);
    }
    let mut index = HashMap::with_capacity(objectives.len());
    for (i, objective) in objectives.iter().enumerate() {
      if !objective.weight.is_finite()
        || !(0.0..=1.0).contains(&objective.weight)
      {
        return Err(Error::InvalidWeight {
          name: objective.name.clone(),
          weight: objective.weight,
        });
      }
      if index.insert(objective.name.clone(), i).is_some() {
        return Err(Error::DuplicateObjective(objective.name.clone()));
      }
    }
    Ok(Self { objectives, index })
  }

  /// Number of objectives.
  pub fn len(&self) -> usize {
    self.objectives.len()
  }

  /// Whether the set is empty. Never true for a constructed set.
  pub fn is_empty(&self) -> bool {
    self.objectives.is_empty()
  }

  /// The objectives in schema order.
  pub fn objectives(&self) -> &[Objective] {
    &self.objectives
  }

  /// Looks an objective up by name.
  pub fn get(&self, name: &str) -> Option<&Objective> {
    self.index.get(name).map(|&i| &self.objectives[i])
  }

  /// The positional index of an objective.
  pub fn index_of(&self, name: &str) -> Option<usize> {
    self.index.get(name).copied()
  }

  /// Determines Pareto dominance between two value vectors laid out in
  /// schema order. Returns `Less` if `a` dominates `b`, `Greater` if `b`
  /// dominates `a` and `Equal` when the vectors are incomparable or
  /// identical. A vector never dominates itself.
  pub fn dominance(&self, a: &[f64], b: &[f64]) -> Ordering {
    let mut ord = Ordering::Equal;
    for (obj, (x, y)) in self.objectives.iter().zip(a.iter().zip(b)) {
      let (x, y) = (obj.directed(*x), obj.directed(*y));
      match (ord, x.partial_cmp(&y).unwrap_or(Ordering::Equal)) {
        (Ordering::Equal, next) => ord = next,
        (Ordering::Greater, Ordering::Less)
        | (Ordering::Less, Ordering::Greater) => return Ordering::Equal,
        _ => {}
      }
    }
    ord
  }

  /// Whether `a` dominates `b`: no worse in every objective, strictly better
  /// in at least one.
  pub fn dominates(&self, a: &[f64], b: &[f64]) -> bool {
    self.dominance(a, b) == Ordering::Less
  }

  /// Weighted scalarization of a value vector; larger is better. Meaningful
  /// as the optimization criterion in single-objective mode and only as a
  /// tie-break/reporting aid in multi-objective mode — never as a dominance
  /// criterion.
  pub fn weighted_fitness(&self, values: &[f64]) -> f64 {
    self
      .objectives
      .iter()
      .zip(values)
      .map(|(obj, v)| -obj.weight * obj.directed(*v))
      .sum()
  }

  /// Whether a value vector satisfies every configured constraint.
  pub fn feasible(&self, values: &[f64]) -> bool {
    self
      .objectives
      .iter()
      .zip(values)
      .all(|(obj, v)| obj.constraint.map_or(true, |c| c.satisfied_by(*v)))
  }

  /// Mirrors the values of constrained objectives for inspection; entries
  /// for unconstrained objectives are `None`.
  pub fn constraint_values(&self, values: &[f64]) -> Vec<Option<f64>> {
    self
      .objectives
      .iter()
      .zip(values)
      .map(|(obj, v)| obj.constraint.map(|_| *v))
      .collect()
  }

  /// A value vector that loses to everything: each objective at its worst.
  pub fn worst_values(&self) -> Vec<f64> {
    self.objectives.iter().map(Objective::worst).collect()
  }
}
