//! Candidate solutions.

use serde::{Deserialize, Serialize};

use crate::objective::ObjectiveSet;
use crate::variable::GeneValue;

/// One point in the search space together with its evaluated data.
///
/// A candidate is a value-like record: cloning produces a fully independent
/// copy with no shared mutable state, so crossover and mutation can never
/// corrupt a parent through a child.
///
/// `rank` and `crowding_distance` are only valid immediately after the
/// sorting/crowding step of the generation that produced them; the engines
/// recompute both every generation before reading them for selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
  genes: Vec<GeneValue>,
  objectives: Vec<f64>,
  constraints: Vec<Option<f64>>,
  fitness: f64,
  rank: usize,
  crowding_distance: f64,
  feasible: bool,
  age: usize,
}

/// Sentinel rank of a candidate that has not been through non-dominated
/// sorting yet.
pub(crate) const UNRANKED: usize = usize::MAX;

impl Candidate {
  /// Creates an unevaluated candidate from a gene vector laid out in design
  /// space order. Its fitness starts at `-∞` so it loses every comparison
  /// until evaluated.
  pub fn from_genes(genes: Vec<GeneValue>) -> Self {
    Self {
      genes,
      objectives: Vec::new(),
      constraints: Vec::new(),
      fitness: f64::NEG_INFINITY,
      rank: UNRANKED,
      crowding_distance: 0.0,
      feasible: false,
      age: 0,
    }
  }

  /// The gene vector, in design space order.
  pub fn genes(&self) -> &[GeneValue] {
    &self.genes
  }

  /// One gene by positional index.
  pub fn gene(&self, index: usize) -> Option<&GeneValue> {
    self.genes.get(index)
  }

  /// Evaluated objective values, in objective schema order. Empty until the
  /// candidate has been evaluated in multi-objective mode.
  pub fn objectives(&self) -> &[f64] {
    &self.objectives
  }

  /// Mirror of constrained objective values for inspection; `None` for
  /// unconstrained objectives.
  pub fn constraints(&self) -> &[Option<f64>] {
    &self.constraints
  }

  /// Scalar fitness; larger is better. In single-objective mode this is the
  /// optimization criterion, in multi-objective mode only a tie-break and
  /// reporting aid.
  pub fn fitness(&self) -> f64 {
    self.fitness
  }

  /// Non-dominated front index; 0 is the non-dominated front.
  pub fn rank(&self) -> usize {
    self.rank
  }

  /// Crowding distance within this candidate's front; infinite for front
  /// boundary members.
  pub fn crowding_distance(&self) -> f64 {
    self.crowding_distance
  }

  /// Whether every constrained objective was within bounds at evaluation.
  pub fn is_feasible(&self) -> bool {
    self.feasible
  }

  /// Number of generations this candidate has survived.
  pub fn age(&self) -> usize {
    self.age
  }

  /// Whether this candidate Pareto-dominates `other` under the given
  /// objective set. Irreflexive: a candidate never dominates itself.
  pub fn dominates(&self, other: &Candidate, objectives: &ObjectiveSet) -> bool {
    objectives.dominates(&self.objectives, &other.objectives)
  }

  pub(crate) fn set_fitness(&mut self, fitness: f64, feasible: bool) {
    self.fitness = fitness;
    self.feasible = feasible;
  }

  pub(crate) fn set_objectives(
    &mut self,
    objectives: Vec<f64>,
    constraints: Vec<Option<f64>>,
    fitness: f64,
    feasible: bool,
  ) {
    self.objectives = objectives;
    self.constraints = constraints;
    self.fitness = fitness;
    self.feasible = feasible;
  }

  pub(crate) fn set_rank(&mut self, rank: usize) {
    self.rank = rank;
  }

  pub(crate) fn reset_crowding(&mut self) {
    self.crowding_distance = 0.0;
  }

  pub(crate) fn set_crowding(&mut self, distance: f64) {
    self.crowding_distance = distance;
  }

  pub(crate) fn add_crowding(&mut self, delta: f64) {
    if self.crowding_distance.is_finite() {
      self.crowding_distance += delta;
    }
  }

  pub(crate) fn bump_age(&mut self) {
    self.age += 1;
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::objective::Objective;
  use crate::variable::GeneValue;

  fn evaluated(objectives: Vec<f64>) -> Candidate {
    let mut c = Candidate::from_genes(vec![GeneValue::Number(0.0)]);
    c.set_objectives(objectives, vec![], 0.0, true);
    c
  }

  #[test]
  fn test_clone_is_a_deep_copy() {
    let parent = evaluated(vec![1.0, 2.0]);
    let mut child = parent.clone();
    child.set_objectives(vec![9.0, 9.0], vec![], -1.0, false);
    assert_eq!(parent.objectives(), &[1.0, 2.0]);
    assert!(parent.is_feasible());
  }

  #[test]
  fn test_unevaluated_candidate_loses_comparisons() {
    let c = Candidate::from_genes(vec![GeneValue::Number(1.0)]);
    assert_eq!(c.fitness(), f64::NEG_INFINITY);
    assert!(!c.is_feasible());
    assert_eq!(c.rank(), UNRANKED);
  }

  #[test]
  fn test_dominates_uses_objective_directions() {
    let set = ObjectiveSet::new(vec![
      Objective::minimize("cost"),
      Objective::minimize("weight"),
    ])
    .unwrap();
    let a = evaluated(vec![1.0, 1.0]);
    let b = evaluated(vec![2.0, 1.0]);
    assert!(a.dominates(&b, &set));
    assert!(!b.dominates(&a, &set));
    assert!(!a.dominates(&a, &set));
  }

  #[test]
  fn test_infinite_crowding_is_sticky() {
    let mut c = evaluated(vec![1.0]);
    c.set_crowding(f64::INFINITY);
    c.add_crowding(0.5);
    assert_eq!(c.crowding_distance(), f64::INFINITY);
  }
}
