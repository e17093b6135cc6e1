//! Per-generation statistics.

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::candidate::Candidate;
use crate::variable::DesignSpace;

/// One statistics entry, recorded after each generation's evaluation
/// barrier. The consuming UI renders these as convergence charts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationStats {
  /// Zero-based generation index.
  pub generation: usize,
  /// Highest scalar fitness in the population.
  pub best_fitness: f64,
  /// Mean scalar fitness over candidates with finite fitness; `-∞` when
  /// every evaluation of the generation failed.
  pub mean_fitness: f64,
  /// Mean pairwise normalized gene distance over the population.
  pub diversity: f64,
  /// Size of the first non-dominated front; `None` in single-objective
  /// mode.
  pub front_size: Option<usize>,
}

impl GenerationStats {
  /// Captures a generation's statistics.
  pub fn capture(
    generation: usize,
    population: &[Candidate],
    space: &DesignSpace,
    front_size: Option<usize>,
  ) -> Self {
    let best_fitness = population
      .iter()
      .map(Candidate::fitness)
      .fold(f64::NEG_INFINITY, f64::max);
    let finite: Vec<f64> = population
      .iter()
      .map(Candidate::fitness)
      .filter(|f| f.is_finite())
      .collect();
    let mean_fitness = if finite.is_empty() {
      f64::NEG_INFINITY
    } else {
      finite.iter().sum::<f64>() / finite.len() as f64
    };
    Self {
      generation,
      best_fitness,
      mean_fitness,
      diversity: population_diversity(population, space),
      front_size,
    }
  }
}

/// Mean pairwise normalized gene distance over a population, in `[0, 1]`.
/// Zero for fewer than two candidates.
pub fn population_diversity(
  population: &[Candidate],
  space: &DesignSpace,
) -> f64 {
  if population.len() < 2 {
    return 0.0;
  }
  let pairs = population.len() * (population.len() - 1) / 2;
  let total: f64 = population
    .iter()
    .tuple_combinations()
    .map(|(a, b)| space.normalized_distance(a.genes(), b.genes()))
    .sum();
  total / pairs as f64
}
