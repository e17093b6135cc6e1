//! Selection operators.

use std::cmp::Ordering;

use rand::seq::index;
use rand::Rng;

use crate::candidate::Candidate;

/// Draws a fixed number of candidates uniformly at random and keeps the
/// winner.
///
/// In single-objective mode the winner is the candidate with the highest
/// fitness; in multi-objective mode the comparison is by rank ascending,
/// then crowding distance descending, so selection pressure favors the
/// better front first and the less crowded region second.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct TournamentSelector {
  size: usize,
}

impl TournamentSelector {
  /// Creates a selector drawing `size` candidates per tournament. A size of
  /// zero behaves like one.
  pub fn new(size: usize) -> Self {
    Self {
      size: size.max(1),
    }
  }

  /// The number of candidates drawn per tournament.
  pub fn size(&self) -> usize {
    self.size
  }

  /// Runs one tournament judged by scalar fitness, descending.
  pub fn select_by_fitness<'a, R: Rng>(
    &self,
    population: &'a [Candidate],
    rng: &mut R,
  ) -> &'a Candidate {
    self.run(population, rng, |a, b| {
      a.fitness().total_cmp(&b.fitness()).reverse()
    })
  }

  /// Runs one tournament judged by rank ascending, then crowding distance
  /// descending.
  pub fn select_by_rank<'a, R: Rng>(
    &self,
    population: &'a [Candidate],
    rng: &mut R,
  ) -> &'a Candidate {
    self.run(population, rng, |a, b| {
      a.rank()
        .cmp(&b.rank())
        .then_with(|| b.crowding_distance().total_cmp(&a.crowding_distance()))
    })
  }

  /// Draws distinct contestants and returns the minimum under `ordering`.
  fn run<'a, R, F>(
    &self,
    population: &'a [Candidate],
    rng: &mut R,
    ordering: F,
  ) -> &'a Candidate
  where
    R: Rng,
    F: Fn(&Candidate, &Candidate) -> Ordering,
  {
    debug_assert!(!population.is_empty(), "tournament over empty population");
    let draws = self.size.min(population.len());
    index::sample(rng, population.len(), draws)
      .iter()
      .map(|i| &population[i])
      .min_by(|a, b| ordering(a, b))
      .expect("tournament drew no contestants")
  }
}

#[cfg(test)]
mod tests {
  use rand::{rngs::StdRng, SeedableRng};

  use super::*;
  use crate::variable::GeneValue;

  fn with_fitness(fitness: f64) -> Candidate {
    let mut c = Candidate::from_genes(vec![GeneValue::Number(fitness)]);
    c.set_fitness(fitness, true);
    c
  }

  fn with_rank_crowding(rank: usize, crowding: f64) -> Candidate {
    let mut c = Candidate::from_genes(vec![GeneValue::Number(0.0)]);
    c.set_fitness(0.0, true);
    c.set_rank(rank);
    c.set_crowding(crowding);
    c
  }

  #[test]
  fn test_full_size_tournament_finds_the_best_fitness() {
    let population: Vec<_> = [0.5, 2.0, -1.0, 1.5].map(with_fitness).into();
    let selector = TournamentSelector::new(population.len());
    let mut rng = StdRng::seed_from_u64(0);
    let winner = selector.select_by_fitness(&population, &mut rng);
    assert_eq!(winner.fitness(), 2.0);
  }

  #[test]
  fn test_rank_beats_crowding() {
    let population = vec![
      with_rank_crowding(1, f64::INFINITY),
      with_rank_crowding(0, 0.1),
    ];
    let selector = TournamentSelector::new(2);
    let mut rng = StdRng::seed_from_u64(0);
    let winner = selector.select_by_rank(&population, &mut rng);
    assert_eq!(winner.rank(), 0);
  }

  #[test]
  fn test_crowding_breaks_rank_ties() {
    let population = vec![
      with_rank_crowding(0, 0.2),
      with_rank_crowding(0, f64::INFINITY),
    ];
    let selector = TournamentSelector::new(2);
    let mut rng = StdRng::seed_from_u64(0);
    let winner = selector.select_by_rank(&population, &mut rng);
    assert_eq!(winner.crowding_distance(), f64::INFINITY);
  }

  #[test]
  fn test_oversized_tournament_is_clamped_to_population() {
    let population = vec![with_fitness(1.0)];
    let selector = TournamentSelector::new(10);
    let mut rng = StdRng::seed_from_u64(0);
    let winner = selector.select_by_fitness(&population, &mut rng);
    assert_eq!(winner.fitness(), 1.0);
  }
}
