//! Optimization engines.
//!
//! Both engines drive the same generational skeleton from a single control
//! thread: initialize a population over the [`DesignSpace`], evaluate each
//! generation concurrently behind a barrier, breed the next generation with
//! tournament selection, SBX crossover and polynomial mutation, and stop on
//! budget exhaustion, convergence or cancellation. They differ in what
//! "better" means: [`ga::GeneticOptimizer`] maximizes one scalar fitness,
//! [`nsga2::Nsga2Optimizer`] approximates the Pareto front of a whole
//! objective set.
//!
//! [`DesignSpace`]: crate::variable::DesignSpace

pub mod ga;
pub mod nsga2;

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::candidate::Candidate;
use crate::variable::DesignSpace;

/// The engine's random source: seeded for reproducible mechanics, entropy
/// otherwise.
pub(crate) fn rng_from_seed(seed: Option<u64>) -> StdRng {
  match seed {
    Some(seed) => StdRng::seed_from_u64(seed),
    None => StdRng::from_entropy(),
  }
}

/// Draws the initial population. When the catalog carries current values,
/// one member is seeded from them so the search starts no worse than the
/// incoming design.
pub(crate) fn initial_population(
  space: &DesignSpace,
  size: usize,
  rng: &mut StdRng,
) -> Vec<Candidate> {
  let mut population = Vec::with_capacity(size);
  if let Some(genes) = space.seed_genes(rng) {
    population.push(Candidate::from_genes(genes));
  }
  while population.len() < size {
    population.push(Candidate::from_genes(space.sample_genes(rng)));
  }
  population
}

/// Picks the winning candidate of a final population: the best feasible one
/// by fitness, or the best infeasible one when nothing is feasible. The
/// returned flag tells whether a feasible winner was found.
pub(crate) fn best_of(population: &[Candidate]) -> Option<(&Candidate, bool)> {
  let best_feasible = population
    .iter()
    .filter(|c| c.is_feasible())
    .max_by(|a, b| a.fitness().total_cmp(&b.fitness()));
  if let Some(winner) = best_feasible {
    return Some((winner, true));
  }
  population
    .iter()
    .max_by(|a, b| a.fitness().total_cmp(&b.fitness()))
    .map(|winner| (winner, false))
}
