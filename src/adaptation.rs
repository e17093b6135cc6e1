//! Adaptive parameter schedules.
//!
//! Exploration gives way to exploitation over a run: the mutation rate
//! decays linearly from its configured value toward a floor while the
//! tournament size grows toward a cap, both as pure functions of progress =
//! generation / budget. Low population diversity pauses the decay for a
//! generation so the search can escape a collapsing population.

use crate::config::GeneticAlgorithmConfig;

/// Floor the mutation rate decays toward.
const MUTATION_RATE_FLOOR: f64 = 0.01;

/// Cap the tournament size grows toward.
const TOURNAMENT_SIZE_CAP: usize = 10;

/// The per-run schedule derived from a configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdaptiveSchedule {
  enabled: bool,
  initial_mutation_rate: f64,
  mutation_rate_floor: f64,
  initial_tournament_size: usize,
  final_tournament_size: usize,
  diversity_threshold: f64,
}

impl AdaptiveSchedule {
  /// Builds the schedule for one run.
  pub fn from_config(config: &GeneticAlgorithmConfig) -> Self {
    Self {
      enabled: config.adaptive_parameters,
      initial_mutation_rate: config.mutation_rate,
      mutation_rate_floor: config.mutation_rate.min(MUTATION_RATE_FLOOR),
      initial_tournament_size: config.tournament_size,
      final_tournament_size: config.tournament_size.max(TOURNAMENT_SIZE_CAP),
      diversity_threshold: config.diversity_threshold,
    }
  }

  /// Mutation rate for the given progress and the previous generation's
  /// diversity. Diversity below the configured threshold holds the rate at
  /// its initial value to re-inject exploration.
  pub fn mutation_rate(&self, progress: f64, diversity: f64) -> f64 {
    if !self.enabled || diversity < self.diversity_threshold {
      return self.initial_mutation_rate;
    }
    let progress = progress.clamp(0.0, 1.0);
    self.initial_mutation_rate
      + (self.mutation_rate_floor - self.initial_mutation_rate) * progress
  }

  /// Tournament size for the given progress.
  pub fn tournament_size(&self, progress: f64) -> usize {
    if !self.enabled {
      return self.initial_tournament_size;
    }
    let progress = progress.clamp(0.0, 1.0);
    let grown = self.initial_tournament_size as f64
      + (self.final_tournament_size - self.initial_tournament_size) as f64
        * progress;
    grown.round() as usize
  }
}
