//! Engine configuration.
//!
//! Both configs derive a compile-time-checked builder, so a caller writes
//! only the fields it cares about:
//!
//! ```
//! use desopt::config::GeneticAlgorithmConfig;
//!
//! let config = GeneticAlgorithmConfig::builder()
//!   .population_size(40)
//!   .generations(200)
//!   .seed(42)
//!   .build();
//! assert_eq!(config.elite_size, 2);
//! ```

use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

use crate::error::Error;

/// Configuration shared by both engines.
#[derive(TypedBuilder, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneticAlgorithmConfig {
  /// Number of candidates kept between generations.
  #[builder(default = 50)]
  pub population_size: usize,

  /// Generation budget.
  #[builder(default = 100)]
  pub generations: usize,

  /// Probability that a selected parent pair is recombined instead of
  /// cloned.
  #[builder(default = 0.9)]
  pub crossover_rate: f64,

  /// Probability that an offspring is mutated.
  #[builder(default = 0.1)]
  pub mutation_rate: f64,

  /// Number of best candidates copied unchanged into the next generation.
  #[builder(default = 2)]
  pub elite_size: usize,

  /// Number of candidates drawn per tournament.
  #[builder(default = 3)]
  pub tournament_size: usize,

  /// Population diversity below which the adaptive schedule re-injects
  /// exploration by holding the mutation rate at its configured value.
  #[builder(default = 0.05)]
  pub diversity_threshold: f64,

  /// Best-fitness spread over the trailing convergence window below which a
  /// single-objective run stops early.
  #[builder(default = 1e-6)]
  pub convergence_tolerance: f64,

  /// Whether the mutation rate decays and the tournament size grows over
  /// the course of the run.
  #[builder(default = true)]
  pub adaptive_parameters: bool,

  /// Seed for the engine's random sequence. Runs with the same seed, inputs
  /// and evaluator reproduce the same mechanics.
  #[builder(default, setter(strip_option))]
  pub seed: Option<u64>,
}

impl Default for GeneticAlgorithmConfig {
  fn default() -> Self {
    Self::builder().build()
  }
}

impl GeneticAlgorithmConfig {
  /// Rejects configurations no generation could run with.
  pub fn validate(&self) -> Result<(), Error> {
    if self.population_size == 0 {
      return Err(Error::InvalidConfig("population_size must be positive".into()));
    }
    if self.generations == 0 {
      return Err(Error::InvalidConfig("generations must be positive".into()));
    }
    if self.elite_size >= self.population_size {
      return Err(Error::InvalidConfig(
        "elite_size must be smaller than population_size".into(),
      ));
    }
    if self.tournament_size == 0 {
      return Err(Error::InvalidConfig("tournament_size must be positive".into()));
    }
    for (name, rate) in [
      ("crossover_rate", self.crossover_rate),
      ("mutation_rate", self.mutation_rate),
    ] {
      if !rate.is_finite() || !(0.0..=1.0).contains(&rate) {
        return Err(Error::InvalidConfig(format!(
          "{name} must lie in [0, 1], got {rate}"
        )));
      }
    }
    if !self.convergence_tolerance.is_finite() || self.convergence_tolerance < 0.0 {
      return Err(Error::InvalidConfig(
        "convergence_tolerance must be non-negative".into(),
      ));
    }
    Ok(())
  }
}

/// The multi-objective search method. NSGA-II is the only implemented
/// method; the field exists so configurations stay stable if alternatives
/// are ever added.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[non_exhaustive]
pub enum MultiObjectiveMethod {
  /// Non-dominated sorting with crowding-distance diversity.
  #[default]
  Nsga2,
}

/// Extra configuration for the NSGA-II engine.
#[derive(TypedBuilder, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiObjectiveConfig {
  /// The generational settings shared with the single-objective engine.
  #[builder(default)]
  pub genetic: GeneticAlgorithmConfig,

  /// The search method.
  #[builder(default)]
  pub method: MultiObjectiveMethod,

  /// Maximum number of candidates returned as the Pareto front.
  #[builder(default = 50)]
  pub pareto_front_size: usize,

  /// Capacity of the non-dominated archive persisted across generations.
  #[builder(default = 100)]
  pub archive_size: usize,

  /// Whether archive truncation prefers the most spread-out candidates
  /// (crowding distance) over insertion order.
  #[builder(default = true)]
  pub diversity_maintenance: bool,
}

impl Default for MultiObjectiveConfig {
  fn default() -> Self {
    Self::builder().build()
  }
}

impl MultiObjectiveConfig {
  /// Rejects configurations no generation could run with.
  pub fn validate(&self) -> Result<(), Error> {
    self.genetic.validate()?;
    if self.pareto_front_size == 0 {
      return Err(Error::InvalidConfig("pareto_front_size must be positive".into()));
    }
    if self.archive_size == 0 {
      return Err(Error::InvalidConfig("archive_size must be positive".into()));
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_defaults_are_valid() {
    GeneticAlgorithmConfig::default().validate().unwrap();
    MultiObjectiveConfig::default().validate().unwrap();
  }

  #[test]
  fn test_zero_population_is_rejected() {
    let config = GeneticAlgorithmConfig::builder().population_size(0).build();
    assert!(config.validate().is_err());
  }

  #[test]
  fn test_zero_generations_are_rejected() {
    let config = GeneticAlgorithmConfig::builder().generations(0).build();
    assert!(config.validate().is_err());
  }

  #[test]
  fn test_elite_size_must_leave_room_for_offspring() {
    let config = GeneticAlgorithmConfig::builder()
      .population_size(4)
      .elite_size(4)
      .build();
    assert!(config.validate().is_err());
  }

  #[test]
  fn test_rates_outside_unit_interval_are_rejected() {
    let config = GeneticAlgorithmConfig::builder().crossover_rate(1.2).build();
    assert!(config.validate().is_err());
    let config = GeneticAlgorithmConfig::builder().mutation_rate(-0.1).build();
    assert!(config.validate().is_err());
  }

  #[test]
  fn test_multi_objective_capacities_must_be_positive() {
    let config = MultiObjectiveConfig::builder().archive_size(0).build();
    assert!(config.validate().is_err());
    let config = MultiObjectiveConfig::builder().pareto_front_size(0).build();
    assert!(config.validate().is_err());
  }

  #[test]
  fn test_config_serializes_for_the_ui_layer() {
    let config = GeneticAlgorithmConfig::builder().seed(7).build();
    let json = serde_json::to_string(&config).unwrap();
    let back: GeneticAlgorithmConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(config, back);
  }
}
