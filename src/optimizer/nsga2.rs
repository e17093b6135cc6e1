//! The NSGA-II multi-objective engine.

use std::time::Instant;

use itertools::Itertools;

use crate::adaptation::AdaptiveSchedule;
use crate::candidate::Candidate;
use crate::config::MultiObjectiveConfig;
use crate::crossover::SbxCrossover;
use crate::error::{Error, Warning};
use crate::evaluation::{evaluate_objectives_batch, EvaluateObjectives};
use crate::mutation::PolynomialMutation;
use crate::objective::ObjectiveSet;
use crate::optimizer::{initial_population, rng_from_seed};
use crate::pareto::{
  assign_crowding_distances, crowd_front, fast_nondominated_sort,
  sort_by_crowding, ParetoArchive,
};
use crate::result::{
  narrate_stop, tradeoff_analysis, ConvergenceSnapshot, OptimizationResult,
  PerformanceSnapshot, SolutionReport,
};
use crate::selection::TournamentSelector;
use crate::statistics::GenerationStats;
use crate::termination::{CancellationToken, StopReason};
use crate::variable::DesignSpace;

/// Non-dominated sorting genetic search for a Pareto-front approximation.
///
/// Each generation evaluates the combined parent and offspring population
/// behind one concurrent barrier, partitions it into non-dominated fronts,
/// computes crowding distances, selects the next parents front by front,
/// folds the first front into a persistent bounded archive and breeds the
/// next offspring by (rank, crowding) tournaments. The run returns one
/// [`OptimizationResult`] per member of the archive's final front.
pub struct Nsga2Optimizer<'a, E> {
  space: &'a DesignSpace,
  objectives: &'a ObjectiveSet,
  config: MultiObjectiveConfig,
  evaluator: E,
  cancellation: CancellationToken,
}

impl<'a, E: EvaluateObjectives> Nsga2Optimizer<'a, E> {
  /// Creates an engine, failing fast on an unusable configuration.
  pub fn new(
    space: &'a DesignSpace,
    objectives: &'a ObjectiveSet,
    config: MultiObjectiveConfig,
    evaluator: E,
  ) -> Result<Self, Error> {
    config.validate()?;
    Ok(Self {
      space,
      objectives,
      config,
      evaluator,
      cancellation: CancellationToken::new(),
    })
  }

  /// A handle the caller can use to cancel the run from another thread. The
  /// engine checks it before each generation and after each evaluation
  /// barrier, and returns the front assembled so far.
  pub fn cancellation_token(&self) -> CancellationToken {
    self.cancellation.clone()
  }

  /// Runs the search and returns the final front, one result per member.
  pub fn run(self) -> Result<Vec<OptimizationResult>, Error> {
    let Self {
      space,
      objectives,
      config,
      evaluator,
      cancellation,
    } = self;
    let genetic = &config.genetic;
    let started = Instant::now();
    let mut rng = rng_from_seed(genetic.seed);
    let schedule = AdaptiveSchedule::from_config(genetic);
    let crossover = SbxCrossover::default();
    let mutation = PolynomialMutation::default();

    let mut archive =
      ParetoArchive::new(config.archive_size, config.diversity_maintenance);
    let mut population =
      initial_population(space, genetic.population_size, &mut rng);
    let mut history: Vec<GenerationStats> = Vec::new();
    let mut warnings: Vec<Warning> = Vec::new();
    let mut evaluations = 0;
    let mut generations_run = 0;
    let mut stop_reason = StopReason::BudgetExhausted;

    for generation in 0..genetic.generations {
      if cancellation.is_cancelled() {
        stop_reason = StopReason::Cancelled;
        break;
      }

      // the population holds parents plus offspring here, except on the
      // very first generation
      evaluations += evaluate_objectives_batch(
        &mut population,
        &evaluator,
        objectives,
        generation,
        &mut warnings,
      );
      let cancelled_after_barrier = cancellation.is_cancelled();

      let fronts = fast_nondominated_sort(&mut population, objectives);
      assign_crowding_distances(&mut population, &fronts, objectives);

      let stats = GenerationStats::capture(
        generation,
        &population,
        space,
        fronts.first().map(Vec::len),
      );
      log::debug!(
        "generation {generation}: front 0 holds {} of {}, diversity {:.3}",
        stats.front_size.unwrap_or(0),
        population.len(),
        stats.diversity,
      );
      let diversity = stats.diversity;
      history.push(stats);
      generations_run = generation + 1;

      let first_front: Vec<Candidate> = fronts
        .first()
        .map(|front| front.iter().map(|&i| population[i].clone()).collect())
        .unwrap_or_default();

      population = environmental_select(
        population,
        fronts,
        genetic.population_size,
      );
      archive.update(&first_front, objectives);

      if cancelled_after_barrier {
        stop_reason = StopReason::Cancelled;
        break;
      }
      if generation + 1 == genetic.generations {
        break;
      }

      let progress = (generation + 1) as f64 / genetic.generations as f64;
      let selector =
        TournamentSelector::new(schedule.tournament_size(progress));
      let mutation_rate = schedule.mutation_rate(progress, diversity);
      let offspring = breed_offspring(
        &population,
        space,
        genetic.population_size,
        genetic.crossover_rate,
        mutation_rate,
        &selector,
        &crossover,
        &mutation,
        &mut rng,
      );
      population.extend(offspring);
    }

    let front = final_front(&archive, objectives, config.pareto_front_size);
    push_degenerate_warnings(&front, objectives, &mut warnings);

    let best_fitness = front
      .iter()
      .map(Candidate::fitness)
      .fold(f64::NEG_INFINITY, f64::max);
    let mut analysis =
      vec![narrate_stop(stop_reason, generations_run, best_fitness)];
    analysis.push(format!(
      "final front holds {} non-dominated design(s)",
      front.len()
    ));
    analysis.extend(tradeoff_analysis(&front, objectives));

    let performance = PerformanceSnapshot {
      elapsed: started.elapsed(),
      evaluations,
      generations_run,
    };
    let convergence = ConvergenceSnapshot {
      stop_reason,
      converged: false,
      history,
    };

    Ok(
      front
        .into_iter()
        .map(|candidate| OptimizationResult {
          solution: SolutionReport::build(
            &candidate,
            space,
            Some(objectives),
          ),
          candidate,
          performance: performance.clone(),
          convergence: convergence.clone(),
          analysis: analysis.clone(),
          warnings: warnings.clone(),
        })
        .collect(),
    )
  }
}

/// Fills the next parent population front by front; the front that would
/// overflow is cut by descending crowding distance to land exactly on the
/// population size. Survivors age by one generation.
fn environmental_select(
  population: Vec<Candidate>,
  fronts: Vec<Vec<usize>>,
  size: usize,
) -> Vec<Candidate> {
  let mut keep: Vec<usize> = Vec::with_capacity(size);
  for front in fronts {
    if keep.len() + front.len() <= size {
      keep.extend(front);
    } else {
      let mut overflow = front;
      sort_by_crowding(&population, &mut overflow);
      overflow.truncate(size - keep.len());
      keep.extend(overflow);
    }
    if keep.len() == size {
      break;
    }
  }

  let mut slots: Vec<Option<Candidate>> =
    population.into_iter().map(Some).collect();
  keep
    .into_iter()
    .map(|i| {
      let mut survivor =
        slots[i].take().expect("selection index used twice");
      survivor.bump_age();
      survivor
    })
    .collect()
}

/// Breeds one offspring batch with (rank, crowding) tournaments.
#[allow(clippy::too_many_arguments)]
fn breed_offspring<R: rand::Rng>(
  parents: &[Candidate],
  space: &DesignSpace,
  count: usize,
  crossover_rate: f64,
  mutation_rate: f64,
  selector: &TournamentSelector,
  crossover: &SbxCrossover,
  mutation: &PolynomialMutation,
  rng: &mut R,
) -> Vec<Candidate> {
  let mut offspring = Vec::with_capacity(count);
  while offspring.len() < count {
    let first = selector.select_by_rank(parents, rng);
    let second = selector.select_by_rank(parents, rng);
    let (left, right) = if rng.gen_bool(crossover_rate) {
      crossover.recombine(first.genes(), second.genes(), space, rng)
    } else {
      (first.genes().to_vec(), second.genes().to_vec())
    };
    for mut genes in [left, right] {
      if offspring.len() >= count {
        break;
      }
      if rng.gen_bool(mutation_rate) {
        mutation.mutate(&mut genes, space, rng);
      }
      offspring.push(Candidate::from_genes(genes));
    }
  }
  offspring
}

/// Extracts the archive's front, freshly crowded and capped to the
/// configured size with the most spread-out members first.
fn final_front(
  archive: &ParetoArchive,
  objectives: &ObjectiveSet,
  cap: usize,
) -> Vec<Candidate> {
  let mut members: Vec<Candidate> = archive.members().to_vec();
  if members.is_empty() {
    return members;
  }
  let indices: Vec<usize> = (0..members.len()).collect();
  crowd_front(&mut members, &indices, objectives);
  let mut order = indices;
  sort_by_crowding(&members, &mut order);
  order.truncate(cap);

  let mut slots: Vec<Option<Candidate>> =
    members.into_iter().map(Some).collect();
  order
    .into_iter()
    .map(|i| slots[i].take().expect("front index used twice"))
    .collect()
}

/// Flags objectives that are constant across the final front; they carry no
/// tradeoff information.
fn push_degenerate_warnings(
  front: &[Candidate],
  objectives: &ObjectiveSet,
  warnings: &mut Vec<Warning>,
) {
  if front.len() < 2 {
    return;
  }
  for (j, objective) in objectives.objectives().iter().enumerate() {
    if let itertools::MinMaxResult::MinMax(min, max) =
      front.iter().map(|c| c.objectives()[j]).minmax()
    {
      if min == max {
        warnings.push(Warning::DegenerateObjective(objective.name().into()));
      }
    } else {
      warnings.push(Warning::DegenerateObjective(objective.name().into()));
    }
  }
}

#[cfg(test)]
mod tests {
  use std::collections::HashMap;

  use super::*;
  use crate::error::EvaluationError;
  use crate::objective::{ConstraintBounds, Objective};
  use crate::topsis;
  use crate::variable::DesignVariable;

  fn line_space() -> DesignSpace {
    DesignSpace::new(vec![DesignVariable::discrete("x", 0.0, 10.0)]).unwrap()
  }

  fn conflicting_set() -> ObjectiveSet {
    ObjectiveSet::new(vec![
      Objective::minimize("cost").with_weight(0.6),
      Objective::minimize("weight").with_weight(0.4),
    ])
    .unwrap()
  }

  /// cost grows and weight shrinks with `x`: every design is Pareto-optimal
  fn conflicting_evaluator(
    c: &Candidate,
  ) -> Result<HashMap<String, f64>, EvaluationError> {
    let x = c.gene(0).and_then(|g| g.as_number()).unwrap_or(0.0);
    Ok(HashMap::from([
      ("cost".to_string(), x),
      ("weight".to_string(), 10.0 - x),
    ]))
  }

  fn config(generations: usize) -> MultiObjectiveConfig {
    MultiObjectiveConfig::builder()
      .genetic(
        crate::config::GeneticAlgorithmConfig::builder()
          .population_size(40)
          .generations(generations)
          .seed(7)
          .build(),
      )
      .build()
  }

  #[test]
  fn test_conflicting_objectives_span_both_extremes() {
    let space = line_space();
    let objectives = conflicting_set();
    let results =
      Nsga2Optimizer::new(&space, &objectives, config(50), conflicting_evaluator)
        .unwrap()
        .run()
        .unwrap();

    assert!(results.len() >= 2, "front too small: {}", results.len());
    let costs: Vec<f64> =
      results.iter().map(|r| r.candidate.objectives()[0]).collect();
    assert!(costs.contains(&0.0), "cheapest extreme missing: {costs:?}");
    assert!(costs.contains(&10.0), "lightest extreme missing: {costs:?}");

    // archive members never dominate each other
    for (a, b) in results.iter().tuple_combinations() {
      assert!(!a.candidate.dominates(&b.candidate, &objectives));
      assert!(!b.candidate.dominates(&a.candidate, &objectives));
    }
    for result in &results {
      assert!(space.contains(result.candidate.genes()));
      assert_eq!(result.candidate.rank(), 0);
    }
  }

  #[test]
  fn test_topsis_compromise_is_a_front_member_and_idempotent() {
    let space = line_space();
    let objectives = conflicting_set();
    let results =
      Nsga2Optimizer::new(&space, &objectives, config(30), conflicting_evaluator)
        .unwrap()
        .run()
        .unwrap();
    let first = topsis::best_compromise_result(&results, &objectives)
      .expect("non-empty front has a compromise");
    assert!(results.iter().any(|r| r.solution == first.solution));
    for _ in 0..3 {
      let again =
        topsis::best_compromise_result(&results, &objectives).unwrap();
      assert_eq!(again.solution, first.solution);
    }
  }

  #[test]
  fn test_seeded_runs_are_reproducible() {
    let space = line_space();
    let objectives = conflicting_set();
    let run = || {
      Nsga2Optimizer::new(&space, &objectives, config(20), conflicting_evaluator)
        .unwrap()
        .run()
        .unwrap()
    };
    let first: Vec<_> = run().into_iter().map(|r| r.solution).collect();
    let second: Vec<_> = run().into_iter().map(|r| r.solution).collect();
    assert_eq!(first, second);
  }

  #[test]
  fn test_constraints_mark_feasibility_per_member() {
    let space = line_space();
    let objectives = ObjectiveSet::new(vec![
      Objective::minimize("cost"),
      Objective::minimize("weight").with_constraint(ConstraintBounds {
        min: None,
        max: Some(4.0),
      }),
    ])
    .unwrap();
    let results =
      Nsga2Optimizer::new(&space, &objectives, config(30), conflicting_evaluator)
        .unwrap()
        .run()
        .unwrap();
    for result in &results {
      let weight = result.candidate.objectives()[1];
      assert_eq!(result.solution.feasible, weight <= 4.0);
      assert_eq!(result.candidate.constraints()[1], Some(weight));
    }
  }

  #[test]
  fn test_constant_objective_is_flagged_degenerate() {
    let space = line_space();
    let objectives = ObjectiveSet::new(vec![
      Objective::minimize("cost"),
      Objective::minimize("weight"),
      Objective::minimize("carbon"),
    ])
    .unwrap();
    let evaluator =
      |c: &Candidate| -> Result<HashMap<String, f64>, EvaluationError> {
        let x = c.gene(0).and_then(|g| g.as_number()).unwrap_or(0.0);
        Ok(HashMap::from([
          ("cost".to_string(), x),
          ("weight".to_string(), 10.0 - x),
          ("carbon".to_string(), 3.0),
        ]))
      };
    let results =
      Nsga2Optimizer::new(&space, &objectives, config(30), evaluator)
        .unwrap()
        .run()
        .unwrap();
    assert!(results.len() >= 2);
    assert!(results[0]
      .warnings
      .iter()
      .any(|w| matches!(w, Warning::DegenerateObjective(name) if name == "carbon")));
  }

  #[test]
  fn test_cancellation_returns_the_front_so_far() {
    let space = line_space();
    let objectives = conflicting_set();
    let optimizer =
      Nsga2Optimizer::new(&space, &objectives, config(1000), conflicting_evaluator)
        .unwrap();
    let token = optimizer.cancellation_token();
    token.cancel();
    let results = optimizer.run().unwrap();
    assert!(results.is_empty(), "nothing was evaluated before cancelling");
  }

  #[test]
  fn test_evaluation_failures_surface_as_warnings() {
    let space = line_space();
    let objectives = conflicting_set();
    let evaluator = |c: &Candidate| {
      let x = c.gene(0).and_then(|g| g.as_number()).unwrap_or(0.0);
      if x == 5.0 {
        return Err(EvaluationError::Failed("solver diverged".into()));
      }
      Ok(HashMap::from([
        ("cost".to_string(), x),
        ("weight".to_string(), 10.0 - x),
      ]))
    };
    let results =
      Nsga2Optimizer::new(&space, &objectives, config(20), evaluator)
        .unwrap()
        .run()
        .unwrap();
    assert!(!results.is_empty());
    assert!(!results[0].warnings.is_empty());
    // the failing design can never reach the front
    for result in &results {
      assert_ne!(
        result.candidate.gene(0).and_then(|g| g.as_number()),
        Some(5.0)
      );
    }
  }

  #[test]
  fn test_invalid_config_fails_before_running() {
    let space = line_space();
    let objectives = conflicting_set();
    let config = MultiObjectiveConfig::builder().archive_size(0).build();
    assert!(Nsga2Optimizer::new(
      &space,
      &objectives,
      config,
      conflicting_evaluator
    )
    .is_err());
  }
}
