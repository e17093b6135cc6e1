//! The single-objective genetic engine.

use std::time::Instant;

use rand::rngs::StdRng;
use rand::Rng;

use crate::adaptation::AdaptiveSchedule;
use crate::candidate::Candidate;
use crate::config::GeneticAlgorithmConfig;
use crate::crossover::SbxCrossover;
use crate::error::{Error, Warning};
use crate::evaluation::{evaluate_fitness_batch, EvaluateFitness};
use crate::mutation::PolynomialMutation;
use crate::optimizer::{best_of, initial_population, rng_from_seed};
use crate::result::{
  narrate_stop, ConvergenceSnapshot, OptimizationResult, PerformanceSnapshot,
  SolutionReport,
};
use crate::selection::TournamentSelector;
use crate::statistics::GenerationStats;
use crate::termination::{
  fitness_spread_converged, CancellationToken, StopReason,
  CONVERGENCE_WINDOW,
};
use crate::variable::DesignSpace;

/// Generational elitist search for the single candidate with maximum
/// fitness.
///
/// ```no_run
/// use desopt::candidate::Candidate;
/// use desopt::config::GeneticAlgorithmConfig;
/// use desopt::error::EvaluationError;
/// use desopt::optimizer::ga::GeneticOptimizer;
/// use desopt::variable::{DesignSpace, DesignVariable};
///
/// let space = DesignSpace::new(vec![
///   DesignVariable::discrete_stepped("beam_width", 200.0, 600.0, 50.0),
/// ])?;
/// let config = GeneticAlgorithmConfig::builder().seed(42).build();
/// // fitness is maximized: report negated cost
/// let evaluator = |c: &Candidate| -> Result<f64, EvaluationError> {
///   let width = c.gene(0).and_then(|g| g.as_number()).unwrap_or(600.0);
///   Ok(-(width * 10.0))
/// };
/// let result = GeneticOptimizer::new(&space, config, evaluator)?.run()?;
/// println!("best design: {:?}", result.solution.genes);
/// # Ok::<(), desopt::error::Error>(())
/// ```
pub struct GeneticOptimizer<'a, E> {
  space: &'a DesignSpace,
  config: GeneticAlgorithmConfig,
  evaluator: E,
  cancellation: CancellationToken,
}

impl<'a, E: EvaluateFitness> GeneticOptimizer<'a, E> {
  /// Creates an engine, failing fast on an unusable configuration.
  pub fn new(
    space: &'a DesignSpace,
    config: GeneticAlgorithmConfig,
    evaluator: E,
  ) -> Result<Self, Error> {
    config.validate()?;
    Ok(Self {
      space,
      config,
      evaluator,
      cancellation: CancellationToken::new(),
    })
  }

  /// A handle the caller can use to cancel the run from another thread. The
  /// engine checks it before each generation and after each evaluation
  /// barrier, and returns the best result found so far.
  pub fn cancellation_token(&self) -> CancellationToken {
    self.cancellation.clone()
  }

  /// Runs the search and returns the best candidate found.
  pub fn run(self) -> Result<OptimizationResult, Error> {
    let Self {
      space,
      config,
      evaluator,
      cancellation,
    } = self;
    let started = Instant::now();
    let mut rng = rng_from_seed(config.seed);
    let schedule = AdaptiveSchedule::from_config(&config);
    let crossover = SbxCrossover::default();
    let mutation = PolynomialMutation::default();

    let mut population =
      initial_population(space, config.population_size, &mut rng);
    let mut history: Vec<GenerationStats> = Vec::new();
    let mut warnings: Vec<Warning> = Vec::new();
    let mut evaluations = 0;
    let mut generations_run = 0;
    let mut stop_reason = StopReason::BudgetExhausted;

    for generation in 0..config.generations {
      if cancellation.is_cancelled() {
        stop_reason = StopReason::Cancelled;
        break;
      }
      evaluations += evaluate_fitness_batch(
        &mut population,
        &evaluator,
        generation,
        &mut warnings,
      );
      let stats =
        GenerationStats::capture(generation, &population, space, None);
      log::debug!(
        "generation {generation}: best {:.4}, mean {:.4}, diversity {:.3}",
        stats.best_fitness,
        stats.mean_fitness,
        stats.diversity,
      );
      let diversity = stats.diversity;
      history.push(stats);
      generations_run = generation + 1;

      if cancellation.is_cancelled() {
        stop_reason = StopReason::Cancelled;
        break;
      }
      let best_history: Vec<f64> =
        history.iter().map(|s| s.best_fitness).collect();
      if fitness_spread_converged(
        &best_history,
        CONVERGENCE_WINDOW,
        config.convergence_tolerance,
      ) {
        stop_reason = StopReason::Converged;
        break;
      }
      if generation + 1 == config.generations {
        break;
      }

      let progress = (generation + 1) as f64 / config.generations as f64;
      let selector =
        TournamentSelector::new(schedule.tournament_size(progress));
      let mutation_rate = schedule.mutation_rate(progress, diversity);
      population = breed(
        &population,
        space,
        &config,
        &selector,
        &crossover,
        &mutation,
        mutation_rate,
        &mut rng,
      );
    }

    let (winner, found_feasible) =
      best_of(&population).ok_or_else(|| {
        Error::InvalidConfig("population vanished during the run".into())
      })?;
    if !found_feasible {
      warnings.push(Warning::NoFeasibleSolution);
    }

    let mut analysis =
      vec![narrate_stop(stop_reason, generations_run, winner.fitness())];
    if !found_feasible {
      analysis.push(
        "no design satisfied every constraint; consider relaxing \
         constraints or widening the catalog"
          .into(),
      );
    }

    Ok(OptimizationResult {
      solution: SolutionReport::build(winner, space, None),
      candidate: winner.clone(),
      performance: PerformanceSnapshot {
        elapsed: started.elapsed(),
        evaluations,
        generations_run,
      },
      convergence: ConvergenceSnapshot {
        stop_reason,
        converged: stop_reason == StopReason::Converged,
        history,
      },
      analysis,
      warnings,
    })
  }
}

/// Breeds the next generation: elites survive unchanged, the rest are bred
/// by tournament selection, crossover and mutation until the population is
/// full again.
#[allow(clippy::too_many_arguments)]
fn breed(
  population: &[Candidate],
  space: &DesignSpace,
  config: &GeneticAlgorithmConfig,
  selector: &TournamentSelector,
  crossover: &SbxCrossover,
  mutation: &PolynomialMutation,
  mutation_rate: f64,
  rng: &mut StdRng,
) -> Vec<Candidate> {
  let mut next = Vec::with_capacity(config.population_size);

  let mut by_fitness: Vec<&Candidate> = population.iter().collect();
  by_fitness.sort_by(|a, b| b.fitness().total_cmp(&a.fitness()));
  for elite in by_fitness.into_iter().take(config.elite_size) {
    let mut survivor = elite.clone();
    survivor.bump_age();
    next.push(survivor);
  }

  while next.len() < config.population_size {
    let first = selector.select_by_fitness(population, rng);
    let second = selector.select_by_fitness(population, rng);
    let (left, right) = if rng.gen_bool(config.crossover_rate) {
      crossover.recombine(first.genes(), second.genes(), space, rng)
    } else {
      (first.genes().to_vec(), second.genes().to_vec())
    };
    for mut genes in [left, right] {
      if next.len() >= config.population_size {
        break;
      }
      if rng.gen_bool(mutation_rate) {
        mutation.mutate(&mut genes, space, rng);
      }
      next.push(Candidate::from_genes(genes));
    }
  }
  next
}
