//! **desopt** is a multi-objective evolutionary optimizer for engineering
//! design spaces. It searches catalogs of discrete, continuous and
//! categorical design parameters — member sizes, spans, material grades —
//! for designs that trade off objectives like cost, weight, sustainability
//! and safety margin, without knowing anything about the domain itself:
//! design evaluation is an opaque callback supplied by the caller.
//!
//! The crate provides:
//! - a **[`DesignSpace`]** of named, typed, bounded variables and the
//!   **[`Candidate`]** value record evaluated over it
//! - a **single-objective engine** ([`GeneticOptimizer`]): elitist
//!   generational search maximizing one scalar fitness
//! - a **multi-objective engine** ([`Nsga2Optimizer`]): NSGA-II
//!   non-dominated sorting, crowding-distance diversity, environmental
//!   selection and a persistent Pareto [`archive`](pareto::ParetoArchive)
//! - **variation operators**: tournament selection, simulated binary
//!   crossover and polynomial mutation, all bounds-preserving
//! - **decision support**: [TOPSIS](topsis) best-compromise selection over
//!   a Pareto front
//! - a **convergence/adaptation controller**: per-generation statistics,
//!   early stopping, linear mutation-rate decay and tournament growth, and
//!   cooperative [cancellation](termination::CancellationToken)
//!
//! # Evaluators are closures
//!
//! Like every operator seam in this crate, the evaluator traits are
//! implemented by closures. A single-objective evaluator maps a candidate
//! to one fitness value (larger is better); a multi-objective evaluator
//! maps it to a value per configured objective name. Evaluations within a
//! generation are independent and are dispatched concurrently through
//! [rayon], with the engine waiting on the whole batch before it publishes
//! the generation — an evaluator may be CPU-bound or I/O-bound, it only has
//! to be `Sync`.
//!
//! # Example
//!
//! Search a two-variable beam catalog for cost/weight tradeoffs and pick a
//! compromise:
//!
//! ```no_run
//! use std::collections::HashMap;
//!
//! use desopt::candidate::Candidate;
//! use desopt::config::MultiObjectiveConfig;
//! use desopt::error::EvaluationError;
//! use desopt::objective::{Objective, ObjectiveSet};
//! use desopt::optimizer::nsga2::Nsga2Optimizer;
//! use desopt::topsis;
//! use desopt::variable::{DesignSpace, DesignVariable};
//!
//! # fn main() -> Result<(), desopt::error::Error> {
//! let space = DesignSpace::new(vec![
//!   DesignVariable::discrete_stepped("beam_width", 200.0, 600.0, 50.0)
//!     .with_units("mm"),
//!   DesignVariable::categorical("grade", ["fc20", "fc25", "fc30"]),
//! ])?;
//! let objectives = ObjectiveSet::new(vec![
//!   Objective::minimize("cost").with_weight(0.6),
//!   Objective::minimize("weight").with_weight(0.4),
//! ])?;
//!
//! let evaluator = |c: &Candidate| -> Result<HashMap<String, f64>, EvaluationError> {
//!   let width = c.gene(0).and_then(|g| g.as_number()).unwrap_or(600.0);
//!   let grade = c.gene(1).and_then(|g| g.as_choice()).unwrap_or(0) as f64;
//!   Ok(HashMap::from([
//!     ("cost".to_string(), width * 10.0 + grade * 1000.0),
//!     ("weight".to_string(), width * 2.0),
//!   ]))
//! };
//!
//! let config = MultiObjectiveConfig::builder().build();
//! let optimizer = Nsga2Optimizer::new(&space, &objectives, config, evaluator)?;
//! let front = optimizer.run()?;
//! if let Some(best) = topsis::best_compromise_result(&front, &objectives) {
//!   println!("best compromise: {:?}", best.solution.genes);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Reproducibility and errors
//!
//! Given a `seed` in the configuration, a run's mechanics are fully
//! reproducible. Configuration mistakes (empty catalogs, zero budgets,
//! rates outside `[0, 1]`) fail fast with [`error::Error`] before a single
//! generation runs. Evaluator failures and non-finite values never abort a
//! run: the affected candidate is demoted to the worst possible fitness and
//! the incident is attached to the result as a [`error::Warning`].
//!
//! [`DesignSpace`]: variable::DesignSpace
//! [`Candidate`]: candidate::Candidate
//! [`GeneticOptimizer`]: optimizer::ga::GeneticOptimizer
//! [`Nsga2Optimizer`]: optimizer::nsga2::Nsga2Optimizer
//! [rayon]: https://docs.rs/rayon

#![warn(missing_docs)]

pub mod adaptation;
pub mod candidate;
pub mod config;
pub mod crossover;
pub mod error;
pub mod evaluation;
pub mod mutation;
pub mod objective;
pub mod optimizer;
pub mod pareto;
pub mod result;
pub mod selection;
pub mod statistics;
pub mod termination;
pub mod topsis;
pub mod variable;

pub use crate::candidate::Candidate;
pub use crate::config::{GeneticAlgorithmConfig, MultiObjectiveConfig};
pub use crate::error::{Error, EvaluationError, Warning};
pub use crate::objective::{Direction, Objective, ObjectiveSet};
pub use crate::optimizer::ga::GeneticOptimizer;
pub use crate::optimizer::nsga2::Nsga2Optimizer;
pub use crate::result::OptimizationResult;
pub use crate::termination::CancellationToken;
pub use crate::variable::{DesignSpace, DesignVariable, GeneValue};
