//! Run results for the consuming UI and reporting layers.

use std::collections::BTreeMap;
use std::time::Duration;

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::candidate::Candidate;
use crate::error::Warning;
use crate::objective::ObjectiveSet;
use crate::statistics::GenerationStats;
use crate::termination::StopReason;
use crate::variable::{DesignSpace, GeneValue};

/// A gene value resolved against the catalog: categorical indices become
/// option labels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GeneSetting {
  /// A numeric setting.
  Number(f64),
  /// A categorical setting, by option label.
  Choice(String),
}

/// The winning design in caller-facing terms: genes and objectives keyed by
/// their configured names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolutionReport {
  /// Gene settings keyed by variable name.
  pub genes: BTreeMap<String, GeneSetting>,
  /// Objective values keyed by objective name; empty in single-objective
  /// mode, where the evaluator reports a bare fitness.
  pub objectives: BTreeMap<String, f64>,
  /// Scalar fitness of the solution.
  pub fitness: f64,
  /// Whether the solution satisfied every configured constraint.
  pub feasible: bool,
}

impl SolutionReport {
  pub(crate) fn build(
    candidate: &Candidate,
    space: &DesignSpace,
    objectives: Option<&ObjectiveSet>,
  ) -> Self {
    let genes = space
      .variables()
      .iter()
      .zip(candidate.genes())
      .map(|(variable, gene)| {
        let setting = match gene {
          GeneValue::Number(v) => GeneSetting::Number(*v),
          GeneValue::Choice(_) => GeneSetting::Choice(
            variable
              .option_label(gene)
              .unwrap_or_default()
              .to_string(),
          ),
        };
        (variable.name().to_string(), setting)
      })
      .collect();
    let objectives = objectives
      .map(|set| {
        set
          .objectives()
          .iter()
          .zip(candidate.objectives())
          .map(|(objective, value)| (objective.name().to_string(), *value))
          .collect()
      })
      .unwrap_or_default();
    Self {
      genes,
      objectives,
      fitness: candidate.fitness(),
      feasible: candidate.is_feasible(),
    }
  }
}

/// How much work the run performed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceSnapshot {
  /// Wall-clock time of the run.
  pub elapsed: Duration,
  /// Number of candidate evaluations dispatched.
  pub evaluations: usize,
  /// Number of generations completed.
  pub generations_run: usize,
}

/// How the run ended and how it got there.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConvergenceSnapshot {
  /// Why the run stopped.
  pub stop_reason: StopReason,
  /// Whether the run stopped because best fitness stabilized.
  pub converged: bool,
  /// One statistics entry per completed generation, in order.
  pub history: Vec<GenerationStats>,
}

/// The complete outcome of one optimization run. Multi-objective runs return
/// one result per Pareto-front member, sharing the performance and
/// convergence snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationResult {
  /// The winning design in caller-facing terms.
  pub solution: SolutionReport,
  /// The raw candidate record behind the solution.
  pub candidate: Candidate,
  /// How much work the run performed.
  pub performance: PerformanceSnapshot,
  /// How the run ended.
  pub convergence: ConvergenceSnapshot,
  /// Textual observations and recommendations for the reporting layer.
  pub analysis: Vec<String>,
  /// Non-fatal conditions recovered during the run.
  pub warnings: Vec<Warning>,
}

/// Narrates how a run ended for the reporting layer.
pub(crate) fn narrate_stop(
  stop_reason: StopReason,
  generations_run: usize,
  best_fitness: f64,
) -> String {
  match stop_reason {
    StopReason::Converged => format!(
      "search converged after {generations_run} generations with best \
       fitness {best_fitness:.4}"
    ),
    StopReason::BudgetExhausted => format!(
      "search used its full budget of {generations_run} generations; best \
       fitness reached {best_fitness:.4}"
    ),
    StopReason::Cancelled => format!(
      "run cancelled after {generations_run} generations; returning the \
       best design found so far"
    ),
  }
}

/// Describes pairwise objective tradeoffs across a Pareto front. Correlation
/// is computed on direction-normalized values, so "conflicting" always means
/// improving one objective worsens the other regardless of their directions.
pub(crate) fn tradeoff_analysis(
  front: &[Candidate],
  objectives: &ObjectiveSet,
) -> Vec<String> {
  let mut notes = Vec::new();
  if front.len() < 3 {
    return notes;
  }
  for (i, j) in (0..objectives.len()).tuple_combinations() {
    let a = objectives.objectives()[i].name();
    let b = objectives.objectives()[j].name();
    let xs: Vec<f64> = front
      .iter()
      .map(|c| objectives.objectives()[i].directed(c.objectives()[i]))
      .collect();
    let ys: Vec<f64> = front
      .iter()
      .map(|c| objectives.objectives()[j].directed(c.objectives()[j]))
      .collect();
    let Some(r) = pearson(&xs, &ys) else {
      continue;
    };
    if r <= -0.7 {
      notes.push(format!(
        "`{a}` and `{b}` are strongly conflicting across the front \
         (r = {r:.2}); improving one costs the other"
      ));
    } else if r >= 0.7 {
      notes.push(format!(
        "`{a}` and `{b}` are largely aligned across the front (r = {r:.2})"
      ));
    }
  }
  notes
}

/// Pearson correlation; `None` for degenerate columns.
fn pearson(xs: &[f64], ys: &[f64]) -> Option<f64> {
  let n = xs.len() as f64;
  let mean_x = xs.iter().sum::<f64>() / n;
  let mean_y = ys.iter().sum::<f64>() / n;
  let mut cov = 0.0;
  let mut var_x = 0.0;
  let mut var_y = 0.0;
  for (x, y) in xs.iter().zip(ys) {
    let dx = x - mean_x;
    let dy = y - mean_y;
    cov += dx * dy;
    var_x += dx * dx;
    var_y += dy * dy;
  }
  let denominator = (var_x * var_y).sqrt();
  if denominator > 0.0 && denominator.is_finite() {
    Some(cov / denominator)
  } else {
    None
  }
}
