//! Run termination: budgets, convergence and cancellation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Number of trailing generations whose best-fitness spread decides
/// convergence.
pub const CONVERGENCE_WINDOW: usize = 10;

/// Why a run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopReason {
  /// The generation budget ran out.
  BudgetExhausted,
  /// Best fitness stopped improving within the convergence tolerance.
  Converged,
  /// The caller cancelled the run; the best result so far was returned.
  Cancelled,
}

/// A cooperative cancellation signal shared between the caller and a running
/// engine.
///
/// The engine checks the token before starting each generation and again
/// after awaiting each evaluation barrier; on cancellation it returns the
/// best result found so far rather than failing.
///
/// ```
/// use desopt::termination::CancellationToken;
///
/// let token = CancellationToken::new();
/// let handle = token.clone();
/// // hand `handle` to a watchdog or a UI cancel button
/// handle.cancel();
/// assert!(token.is_cancelled());
/// ```
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
  cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
  /// Creates a token in the not-cancelled state.
  pub fn new() -> Self {
    Self::default()
  }

  /// Requests cancellation. Idempotent.
  pub fn cancel(&self) {
    self.cancelled.store(true, Ordering::Relaxed);
  }

  /// Whether cancellation has been requested.
  pub fn is_cancelled(&self) -> bool {
    self.cancelled.load(Ordering::Relaxed)
  }
}

/// Whether the spread of best fitness over the trailing `window` entries has
/// fallen below `tolerance`. Pure function of the history, so the
/// convergence rule is testable without running a whole search.
///
/// Returns `false` until `window` generations have been recorded, and for
/// histories containing non-finite entries (a generation whose every
/// evaluation failed must not look converged).
pub fn fitness_spread_converged(
  best_history: &[f64],
  window: usize,
  tolerance: f64,
) -> bool {
  if window == 0 || best_history.len() < window {
    return false;
  }
  let tail = &best_history[best_history.len() - window..];
  if tail.iter().any(|f| !f.is_finite()) {
    return false;
  }
  let min = tail.iter().copied().fold(f64::INFINITY, f64::min);
  let max = tail.iter().copied().fold(f64::NEG_INFINITY, f64::max);
  max - min < tolerance
}
