//! Crossover operators.

use rand::Rng;

use crate::variable::{DesignSpace, GeneValue};

/// Parent values closer than this are treated as identical and passed
/// through unchanged.
const PARITY_EPSILON: f64 = 1e-9;

/// Simulated binary crossover for numeric genes, uniform swap for
/// categorical genes.
///
/// SBX mimics the exploration behavior of single-point binary crossover on
/// real values: children concentrate around the parents, with the
/// distribution index `eta` controlling how tightly. Offspring values are
/// clamped back into their variable's bounds and discrete genes are rounded
/// to their step before they are stored, so a child can never carry an
/// inadmissible gene.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct SbxCrossover {
  eta: f64,
}

impl Default for SbxCrossover {
  fn default() -> Self {
    Self { eta: 20.0 }
  }
}

impl SbxCrossover {
  /// Creates the operator with a custom distribution index.
  pub fn with_eta(eta: f64) -> Self {
    Self { eta }
  }

  /// Recombines two parent gene vectors into two children.
  pub fn recombine<R: Rng>(
    &self,
    a: &[GeneValue],
    b: &[GeneValue],
    space: &DesignSpace,
    rng: &mut R,
  ) -> (Vec<GeneValue>, Vec<GeneValue>) {
    let mut left = Vec::with_capacity(a.len());
    let mut right = Vec::with_capacity(b.len());
    for (variable, (ga, gb)) in space.variables().iter().zip(a.iter().zip(b)) {
      match (ga, gb) {
        (GeneValue::Number(p1), GeneValue::Number(p2)) => {
          if (p1 - p2).abs() <= PARITY_EPSILON {
            left.push(*ga);
            right.push(*gb);
            continue;
          }
          let u: f64 = rng.gen();
          let beta = if u <= 0.5 {
            (2.0 * u).powf(1.0 / (self.eta + 1.0))
          } else {
            (1.0 / (2.0 * (1.0 - u))).powf(1.0 / (self.eta + 1.0))
          };
          let sum = p1 + p2;
          let gap = (p1 - p2).abs();
          left.push(variable.clamp_number(0.5 * (sum - beta * gap)));
          right.push(variable.clamp_number(0.5 * (sum + beta * gap)));
        }
        (GeneValue::Choice(_), GeneValue::Choice(_)) => {
          // exchange the pair or keep it, never invent a third option
          if rng.gen_bool(0.5) {
            left.push(variable.clamp(gb));
            right.push(variable.clamp(ga));
          } else {
            left.push(variable.clamp(ga));
            right.push(variable.clamp(gb));
          }
        }
        _ => {
          debug_assert!(false, "gene kind mismatch between parents");
          left.push(variable.clamp(ga));
          right.push(variable.clamp(gb));
        }
      }
    }
    (left, right)
  }
}

#[cfg(test)]
mod tests {
  use proptest::prelude::*;
  use rand::{rngs::StdRng, SeedableRng};

  use super::*;
  use crate::variable::DesignVariable;

  fn space() -> DesignSpace {
    DesignSpace::new(vec![
      DesignVariable::continuous("span", 3.0, 12.0),
      DesignVariable::discrete_stepped("width", 200.0, 600.0, 50.0),
      DesignVariable::categorical("grade", ["fc20", "fc25", "fc30"]),
    ])
    .unwrap()
  }

  #[test]
  fn test_children_stay_in_bounds_and_on_grid() {
    let space = space();
    let mut rng = StdRng::seed_from_u64(11);
    let crossover = SbxCrossover::default();
    for _ in 0..200 {
      let a = space.sample_genes(&mut rng);
      let b = space.sample_genes(&mut rng);
      let (c1, c2) = crossover.recombine(&a, &b, &space, &mut rng);
      assert!(space.contains(&c1));
      assert!(space.contains(&c2));
    }
  }

  #[test]
  fn test_identical_parents_pass_through() {
    let space = space();
    let mut rng = StdRng::seed_from_u64(3);
    let genes = space.sample_genes(&mut rng);
    let (c1, c2) =
      SbxCrossover::default().recombine(&genes, &genes, &space, &mut rng);
    assert_eq!(c1, genes);
    assert_eq!(c2, genes);
  }

  #[test]
  fn test_categorical_genes_swap_as_a_pair() {
    let space =
      DesignSpace::new(vec![DesignVariable::categorical("grade", ["a", "b"])])
        .unwrap();
    let a = vec![GeneValue::Choice(0)];
    let b = vec![GeneValue::Choice(1)];
    let mut rng = StdRng::seed_from_u64(0);
    let crossover = SbxCrossover::default();
    for _ in 0..50 {
      let (c1, c2) = crossover.recombine(&a, &b, &space, &mut rng);
      let mut pair = [c1[0].as_choice().unwrap(), c2[0].as_choice().unwrap()];
      pair.sort_unstable();
      // the two options always survive, only their assignment varies
      assert_eq!(pair, [0, 1]);
    }
  }

  proptest! {
    #[test]
    fn prop_numeric_children_never_escape_bounds(
      seed in 0u64..1000,
      p1 in 3.0..12.0f64,
      p2 in 3.0..12.0f64,
    ) {
      let space = DesignSpace::new(vec![DesignVariable::continuous(
        "span", 3.0, 12.0,
      )])
      .unwrap();
      let mut rng = StdRng::seed_from_u64(seed);
      let (c1, c2) = SbxCrossover::default().recombine(
        &[GeneValue::Number(p1)],
        &[GeneValue::Number(p2)],
        &space,
        &mut rng,
      );
      prop_assert!(space.contains(&c1));
      prop_assert!(space.contains(&c2));
    }
  }
}
