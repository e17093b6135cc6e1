//! Fast non-dominated sorting, crowding distance and the Pareto archive.

use std::cmp::Ordering;

use crate::candidate::Candidate;
use crate::objective::ObjectiveSet;

/// Partitions a population into ordered fronts F0, F1, … such that every
/// candidate in Fi is dominated only by candidates of earlier fronts and
/// dominates none of them. Assigns each candidate's `rank` and returns the
/// fronts as index lists into `population`.
///
/// For each pair the dominance relation is determined once; a per-candidate
/// domination counter and list of dominated peers then let the fronts peel
/// off by decrementing counters, the classic NSGA-II bookkeeping.
pub fn fast_nondominated_sort(
  population: &mut [Candidate],
  objectives: &ObjectiveSet,
) -> Vec<Vec<usize>> {
  let n = population.len();
  if n == 0 {
    return Vec::new();
  }

  // dominated peers and dominator counts per candidate
  let mut dominated: Vec<Vec<usize>> = vec![Vec::new(); n];
  let mut counters: Vec<usize> = vec![0; n];
  let mut first_front: Vec<usize> = Vec::new();

  for p in 0..n {
    for q in (p + 1)..n {
      match objectives
        .dominance(population[p].objectives(), population[q].objectives())
      {
        Ordering::Less => {
          dominated[p].push(q);
          counters[q] += 1;
        }
        Ordering::Greater => {
          dominated[q].push(p);
          counters[p] += 1;
        }
        Ordering::Equal => {}
      }
    }
    // all pairs involving `p` have been seen at this point
    if counters[p] == 0 {
      population[p].set_rank(0);
      first_front.push(p);
    }
  }

  let mut fronts = Vec::new();
  let mut current = first_front;
  let mut rank = 0;
  while !current.is_empty() {
    let mut next = Vec::new();
    for &p in &current {
      for &q in &dominated[p] {
        counters[q] -= 1;
        if counters[q] == 0 {
          population[q].set_rank(rank + 1);
          next.push(q);
        }
      }
    }
    fronts.push(current);
    current = next;
    rank += 1;
  }
  fronts
}

/// Computes crowding distances for every front of a sorted population.
pub fn assign_crowding_distances(
  population: &mut [Candidate],
  fronts: &[Vec<usize>],
  objectives: &ObjectiveSet,
) {
  for front in fronts {
    crowd_front(population, front, objectives);
  }
}

/// Computes crowding distances within one front: per objective, the two
/// boundary members get an infinite distance and every interior member
/// accumulates the normalized gap between its neighbors. A zero-range
/// objective contributes nothing instead of dividing by zero.
pub fn crowd_front(
  population: &mut [Candidate],
  front: &[usize],
  objectives: &ObjectiveSet,
) {
  if front.is_empty() {
    return;
  }
  for &i in front {
    population[i].reset_crowding();
  }
  let mut order: Vec<usize> = front.to_vec();
  for m in 0..objectives.len() {
    order.sort_by(|&a, &b| {
      population[a].objectives()[m].total_cmp(&population[b].objectives()[m])
    });
    let first = order[0];
    let last = order[order.len() - 1];
    population[first].set_crowding(f64::INFINITY);
    population[last].set_crowding(f64::INFINITY);

    let range =
      population[last].objectives()[m] - population[first].objectives()[m];
    if !range.is_finite() || range <= 0.0 {
      continue;
    }
    for w in 1..order.len().saturating_sub(1) {
      let gap = population[order[w + 1]].objectives()[m]
        - population[order[w - 1]].objectives()[m];
      population[order[w]].add_crowding(gap / range);
    }
  }
}

/// Sorts front indices by descending crowding distance.
pub(crate) fn sort_by_crowding(
  population: &[Candidate],
  front: &mut [usize],
) {
  front.sort_by(|&a, &b| {
    population[b]
      .crowding_distance()
      .total_cmp(&population[a].crowding_distance())
  });
}

/// The size-bounded collection of non-dominated candidates persisted across
/// generations, independent of the transient population.
#[derive(Debug, Clone)]
pub struct ParetoArchive {
  members: Vec<Candidate>,
  capacity: usize,
  diversity_maintenance: bool,
}

impl ParetoArchive {
  /// Creates an empty archive. With `diversity_maintenance` the archive
  /// truncates by crowding distance, otherwise by insertion order.
  pub fn new(capacity: usize, diversity_maintenance: bool) -> Self {
    Self {
      members: Vec::new(),
      capacity,
      diversity_maintenance,
    }
  }

  /// The archived candidates. Always mutually non-dominated.
  pub fn members(&self) -> &[Candidate] {
    &self.members
  }

  /// Number of archived candidates.
  pub fn len(&self) -> usize {
    self.members.len()
  }

  /// Whether the archive holds nothing yet.
  pub fn is_empty(&self) -> bool {
    self.members.is_empty()
  }

  /// Merges the current generation's first front into the archive: the
  /// union is re-sorted, only its first front survives, and overflow past
  /// the capacity is truncated.
  ///
  /// Duplicate gene vectors are dropped before sorting so repeated
  /// generations cannot flood the archive with copies of one design.
  pub fn update(&mut self, front: &[Candidate], objectives: &ObjectiveSet) {
    let mut union: Vec<Candidate> = Vec::new();
    for candidate in self.members.drain(..).chain(front.iter().cloned()) {
      if !union.iter().any(|kept| kept.genes() == candidate.genes()) {
        union.push(candidate);
      }
    }

    let fronts = fast_nondominated_sort(&mut union, objectives);
    let Some(first) = fronts.into_iter().next() else {
      return;
    };
    let mut keep = first;
    if keep.len() > self.capacity {
      crowd_front(&mut union, &keep, objectives);
      if self.diversity_maintenance {
        sort_by_crowding(&union, &mut keep);
      }
      keep.truncate(self.capacity);
    }

    let mut slots: Vec<Option<Candidate>> =
      union.into_iter().map(Some).collect();
    self.members = keep
      .into_iter()
      .map(|i| slots[i].take().expect("archive index used twice"))
      .collect();
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::objective::Objective;
  use crate::variable::GeneValue;

  fn set2() -> ObjectiveSet {
    ObjectiveSet::new(vec![
      Objective::minimize("cost"),
      Objective::minimize("weight"),
    ])
    .unwrap()
  }

  fn candidate(tag: f64, objectives: Vec<f64>) -> Candidate {
    let mut c = Candidate::from_genes(vec![GeneValue::Number(tag)]);
    let fitness = -objectives.iter().sum::<f64>();
    c.set_objectives(objectives, vec![], fitness, true);
    c
  }

  #[test]
  fn test_fronts_partition_the_population() {
    let set = set2();
    let mut population = vec![
      candidate(0.0, vec![1.0, 4.0]), // front 0
      candidate(1.0, vec![2.0, 3.0]), // front 0
      candidate(2.0, vec![2.0, 4.0]), // dominated by both
      candidate(3.0, vec![3.0, 5.0]), // dominated by everything above
    ];
    let fronts = fast_nondominated_sort(&mut population, &set);

    let mut seen: Vec<usize> = fronts.iter().flatten().copied().collect();
    seen.sort_unstable();
    assert_eq!(seen, vec![0, 1, 2, 3], "fronts must cover the population");

    assert_eq!(fronts[0], vec![0, 1]);
    assert_eq!(population[0].rank(), 0);
    assert_eq!(population[1].rank(), 0);
    assert_eq!(population[2].rank(), 1);
    assert_eq!(population[3].rank(), 2);
  }

  #[test]
  fn test_first_front_is_not_dominated_by_anyone() {
    let set = set2();
    let mut population: Vec<Candidate> = (0..12)
      .map(|i| {
        let x = f64::from(i);
        candidate(x, vec![x, 11.0 - x])
      })
      .collect();
    population.push(candidate(20.0, vec![6.0, 6.5]));
    let fronts = fast_nondominated_sort(&mut population, &set);
    for &i in &fronts[0] {
      for (j, other) in population.iter().enumerate() {
        if i != j {
          assert!(
            !other.dominates(&population[i], &set),
            "front 0 member {i} dominated by {j}"
          );
        }
      }
    }
  }

  #[test]
  fn test_crowding_boundaries_are_infinite() {
    let set = set2();
    let mut population = vec![
      candidate(0.0, vec![1.0, 5.0]),
      candidate(1.0, vec![2.0, 4.0]),
      candidate(2.0, vec![3.0, 3.0]),
      candidate(3.0, vec![4.0, 2.0]),
      candidate(4.0, vec![5.0, 1.0]),
    ];
    let fronts = fast_nondominated_sort(&mut population, &set);
    assert_eq!(fronts.len(), 1);
    assign_crowding_distances(&mut population, &fronts, &set);

    assert_eq!(population[0].crowding_distance(), f64::INFINITY);
    assert_eq!(population[4].crowding_distance(), f64::INFINITY);
    for member in &population[1..4] {
      let d = member.crowding_distance();
      assert!(d.is_finite() && d > 0.0);
    }
  }

  #[test]
  fn test_zero_range_objective_contributes_nothing() {
    let set = set2();
    let mut population = vec![
      candidate(0.0, vec![1.0, 2.0]),
      candidate(1.0, vec![2.0, 2.0]),
      candidate(2.0, vec![3.0, 2.0]),
    ];
    let fronts = vec![vec![0, 1, 2]];
    assign_crowding_distances(&mut population, &fronts, &set);
    // interior member gets a contribution from the first objective only
    let d = population[1].crowding_distance();
    assert!((d - 1.0).abs() < 1e-12);
  }

  #[test]
  fn test_two_member_front_is_all_boundary() {
    let set = set2();
    let mut population = vec![
      candidate(0.0, vec![1.0, 2.0]),
      candidate(1.0, vec![2.0, 1.0]),
    ];
    let fronts = vec![vec![0, 1]];
    assign_crowding_distances(&mut population, &fronts, &set);
    assert_eq!(population[0].crowding_distance(), f64::INFINITY);
    assert_eq!(population[1].crowding_distance(), f64::INFINITY);
  }

  #[test]
  fn test_archive_keeps_only_the_first_front() {
    let set = set2();
    let mut archive = ParetoArchive::new(10, true);
    archive.update(
      &[
        candidate(0.0, vec![1.0, 4.0]),
        candidate(1.0, vec![4.0, 1.0]),
      ],
      &set,
    );
    assert_eq!(archive.len(), 2);

    // a new candidate dominating one archived member replaces it
    archive.update(&[candidate(2.0, vec![0.5, 3.0])], &set);
    let members = archive.members();
    assert_eq!(members.len(), 2);
    assert!(members
      .iter()
      .all(|m| m.objectives() != [1.0, 4.0].as_slice()));
  }

  #[test]
  fn test_archive_truncates_to_capacity_by_crowding() {
    let set = set2();
    let mut archive = ParetoArchive::new(3, true);
    let front: Vec<Candidate> = (0..7)
      .map(|i| {
        let x = f64::from(i);
        candidate(x, vec![x, 6.0 - x])
      })
      .collect();
    archive.update(&front, &set);
    assert_eq!(archive.len(), 3);
    // boundary members have infinite crowding and must survive
    let objectives: Vec<_> =
      archive.members().iter().map(|m| m.objectives()[0]).collect();
    assert!(objectives.contains(&0.0));
    assert!(objectives.contains(&6.0));
  }

  #[test]
  fn test_archive_drops_duplicate_designs() {
    let set = set2();
    let mut archive = ParetoArchive::new(10, true);
    let same = candidate(1.0, vec![2.0, 2.0]);
    archive.update(&[same.clone()], &set);
    archive.update(&[same.clone()], &set);
    archive.update(&[same], &set);
    assert_eq!(archive.len(), 1);
  }
}
