//! Design variable catalog: the read-only description of the search space.
//!
//! A [`DesignSpace`] is an ordered sequence of named [`DesignVariable`]s.
//! Variable order is fixed at construction and every [`Candidate`]'s genes
//! are stored positionally against it, so a gene is always resolved by index
//! instead of by string lookup during the hot loop.
//!
//! [`Candidate`]: crate::candidate::Candidate

use std::collections::HashMap;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// A single gene value.
///
/// Numeric variables carry an `f64`; categorical variables carry the index of
/// the chosen option in their option list.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum GeneValue {
  /// Value of a continuous or discrete variable.
  Number(f64),
  /// Index into a categorical variable's option list.
  Choice(usize),
}

impl GeneValue {
  /// Returns the numeric value, if this gene is numeric.
  pub fn as_number(&self) -> Option<f64> {
    match self {
      GeneValue::Number(v) => Some(*v),
      GeneValue::Choice(_) => None,
    }
  }

  /// Returns the option index, if this gene is categorical.
  pub fn as_choice(&self) -> Option<usize> {
    match self {
      GeneValue::Number(_) => None,
      GeneValue::Choice(i) => Some(*i),
    }
  }
}

/// The type of a design variable together with its domain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum VariableKind {
  /// A real-valued variable in `[min, max]`.
  Continuous {
    /// Lower bound.
    min: f64,
    /// Upper bound.
    max: f64,
  },
  /// A numeric variable restricted to `min + k * step <= max`.
  Discrete {
    /// Lower bound.
    min: f64,
    /// Upper bound.
    max: f64,
    /// Distance between admissible values.
    step: f64,
  },
  /// A variable taking one value out of an ordered list of named options.
  Categorical {
    /// The admissible options, in catalog order.
    options: Vec<String>,
  },
}

/// One tunable parameter of a design: a member size, a material grade, a
/// connection type. Immutable for the duration of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesignVariable {
  name: String,
  kind: VariableKind,
  initial: Option<GeneValue>,
  description: Option<String>,
  units: Option<String>,
}

impl DesignVariable {
  /// Creates a continuous variable on `[min, max]`.
  pub fn continuous(name: impl Into<String>, min: f64, max: f64) -> Self {
    Self {
      name: name.into(),
      kind: VariableKind::Continuous { min, max },
      initial: None,
      description: None,
      units: None,
    }
  }

  /// Creates a discrete variable on `[min, max]` with step 1.
  pub fn discrete(name: impl Into<String>, min: f64, max: f64) -> Self {
    Self::discrete_stepped(name, min, max, 1.0)
  }

  /// Creates a discrete variable on `[min, max]` with an explicit step.
  pub fn discrete_stepped(
    name: impl Into<String>,
    min: f64,
    max: f64,
    step: f64,
  ) -> Self {
    Self {
      name: name.into(),
      kind: VariableKind::Discrete { min, max, step },
      initial: None,
      description: None,
      units: None,
    }
  }

  /// Creates a categorical variable over an ordered list of options.
  pub fn categorical<I, S>(name: impl Into<String>, options: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    Self {
      name: name.into(),
      kind: VariableKind::Categorical {
        options: options.into_iter().map(Into::into).collect(),
      },
      initial: None,
      description: None,
      units: None,
    }
  }

  /// Sets the catalog's current value for this variable. When any variable
  /// carries one, a single member of the initial population is seeded from
  /// the catalog instead of sampled at random.
  pub fn with_initial(mut self, value: GeneValue) -> Self {
    self.initial = Some(value);
    self
  }

  /// Attaches a free-text description.
  pub fn with_description(mut self, description: impl Into<String>) -> Self {
    self.description = Some(description.into());
    self
  }

  /// Attaches a unit label.
  pub fn with_units(mut self, units: impl Into<String>) -> Self {
    self.units = Some(units.into());
    self
  }

  /// The variable's unique name.
  pub fn name(&self) -> &str {
    &self.name
  }

  /// The variable's kind and domain.
  pub fn kind(&self) -> &VariableKind {
    &self.kind
  }

  /// The catalog's current value, if one was set.
  pub fn initial(&self) -> Option<GeneValue> {
    self.initial
  }

  /// The free-text description, if any.
  pub fn description(&self) -> Option<&str> {
    self.description.as_deref()
  }

  /// The unit label, if any.
  pub fn units(&self) -> Option<&str> {
    self.units.as_deref()
  }

  /// Resolves a categorical gene to its option label.
  pub fn option_label(&self, value: &GeneValue) -> Option<&str> {
    match (&self.kind, value) {
      (VariableKind::Categorical { options }, GeneValue::Choice(i)) => {
        options.get(*i).map(String::as_str)
      }
      _ => None,
    }
  }

  /// Draws a uniformly random admissible value.
  pub fn sample<R: Rng>(&self, rng: &mut R) -> GeneValue {
    match &self.kind {
      VariableKind::Continuous { min, max } => {
        GeneValue::Number(rng.gen_range(*min..=*max))
      }
      VariableKind::Discrete { min, max, step } => {
        let steps = ((max - min) / step).floor() as u64;
        let k = rng.gen_range(0..=steps);
        GeneValue::Number(min + k as f64 * step)
      }
      VariableKind::Categorical { options } => {
        GeneValue::Choice(rng.gen_range(0..options.len()))
      }
    }
  }

  /// Clamps a raw numeric value into this variable's domain, rounding
  /// discrete values to the nearest admissible step. For categorical
  /// variables the value is interpreted as an option index and clamped into
  /// the option list.
  pub fn clamp_number(&self, value: f64) -> GeneValue {
    match &self.kind {
      VariableKind::Continuous { min, max } => {
        GeneValue::Number(value.clamp(*min, *max))
      }
      VariableKind::Discrete { min, max, step } => {
        let clamped = value.clamp(*min, *max);
        let mut k = ((clamped - min) / step).round();
        // rounding up may overshoot max when the range is not a step multiple
        if min + k * step > *max {
          k -= 1.0;
        }
        GeneValue::Number(min + k * step)
      }
      VariableKind::Categorical { options } => {
        let last = options.len() - 1;
        GeneValue::Choice((value.round().max(0.0) as usize).min(last))
      }
    }
  }

  /// Clamps an existing gene back into this variable's domain.
  pub fn clamp(&self, value: &GeneValue) -> GeneValue {
    match value {
      GeneValue::Number(v) => self.clamp_number(*v),
      GeneValue::Choice(i) => self.clamp_number(*i as f64),
    }
  }

  /// The width of the numeric domain, or the number of option gaps for a
  /// categorical variable.
  pub fn span(&self) -> f64 {
    match &self.kind {
      VariableKind::Continuous { min, max }
      | VariableKind::Discrete { min, max, .. } => max - min,
      VariableKind::Categorical { options } => (options.len() - 1) as f64,
    }
  }

  /// Whether a gene value lies within this variable's domain.
  pub fn contains(&self, value: &GeneValue) -> bool {
    match (&self.kind, value) {
      (VariableKind::Continuous { min, max }, GeneValue::Number(v)) => {
        (*min..=*max).contains(v)
      }
      (VariableKind::Discrete { min, max, step }, GeneValue::Number(v)) => {
        if !(*min..=*max).contains(v) {
          return false;
        }
        let k = (v - min) / step;
        (k - k.round()).abs() < 1e-9
      }
      (VariableKind::Categorical { options }, GeneValue::Choice(i)) => {
        *i < options.len()
      }
      _ => false,
    }
  }

  /// Normalized distance between two values of this variable, in `[0, 1]`.
  /// Categorical values are either identical (0) or not (1).
  pub fn normalized_distance(&self, a: &GeneValue, b: &GeneValue) -> f64 {
    match (a, b) {
      (GeneValue::Number(x), GeneValue::Number(y)) => {
        let span = self.span();
        if span > 0.0 {
          ((x - y).abs() / span).min(1.0)
        } else {
          0.0
        }
      }
      (GeneValue::Choice(x), GeneValue::Choice(y)) => {
        if x == y {
          0.0
        } else {
          1.0
        }
      }
      _ => 1.0,
    }
  }

  fn validate(&self) -> Result<(), Error> {
    match &self.kind {
      VariableKind::Continuous { min, max } => {
        if !min.is_finite() || !max.is_finite() || min > max {
          return Err(Error::InvalidBounds {
            name: self.name.clone(),
            min: *min,
            max: *max,
          });
        }
      }
      VariableKind::Discrete { min, max, step } => {
        if !min.is_finite() || !max.is_finite() || min > max {
          return Err(Error::InvalidBounds {
            name: self.name.clone(),
            min: *min,
            max: *max,
          });
        }
        if !step.is_finite() || *step <= 0.0 {
          return Err(Error::InvalidStep {
            name: self.name.clone(),
            step: *step,
          });
        }
      }
      VariableKind::Categorical { options } => {
        if options.is_empty() {
          return Err(Error::EmptyOptions(self.name.clone()));
        }
      }
    }
    Ok(())
  }
}

/// The ordered, validated catalog of design variables for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct DesignSpace {
  variables: Vec<DesignVariable>,
  index: HashMap<String, usize>,
}

impl DesignSpace {
  /// Builds a design space from a list of variables.
  ///
  /// Fails fast on an empty catalog, duplicate names, inverted or non-finite
  /// bounds, non-positive steps and empty option lists.
  pub fn new(variables: Vec<DesignVariable>) -> Result<Self, Error> {
    if variables.is_empty() {
      return Err(Error::EmptyDesignSpace);
    }
    let mut index = HashMap::with_capacity(variables.len());
    for (i, variable) in variables.iter().enumerate() {
      variable.validate()?;
      if index.insert(variable.name.clone(), i).is_some() {
        return Err(Error::DuplicateVariable(variable.name.clone()));
      }
    }
    Ok(Self { variables, index })
  }

  /// Number of variables in the catalog.
  pub fn len(&self) -> usize {
    self.variables.len()
  }

  /// Whether the catalog is empty. Never true for a constructed space.
  pub fn is_empty(&self) -> bool {
    self.variables.is_empty()
  }

  /// The variables in catalog order.
  pub fn variables(&self) -> &[DesignVariable] {
    &self.variables
  }

  /// Looks a variable up by name.
  pub fn get(&self, name: &str) -> Option<&DesignVariable> {
    self.index.get(name).map(|&i| &self.variables[i])
  }

  /// The positional index of a variable.
  pub fn index_of(&self, name: &str) -> Option<usize> {
    self.index.get(name).copied()
  }

  /// Draws one uniformly random gene vector.
  pub fn sample_genes<R: Rng>(&self, rng: &mut R) -> Vec<GeneValue> {
    self.variables.iter().map(|v| v.sample(rng)).collect()
  }

  /// Builds a gene vector from the catalog's current values, sampling the
  /// variables that don't carry one. Returns `None` when no variable carries
  /// a current value.
  pub fn seed_genes<R: Rng>(&self, rng: &mut R) -> Option<Vec<GeneValue>> {
    if self.variables.iter().all(|v| v.initial.is_none()) {
      return None;
    }
    Some(
      self
        .variables
        .iter()
        .map(|v| match v.initial {
          Some(value) => v.clamp(&value),
          None => v.sample(rng),
        })
        .collect(),
    )
  }

  /// Mean normalized per-variable distance between two gene vectors.
  pub fn normalized_distance(&self, a: &[GeneValue], b: &[GeneValue]) -> f64 {
    let total: f64 = self
      .variables
      .iter()
      .zip(a.iter().zip(b))
      .map(|(v, (x, y))| v.normalized_distance(x, y))
      .sum();
    total / self.variables.len() as f64
  }

  /// Whether every gene of a vector lies within its variable's domain.
  pub fn contains(&self, genes: &[GeneValue]) -> bool {
    genes.len() == self.variables.len()
      && self
        .variables
        .iter()
        .zip(genes)
        .all(|(v, g)| v.contains(g))
  }
}

#[cfg(test)]
mod tests {
  use proptest::prelude::*;
  use rand::{rngs::StdRng, SeedableRng};

  use super::*;

  fn beam_catalog() -> DesignSpace {
    DesignSpace::new(vec![
      DesignVariable::discrete_stepped("beam_width", 200.0, 600.0, 50.0),
      DesignVariable::continuous("span", 3.0, 12.0),
      DesignVariable::categorical("grade", ["fc20", "fc25", "fc30"]),
    ])
    .unwrap()
  }

  #[test]
  fn test_empty_catalog_is_rejected() {
    assert_eq!(DesignSpace::new(vec![]), Err(Error::EmptyDesignSpace));
  }

  #[test]
  fn test_duplicate_names_are_rejected() {
    let result = DesignSpace::new(vec![
      DesignVariable::continuous("a", 0.0, 1.0),
      DesignVariable::continuous("a", 0.0, 2.0),
    ]);
    assert_eq!(result, Err(Error::DuplicateVariable("a".into())));
  }

  #[test]
  fn test_inverted_bounds_are_rejected() {
    let result =
      DesignSpace::new(vec![DesignVariable::continuous("a", 2.0, 1.0)]);
    assert!(matches!(result, Err(Error::InvalidBounds { .. })));
  }

  #[test]
  fn test_zero_step_is_rejected() {
    let result = DesignSpace::new(vec![DesignVariable::discrete_stepped(
      "a", 0.0, 10.0, 0.0,
    )]);
    assert!(matches!(result, Err(Error::InvalidStep { .. })));
  }

  #[test]
  fn test_empty_options_are_rejected() {
    let result = DesignSpace::new(vec![DesignVariable::categorical(
      "grade",
      Vec::<String>::new(),
    )]);
    assert_eq!(result, Err(Error::EmptyOptions("grade".into())));
  }

  #[test]
  fn test_sampled_genes_stay_in_bounds() {
    let space = beam_catalog();
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..500 {
      let genes = space.sample_genes(&mut rng);
      assert!(space.contains(&genes), "sampled genes out of bounds");
    }
  }

  #[test]
  fn test_discrete_clamp_rounds_to_step() {
    let v = DesignVariable::discrete_stepped("w", 200.0, 600.0, 50.0);
    assert_eq!(v.clamp_number(226.0), GeneValue::Number(250.0));
    assert_eq!(v.clamp_number(224.0), GeneValue::Number(200.0));
    assert_eq!(v.clamp_number(1000.0), GeneValue::Number(600.0));
    assert_eq!(v.clamp_number(-3.0), GeneValue::Number(200.0));
  }

  #[test]
  fn test_categorical_clamp_keeps_index_valid() {
    let v = DesignVariable::categorical("grade", ["fc20", "fc25", "fc30"]);
    assert_eq!(v.clamp(&GeneValue::Choice(9)), GeneValue::Choice(2));
    assert_eq!(v.option_label(&GeneValue::Choice(1)), Some("fc25"));
  }

  #[test]
  fn test_seed_genes_uses_catalog_values() {
    let space = DesignSpace::new(vec![
      DesignVariable::discrete_stepped("w", 200.0, 600.0, 50.0)
        .with_initial(GeneValue::Number(300.0)),
      DesignVariable::continuous("span", 3.0, 12.0),
    ])
    .unwrap();
    let mut rng = StdRng::seed_from_u64(1);
    let genes = space.seed_genes(&mut rng).unwrap();
    assert_eq!(genes[0], GeneValue::Number(300.0));
    assert!(space.contains(&genes));
  }

  #[test]
  fn test_seed_genes_absent_without_initial_values() {
    let space = beam_catalog();
    let mut rng = StdRng::seed_from_u64(1);
    assert!(space.seed_genes(&mut rng).is_none());
  }

  #[test]
  fn test_normalized_distance() {
    let space = beam_catalog();
    let a = vec![
      GeneValue::Number(200.0),
      GeneValue::Number(3.0),
      GeneValue::Choice(0),
    ];
    let b = vec![
      GeneValue::Number(600.0),
      GeneValue::Number(3.0),
      GeneValue::Choice(2),
    ];
    let d = space.normalized_distance(&a, &b);
    assert!((d - 2.0 / 3.0).abs() < 1e-12);
    assert_eq!(space.normalized_distance(&a, &a), 0.0);
  }

  proptest! {
    #[test]
    fn prop_clamp_always_lands_in_bounds(
      min in -1e3..1e3f64,
      width in 0.0..1e3f64,
      step in 0.1..50.0f64,
      value in -1e4..1e4f64,
    ) {
      let max = min + width;
      let v = DesignVariable::discrete_stepped("v", min, max, step);
      let clamped = v.clamp_number(value);
      let n = clamped.as_number().unwrap();
      prop_assert!(n >= min - 1e-9 && n <= max + 1e-9);
    }
  }
}
