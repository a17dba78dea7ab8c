//! Named per-point scalar attributes

use crate::point::ScalarType;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::ops::Index;

/// A named buffer holding one scalar value per point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalarField {
    name: String,
    values: Vec<ScalarType>,
    min: ScalarType,
    max: ScalarType,
}

impl ScalarField {
    /// Create a new empty scalar field
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            values: Vec::new(),
            min: 0.0,
            max: 0.0,
        }
    }

    /// Create a scalar field from existing values. Min and max are computed.
    pub fn from_values<S: Into<String>>(name: S, values: Vec<ScalarType>) -> Self {
        let mut field = Self {
            name: name.into(),
            values,
            min: 0.0,
            max: 0.0,
        };
        field.compute_min_and_max();
        field
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Make room for `count` values in total. Fails instead of aborting when
    /// the allocation cannot be satisfied.
    pub fn try_reserve(&mut self, count: usize) -> Result<()> {
        let additional = count.saturating_sub(self.values.len());
        self.values.try_reserve_exact(additional)?;
        Ok(())
    }

    /// Number of values the field can hold without reallocating
    pub fn capacity(&self) -> usize {
        self.values.capacity()
    }

    /// Append one value
    pub fn add_element(&mut self, value: ScalarType) {
        self.values.push(value);
    }

    /// Recompute the cached min/max summary. NaN values are ignored; an empty
    /// (or all-NaN) field gets `0.0` for both.
    pub fn compute_min_and_max(&mut self) {
        let mut range: Option<(ScalarType, ScalarType)> = None;
        for &v in self.values.iter().filter(|v| !v.is_nan()) {
            range = Some(match range {
                Some((lo, hi)) => (lo.min(v), hi.max(v)),
                None => (v, v),
            });
        }
        let (min, max) = range.unwrap_or((0.0, 0.0));
        self.min = min;
        self.max = max;
    }

    /// Smallest value as of the last `compute_min_and_max`
    pub fn min(&self) -> ScalarType {
        self.min
    }

    /// Largest value as of the last `compute_min_and_max`
    pub fn max(&self) -> ScalarType {
        self.max
    }

    pub fn values(&self) -> &[ScalarType] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl Index<usize> for ScalarField {
    type Output = ScalarType;

    fn index(&self, index: usize) -> &Self::Output {
        &self.values[index]
    }
}
