//! Point layouts

use crate::dimension::DimensionId;
use serde::{Deserialize, Serialize};

/// Ordered set of dimensions present in a point stream.
///
/// Dimensions keep the order in which they were registered. Registering a
/// dimension twice is a no-op.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointLayout {
    dims: Vec<DimensionId>,
}

impl PointLayout {
    /// Create an empty layout
    pub fn new() -> Self {
        Self { dims: Vec::new() }
    }

    /// Create a layout from a list of dimensions, dropping duplicates
    pub fn from_dims<I: IntoIterator<Item = DimensionId>>(dims: I) -> Self {
        let mut layout = Self::new();
        for id in dims {
            layout.register_dim(id);
        }
        layout
    }

    /// Register a dimension, returning its position in the layout
    pub fn register_dim(&mut self, id: DimensionId) -> usize {
        match self.index_of(id) {
            Some(index) => index,
            None => {
                self.dims.push(id);
                self.dims.len() - 1
            }
        }
    }

    /// Position of `id` in the layout
    pub fn index_of(&self, id: DimensionId) -> Option<usize> {
        self.dims.iter().position(|d| *d == id)
    }

    pub fn has_dim(&self, id: DimensionId) -> bool {
        self.dims.contains(&id)
    }

    /// Dimensions in registration order
    pub fn dims(&self) -> &[DimensionId] {
        &self.dims
    }

    /// Number of dimensions (the stride of a point row)
    pub fn len(&self) -> usize {
        self.dims.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dims.is_empty()
    }
}
