//! Point storage shared between stages: views, fixed tables and point
//! references.
//!
//! Every value is held as `f64` in layout order; consumers convert to the
//! numeric type they need.

use super::StreamableStage;
use pointstage_core::{DimensionId, Error, Point3d, PointLayout, Result, ScalarType};

/// Read-only view of one point's values
#[derive(Debug, Clone, Copy)]
pub struct PointRef<'a> {
    layout: &'a PointLayout,
    values: &'a [f64],
}

impl<'a> PointRef<'a> {
    pub fn new(layout: &'a PointLayout, values: &'a [f64]) -> Self {
        Self { layout, values }
    }

    pub fn has_dim(&self, id: DimensionId) -> bool {
        self.layout.has_dim(id)
    }

    /// Value of `id` as `f64`. Dimensions missing from the layout read as 0.
    pub fn get_f64(&self, id: DimensionId) -> f64 {
        self.layout
            .index_of(id)
            .and_then(|i| self.values.get(i).copied())
            .unwrap_or(0.0)
    }

    /// Value of `id` as a scalar field value
    pub fn get_scalar(&self, id: DimensionId) -> ScalarType {
        self.get_f64(id) as ScalarType
    }

    /// Value of `id` saturated into `u16`
    pub fn get_u16(&self, id: DimensionId) -> u16 {
        let v = self.get_f64(id);
        if v.is_nan() {
            0
        } else {
            v.round().clamp(0.0, u16::MAX as f64) as u16
        }
    }

    /// Raw X/Y/Z in double precision
    pub fn position(&self) -> Point3d {
        Point3d::new(
            self.get_f64(DimensionId::X),
            self.get_f64(DimensionId::Y),
            self.get_f64(DimensionId::Z),
        )
    }
}

/// A materialized, randomly addressable set of points
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointView {
    id: usize,
    layout: PointLayout,
    data: Vec<f64>,
}

/// Views produced by one execution, in production order
pub type PointViewSet = Vec<PointView>;

impl PointView {
    pub fn new(id: usize, layout: PointLayout) -> Self {
        Self {
            id,
            layout,
            data: Vec::new(),
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn layout(&self) -> &PointLayout {
        &self.layout
    }

    /// Append one point given in layout order
    pub fn append_row(&mut self, row: &[f64]) -> Result<()> {
        if row.len() != self.layout.len() {
            return Err(Error::InvalidData(format!(
                "Point has {} values but the layout has {} dimensions",
                row.len(),
                self.layout.len()
            )));
        }
        self.data.extend_from_slice(row);
        Ok(())
    }

    pub fn len(&self) -> usize {
        match self.layout.len() {
            0 => 0,
            stride => self.data.len() / stride,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn point(&self, index: usize) -> Option<PointRef<'_>> {
        let stride = self.layout.len();
        let start = index.checked_mul(stride)?;
        let values = self.data.get(start..start + stride)?;
        Some(PointRef::new(&self.layout, values))
    }

    pub fn iter(&self) -> impl Iterator<Item = PointRef<'_>> + '_ {
        let stride = self.layout.len().max(1);
        self.data
            .chunks_exact(stride)
            .take(self.len())
            .map(move |values| PointRef::new(&self.layout, values))
    }
}

/// A bounded point table for streaming execution.
///
/// Holds at most `capacity` points at once regardless of the size of the
/// source.
#[derive(Debug, Clone)]
pub struct FixedPointTable {
    layout: PointLayout,
    capacity: usize,
    data: Vec<f64>,
    len: usize,
}

impl FixedPointTable {
    /// Create a table holding up to `capacity` points (at least one)
    pub fn new(capacity: usize) -> Self {
        Self {
            layout: PointLayout::new(),
            capacity: capacity.max(1),
            data: Vec::new(),
            len: 0,
        }
    }

    pub fn layout(&self) -> &PointLayout {
        &self.layout
    }

    pub fn layout_mut(&mut self) -> &mut PointLayout {
        &mut self.layout
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn clear(&mut self) {
        self.data.clear();
        self.len = 0;
    }

    /// Replace the table contents with up to `capacity` points pulled from
    /// `source`. Returns the number of points read; fewer than `capacity`
    /// means the source is exhausted.
    pub fn fill(&mut self, source: &mut dyn StreamableStage) -> Result<usize> {
        self.clear();
        let stride = self.layout.len();
        while self.len < self.capacity {
            let start = self.data.len();
            self.data.resize(start + stride, 0.0);
            match source.read_next(&self.layout, &mut self.data[start..]) {
                Ok(true) => self.len += 1,
                Ok(false) => {
                    self.data.truncate(start);
                    break;
                }
                Err(e) => {
                    self.data.truncate(start);
                    return Err(e);
                }
            }
        }
        Ok(self.len)
    }

    pub fn point(&self, index: usize) -> Option<PointRef<'_>> {
        if index >= self.len {
            return None;
        }
        let stride = self.layout.len();
        let start = index * stride;
        Some(PointRef::new(&self.layout, &self.data[start..start + stride]))
    }
}
