//! Point stages
//!
//! A stage produces point data: it can be previewed cheaply, prepared
//! against a point layout, and then either executed in one go (producing
//! materialized point views) or, if it is streamable, pulled one point at a
//! time into a fixed-size table.

use pointstage_core::{DimensionId, PointLayout, Result};

mod table;
pub use self::table::*;

mod execution;
pub use self::execution::*;

mod factory;
pub use self::factory::*;

/// Lightweight summary of a source, obtained without reading its points
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuickInfo {
    /// Estimated number of points. Only used to size progress and initial
    /// reservations, never trusted as exact.
    pub point_count: usize,
    /// Dimensions the source declares
    pub dims: Vec<DimensionId>,
}

impl QuickInfo {
    pub fn new(point_count: usize, dims: Vec<DimensionId>) -> Self {
        Self { point_count, dims }
    }
}

/// A producer of point data
pub trait Stage: Send {
    /// Driver name, e.g. `readers.text`
    fn name(&self) -> &str;

    /// Read just enough of the source to describe it
    fn preview(&mut self) -> Result<QuickInfo>;

    /// Whether the stage can be driven point by point with bounded memory
    fn pipeline_streamable(&self) -> bool {
        false
    }

    /// Open the source and register its dimensions in `layout`
    fn prepare(&mut self, layout: &mut PointLayout) -> Result<()>;

    /// Read every point into memory
    fn execute(&mut self, layout: &PointLayout) -> Result<PointViewSet>;

    /// Streaming access, available on streamable stages after `prepare`
    fn as_streamable(&mut self) -> Option<&mut dyn StreamableStage> {
        None
    }
}

/// Point-at-a-time access to a prepared stage
pub trait StreamableStage {
    /// Fill `row` with the next point, laid out per `layout`. The row is
    /// zeroed beforehand. Returns `Ok(false)` once the source is exhausted.
    fn read_next(&mut self, layout: &PointLayout, row: &mut [f64]) -> Result<bool>;
}

/// A consumer of points at the end of a pipeline
pub trait StreamFilter {
    /// Called once with the full layout before any point
    fn prepared(&mut self, layout: &PointLayout) -> Result<()>;

    /// Consume one point. Returns whether the point is passed on inline.
    fn process_one(&mut self, point: &PointRef<'_>) -> Result<bool>;

    /// Consume a materialized view
    fn run(&mut self, view: &PointView) -> Result<()> {
        for point in view.iter() {
            self.process_one(&point)?;
        }
        Ok(())
    }

    /// Called once after the last point
    fn done(&mut self) -> Result<()>;
}
