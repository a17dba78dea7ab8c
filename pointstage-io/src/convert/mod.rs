//! Conversion of stage output into a [`PointCloud`]
//!
//! [`CloudConverter`] sits at the end of a stage pipeline. It receives every
//! point once, recentres coordinates with the shift chosen on the first
//! point, and fills one scalar field per generic attribute.

pub mod fields;

pub use fields::{
    create_scalar_field_map, create_scalar_field_map_with, is_color, is_coordinate,
    is_scalar_attribute, ScalarFieldMap,
};

use crate::events::{EventSink, LoadEvent, TracingSink};
use crate::stage::{PointRef, PointView, QuickInfo, StreamFilter};
use pointstage_core::{shifted_point, DimensionId, Error, Point3d, PointCloud, PointLayout, Result};
use std::sync::Arc;
use tracing::debug;

/// Callback choosing the global shift from the first raw point
pub type DetermineShiftFn<'a> = Box<dyn FnMut(&Point3d, &mut PointCloud) + 'a>;

/// Callback invoked once per converted point
pub type ProgressFn<'a> = Box<dyn FnMut() + 'a>;

/// Pipeline sink building a [`PointCloud`]
pub struct CloudConverter<'a> {
    info: QuickInfo,
    cloud: Option<PointCloud>,
    determine_shift: DetermineShiftFn<'a>,
    progress: ProgressFn<'a>,
    events: Arc<dyn EventSink>,
    scalar_fields: ScalarFieldMap,
    field_ids: Vec<DimensionId>,
    extract_colors: bool,
    is_first_point: bool,
}

fn missing_cloud() -> Error {
    Error::Stage("Converter has no destination cloud".to_string())
}

impl<'a> CloudConverter<'a> {
    /// `info.point_count` sizes the initial reservation. `progress` is called
    /// once per point.
    pub fn new<F>(info: QuickInfo, progress: F) -> Self
    where
        F: FnMut() + 'a,
    {
        Self {
            info,
            cloud: Some(PointCloud::default()),
            determine_shift: Box::new(|_, _| {}),
            progress: Box::new(progress),
            events: Arc::new(TracingSink),
            scalar_fields: ScalarFieldMap::new(),
            field_ids: Vec::new(),
            extract_colors: false,
            is_first_point: true,
        }
    }

    /// Set the callback run on the first point. Without one, coordinates are
    /// stored unshifted.
    pub fn set_determine_shift<F>(&mut self, determine_shift: F)
    where
        F: FnMut(&Point3d, &mut PointCloud) + 'a,
    {
        self.determine_shift = Box::new(determine_shift);
    }

    pub fn with_event_sink(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }

    /// Dimensions that got a scalar field, in creation order
    pub fn scalar_field_ids(&self) -> &[DimensionId] {
        &self.field_ids
    }

    /// Whether colours are being extracted
    pub fn extracts_colors(&self) -> bool {
        self.extract_colors
    }

    /// The cloud being built
    pub fn cloud(&self) -> Option<&PointCloud> {
        self.cloud.as_ref()
    }

    /// Move the built cloud out. Later calls return `None`.
    pub fn take_cloud(&mut self) -> Option<PointCloud> {
        self.cloud.take()
    }
}

impl StreamFilter for CloudConverter<'_> {
    fn prepared(&mut self, layout: &PointLayout) -> Result<()> {
        self.events.emit(LoadEvent::info("Initialize"));
        let count = self.info.point_count;
        let cloud = self.cloud.as_mut().ok_or_else(missing_cloud)?;

        cloud.reserve(count).map_err(|_| {
            Error::OutOfMemory(format!("Not enough memory to load {} points", count))
        })?;

        self.extract_colors = [DimensionId::Red, DimensionId::Green, DimensionId::Blue]
            .iter()
            .all(|id| layout.has_dim(*id));
        if self.extract_colors {
            cloud.reserve_colors(count).map_err(|_| {
                Error::OutOfMemory(format!("Not enough memory to load {} colors", count))
            })?;
        }

        self.scalar_fields = create_scalar_field_map(layout.dims(), count, self.events.as_ref());
        self.field_ids = self.scalar_fields.keys().collect();
        self.is_first_point = true;
        debug!(
            "Converter prepared for {} points, {} scalar fields, colors: {}",
            count,
            self.field_ids.len(),
            self.extract_colors
        );
        Ok(())
    }

    fn process_one(&mut self, point: &PointRef<'_>) -> Result<bool> {
        let cloud = self.cloud.as_mut().ok_or_else(missing_cloud)?;
        let raw = point.position();
        if self.is_first_point {
            (self.determine_shift)(&raw, cloud);
            self.is_first_point = false;
        }

        let shift = cloud.global_shift();
        cloud.add_point(shifted_point(&raw, &shift));
        for (id, field) in self.scalar_fields.iter_mut() {
            field.add_element(point.get_scalar(id));
        }
        if self.extract_colors {
            cloud.add_color([
                point.get_u16(DimensionId::Red),
                point.get_u16(DimensionId::Green),
                point.get_u16(DimensionId::Blue),
            ]);
        }

        (self.progress)();
        Ok(false)
    }

    fn run(&mut self, view: &PointView) -> Result<()> {
        let cloud = self.cloud.as_mut().ok_or_else(missing_cloud)?;
        let total = cloud.len() + view.len();
        cloud.reserve(total)?;
        for point in view.iter() {
            self.process_one(&point)?;
        }
        Ok(())
    }

    fn done(&mut self) -> Result<()> {
        let cloud = self.cloud.as_mut().ok_or_else(missing_cloud)?;
        for (_, mut field) in std::mem::take(&mut self.scalar_fields) {
            field.compute_min_and_max();
            cloud.add_scalar_field(field);
        }
        debug!("Converter done: {} points", cloud.len());
        Ok(())
    }
}
