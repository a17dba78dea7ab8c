//! Reader over points already in memory

use crate::stage::{PointView, PointViewSet, QuickInfo, Stage, StreamableStage};
use pointstage_core::{PointLayout, Result};

/// Driver name of the in-memory reader
pub const BUFFER_READER: &str = "readers.buffer";

/// Replays a set of point views as a stage
#[derive(Debug, Default)]
pub struct BufferReader {
    views: PointViewSet,
    view_index: usize,
    point_index: usize,
}

impl BufferReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_views(views: PointViewSet) -> Self {
        Self {
            views,
            view_index: 0,
            point_index: 0,
        }
    }

    pub fn add_view(&mut self, view: PointView) {
        self.views.push(view);
    }

    /// Total number of buffered points
    pub fn len(&self) -> usize {
        self.views.iter().map(|v| v.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn layout(&self) -> PointLayout {
        PointLayout::from_dims(self.views.iter().flat_map(|v| v.layout().dims().iter().copied()))
    }
}

impl Stage for BufferReader {
    fn name(&self) -> &str {
        BUFFER_READER
    }

    fn preview(&mut self) -> Result<QuickInfo> {
        Ok(QuickInfo::new(self.len(), self.layout().dims().to_vec()))
    }

    fn pipeline_streamable(&self) -> bool {
        true
    }

    fn prepare(&mut self, layout: &mut PointLayout) -> Result<()> {
        for id in self.layout().dims() {
            layout.register_dim(*id);
        }
        self.view_index = 0;
        self.point_index = 0;
        Ok(())
    }

    /// Hands the buffered views over unchanged when their layout matches
    /// `layout`, otherwise re-lays them out
    fn execute(&mut self, layout: &PointLayout) -> Result<PointViewSet> {
        let views = std::mem::take(&mut self.views);
        views
            .into_iter()
            .map(|view| {
                if view.layout() == layout {
                    return Ok(view);
                }
                let mut relaid = PointView::new(view.id(), layout.clone());
                let mut row = vec![0.0; layout.len()];
                for point in view.iter() {
                    for (slot, id) in layout.dims().iter().enumerate() {
                        row[slot] = point.get_f64(*id);
                    }
                    relaid.append_row(&row)?;
                }
                Ok(relaid)
            })
            .collect()
    }

    fn as_streamable(&mut self) -> Option<&mut dyn StreamableStage> {
        Some(self)
    }
}

impl StreamableStage for BufferReader {
    fn read_next(&mut self, layout: &PointLayout, row: &mut [f64]) -> Result<bool> {
        while let Some(view) = self.views.get(self.view_index) {
            if let Some(point) = view.point(self.point_index) {
                for (slot, id) in layout.dims().iter().enumerate() {
                    row[slot] = point.get_f64(*id);
                }
                self.point_index += 1;
                return Ok(true);
            }
            self.view_index += 1;
            self.point_index = 0;
        }
        Ok(false)
    }
}
