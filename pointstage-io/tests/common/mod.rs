//! Shared fixtures for the ingestion tests

#![allow(dead_code)]

use pointstage_core::{DimensionId, EntityGroup, Error, PointCloud, PointLayout, Result};
use pointstage_io::stage::{PointView, PointViewSet, QuickInfo, Stage, StreamableStage};
use pointstage_io::{FileError, LoadParameters, MemorySink, ProgressReporter, StageFilter};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// How a [`ScriptedStage`] behaves when driven
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Script {
    /// Streamable, one point per `read_next`
    Streaming,
    /// Not streamable, one view from `execute`
    Batch,
    /// Not streamable, rows split over two views
    TwoViews,
    /// Not streamable, `execute` returns no view
    NoViews,
    /// `execute` fails
    FailOnExecute,
    /// `execute` panics
    PanicOnExecute,
}

/// A stage replaying fixed rows
#[derive(Debug, Clone)]
pub struct ScriptedStage {
    script: Script,
    dims: Vec<DimensionId>,
    rows: Vec<Vec<f64>>,
    estimate: Option<usize>,
    cursor: usize,
}

impl ScriptedStage {
    pub fn new(script: Script, dims: &[DimensionId], rows: Vec<Vec<f64>>) -> Self {
        Self {
            script,
            dims: dims.to_vec(),
            rows,
            estimate: None,
            cursor: 0,
        }
    }

    /// Point count reported by `preview` instead of the real one
    pub fn with_estimate(mut self, estimate: usize) -> Self {
        self.estimate = Some(estimate);
        self
    }

    fn fill_row(&self, index: usize, layout: &PointLayout, row: &mut [f64]) {
        for (id, value) in self.dims.iter().zip(&self.rows[index]) {
            if let Some(slot) = layout.index_of(*id) {
                row[slot] = *value;
            }
        }
    }

    fn view(&self, id: usize, layout: &PointLayout, range: std::ops::Range<usize>) -> Result<PointView> {
        let mut view = PointView::new(id, layout.clone());
        for index in range {
            let mut row = vec![0.0; layout.len()];
            self.fill_row(index, layout, &mut row);
            view.append_row(&row)?;
        }
        Ok(view)
    }
}

impl Stage for ScriptedStage {
    fn name(&self) -> &str {
        "readers.scripted"
    }

    fn preview(&mut self) -> Result<QuickInfo> {
        Ok(QuickInfo::new(
            self.estimate.unwrap_or(self.rows.len()),
            self.dims.clone(),
        ))
    }

    fn pipeline_streamable(&self) -> bool {
        self.script == Script::Streaming
    }

    fn prepare(&mut self, layout: &mut PointLayout) -> Result<()> {
        for id in &self.dims {
            layout.register_dim(*id);
        }
        self.cursor = 0;
        Ok(())
    }

    fn execute(&mut self, layout: &PointLayout) -> Result<PointViewSet> {
        let count = self.rows.len();
        match self.script {
            Script::FailOnExecute => Err(Error::Stage("scripted read failure".to_string())),
            Script::PanicOnExecute => panic!("scripted reader panic"),
            Script::NoViews => Ok(Vec::new()),
            Script::TwoViews => {
                let half = count / 2;
                Ok(vec![
                    self.view(0, layout, 0..half)?,
                    self.view(1, layout, half..count)?,
                ])
            }
            Script::Streaming | Script::Batch => Ok(vec![self.view(0, layout, 0..count)?]),
        }
    }

    fn as_streamable(&mut self) -> Option<&mut dyn StreamableStage> {
        match self.script {
            Script::Streaming => Some(self),
            _ => None,
        }
    }
}

impl StreamableStage for ScriptedStage {
    fn read_next(&mut self, layout: &PointLayout, row: &mut [f64]) -> Result<bool> {
        if self.cursor >= self.rows.len() {
            return Ok(false);
        }
        self.fill_row(self.cursor, layout, row);
        self.cursor += 1;
        Ok(true)
    }
}

/// Progress reporter remembering what it was told
#[derive(Debug, Default)]
pub struct RecordingProgress {
    pub titles: Vec<String>,
    pub updates: Vec<f32>,
    pub pulses: usize,
    pub starts: usize,
    pub stops: usize,
}

impl ProgressReporter for RecordingProgress {
    fn set_method_title(&mut self, title: &str) {
        self.titles.push(title.to_string());
    }

    fn start(&mut self) {
        self.starts += 1;
    }

    fn update(&mut self, percent: f32) {
        self.updates.push(percent);
    }

    fn pulse(&mut self) {
        self.pulses += 1;
    }

    fn stop(&mut self) {
        self.stops += 1;
    }
}

pub const XYZI: [DimensionId; 4] = [
    DimensionId::X,
    DimensionId::Y,
    DimensionId::Z,
    DimensionId::Intensity,
];

/// `count` deterministic rows for `XYZI`, offset by `origin`
pub fn grid_rows(count: usize, origin: [f64; 3]) -> Vec<Vec<f64>> {
    (0..count)
        .map(|i| {
            let f = i as f64;
            vec![
                origin[0] + f * 0.25,
                origin[1] + (f * 0.5) % 17.0,
                origin[2] + f * 0.125,
                (i % 256) as f64,
            ]
        })
        .collect()
}

/// Result of one load through a [`StageFilter`]
pub struct Loaded {
    pub result: std::result::Result<(), FileError>,
    pub group: EntityGroup,
    pub sink: Arc<MemorySink>,
}

impl Loaded {
    pub fn cloud(&self) -> &PointCloud {
        &self.group.children()[0]
    }
}

pub fn load_stage(stage: ScriptedStage, params: &LoadParameters) -> Loaded {
    load_stage_with_progress(stage, params, &mut RecordingProgress::default())
}

pub fn load_stage_with_progress(
    stage: ScriptedStage,
    params: &LoadParameters,
    progress: &mut dyn ProgressReporter,
) -> Loaded {
    let sink = Arc::new(MemorySink::new());
    let filter = StageFilter::new().with_event_sink(sink.clone());
    let mut group = EntityGroup::new();
    let result = filter.load_with(
        |_| Ok(Box::new(stage.clone()) as Box<dyn Stage>),
        Path::new("scripted.xyz"),
        &mut group,
        params,
        progress,
    );
    Loaded {
        result,
        group,
        sink,
    }
}

/// A file under the temp directory, removed on drop
pub struct TempFile {
    pub path: PathBuf,
}

impl TempFile {
    pub fn new(name: &str, content: &[u8]) -> Self {
        let path = std::env::temp_dir().join(format!(
            "pointstage_it_{}_{}",
            std::process::id(),
            name
        ));
        std::fs::write(&path, content).unwrap();
        Self { path }
    }
}

impl Drop for TempFile {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}
