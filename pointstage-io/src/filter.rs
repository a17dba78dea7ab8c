//! The stage-backed file filter
//!
//! [`StageFilter`] picks a reader stage for a file and drives it into a
//! [`CloudConverter`]. Streamable readers are pulled chunk by chunk through a
//! fixed-size table. Other readers run to completion on a background thread
//! while the caller's progress reporter is pulsed, and their views are then
//! replayed through a [`BufferReader`].

use crate::convert::CloudConverter;
use crate::error::FileError;
use crate::events::{EventSink, LoadEvent, TracingSink};
use crate::params::LoadParameters;
use crate::progress::{NormalizedProgress, ProgressReporter};
use crate::readers::BufferReader;
use crate::registry::{FileIoFilter, FilterFeatures, FilterInfo, SaveSupport};
use crate::shift::determine_shift_fn;
use crate::stage::{
    execute_standard, execute_streaming, FixedPointTable, PointViewSet, QuickInfo, Stage,
    StageFactory,
};
use pointstage_core::{EntityGroup, EntityType, Error, PointCloud, PointLayout};
use std::any::Any;
use std::path::Path;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::debug;

/// Identifier the filter registers under
pub const STAGE_FILTER_ID: &str = "_Stage Filter";

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "reader thread panicked".to_string()
    }
}

/// File filter loading any format the [`StageFactory`] knows
pub struct StageFilter {
    info: FilterInfo,
    factory: StageFactory,
    events: Arc<dyn EventSink>,
}

impl StageFilter {
    pub fn new() -> Self {
        let factory = StageFactory::new();
        let info = FilterInfo {
            id: STAGE_FILTER_ID.to_string(),
            priority: 1.0,
            import_extensions: factory
                .supported_extensions()
                .iter()
                .map(|e| e.to_string())
                .collect(),
            default_extension: "pcd".to_string(),
            import_filter_strings: vec![
                "Point Cloud Data (*.pcd)".to_string(),
                "ASCII cloud (*.xyz *.txt *.csv *.asc *.pts)".to_string(),
            ],
            export_filter_strings: vec!["Point Cloud Data (*.pcd)".to_string()],
            features: FilterFeatures {
                import: true,
                export: true,
            },
        };
        Self {
            info,
            factory,
            events: Arc::new(TracingSink),
        }
    }

    /// Send load events to `events` instead of `tracing`
    pub fn with_event_sink(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }

    /// Load `path` using readers created by `factory`
    pub fn load_with<F>(
        &self,
        factory: F,
        path: &Path,
        group: &mut EntityGroup,
        params: &LoadParameters,
        progress: &mut dyn ProgressReporter,
    ) -> Result<(), FileError>
    where
        F: Fn(&Path) -> pointstage_core::Result<Box<dyn Stage>>,
    {
        let mut probe = factory(path).map_err(|e| self.fail(e))?;
        let streamable = probe.pipeline_streamable();
        self.events.emit(LoadEvent::info(format!(
            "File: {} driver is: {}, is driver streamable? : {}",
            path.display(),
            probe.name(),
            streamable
        )));
        let info = probe.preview().map_err(|e| self.fail(e))?;
        drop(probe);
        debug!("Preview: {} points, dims {:?}", info.point_count, info.dims);

        let reader = factory(path).map_err(|e| self.fail(e))?;
        let cloud = if reader.pipeline_streamable() {
            self.load_streaming(reader, info, params, progress)?
        } else {
            self.load_batch(reader, info, params, progress)?
        };

        let mut cloud = cloud.ok_or_else(|| self.console_error("No point cloud was produced"))?;
        cloud.set_name(path.display().to_string());
        group.add_child(cloud);
        Ok(())
    }

    fn converter<'a, F>(
        &self,
        info: QuickInfo,
        params: &'a LoadParameters,
        progress: F,
    ) -> CloudConverter<'a>
    where
        F: FnMut() + 'a,
    {
        let mut converter = CloudConverter::new(info, progress).with_event_sink(self.events.clone());
        converter.set_determine_shift(determine_shift_fn(params, self.events.clone()));
        converter
    }

    fn load_streaming(
        &self,
        mut reader: Box<dyn Stage>,
        info: QuickInfo,
        params: &LoadParameters,
        progress: &mut dyn ProgressReporter,
    ) -> Result<Option<PointCloud>, FileError> {
        self.events.emit(LoadEvent::info("Executing in streaming mode"));
        progress.set_method_title("Loading file");
        progress.set_info(&format!("Points: {}", info.point_count));
        progress.start();

        let total = info.point_count;
        let result = {
            let mut steps = NormalizedProgress::new(progress, total);
            let mut converter = self.converter(info, params, move || steps.one_step());
            let mut table = FixedPointTable::new(params.stream_capacity);
            execute_streaming(reader.as_mut(), &mut converter, &mut table)
                .map(|_| converter.take_cloud())
        };
        progress.stop();
        result.map_err(|e| self.fail(e))
    }

    fn load_batch(
        &self,
        reader: Box<dyn Stage>,
        info: QuickInfo,
        params: &LoadParameters,
        progress: &mut dyn ProgressReporter,
    ) -> Result<Option<PointCloud>, FileError> {
        self.events.emit(LoadEvent::info("Executing in non-streaming mode"));
        let views = self.read_views(reader, params, progress)?;
        if views.is_empty() {
            return Err(self.console_error("Reader produced no point view"));
        }
        if views.len() > 1 {
            self.events.emit(LoadEvent::info(format!(
                "Reader produced {} point views, merging them",
                views.len()
            )));
        }
        debug!("View size: {}", views.iter().map(|v| v.len()).sum::<usize>());

        progress.set_method_title("Loading points");
        progress.set_info(&format!("Points: {}", info.point_count));
        progress.start();

        let total = info.point_count;
        let mut buffer = BufferReader::from_views(views);
        let result = {
            let mut steps = NormalizedProgress::new(progress, total);
            let mut converter = self.converter(info, params, move || steps.one_step());
            execute_standard(&mut buffer, &mut converter).map(|_| converter.take_cloud())
        };
        progress.stop();
        result.map_err(|e| self.fail(e))
    }

    /// Prepare and execute `reader` on a background thread, pulsing
    /// `progress` until it is done
    fn read_views(
        &self,
        mut reader: Box<dyn Stage>,
        params: &LoadParameters,
        progress: &mut dyn ProgressReporter,
    ) -> Result<PointViewSet, FileError> {
        progress.set_method_title("Reading file");
        progress.set_info("Please wait... reading in progress");
        progress.start();

        let interval = Duration::from_millis(params.poll_interval_ms.max(1));
        let outcome = thread::scope(|scope| {
            let handle = scope.spawn(move || {
                let mut layout = PointLayout::new();
                reader.prepare(&mut layout)?;
                reader.execute(&layout)
            });
            while !handle.is_finished() {
                progress.pulse();
                thread::sleep(interval);
            }
            handle.join()
        });
        progress.stop();

        match outcome {
            Ok(result) => result.map_err(|e| self.fail(e)),
            Err(payload) => Err(self.fail(Error::Stage(panic_message(payload.as_ref())))),
        }
    }

    fn fail(&self, error: Error) -> FileError {
        let message = error.to_string();
        self.events.emit(LoadEvent::error(format!("Error: {}", message)));
        FileError::ThirdPartyLibException(message)
    }

    fn console_error(&self, message: &str) -> FileError {
        self.events.emit(LoadEvent::error(message));
        FileError::ConsoleError(message.to_string())
    }
}

impl Default for StageFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl FileIoFilter for StageFilter {
    fn info(&self) -> &FilterInfo {
        &self.info
    }

    #[tracing::instrument(skip_all, fields(path = %path.display()))]
    fn load_file(
        &self,
        path: &Path,
        group: &mut EntityGroup,
        params: &LoadParameters,
        progress: &mut dyn ProgressReporter,
    ) -> Result<(), FileError> {
        let driver = self.factory.infer_reader_driver(path).ok_or_else(|| {
            self.console_error(&format!("No reader driver for {}", path.display()))
        })?;
        let factory = self.factory;
        self.load_with(
            move |p| factory.create_stage(driver, p),
            path,
            group,
            params,
            progress,
        )
    }

    fn save_to_file(&self, _entity: &PointCloud, _path: &Path) -> Result<(), FileError> {
        Err(FileError::NotImplemented)
    }

    fn can_save(&self, entity_type: EntityType) -> SaveSupport {
        SaveSupport {
            supported: entity_type == EntityType::PointCloud,
            multiple: false,
            exclusive: false,
        }
    }
}
