//! Point stage ingestion for pointstage
//!
//! This crate loads point files into [`PointCloud`](pointstage_core::PointCloud)s.
//! A reader stage is picked from the file extension and driven either point
//! by point (streamable readers) or in one go on a background thread; every
//! point then passes through a [`CloudConverter`] that applies the global
//! shift and fills per-attribute scalar fields.
//!
//! ```no_run
//! use pointstage_core::EntityGroup;
//! use pointstage_io::{FilterRegistry, LoadParameters, NoProgress};
//! use std::path::Path;
//!
//! let registry = FilterRegistry::with_default_filters();
//! let mut group = EntityGroup::new();
//! registry.load(Path::new("scan.xyz"), &mut group, &LoadParameters::default(), &mut NoProgress)?;
//! # Ok::<(), pointstage_io::FileError>(())
//! ```

pub mod convert;
pub mod error;
pub mod events;
pub mod filter;
pub mod params;
pub mod progress;
pub mod readers;
pub mod registry;
pub mod shift;
pub mod stage;

pub use convert::{CloudConverter, ScalarFieldMap};
pub use error::*;
pub use events::{EventLevel, EventSink, LoadEvent, MemorySink, TracingSink};
pub use filter::{StageFilter, STAGE_FILTER_ID};
pub use params::{LoadParameters, ShiftMode};
pub use progress::{LogProgress, NoProgress, NormalizedProgress, ProgressReporter};
pub use readers::{BufferReader, PcdReader, TextReader, TextReaderOptions};
pub use registry::{FileIoFilter, FilterFeatures, FilterInfo, FilterRegistry, SaveSupport};
pub use stage::{QuickInfo, Stage, StageFactory, StreamFilter, StreamableStage};
