//! Filter registry for format-agnostic loading
//!
//! Hosts register file filters once and then load any supported file by
//! path, without knowing which filter handles it.

use crate::error::FileError;
use crate::filter::StageFilter;
use crate::params::LoadParameters;
use crate::progress::ProgressReporter;
use pointstage_core::{EntityGroup, EntityType, PointCloud};
use std::path::Path;

/// What a filter can do
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterFeatures {
    pub import: bool,
    pub export: bool,
}

/// Registration data of a file filter
#[derive(Debug, Clone, PartialEq)]
pub struct FilterInfo {
    /// Unique identifier
    pub id: String,
    /// When several filters accept a file, the highest priority wins
    pub priority: f32,
    /// Lowercase extensions accepted for import
    pub import_extensions: Vec<String>,
    pub default_extension: String,
    /// Dialog filter strings, e.g. `Point Cloud Data (*.pcd)`
    pub import_filter_strings: Vec<String>,
    pub export_filter_strings: Vec<String>,
    pub features: FilterFeatures,
}

impl FilterInfo {
    /// Whether `extension` is accepted for import, ignoring case
    pub fn accepts_extension(&self, extension: &str) -> bool {
        self.import_extensions
            .iter()
            .any(|e| e.eq_ignore_ascii_case(extension))
    }
}

/// Answer of [`FileIoFilter::can_save`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SaveSupport {
    pub supported: bool,
    /// Several entities can go into one file
    pub multiple: bool,
    /// The entity must be saved alone
    pub exclusive: bool,
}

/// A loader/saver for one family of file formats
pub trait FileIoFilter: Send + Sync {
    fn info(&self) -> &FilterInfo;

    /// Load `path` and append the result to `group`. Nothing is appended on
    /// failure.
    fn load_file(
        &self,
        path: &Path,
        group: &mut EntityGroup,
        params: &LoadParameters,
        progress: &mut dyn ProgressReporter,
    ) -> Result<(), FileError>;

    fn save_to_file(&self, entity: &PointCloud, path: &Path) -> Result<(), FileError>;

    fn can_save(&self, entity_type: EntityType) -> SaveSupport;
}

fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_lowercase())
}

/// Registry of file filters
pub struct FilterRegistry {
    filters: Vec<Box<dyn FileIoFilter>>,
}

impl FilterRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            filters: Vec::new(),
        }
    }

    /// Registry with the stage filter registered
    pub fn with_default_filters() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(StageFilter::new()));
        registry
    }

    pub fn register(&mut self, filter: Box<dyn FileIoFilter>) {
        self.filters.push(filter);
    }

    pub fn filters(&self) -> impl Iterator<Item = &dyn FileIoFilter> {
        self.filters.iter().map(|f| f.as_ref())
    }

    pub fn find_by_id(&self, id: &str) -> Option<&dyn FileIoFilter> {
        self.filters().find(|f| f.info().id == id)
    }

    /// Filter importing `path`, by extension. Ties go to the filter
    /// registered first.
    pub fn find_for_path(&self, path: &Path) -> Option<&dyn FileIoFilter> {
        let ext = extension_of(path)?;
        self.filters()
            .filter(|f| f.info().features.import && f.info().accepts_extension(&ext))
            .fold(None, |best: Option<&dyn FileIoFilter>, f| match best {
                Some(b) if b.info().priority >= f.info().priority => Some(b),
                _ => Some(f),
            })
    }

    /// Filter exporting to `path`: one whose default extension matches
    fn find_for_save(&self, path: &Path) -> Option<&dyn FileIoFilter> {
        let ext = extension_of(path)?;
        self.filters().find(|f| {
            f.info().features.export && f.info().default_extension.eq_ignore_ascii_case(&ext)
        })
    }

    /// Load `path` with the matching filter
    pub fn load(
        &self,
        path: &Path,
        group: &mut EntityGroup,
        params: &LoadParameters,
        progress: &mut dyn ProgressReporter,
    ) -> Result<(), FileError> {
        let filter = self.find_for_path(path).ok_or_else(|| {
            FileError::ConsoleError(format!("No filter can load {}", path.display()))
        })?;
        filter.load_file(path, group, params, progress)
    }

    /// Save `entity` to `path` with the matching filter
    pub fn save(&self, entity: &PointCloud, path: &Path) -> Result<(), FileError> {
        let filter = self.find_for_save(path).ok_or_else(|| {
            FileError::ConsoleError(format!("No filter can save {}", path.display()))
        })?;
        if !filter.can_save(EntityType::PointCloud).supported {
            return Err(FileError::ConsoleError(format!(
                "Filter '{}' cannot save point clouds",
                filter.info().id
            )));
        }
        filter.save_to_file(entity, path)
    }

    /// All import extensions, sorted and deduplicated
    pub fn supported_import_extensions(&self) -> Vec<String> {
        let mut extensions: Vec<String> = self
            .filters()
            .flat_map(|f| f.info().import_extensions.iter().cloned())
            .collect();
        extensions.sort();
        extensions.dedup();
        extensions
    }
}

impl Default for FilterRegistry {
    fn default() -> Self {
        Self::new()
    }
}
