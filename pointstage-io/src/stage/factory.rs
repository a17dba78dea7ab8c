//! Reader driver inference and construction

use super::Stage;
use crate::readers::{PcdReader, TextReader};
use pointstage_core::{Error, Result};
use std::path::Path;

/// Driver name of the delimited text reader
pub const TEXT_READER: &str = "readers.text";
/// Driver name of the PCD reader
pub const PCD_READER: &str = "readers.pcd";

/// Creates reader stages by driver name
#[derive(Debug, Default, Clone, Copy)]
pub struct StageFactory;

impl StageFactory {
    pub fn new() -> Self {
        Self
    }

    /// Infer the reader driver for `filename` from its extension
    pub fn infer_reader_driver<P: AsRef<Path>>(&self, filename: P) -> Option<&'static str> {
        let ext = filename.as_ref().extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "xyz" | "txt" | "csv" | "asc" | "pts" => Some(TEXT_READER),
            "pcd" => Some(PCD_READER),
            _ => None,
        }
    }

    /// Extensions for which a driver can be inferred
    pub fn supported_extensions(&self) -> &'static [&'static str] {
        &["xyz", "txt", "csv", "asc", "pts", "pcd"]
    }

    /// Create a reader stage for `driver` bound to `filename`
    pub fn create_stage<P: AsRef<Path>>(&self, driver: &str, filename: P) -> Result<Box<dyn Stage>> {
        match driver {
            TEXT_READER => Ok(Box::new(TextReader::new(filename))),
            PCD_READER => Ok(Box::new(PcdReader::new(filename))),
            _ => Err(Error::UnsupportedFormat(format!("Unknown reader driver: {}", driver))),
        }
    }
}
