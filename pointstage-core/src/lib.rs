//! Core data structures for pointstage
//!
//! This crate provides the destination side of point ingestion: point types,
//! dimension identifiers and layouts, scalar fields, the in-memory point cloud
//! that converted points are written into, and the group that receives it.

pub mod point;
pub mod dimension;
pub mod layout;
pub mod scalar_field;
pub mod point_cloud;
pub mod entity;
pub mod traits;
pub mod error;

pub use point::*;
pub use dimension::*;
pub use layout::*;
pub use scalar_field::*;
pub use point_cloud::*;
pub use entity::*;
pub use traits::*;
pub use error::*;

/// Re-export commonly used types from nalgebra
pub use nalgebra::{Point3, Vector3};
