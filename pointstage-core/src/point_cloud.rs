//! Point cloud data structures and functionality

use crate::point::*;
use crate::scalar_field::ScalarField;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::ops::Index;

/// An in-memory point cloud.
///
/// Coordinates are stored in single precision relative to `global_shift`:
/// the original position of point `i` is `points[i] - global_shift`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointCloud {
    name: String,
    points: Vec<Point3f>,
    colors: Option<Vec<[u16; 3]>>,
    global_shift: Vector3d,
    scalar_fields: Vec<ScalarField>,
}

impl PointCloud {
    /// Create a new empty point cloud
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            points: Vec::new(),
            colors: None,
            global_shift: Vector3d::zeros(),
            scalar_fields: Vec::new(),
        }
    }

    /// Create a point cloud from a vector of points
    pub fn from_points<S: Into<String>>(name: S, points: Vec<Point3f>) -> Self {
        Self {
            points,
            ..Self::new(name)
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name<S: Into<String>>(&mut self, name: S) {
        self.name = name.into();
    }

    /// Get the number of points in the cloud
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Check if the point cloud is empty
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Make room for `count` points in total. Fails instead of aborting when
    /// the allocation cannot be satisfied.
    pub fn reserve(&mut self, count: usize) -> Result<()> {
        let additional = count.saturating_sub(self.points.len());
        self.points.try_reserve_exact(additional)?;
        if let Some(colors) = self.colors.as_mut() {
            let additional = count.saturating_sub(colors.len());
            colors.try_reserve_exact(additional)?;
        }
        Ok(())
    }

    /// Number of points the cloud can hold without reallocating
    pub fn capacity(&self) -> usize {
        self.points.capacity()
    }

    /// Enable the colour channel and make room for `count` colours in total
    pub fn reserve_colors(&mut self, count: usize) -> Result<()> {
        let colors = self.colors.get_or_insert_with(Vec::new);
        let additional = count.saturating_sub(colors.len());
        colors.try_reserve_exact(additional)?;
        Ok(())
    }

    /// Add a point to the cloud
    pub fn add_point(&mut self, point: Point3f) {
        self.points.push(point);
    }

    /// Add a colour for the most recently added point. Enables the colour
    /// channel if needed.
    pub fn add_color(&mut self, rgb: [u16; 3]) {
        self.colors.get_or_insert_with(Vec::new).push(rgb);
    }

    pub fn has_colors(&self) -> bool {
        self.colors.is_some()
    }

    /// Raw per-point colours, if the colour channel is enabled
    pub fn colors(&self) -> Option<&[[u16; 3]]> {
        self.colors.as_deref()
    }

    pub fn points(&self) -> &[Point3f] {
        &self.points
    }

    /// Get an iterator over the points
    pub fn iter(&self) -> std::slice::Iter<'_, Point3f> {
        self.points.iter()
    }

    /// Offset that was added to every raw coordinate
    pub fn global_shift(&self) -> Vector3d {
        self.global_shift
    }

    pub fn set_global_shift(&mut self, shift: Vector3d) {
        self.global_shift = shift;
    }

    /// Whether a non-zero global shift is set
    pub fn is_shifted(&self) -> bool {
        self.global_shift != Vector3d::zeros()
    }

    /// Converts a stored point back to its original coordinates
    pub fn to_global(&self, point: &Point3f) -> Point3d {
        Point3d::new(point.x as f64, point.y as f64, point.z as f64) - self.global_shift
    }

    /// Attach a scalar field, returning its index
    pub fn add_scalar_field(&mut self, field: ScalarField) -> usize {
        self.scalar_fields.push(field);
        self.scalar_fields.len() - 1
    }

    pub fn scalar_field(&self, index: usize) -> Option<&ScalarField> {
        self.scalar_fields.get(index)
    }

    pub fn scalar_field_by_name(&self, name: &str) -> Option<&ScalarField> {
        self.scalar_fields.iter().find(|sf| sf.name() == name)
    }

    /// Attached scalar fields, in attachment order
    pub fn scalar_fields(&self) -> &[ScalarField] {
        &self.scalar_fields
    }
}

impl Default for PointCloud {
    fn default() -> Self {
        Self::new("")
    }
}

impl Index<usize> for PointCloud {
    type Output = Point3f;

    fn index(&self, index: usize) -> &Self::Output {
        &self.points[index]
    }
}

impl<'a> IntoIterator for &'a PointCloud {
    type Item = &'a Point3f;
    type IntoIter = std::slice::Iter<'a, Point3f>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}

impl Extend<Point3f> for PointCloud {
    fn extend<I: IntoIterator<Item = Point3f>>(&mut self, iter: I) {
        self.points.extend(iter);
    }
}
