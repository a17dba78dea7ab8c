//! Point types and related functionality

use nalgebra::{Point3, Vector3};

/// Numeric type of stored point coordinates
pub type PointCoordinateType = f32;

/// Numeric type of stored scalar field values
pub type ScalarType = f32;

/// A 3D point with floating point coordinates
pub type Point3f = Point3<PointCoordinateType>;

/// A 3D point with double precision coordinates
pub type Point3d = Point3<f64>;

/// A 3D vector with double precision components
pub type Vector3d = Vector3<f64>;

/// Applies `shift` to a raw double precision position and narrows the result
/// to the stored coordinate type.
pub fn shifted_point(raw: &Point3d, shift: &Vector3d) -> Point3f {
    let p = raw + shift;
    Point3f::new(
        p.x as PointCoordinateType,
        p.y as PointCoordinateType,
        p.z as PointCoordinateType,
    )
}
