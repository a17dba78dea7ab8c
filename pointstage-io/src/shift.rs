//! Global shift policy
//!
//! Single precision storage loses detail far from the origin, so the first
//! point of a load may move the whole cloud closer to it. The shift is chosen
//! once and stays fixed for the rest of the load.

use crate::events::{EventSink, LoadEvent};
use crate::params::{LoadParameters, ShiftMode};
use pointstage_core::{Point3d, PointCloud, Vector3d};
use std::sync::Arc;

/// Whether any component of `point` is too large to store precisely
pub fn needs_shift(point: &Point3d, max_abs_coord: f64) -> bool {
    point.coords.iter().any(|c| c.abs() >= max_abs_coord)
}

/// Suggested shift: every large component is moved to the nearest hundred
/// of the origin, small components are left alone.
pub fn best_shift(point: &Point3d, max_abs_coord: f64) -> Vector3d {
    point.coords.map(|c| {
        if c.abs() >= max_abs_coord {
            -(c / 100.0).round() * 100.0
        } else {
            0.0
        }
    })
}

/// Shift to apply for a load whose first point is `point`, or `None` to keep
/// raw coordinates
pub fn handle_global_shift(point: &Point3d, params: &LoadParameters) -> Option<Vector3d> {
    let shift = match &params.shift_mode {
        ShiftMode::Never => return None,
        ShiftMode::Manual(shift) => *shift,
        ShiftMode::Auto => {
            if !needs_shift(point, params.max_abs_coord) {
                return None;
            }
            best_shift(point, params.max_abs_coord)
        }
    };
    (shift != Vector3d::zeros()).then_some(shift)
}

/// The default shift-determination callback for a converter
pub fn determine_shift_fn(
    params: &LoadParameters,
    events: Arc<dyn EventSink>,
) -> impl FnMut(&Point3d, &mut PointCloud) + '_ {
    move |point, cloud| {
        let shift = match handle_global_shift(point, params) {
            Some(shift) => shift,
            None => return,
        };
        if params.preserve_coordinate_shift {
            cloud.set_global_shift(shift);
            events.emit(LoadEvent::warning(format!(
                "Cloud has been recentered! Translation: ({:.2} ; {:.2} ; {:.2})",
                shift.x, shift.y, shift.z
            )));
        } else {
            events.emit(LoadEvent::info(format!(
                "Suggested shift ({:.2} ; {:.2} ; {:.2}) not preserved",
                shift.x, shift.y, shift.z
            )));
        }
    }
}
