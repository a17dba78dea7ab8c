//! Load configuration

use pointstage_core::Vector3d;
use serde::{Deserialize, Serialize};

/// How the first point of a load decides the global shift
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ShiftMode {
    /// Keep raw coordinates
    Never,
    /// Recentre components whose magnitude reaches `max_abs_coord`
    Auto,
    /// Always use this shift
    Manual(Vector3d),
}

/// Parameters of a single load
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadParameters {
    pub shift_mode: ShiftMode,
    /// Coordinates at or beyond this magnitude trigger an automatic shift
    pub max_abs_coord: f64,
    /// Store the chosen shift on the cloud. When false the shift is dropped.
    pub preserve_coordinate_shift: bool,
    /// Points per chunk on the streaming path
    pub stream_capacity: usize,
    /// How often the batch path pulses progress while the reader works
    pub poll_interval_ms: u64,
}

impl Default for LoadParameters {
    fn default() -> Self {
        Self {
            shift_mode: ShiftMode::Auto,
            max_abs_coord: 1.0e4,
            preserve_coordinate_shift: true,
            stream_capacity: 1000,
            poll_interval_ms: 50,
        }
    }
}

impl LoadParameters {
    pub fn with_shift_mode(mut self, mode: ShiftMode) -> Self {
        self.shift_mode = mode;
        self
    }

    pub fn with_max_abs_coord(mut self, max_abs_coord: f64) -> Self {
        self.max_abs_coord = max_abs_coord;
        self
    }

    pub fn with_preserve_coordinate_shift(mut self, preserve: bool) -> Self {
        self.preserve_coordinate_shift = preserve;
        self
    }

    pub fn with_stream_capacity(mut self, capacity: usize) -> Self {
        self.stream_capacity = capacity;
        self
    }

    pub fn with_poll_interval_ms(mut self, interval: u64) -> Self {
        self.poll_interval_ms = interval;
        self
    }
}
