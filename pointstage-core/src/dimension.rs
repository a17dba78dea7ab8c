//! Dimension identifiers
//!
//! A dimension is a named per-point attribute carried by a point stream:
//! a coordinate component, a colour channel or any other scalar value.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a per-point attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DimensionId {
    X,
    Y,
    Z,
    Red,
    Green,
    Blue,
    Alpha,
    Intensity,
    ReturnNumber,
    NumberOfReturns,
    Classification,
    ScanAngleRank,
    UserData,
    PointSourceId,
    GpsTime,
    NormalX,
    NormalY,
    NormalZ,
    Curvature,
}

impl DimensionId {
    /// Every known dimension, in declaration order
    pub const ALL: [DimensionId; 19] = [
        DimensionId::X,
        DimensionId::Y,
        DimensionId::Z,
        DimensionId::Red,
        DimensionId::Green,
        DimensionId::Blue,
        DimensionId::Alpha,
        DimensionId::Intensity,
        DimensionId::ReturnNumber,
        DimensionId::NumberOfReturns,
        DimensionId::Classification,
        DimensionId::ScanAngleRank,
        DimensionId::UserData,
        DimensionId::PointSourceId,
        DimensionId::GpsTime,
        DimensionId::NormalX,
        DimensionId::NormalY,
        DimensionId::NormalZ,
        DimensionId::Curvature,
    ];

    /// Canonical name of the dimension, used to name scalar fields
    pub fn name(&self) -> &'static str {
        match self {
            DimensionId::X => "X",
            DimensionId::Y => "Y",
            DimensionId::Z => "Z",
            DimensionId::Red => "Red",
            DimensionId::Green => "Green",
            DimensionId::Blue => "Blue",
            DimensionId::Alpha => "Alpha",
            DimensionId::Intensity => "Intensity",
            DimensionId::ReturnNumber => "ReturnNumber",
            DimensionId::NumberOfReturns => "NumberOfReturns",
            DimensionId::Classification => "Classification",
            DimensionId::ScanAngleRank => "ScanAngleRank",
            DimensionId::UserData => "UserData",
            DimensionId::PointSourceId => "PointSourceId",
            DimensionId::GpsTime => "GpsTime",
            DimensionId::NormalX => "NormalX",
            DimensionId::NormalY => "NormalY",
            DimensionId::NormalZ => "NormalZ",
            DimensionId::Curvature => "Curvature",
        }
    }

    /// Parse a dimension from a canonical name or a common alias.
    /// Matching ignores case and surrounding whitespace.
    pub fn from_name(name: &str) -> Option<Self> {
        let lower = name.trim().to_lowercase();
        let id = match lower.as_str() {
            "x" | "px" | "pos_x" | "position_x" => DimensionId::X,
            "y" | "py" | "pos_y" | "position_y" => DimensionId::Y,
            "z" | "pz" | "pos_z" | "position_z" => DimensionId::Z,
            "red" | "r" | "color_r" => DimensionId::Red,
            "green" | "g" | "color_g" => DimensionId::Green,
            "blue" | "b" | "color_b" => DimensionId::Blue,
            "alpha" | "a" | "color_a" => DimensionId::Alpha,
            "intensity" | "i" | "int" => DimensionId::Intensity,
            "returnnumber" | "return_number" => DimensionId::ReturnNumber,
            "numberofreturns" | "number_of_returns" => DimensionId::NumberOfReturns,
            "classification" | "class" | "label" => DimensionId::Classification,
            "scananglerank" | "scan_angle_rank" | "scan_angle" => DimensionId::ScanAngleRank,
            "userdata" | "user_data" => DimensionId::UserData,
            "pointsourceid" | "point_source_id" => DimensionId::PointSourceId,
            "gpstime" | "gps_time" | "time" => DimensionId::GpsTime,
            "normalx" | "normal_x" | "nx" | "n_x" => DimensionId::NormalX,
            "normaly" | "normal_y" | "ny" | "n_y" => DimensionId::NormalY,
            "normalz" | "normal_z" | "nz" | "n_z" => DimensionId::NormalZ,
            "curvature" => DimensionId::Curvature,
            _ => return None,
        };
        Some(id)
    }
}

impl fmt::Display for DimensionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
