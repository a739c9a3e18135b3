//! Vehicle classes.  Each class owns an independent graph universe: the car
//! network and the foot network share no nodes or edges.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::CoreError;

/// The network a request is routed on.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum VehicleClass {
    /// Drivable network.
    Car,
    /// Walkable network.
    Foot,
}

impl VehicleClass {
    pub const ALL: [VehicleClass; 2] = [VehicleClass::Car, VehicleClass::Foot];

    /// Label used in row sources, config keys and logs.
    pub fn as_str(self) -> &'static str {
        match self {
            VehicleClass::Car  => "car",
            VehicleClass::Foot => "foot",
        }
    }

    /// Typical cruising speed in map units per second, used when a caller
    /// does not supply one (~40 km/h by car, ~5 km/h on foot).
    pub fn typical_speed(self) -> f64 {
        match self {
            VehicleClass::Car  => 11.1,
            VehicleClass::Foot => 1.4,
        }
    }
}

impl FromStr for VehicleClass {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "car" => Ok(VehicleClass::Car),
            "foot" | "walk" => Ok(VehicleClass::Foot),
            other => Err(CoreError::UnknownVehicle(other.to_string())),
        }
    }
}

impl std::fmt::Display for VehicleClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
