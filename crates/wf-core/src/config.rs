//! Engine configuration.
//!
//! Every field has a default so a config file only needs to name what it
//! overrides:
//!
//! ```toml
//! unit_scale             = 1.0
//! blocked_cost_threshold = 10000.0
//!
//! [frame]
//! map_height = 7801.0
//! invert_y   = true
//!
//! [speeds]
//! car  = 11.1
//! foot = 1.4
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{CoreError, CoreResult, Point, VehicleClass};

// ── CoordinateFrame ───────────────────────────────────────────────────────────

/// Convention mapping storage coordinates to engine coordinates.
///
/// Storage rows use image coordinates (y grows downwards from the top edge of
/// the district map); the engine and its clients use y growing upwards.  The
/// conversion is applied once, at load time.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoordinateFrame {
    /// Height of the map image in pixels.
    pub map_height: f64,
    /// Flip `y` against `map_height` when loading rows.
    pub invert_y: bool,
}

impl CoordinateFrame {
    /// Identity frame: rows are used as-is.  Handy for synthetic graphs.
    pub const IDENTITY: CoordinateFrame = CoordinateFrame { map_height: 0.0, invert_y: false };

    /// Convert a storage `(x, y)` pair into an engine position.
    #[inline]
    pub fn to_engine(&self, x: f64, y: f64) -> Point {
        if self.invert_y {
            Point::new(x, self.map_height - y)
        } else {
            Point::new(x, y)
        }
    }
}

impl Default for CoordinateFrame {
    fn default() -> Self {
        Self { map_height: 7_801.0, invert_y: true }
    }
}

// ── SpeedTable ────────────────────────────────────────────────────────────────

/// Default travel speed per vehicle class, in map units per second.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeedTable {
    pub car:  f64,
    pub foot: f64,
}

impl SpeedTable {
    pub fn speed_for(&self, class: VehicleClass) -> f64 {
        match class {
            VehicleClass::Car  => self.car,
            VehicleClass::Foot => self.foot,
        }
    }
}

impl Default for SpeedTable {
    fn default() -> Self {
        Self {
            car:  VehicleClass::Car.typical_speed(),
            foot: VehicleClass::Foot.typical_speed(),
        }
    }
}

// ── EngineConfig ──────────────────────────────────────────────────────────────

/// Top-level engine configuration.
///
/// Typically loaded from a TOML file by the application crate and handed to
/// `wf_engine::EngineBuilder`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Storage → engine coordinate convention.
    pub frame: CoordinateFrame,

    /// Factor converting summed edge weights into reported distance and cost
    /// units.  Applied identically to both sums.
    pub unit_scale: f64,

    /// Scaled weighted cost above which a route is reported as blocked
    /// instead of returning a travel time.
    pub blocked_cost_threshold: f64,

    /// Projections this close (in segment-parameter space) to an edge
    /// endpoint attach to the endpoint instead of splitting the edge.
    pub attach_epsilon: f64,

    /// Default speeds for callers that do not pass one.
    pub speeds: SpeedTable,

    /// Worker threads used for the parallel startup load.  `None` uses the
    /// global Rayon pool.
    pub num_threads: Option<usize>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            frame:                  CoordinateFrame::default(),
            unit_scale:             1.0,
            blocked_cost_threshold: 10_000.0,
            attach_epsilon:         1e-9,
            speeds:                 SpeedTable::default(),
            num_threads:            None,
        }
    }
}

impl EngineConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(s: &str) -> CoreResult<Self> {
        let config: EngineConfig =
            toml::from_str(s).map_err(|e| CoreError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn from_path(path: &Path) -> CoreResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Reject values the engine cannot work with.
    pub fn validate(&self) -> CoreResult<()> {
        if !(self.unit_scale.is_finite() && self.unit_scale > 0.0) {
            return Err(CoreError::Config(format!(
                "unit_scale must be positive, got {}",
                self.unit_scale
            )));
        }
        if !(self.blocked_cost_threshold > 0.0) {
            return Err(CoreError::Config(format!(
                "blocked_cost_threshold must be positive, got {}",
                self.blocked_cost_threshold
            )));
        }
        if !(0.0..0.5).contains(&self.attach_epsilon) {
            return Err(CoreError::Config(format!(
                "attach_epsilon must lie in [0, 0.5), got {}",
                self.attach_epsilon
            )));
        }
        if self.num_threads == Some(0) {
            return Err(CoreError::Config("num_threads must be at least 1".into()));
        }
        Ok(())
    }
}
