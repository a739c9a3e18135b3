//! Scenario requests and the disturbances they map to.
//!
//! An operator draws a stroke on the map (`start` → `end`) and picks a kind:
//!
//! | Kind    | Stroke          | Disturbance                                 |
//! |---------|-----------------|---------------------------------------------|
//! | `Rain`  | zero length     | circle at `start`, radius `threshold`       |
//! | `Rain`  | non-zero length | circle whose diameter is the stroke         |
//! | `Block` | zero length     | circle at `start`, radius `threshold`       |
//! | `Block` | non-zero length | the stroke itself, as a blocking line       |

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use wf_core::Point;

use crate::{ScenarioError, ScenarioResult};

// ── ScenarioKind ──────────────────────────────────────────────────────────────

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioKind {
    /// Area effect: every road inside the zone is slowed down.
    Rain,
    /// Road blockage: every road crossing the line is penalised.
    Block,
}

impl ScenarioKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ScenarioKind::Rain  => "rain",
            ScenarioKind::Block => "block",
        }
    }
}

impl fmt::Display for ScenarioKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScenarioKind {
    type Err = ScenarioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rain" => Ok(ScenarioKind::Rain),
            "block" => Ok(ScenarioKind::Block),
            other => Err(ScenarioError::InvalidGeometry(format!("unknown scenario kind {other:?}"))),
        }
    }
}

// ── Disturbance ───────────────────────────────────────────────────────────────

/// Geometry used to select affected edges.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Disturbance {
    /// Edges whose segment intersects `start–end` are affected whole.
    Line { start: Point, end: Point },
    /// Edges inside the circle are affected; edges crossing its boundary are
    /// split and only the inside parts are affected.
    Circle { center: Point, radius: f64 },
}

// ── ScenarioRequest ───────────────────────────────────────────────────────────

/// What the request layer hands to the engine.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScenarioRequest {
    pub kind:      ScenarioKind,
    pub start:     Point,
    pub end:       Point,
    /// Multiplier applied to the current weight of every affected edge.
    pub penalty:   f64,
    /// Radius used when the stroke degenerates to a point.
    #[serde(default = "default_threshold")]
    pub threshold: f64,
}

fn default_threshold() -> f64 {
    50.0
}

impl ScenarioRequest {
    pub fn new(kind: ScenarioKind, start: Point, end: Point, penalty: f64, threshold: f64) -> Self {
        Self { kind, start, end, penalty, threshold }
    }

    /// Reject requests no disturbance can be built from.
    ///
    /// Penalties below 1 would make disturbed roads cheaper than their
    /// length, so they are refused along with non-finite ones.
    pub fn validate(&self) -> ScenarioResult<()> {
        if !(self.penalty.is_finite() && self.penalty >= 1.0) {
            return Err(ScenarioError::InvalidPenalty(self.penalty));
        }
        let coords = [self.start.x, self.start.y, self.end.x, self.end.y];
        if coords.iter().any(|c| !c.is_finite()) {
            return Err(ScenarioError::InvalidGeometry(format!(
                "non-finite stroke {} -> {}",
                self.start, self.end
            )));
        }
        if !(self.threshold.is_finite() && self.threshold >= 0.0) {
            return Err(ScenarioError::InvalidGeometry(format!(
                "threshold must be finite and non-negative, got {}",
                self.threshold
            )));
        }
        Ok(())
    }

    /// The disturbance this request describes (see the module table).
    pub fn disturbance(&self) -> Disturbance {
        let length = self.start.distance(self.end);
        if length == 0.0 {
            return Disturbance::Circle { center: self.start, radius: self.threshold };
        }
        match self.kind {
            ScenarioKind::Rain => Disturbance::Circle {
                center: self.start.midpoint(self.end),
                radius: length / 2.0,
            },
            ScenarioKind::Block => Disturbance::Line { start: self.start, end: self.end },
        }
    }
}

// ── Presets ───────────────────────────────────────────────────────────────────

/// Named penalty/threshold combinations offered by the admin client.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Preset {
    MediumRain,
    HeavyRain,
    ExtremeRain,
    RoadBlock,
}

impl Preset {
    pub const ALL: [Preset; 4] = [Preset::MediumRain, Preset::HeavyRain, Preset::ExtremeRain, Preset::RoadBlock];

    pub fn kind(self) -> ScenarioKind {
        match self {
            Preset::RoadBlock => ScenarioKind::Block,
            _ => ScenarioKind::Rain,
        }
    }

    pub fn penalty(self) -> f64 {
        match self {
            Preset::MediumRain  => 1.0,
            Preset::HeavyRain   => 2.0,
            Preset::ExtremeRain => 5.0,
            Preset::RoadBlock   => 9_999.0,
        }
    }

    pub fn threshold(self) -> f64 {
        match self {
            Preset::MediumRain  => 50.0,
            Preset::HeavyRain   => 70.0,
            Preset::ExtremeRain => 100.0,
            Preset::RoadBlock   => 50.0,
        }
    }

    /// A request for this preset drawn from `start` to `end`.
    pub fn request(self, start: Point, end: Point) -> ScenarioRequest {
        ScenarioRequest::new(self.kind(), start, end, self.penalty(), self.threshold())
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Preset::MediumRain  => "medium-rain",
            Preset::HeavyRain   => "heavy-rain",
            Preset::ExtremeRain => "extreme-rain",
            Preset::RoadBlock   => "road-block",
        }
    }
}

impl FromStr for Preset {
    type Err = ScenarioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let norm = s.trim().to_ascii_lowercase().replace('_', "-");
        Preset::ALL
            .into_iter()
            .find(|p| p.as_str() == norm)
            .ok_or_else(|| ScenarioError::UnknownPreset(s.to_string()))
    }
}
