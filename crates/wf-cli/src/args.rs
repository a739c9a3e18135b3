//! Command-line surface of the `wayfare` binary.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use wf_core::{Point, VehicleClass};
use wf_scenario::{Preset, ScenarioKind};

#[derive(Parser, Debug)]
#[command(author, version, about = "Road-network routing with reversible traffic scenarios")]
pub struct Cli {
    /// Engine configuration (TOML).  Defaults apply when omitted.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub graphs: GraphFiles,

    #[command(subcommand)]
    pub command: Command,
}

/// Node and edge CSVs per vehicle class.  A class is loaded only when both
/// of its files are given.
#[derive(Args, Debug, Default)]
pub struct GraphFiles {
    /// Car network nodes (`id,x,y`)
    #[arg(long, global = true, requires = "car_edges")]
    pub car_nodes: Option<PathBuf>,
    /// Car network edges (`node_from,node_to,weight`)
    #[arg(long, global = true, requires = "car_nodes")]
    pub car_edges: Option<PathBuf>,
    /// Pedestrian network nodes (`id,x,y`)
    #[arg(long, global = true, requires = "foot_edges")]
    pub foot_nodes: Option<PathBuf>,
    /// Pedestrian network edges (`node_from,node_to,weight`)
    #[arg(long, global = true, requires = "foot_nodes")]
    pub foot_edges: Option<PathBuf>,
}

impl GraphFiles {
    /// `(class, nodes, edges)` for every class with both files present.
    pub fn sources(&self) -> Vec<(VehicleClass, &PathBuf, &PathBuf)> {
        let mut out = Vec::new();
        if let (Some(n), Some(e)) = (&self.car_nodes, &self.car_edges) {
            out.push((VehicleClass::Car, n, e));
        }
        if let (Some(n), Some(e)) = (&self.foot_nodes, &self.foot_edges) {
            out.push((VehicleClass::Foot, n, e));
        }
        out
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Find the lowest-cost route between two points
    Route(RouteArgs),
    /// Apply a scenario, optionally routing before and after it
    Scenario(ScenarioArgs),
    /// Print size and degree statistics for every loaded graph
    Stats,
    /// List the built-in scenario presets
    Presets,
}

#[derive(Args, Debug, Clone)]
pub struct RouteArgs {
    /// Start point as `x,y`
    #[arg(long, value_parser = parse_point, allow_hyphen_values = true)]
    pub from: Point,
    /// End point as `x,y`
    #[arg(long, value_parser = parse_point, allow_hyphen_values = true)]
    pub to: Point,
    #[arg(long, default_value = "car")]
    pub vehicle: VehicleClass,
    /// Travel speed in map units per second; the configured speed when omitted
    #[arg(long)]
    pub speed: Option<f64>,
}

#[derive(Args, Debug)]
pub struct ScenarioArgs {
    /// Scenario kind (`rain` or `block`)
    #[arg(long, conflicts_with = "preset", required_unless_present = "preset")]
    pub kind: Option<ScenarioKind>,
    /// Named preset (medium-rain, heavy-rain, extreme-rain, road-block)
    #[arg(long)]
    pub preset: Option<Preset>,
    /// Stroke start as `x,y`
    #[arg(long, value_parser = parse_point, allow_hyphen_values = true)]
    pub start: Point,
    /// Stroke end as `x,y`; a point scenario when omitted
    #[arg(long, value_parser = parse_point, allow_hyphen_values = true)]
    pub end: Option<Point>,
    /// Cost multiplier (ignored with --preset)
    #[arg(long, default_value_t = 2.0)]
    pub penalty: f64,
    /// Radius of point scenarios (ignored with --preset)
    #[arg(long, default_value_t = 50.0)]
    pub threshold: f64,
    /// Route to compare before and after, as `x,y`
    #[arg(long, value_parser = parse_point, allow_hyphen_values = true, requires = "route_to")]
    pub route_from: Option<Point>,
    #[arg(long, value_parser = parse_point, allow_hyphen_values = true, requires = "route_from")]
    pub route_to: Option<Point>,
    #[arg(long, default_value = "car")]
    pub vehicle: VehicleClass,
}

/// Parse `x,y` into a point.
pub fn parse_point(s: &str) -> Result<Point, String> {
    let (x, y) = s.split_once(',').ok_or_else(|| format!("expected `x,y`, got {s:?}"))?;
    let x: f64 = x.trim().parse().map_err(|e| format!("bad x in {s:?}: {e}"))?;
    let y: f64 = y.trim().parse().map_err(|e| format!("bad y in {s:?}: {e}"))?;
    Ok(Point::new(x, y))
}
