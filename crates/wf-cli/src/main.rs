//! `wayfare` — command-line front end for the routing engine.
//!
//! Loads per-vehicle road networks from CSV, then answers one command and
//! prints the result as JSON on stdout.  Logs go to stderr (`RUST_LOG`,
//! default `info`).
//!
//! ```text
//! wayfare --car-nodes nodes.csv --car-edges edges.csv \
//!     route --from 0,0 --to 20,0
//! wayfare --car-nodes nodes.csv --car-edges edges.csv \
//!     scenario --preset heavy-rain --start 5,5 --end 15,5 --route-from 0,0 --route-to 20,0
//! ```

mod args;

#[cfg(test)]
mod tests;

use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use serde_json::{json, Value};
use tracing::info;
use tracing_subscriber::EnvFilter;

use wf_core::EngineConfig;
use wf_engine::{EngineBuilder, RoutingEngine, ScenarioRequest};
use wf_graph::loader::{load_edge_rows, load_node_rows};
use wf_scenario::Preset;

use args::{Cli, Command, GraphFiles, RouteArgs, ScenarioArgs};

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(log_filter(std::env::var("RUST_LOG").ok().as_deref()))
        .with_writer(std::io::stderr)
        .init();

    let output = run(&cli)?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

/// `RUST_LOG` directives when set and valid, `info` otherwise.
pub(crate) fn log_filter(directives: Option<&str>) -> EnvFilter {
    directives
        .filter(|d| !d.trim().is_empty())
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new("info"))
}

/// Execute one command and return its JSON report.
pub(crate) fn run(cli: &Cli) -> Result<Value> {
    if let Command::Presets = cli.command {
        return Ok(presets());
    }

    let config = match &cli.config {
        Some(path) => EngineConfig::from_path(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => EngineConfig::default(),
    };
    let engine = build_engine(config, &cli.graphs)?;

    match &cli.command {
        Command::Route(route) => Ok(json!({ "route": route_report(&engine, route)? })),
        Command::Scenario(scenario) => scenario_report(&engine, scenario),
        Command::Stats => stats(&engine),
        Command::Presets => Ok(presets()),
    }
}

// ── Engine setup ──────────────────────────────────────────────────────────────

fn build_engine(config: EngineConfig, files: &GraphFiles) -> Result<RoutingEngine> {
    let sources = files.sources();
    anyhow::ensure!(
        !sources.is_empty(),
        "no road network given; pass --car-nodes/--car-edges or --foot-nodes/--foot-edges"
    );

    let t0 = Instant::now();
    let mut builder = EngineBuilder::new().config(config);
    for (class, nodes, edges) in sources {
        let node_rows = load_node_rows(nodes).with_context(|| format!("reading {}", nodes.display()))?;
        let edge_rows = load_edge_rows(edges).with_context(|| format!("reading {}", edges.display()))?;
        builder = builder.graph(class, node_rows, edge_rows);
    }
    let engine = builder.build()?;
    info!(elapsed_ms = t0.elapsed().as_millis() as u64, "networks loaded");
    Ok(engine)
}

// ── Commands ──────────────────────────────────────────────────────────────────

fn route_report(engine: &RoutingEngine, route: &RouteArgs) -> Result<Value> {
    let found = engine.find_path(route.from.x, route.from.y, route.to.x, route.to.y, route.vehicle, route.speed)?;
    Ok(serde_json::to_value(found)?)
}

fn scenario_report(engine: &RoutingEngine, args: &ScenarioArgs) -> Result<Value> {
    let end = args.end.unwrap_or(args.start);
    let request = match (args.preset, args.kind) {
        (Some(preset), _) => preset.request(args.start, end),
        (None, Some(kind)) => ScenarioRequest::new(kind, args.start, end, args.penalty, args.threshold),
        (None, None) => anyhow::bail!("either --kind or --preset is required"),
    };

    let check = match (args.route_from, args.route_to) {
        (Some(from), Some(to)) => Some(RouteArgs { from, to, vehicle: args.vehicle, speed: None }),
        _ => None,
    };

    let before = check.as_ref().map(|r| route_report(engine, r)).transpose()?;
    let applied = engine.apply_scenario(request)?;
    let after = check.as_ref().map(|r| route_report(engine, r)).transpose()?;

    Ok(json!({
        "applied":   applied,
        "request":   request,
        "scenarios": engine.scenarios()?,
        "before":    before,
        "after":     after,
    }))
}

fn stats(engine: &RoutingEngine) -> Result<Value> {
    let mut out = Vec::new();
    for class in engine.vehicle_classes()? {
        let stats = engine.graph_stats(class)?;
        let nodes = engine.node_summaries(class)?;
        let dead_ends = nodes.iter().filter(|n| n.out_degree == 0).count();
        out.push(json!({ "stats": stats, "dead_ends": dead_ends }));
    }
    Ok(Value::Array(out))
}

fn presets() -> Value {
    Preset::ALL
        .iter()
        .map(|p| {
            json!({
                "name":      p.as_str(),
                "kind":      p.kind(),
                "penalty":   p.penalty(),
                "threshold": p.threshold(),
            })
        })
        .collect()
}
