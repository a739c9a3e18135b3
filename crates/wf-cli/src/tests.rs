//! Unit tests for the `wayfare` binary.

#[cfg(test)]
mod args {
    use clap::{CommandFactory, Parser};

    use wf_core::{Point, VehicleClass};
    use wf_scenario::Preset;

    use crate::args::{parse_point, Cli, Command};

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn points_parse() {
        assert_eq!(parse_point("1.5,-2").unwrap(), Point::new(1.5, -2.0));
        assert_eq!(parse_point(" 3 , 4 ").unwrap(), Point::new(3.0, 4.0));
        assert!(parse_point("3;4").is_err());
        assert!(parse_point("x,4").is_err());
    }

    #[test]
    fn route_arguments() {
        let cli = Cli::try_parse_from([
            "wayfare", "--car-nodes", "n.csv", "--car-edges", "e.csv",
            "route", "--from", "0,0", "--to", "-5,20", "--vehicle", "foot",
        ])
        .unwrap();
        let Command::Route(route) = cli.command else { panic!("expected route") };
        assert_eq!(route.to, Point::new(-5.0, 20.0));
        assert_eq!(route.vehicle, VehicleClass::Foot);
        assert_eq!(route.speed, None);
        assert_eq!(cli.graphs.sources().len(), 1);
    }

    #[test]
    fn scenario_needs_kind_or_preset() {
        assert!(Cli::try_parse_from(["wayfare", "scenario", "--start", "0,0"]).is_err());
        let cli = Cli::try_parse_from(["wayfare", "scenario", "--preset", "heavy_rain", "--start", "0,0"]).unwrap();
        let Command::Scenario(s) = cli.command else { panic!("expected scenario") };
        assert_eq!(s.preset, Some(Preset::HeavyRain));
        assert_eq!(s.end, None);
    }

    #[test]
    fn half_a_graph_is_rejected() {
        assert!(Cli::try_parse_from(["wayfare", "--car-nodes", "n.csv", "stats"]).is_err());
    }
}

#[cfg(test)]
mod logging {
    use tracing_subscriber::filter::LevelFilter;

    use crate::log_filter;

    #[test]
    fn rust_log_sets_the_level() {
        assert_eq!(log_filter(Some("debug")).max_level_hint(), Some(LevelFilter::DEBUG));
        assert_eq!(log_filter(Some("warn")).max_level_hint(), Some(LevelFilter::WARN));
    }

    #[test]
    fn defaults_to_info() {
        assert_eq!(log_filter(None).max_level_hint(), Some(LevelFilter::INFO));
        assert_eq!(log_filter(Some("  ")).max_level_hint(), Some(LevelFilter::INFO));
        assert_eq!(log_filter(Some("wayfare=loud")).max_level_hint(), Some(LevelFilter::INFO));
    }
}

#[cfg(test)]
mod run {
    use std::fs;
    use std::path::Path;

    use clap::Parser;
    use tempfile::TempDir;

    use crate::args::Cli;
    use crate::run;

    /// A(1):(0,0) → B(2):(10,0) → C(3):(20,0) in storage coordinates.
    fn write_line(dir: &Path) {
        fs::write(dir.join("nodes.csv"), "id,x,y\n1,0,0\n2,10,0\n3,20,0\n").unwrap();
        fs::write(dir.join("edges.csv"), "node_from,node_to,weight\n1,2,10\n2,3,10\n").unwrap();
        fs::write(dir.join("wayfare.toml"), "[frame]\ninvert_y = false\n").unwrap();
    }

    fn cli(dir: &TempDir, rest: &[&str]) -> Cli {
        let path = |f: &str| dir.path().join(f).to_string_lossy().into_owned();
        let mut argv = vec![
            "wayfare".to_string(),
            "--config".into(),
            path("wayfare.toml"),
            "--car-nodes".into(),
            path("nodes.csv"),
            "--car-edges".into(),
            path("edges.csv"),
        ];
        argv.extend(rest.iter().map(|s| s.to_string()));
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn route_command() {
        let dir = tempfile::tempdir().unwrap();
        write_line(dir.path());
        let out = run(&cli(&dir, &["route", "--from", "0,0", "--to", "20,0", "--speed", "2"])).unwrap();
        assert_eq!(out["route"]["distance"], 20.0);
        assert_eq!(out["route"]["travel"]["seconds"], 10.0);
        assert_eq!(out["route"]["path"].as_array().unwrap().len(), 3);
        assert_eq!(out["route"]["node_count"], 3);
    }

    #[test]
    fn scenario_command_reports_before_and_after() {
        let dir = tempfile::tempdir().unwrap();
        write_line(dir.path());
        let out = run(&cli(
            &dir,
            &[
                "scenario", "--kind", "block", "--start", "15,-5", "--end", "15,3", "--penalty", "1000",
                "--route-from", "0,0", "--route-to", "20,0",
            ],
        ))
        .unwrap();
        assert_eq!(out["applied"]["affected_edge_count"], 1);
        assert_eq!(out["before"]["cost"], 20.0);
        assert_eq!(out["after"]["cost"], 10_010.0);
        assert_eq!(out["after"]["travel"], "blocked");
        assert_eq!(out["scenarios"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn stats_command() {
        let dir = tempfile::tempdir().unwrap();
        write_line(dir.path());
        let out = run(&cli(&dir, &["stats"])).unwrap();
        assert_eq!(out[0]["stats"]["class"], "car");
        assert_eq!(out[0]["stats"]["nodes"], 3);
        assert_eq!(out[0]["dead_ends"], 1);
    }

    #[test]
    fn presets_need_no_network() {
        let out = run(&Cli::try_parse_from(["wayfare", "presets"]).unwrap()).unwrap();
        assert_eq!(out.as_array().unwrap().len(), 4);
        assert_eq!(out[0]["name"], "medium-rain");
        assert_eq!(out[0]["penalty"], 1.0);
        assert_eq!(out[3]["name"], "road-block");
    }

    #[test]
    fn missing_network_is_an_error() {
        assert!(run(&Cli::try_parse_from(["wayfare", "stats"]).unwrap()).is_err());
    }
}
