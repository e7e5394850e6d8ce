// Highway path planner bridge
//
// Reads one simulator frame per line on stdin and answers each handled frame
// with one line on stdout. Logging goes to stderr.
//
// usage: path_planner <map file> [params.toml]

use std::io::{self, BufRead, Write};
use std::process;

use log::{error, info, LevelFilter};

use highway_planner::bridge::{self, Inbound};
use highway_planner::utils::{level_from_env, logger_init};
use highway_planner::{
    HighwayPlanner, PlannerConfig, PlannerError, PlannerResult, PlannerSession, RoadMap,
};

fn run() -> PlannerResult<()> {
    let args: Vec<String> = std::env::args().collect();
    let map_path = args.get(1).ok_or_else(|| {
        PlannerError::InvalidParameter("usage: path_planner <map file> [params.toml]".to_string())
    })?;
    let config = match args.get(2) {
        Some(path) => PlannerConfig::load(path)?,
        None => PlannerConfig::default(),
    };

    let map = RoadMap::load(map_path, config.road.max_s)?;
    info!("Loaded {} waypoints from {}, max_s = {}", map.len(), map_path, config.road.max_s);

    let planner = HighwayPlanner::new(map, config.behavior, config.trajectory)?;
    let mut session = PlannerSession::new(planner);

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut out = stdout.lock();

    for line in stdin.lock().lines() {
        let line = line?;
        let reply = match bridge::decode(&line)? {
            Inbound::Telemetry(telemetry) => match session.step(&telemetry) {
                Ok(trajectory) => bridge::encode_control(&trajectory),
                Err(e) => {
                    // Keep driving what was already committed; the state is unchanged
                    error!("Cycle {} rejected: {}", session.cycles(), e);
                    bridge::encode_control(&telemetry.previous.path)
                }
            },
            Inbound::NoPayload => bridge::encode_manual(),
            Inbound::Ignored => continue,
        };
        writeln!(out, "{}", reply)?;
        out.flush()?;
    }

    info!("Input closed after {} cycles", session.cycles());
    Ok(())
}

fn main() {
    let level = match level_from_env(LevelFilter::Info) {
        Ok(level) => level,
        Err(e) => {
            eprintln!("{}", e);
            process::exit(2);
        }
    };
    if let Err(e) = logger_init(level) {
        eprintln!("{}", e);
        process::exit(2);
    }

    if let Err(e) = run() {
        error!("{}", e);
        process::exit(1);
    }
}
