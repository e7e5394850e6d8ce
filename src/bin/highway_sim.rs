// Closed-loop highway simulation
//
// Drives the planner on a synthetic circular three-lane track with traffic
// cruising at random speeds. Each cycle the ego vehicle consumes a few points
// of the last trajectory, exactly like the real simulator does between
// telemetry messages, and the driven path is plotted at the end.
//
// usage: highway_sim [cycles] [seed] [output.svg]

use std::process;

use log::{error, info, warn, LevelFilter};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};

use highway_planner::common::{frenet_gap, lane_center, lane_index};
use highway_planner::utils::{colors, level_from_env, logger_init, PathStyle, PointStyle, Visualizer};
use highway_planner::{
    EgoState, FrenetFrame, HighwayPlanner, Path2D, PlannerError, PlannerResult, PlannerSession,
    PreviousPath, RoadMap, Telemetry, TrafficVehicle,
};

const TRACK_RADIUS: f64 = 1100.0;
const TRACK_WAYPOINTS: usize = 200;
const LANE_WIDTH: f64 = 4.0;
const LANE_COUNT: usize = 3;
const TRAFFIC_COUNT: usize = 12;
const POINTS_PER_CYCLE: usize = 5;
const TIME_STEP: f64 = 0.02;
const MPS_TO_MPH: f64 = 2.24;

/// A vehicle keeping its lane at constant speed
struct Cruiser {
    id: i64,
    s: f64,
    lane: usize,
    speed: f64,
}

impl Cruiser {
    fn advance(&mut self, dt: f64, max_s: f64) {
        self.s = (self.s + self.speed * dt).rem_euclid(max_s);
    }

    fn to_vehicle(&self, map: &RoadMap) -> TrafficVehicle {
        let d = lane_center(self.lane, LANE_WIDTH);
        let p = map.to_cartesian(self.s, d);
        let ahead = map.to_cartesian(self.s + 1.0, d);
        let heading = (ahead.y - p.y).atan2(ahead.x - p.x);
        TrafficVehicle::new(
            self.id,
            p.x,
            p.y,
            self.speed * heading.cos(),
            self.speed * heading.sin(),
            self.s,
            d,
        )
    }
}

fn spawn_traffic(rng: &mut StdRng, max_s: f64) -> PlannerResult<Vec<Cruiser>> {
    let speed: Normal<f64> = Normal::new(19.0, 2.5)
        .map_err(|e| PlannerError::InvalidParameter(e.to_string()))?;
    Ok((0..TRAFFIC_COUNT)
        .map(|i| Cruiser {
            id: i as i64,
            s: (200.0 + 120.0 * i as f64 + rng.gen_range(0.0..40.0)).rem_euclid(max_s),
            lane: rng.gen_range(0..LANE_COUNT),
            speed: speed.sample(rng).clamp(12.0, 22.0),
        })
        .collect())
}

fn run(cycles: usize, seed: u64, output: &str) -> PlannerResult<()> {
    let map = RoadMap::circular(TRACK_RADIUS, TRACK_WAYPOINTS)?;
    let max_s = map.max_s();
    let mut rng = StdRng::seed_from_u64(seed);
    let mut traffic = spawn_traffic(&mut rng, max_s)?;

    let start_s = 124.8;
    let start = map.to_cartesian(start_s, 6.0);
    let ahead = map.to_cartesian(start_s + 1.0, 6.0);
    let mut ego = EgoState::new(start.x, start.y, (ahead.y - start.y).atan2(ahead.x - start.x), 0.0, start_s, 6.0);
    let mut previous = PreviousPath::empty();
    let mut driven = Path2D::from_points(vec![start]);

    let mut session = PlannerSession::new(HighwayPlanner::with_defaults(map.clone())?);
    let mut min_gap = f64::INFINITY;

    for cycle in 0..cycles {
        let telemetry = Telemetry {
            ego,
            previous: previous.clone(),
            traffic: traffic.iter().map(|c| c.to_vehicle(&map)).collect(),
        };
        let trajectory = session.step(&telemetry)?;

        // The vehicle drives the first few points before the next message
        let consumed = POINTS_PER_CYCLE.min(trajectory.len());
        let last = trajectory.points[consumed - 1];
        let before = if consumed >= 2 { trajectory.points[consumed - 2] } else { ego.position() };
        for p in &trajectory.points[..consumed] {
            driven.push(*p);
        }

        let (s, d) = map.to_frenet(last.x, last.y);
        let speed = last.distance(&before) / TIME_STEP * MPS_TO_MPH;
        ego = EgoState::new(last.x, last.y, (last.y - before.y).atan2(last.x - before.x), speed, s, d);

        let rest = Path2D::from_points(trajectory.points[consumed..].to_vec());
        previous = match rest.last() {
            Some(end) => {
                let (end_s, end_d) = map.to_frenet(end.x, end.y);
                PreviousPath::new(rest.clone(), end_s, end_d)
            }
            None => PreviousPath::empty(),
        };

        let elapsed = consumed as f64 * TIME_STEP;
        for car in traffic.iter_mut() {
            car.advance(elapsed, max_s);
        }

        let ego_lane = lane_index(ego.d, LANE_WIDTH);
        for car in &traffic {
            if car.lane as i64 == ego_lane {
                let gap = frenet_gap(ego.s, car.s, max_s);
                if gap > 0.0 {
                    min_gap = min_gap.min(gap);
                }
            }
        }

        if cycle % 50 == 0 {
            info!(
                "cycle {:4}: s={:7.1} d={:5.2} speed={:5.1} mph lane={} ref={:5.2}",
                cycle, ego.s, ego.d, ego.speed, session.state().lane, session.state().reference_speed
            );
        }
    }

    info!("Driven {:.1} m, closest vehicle ahead in own lane: {:.1} m", driven.total_length(), min_gap);

    let cars: Vec<TrafficVehicle> = traffic.iter().map(|c| c.to_vehicle(&map)).collect();
    let mut vis = Visualizer::new();
    vis.set_title("Highway planner")
        .plot_track(&map, LANE_COUNT, LANE_WIDTH, 10.0)
        .plot_traffic(&map, &cars, LANE_WIDTH)
        .plot_path(&driven, &PathStyle::new(colors::DRIVEN, "Driven"))
        .plot_points(&[ego.position()], &PointStyle::new(colors::EGO, "Ego").with_size(2.0));

    match vis.save_svg(output) {
        Ok(()) => info!("Plot saved to: {}", output),
        Err(e) => warn!("Could not save plot: {}", e),
    }
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

    let args: Vec<String> = std::env::args().collect();
    let cycles = args.get(1).and_then(|a| a.parse().ok()).unwrap_or(600);
    let seed = args.get(2).and_then(|a| a.parse().ok()).unwrap_or(42);
    let output = args.get(3).map(String::as_str).unwrap_or("highway_sim.svg");

    info!("Highway simulation: {} cycles, seed {}", cycles, seed);
    if let Err(e) = run(cycles, seed, output) {
        error!("{}", e);
        process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spawned_traffic_is_on_the_road() {
        let mut rng = StdRng::seed_from_u64(42);
        let traffic = spawn_traffic(&mut rng, 6000.0).unwrap();
        assert_eq!(traffic.len(), TRAFFIC_COUNT);
        for car in &traffic {
            assert!(car.lane < LANE_COUNT);
            assert!(car.speed >= 12.0 && car.speed <= 22.0);
            assert!(car.s >= 0.0 && car.s < 6000.0);
        }
    }

    #[test]
    fn test_cruiser_wraps_at_loop_end() {
        let mut car = Cruiser { id: 0, s: 5990.0, lane: 1, speed: 20.0 };
        car.advance(1.0, 6000.0);
        assert!((car.s - 10.0).abs() < 1e-9);
    }
}
