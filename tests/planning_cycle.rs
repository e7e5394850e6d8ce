use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use highway_planner::bridge::{self, Inbound};
use highway_planner::common::frenet_gap;
use highway_planner::mission_planning::{BehaviorConfig, BehaviorPlanner};
use highway_planner::{
    EgoState, FrenetFrame, HighwayPlanner, Path2D, PlannerConfig, PlannerSession, PlannerState,
    PreviousPath, RoadMap, Telemetry, TrafficVehicle,
};

const SPEED_LIMIT: f64 = 48.9;

fn track() -> RoadMap {
    RoadMap::circular(1100.0, 200).unwrap()
}

fn ego_on(map: &RoadMap, s: f64, d: f64, speed: f64) -> EgoState {
    let p = map.to_cartesian(s, d);
    let q = map.to_cartesian(s + 1.0, d);
    EgoState::new(p.x, p.y, (q.y - p.y).atan2(q.x - p.x), speed, s, d)
}

fn parked(map: &RoadMap, id: i64, s: f64, d: f64) -> TrafficVehicle {
    let p = map.to_cartesian(s, d);
    TrafficVehicle::new(id, p.x, p.y, 0.0, 0.0, s, d)
}

/// Let the vehicle drive the first `k` points of `trajectory`
fn drive(map: &RoadMap, ego: &EgoState, trajectory: &Path2D, k: usize) -> (EgoState, PreviousPath) {
    let k = k.min(trajectory.len());
    let ego = if k == 0 {
        *ego
    } else {
        let last = trajectory.points[k - 1];
        let before = if k >= 2 { trajectory.points[k - 2] } else { ego.position() };
        let (s, d) = map.to_frenet(last.x, last.y);
        let step = last.distance(&before);
        let yaw = if step > 1e-9 { (last.y - before.y).atan2(last.x - before.x) } else { ego.yaw };
        EgoState::new(last.x, last.y, yaw, step / 0.02 * 2.24, s, d)
    };

    let rest = Path2D::from_points(trajectory.points[k..].to_vec());
    let previous = match rest.last() {
        Some(end) => {
            let (s, d) = map.to_frenet(end.x, end.y);
            PreviousPath::new(rest.clone(), s, d)
        }
        None => PreviousPath::empty(),
    };
    (ego, previous)
}

#[test]
fn frenet_round_trip_recovers_s() {
    let map = track();
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..500 {
        let s = rng.gen_range(0.0..map.max_s());
        let d = rng.gen_range(0.0..12.0);
        let p = map.to_cartesian(s, d);
        let (s2, d2) = map.to_frenet(p.x, p.y);
        assert!(frenet_gap(s, s2, map.max_s()).abs() < 0.5, "s {} -> {}", s, s2);
        assert!((d - d2).abs() < 0.1, "d {} -> {}", d, d2);
    }
}

#[test]
fn vehicle_ahead_never_speeds_us_up() {
    let planner = BehaviorPlanner::new(BehaviorConfig::default(), 6945.554).unwrap();
    let mut rng = StdRng::seed_from_u64(11);
    for _ in 0..1000 {
        let lane = rng.gen_range(0..3usize);
        let state = PlannerState::new(lane, rng.gen_range(0.0..=SPEED_LIMIT));
        let ego_s = rng.gen_range(0.0..6945.554);
        let ego = EgoState::new(0.0, 0.0, 0.0, 20.0, ego_s, 2.0 + 4.0 * lane as f64);

        let mut traffic = vec![TrafficVehicle::new(
            0, 0.0, 0.0, 0.0, 0.0,
            ego_s + rng.gen_range(0.1..24.9),
            4.0 * lane as f64 + rng.gen_range(0.0..3.99),
        )];
        for id in 1..rng.gen_range(1..8) {
            traffic.push(TrafficVehicle::new(
                id, 0.0, 0.0,
                rng.gen_range(-5.0..25.0), 0.0,
                ego_s + rng.gen_range(-60.0..60.0),
                rng.gen_range(0.0..11.99),
            ));
        }

        let out = planner.plan(&state, &ego, &PreviousPath::empty(), &traffic).unwrap();
        assert!(out.assessment.too_close);
        assert!(out.state.reference_speed <= state.reference_speed);
        assert!((out.state.lane as i64 - lane as i64).abs() <= 1);
    }
}

#[test]
fn reference_speed_stays_in_bounds() {
    let planner = BehaviorPlanner::new(BehaviorConfig::default(), 6945.554).unwrap();
    let mut rng = StdRng::seed_from_u64(23);
    let mut state = PlannerState::default();
    for _ in 0..5000 {
        let ego_s = rng.gen_range(0.0..6945.554);
        let ego = EgoState::new(0.0, 0.0, 0.0, 0.0, ego_s, 2.0 + 4.0 * state.lane as f64);
        let traffic: Vec<TrafficVehicle> = (0..rng.gen_range(0..6))
            .map(|id| TrafficVehicle::new(
                id, 0.0, 0.0,
                rng.gen_range(0.0..25.0), 0.0,
                ego_s + rng.gen_range(-40.0..40.0),
                rng.gen_range(0.0..11.99),
            ))
            .collect();
        let next = planner.plan(&state, &ego, &PreviousPath::empty(), &traffic).unwrap().state;
        assert!(next.reference_speed >= 0.0 && next.reference_speed <= SPEED_LIMIT);
        assert!((next.reference_speed - state.reference_speed).abs() <= 0.224 + 1e-12);
        assert!(next.lane < 3);
        state = next;
    }
}

#[test]
fn trajectory_always_has_fifty_points() {
    let map = track();
    let planner = HighwayPlanner::with_defaults(map.clone()).unwrap();
    let state = PlannerState::new(1, 30.0);
    let ego = ego_on(&map, 100.0, 6.0, 30.0);

    let first = planner
        .plan_cycle(&state, &Telemetry { ego, previous: PreviousPath::empty(), traffic: Vec::new() })
        .unwrap();
    assert_eq!(first.trajectory.len(), 50);

    for consumed in 0..=50 {
        let (ego, previous) = drive(&map, &ego, &first.trajectory, consumed);
        assert_eq!(previous.len(), 50 - consumed);
        let out = planner
            .plan_cycle(&first.state, &Telemetry { ego, previous: previous.clone(), traffic: Vec::new() })
            .unwrap();
        assert_eq!(out.trajectory.len(), 50, "prefix of {}", previous.len());
        assert_eq!(&out.trajectory.points[..previous.len()], &previous.path.points[..]);
    }
}

#[test]
fn new_points_continue_the_prefix() {
    let map = track();
    let mut session = PlannerSession::with_state(
        HighwayPlanner::with_defaults(map.clone()).unwrap(),
        PlannerState::new(1, 20.0),
    );
    let mut ego = ego_on(&map, 100.0, 6.0, 20.0);
    let mut previous = PreviousPath::empty();
    // Parked in lane 1, so a lane change happens on the way
    let traffic = vec![parked(&map, 0, 400.0, 6.0)];

    for cycle in 0..300 {
        let trajectory = session
            .step(&Telemetry { ego, previous: previous.clone(), traffic: traffic.clone() })
            .unwrap();
        let n = previous.len();
        if n >= 2 && n < trajectory.len() {
            let a = trajectory.points[n - 2];
            let b = trajectory.points[n - 1];
            let expected_x = 2.0 * b.x - a.x;
            let expected_y = 2.0 * b.y - a.y;
            let q = trajectory.points[n];
            let jump = ((q.x - expected_x).powi(2) + (q.y - expected_y).powi(2)).sqrt();
            assert!(jump < 0.05, "cycle {}: jump of {:.3} m", cycle, jump);
        }
        let next = drive(&map, &ego, &trajectory, 5);
        ego = next.0;
        previous = next.1;
    }
    // The parked car blocked lane 1 at some point
    assert_ne!(session.state().lane, 1);
}

#[test]
fn empty_road_accelerates_in_lane() {
    let map = track();
    let mut session = PlannerSession::with_state(
        HighwayPlanner::with_defaults(map.clone()).unwrap(),
        PlannerState::new(1, 20.0),
    );
    let mut ego = ego_on(&map, 100.0, 6.0, 20.0);
    let mut previous = PreviousPath::empty();

    let first = session
        .step(&Telemetry { ego, previous: previous.clone(), traffic: Vec::new() })
        .unwrap();
    let start = ego.position();
    let distances: Vec<f64> = first.points.iter().map(|p| p.distance(&start)).collect();
    assert!(distances.windows(2).all(|w| w[1] > w[0]));
    assert!((session.state().reference_speed - 20.2).abs() < 1e-10);

    let mut trajectory = first;
    let mut last_speed = session.state().reference_speed;
    for _ in 0..200 {
        let next = drive(&map, &ego, &trajectory, 5);
        ego = next.0;
        previous = next.1;
        trajectory = session
            .step(&Telemetry { ego, previous: previous.clone(), traffic: Vec::new() })
            .unwrap();
        assert!(session.state().reference_speed >= last_speed);
        assert_eq!(session.state().lane, 1);
        last_speed = session.state().reference_speed;
    }
    assert!((session.state().reference_speed - SPEED_LIMIT).abs() < 1e-9);

    // New points are spaced for the speed limit
    let tail = &trajectory.points[45..];
    let expected = SPEED_LIMIT / 2.24 * 0.02;
    for w in tail.windows(2) {
        assert!((w[0].distance(&w[1]) - expected).abs() < 0.01);
    }
    assert!((ego.d - 6.0).abs() < 0.2);
}

#[test]
fn boxed_in_slows_down_and_holds_lane() {
    let map = track();
    let planner = HighwayPlanner::with_defaults(map.clone()).unwrap();
    let state = PlannerState::new(1, 30.0);
    let ego = ego_on(&map, 100.0, 6.0, 30.0);
    let traffic = vec![
        parked(&map, 0, 115.0, 6.0),
        parked(&map, 1, 110.0, 2.0),
        parked(&map, 2, 90.0, 10.0),
    ];

    let out = planner
        .plan_cycle(&state, &Telemetry { ego, previous: PreviousPath::empty(), traffic })
        .unwrap();
    assert!(out.state.reference_speed < state.reference_speed);
    assert_eq!(out.state.lane, 1);

    let end = out.trajectory.last().unwrap();
    let (_, d) = map.to_frenet(end.x, end.y);
    assert!((d - 6.0).abs() < 0.2);
}

#[test]
fn clear_lane_two_is_taken_while_slowing() {
    let map = track();
    let planner = HighwayPlanner::with_defaults(map.clone()).unwrap();
    let state = PlannerState::new(1, 30.0);
    let ego = ego_on(&map, 100.0, 6.0, 30.0);
    let traffic = vec![parked(&map, 0, 115.0, 6.0), parked(&map, 1, 105.0, 2.0)];

    let out = planner
        .plan_cycle(&state, &Telemetry { ego, previous: PreviousPath::empty(), traffic })
        .unwrap();
    assert_eq!(out.state.lane, 2);
    assert!(out.state.reference_speed < state.reference_speed);

    // The new points bend towards lane 2
    let end = out.trajectory.last().unwrap();
    let (_, d) = map.to_frenet(end.x, end.y);
    assert!(d > 6.0);
}

#[test]
fn bridge_round_trip() {
    let map = track();
    let mut session = PlannerSession::new(HighwayPlanner::with_defaults(map.clone()).unwrap());
    let ego = ego_on(&map, 124.8, 6.16, 0.0);
    let frame = format!(
        r#"42["telemetry",{{"x":{},"y":{},"yaw":{},"speed":0,"s":124.8,"d":6.16,"previous_path_x":[],"previous_path_y":[],"end_path_s":0,"end_path_d":0,"sensor_fusion":[[3,0,0,20,0,400,2]]}}]"#,
        ego.x,
        ego.y,
        ego.yaw.to_degrees()
    );

    let telemetry = match bridge::decode(&frame).unwrap() {
        Inbound::Telemetry(t) => t,
        other => panic!("unexpected {:?}", other),
    };
    let trajectory = session.step(&telemetry).unwrap();
    let reply = bridge::encode_control(&trajectory);
    let value: serde_json::Value = serde_json::from_str(&reply[2..]).unwrap();
    assert_eq!(value[0], "control");
    assert_eq!(value[1]["next_x"].as_array().unwrap().len(), 50);
    assert_eq!(value[1]["next_y"].as_array().unwrap().len(), 50);

    assert_eq!(bridge::decode(r#"42["telemetry",null]"#).unwrap(), Inbound::NoPayload);
}

#[test]
fn shipped_parameters_match_defaults() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/params/planner.toml");
    let config = PlannerConfig::load(path).unwrap();
    let defaults = PlannerConfig::default();
    assert_eq!(config.trajectory.path_len, defaults.trajectory.path_len);
    assert_eq!(config.behavior.lane_count, defaults.behavior.lane_count);
    assert_eq!(config.behavior.safety_gap, defaults.behavior.safety_gap);
    assert_eq!(config.behavior.speed_limit, defaults.behavior.speed_limit);
    assert_eq!(config.road.max_s, defaults.road.max_s);
}
