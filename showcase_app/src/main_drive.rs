//! Hover Drive Demo
//!
//! Headless race on the sandbox world:
//! - Track read from a curve file given as first argument, or a built-in oval
//! - Checkpoint gates on evenly spaced track anchors, boost squares in between
//! - A scripted driver steering toward the next gate
//! - Auto-pilot cruising once the finish line is crossed
//!
//! An engine configuration file (`.toml` or `.ron`) may be given as second
//! argument.

use hover_engine::config::Config;
use hover_engine::curve::{AnchorPoint, BezierControlPoint, BezierCurve, CurveError, DiscreteCurve, TrackPath};
use hover_engine::foundation::logging;
use hover_engine::foundation::math::utils::look_rotation;
use hover_engine::foundation::math::{Pose, Quat, Vec3};
use hover_engine::foundation::time::Stopwatch;
use hover_engine::physics::{BodyDesc, GameObject, Layer, PhysicsWorld, SandboxWorld, TriggerAction};
use hover_engine::race::RacePhase;
use hover_engine::vehicle::VehicleInput;
use hover_engine::{Engine, EngineConfig, EngineError};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

// Simulation
const FRAME_DELTA: f32 = 1.0 / 60.0;
const MAX_RACE_TIME: f32 = 240.0;
const CRUISE_TIME_AFTER_END: f32 = 3.0;

// Track dressing
const ANCHORS_PER_GATE: usize = 8;
const GATE_HALF_EXTENTS: Vec3 = Vec3::new(1.0, 3.0, 12.0);
const BOOST_SQUARES: usize = 4;
const BOOST_FUEL: f32 = 0.25;
const GROUND_MARGIN: f32 = 40.0;

#[derive(thiserror::Error, Debug)]
enum DemoError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Curve(#[from] CurveError),

    #[error("Track has too few anchors for a race ({0})")]
    TrackTooShort(usize),
}

fn builtin_oval() -> Result<BezierCurve, CurveError> {
    let start = BezierControlPoint::new(Vec3::zeros(), Vec3::new(-60.0, 0.0, 0.0), Vec3::new(60.0, 0.0, 0.0));
    BezierCurve::new(vec![
        start,
        BezierControlPoint::new(Vec3::new(180.0, 0.0, 90.0), Vec3::new(180.0, 0.0, 30.0), Vec3::new(180.0, 0.0, 150.0)),
        BezierControlPoint::new(Vec3::new(0.0, 0.0, 180.0), Vec3::new(60.0, 0.0, 180.0), Vec3::new(-60.0, 0.0, 180.0)),
        BezierControlPoint::new(Vec3::new(-180.0, 0.0, 90.0), Vec3::new(-180.0, 0.0, 150.0), Vec3::new(-180.0, 0.0, 30.0)),
        start,
    ])
}

fn anchor_pose(anchor: &AnchorPoint, lift: f32) -> Pose {
    let rotation = look_rotation(&anchor.forward, &anchor.up).unwrap_or_else(Quat::identity);
    Pose::from_parts((anchor.position + anchor.up * lift).into(), rotation)
}

/// Place the ground, the gates and the boost squares, return gate positions in race order
fn dress_track(engine: &mut Engine<SandboxWorld>, track: &TrackPath, anchors: &[AnchorPoint]) -> Result<Vec<Vec3>, DemoError> {
    let footprint = track.footprint(GROUND_MARGIN);
    let (center_x, center_z) = footprint.midpoint();
    engine.add_object(
        GameObject::new("ground", Layer::DEFAULT).with_footprint(footprint),
        Some(BodyDesc::fixed(
            Pose::translation(center_x, -0.5, center_z),
            Vec3::new((footprint.max_x - footprint.min_x) * 0.5, 0.5, (footprint.max_y - footprint.min_y) * 0.5),
        )),
    )?;

    let hover_height = engine.config().vehicle.hover_height;
    let mut gates = Vec::new();
    for (id, anchor) in anchors.iter().skip(ANCHORS_PER_GATE).step_by(ANCHORS_PER_GATE).enumerate() {
        let pose = anchor_pose(anchor, GATE_HALF_EXTENTS.y);
        let respawn = anchor_pose(anchor, hover_height);
        let id = u32::try_from(id).unwrap_or(u32::MAX);
        engine.add_object(
            GameObject::new(format!("gate {id}"), Layer::DEFAULT).with_trigger(TriggerAction::Checkpoint { id, respawn }),
            Some(BodyDesc::fixed(pose, GATE_HALF_EXTENTS)),
        )?;
        gates.push(anchor.position);
    }

    let mut rng = StdRng::seed_from_u64(42);
    for index in 0..BOOST_SQUARES {
        let anchor = &anchors[rng.gen_range(1..anchors.len())];
        engine.add_object(
            GameObject::new(format!("boost {index}"), Layer::DEFAULT).with_trigger(TriggerAction::BoostSquare { fuel: BOOST_FUEL }),
            Some(BodyDesc::fixed(anchor_pose(anchor, 1.0), Vec3::new(2.0, 1.0, 4.0))),
        )?;
    }

    log::info!("Track dressed with {} gates and {BOOST_SQUARES} boost squares", gates.len());
    Ok(gates)
}

/// Full throttle, steering toward `target` on the ground plane
fn steer_toward(pose: &Pose, target: &Vec3) -> VehicleInput {
    let forward = pose.rotation * Vec3::x();
    let right = forward.cross(&Vec3::y());
    let mut to_target = target - pose.translation.vector;
    to_target.y = 0.0;
    let Some(to_target) = to_target.try_normalize(f32::EPSILON) else {
        return VehicleInput { forward: 1.0, ..VehicleInput::IDLE };
    };
    VehicleInput {
        forward: if to_target.dot(&forward) > 0.0 { 1.0 } else { 0.3 },
        turn: (to_target.dot(&right) * 3.0).clamp(-1.0, 1.0),
        ..VehicleInput::IDLE
    }
}

fn run() -> Result<(), DemoError> {
    let mut args = std::env::args().skip(1);
    let curve = match args.next() {
        Some(path) => BezierCurve::load_from_file(path)?,
        None => builtin_oval()?,
    };
    let config = match args.next() {
        Some(path) => EngineConfig::load_from_file(path).map_err(EngineError::from)?,
        None => EngineConfig { laps: 2, ..EngineConfig::default() },
    };

    let track = TrackPath::new(curve, Vec::new());
    let anchors = track.sample_anchor_points()?;
    if anchors.len() < ANCHORS_PER_GATE * 2 {
        return Err(DemoError::TrackTooShort(anchors.len()));
    }

    let mut engine = Engine::new(config, SandboxWorld::new());
    let gates = dress_track(&mut engine, &track, &anchors)?;
    let hover_height = engine.config().vehicle.hover_height;
    engine.spawn_player(anchor_pose(&anchors[0], hover_height))?;
    engine.set_post_race_track(DiscreteCurve::new(
        anchors.iter().map(|anchor| anchor.position + anchor.up * hover_height).collect(),
    )?);
    engine.start_race()?;

    let stopwatch = Stopwatch::start_new();
    let mut sim_time = 0.0;
    let mut next_report = 0.0;
    let mut cruise_time = 0.0;
    while sim_time < MAX_RACE_TIME && cruise_time < CRUISE_TIME_AFTER_END {
        let Some(pose) = engine.vehicle().and_then(|vehicle| vehicle.pose(engine.world())) else {
            break;
        };
        let next_gate = usize::try_from(engine.race().next_checkpoint()).unwrap_or(0);
        let input = gates.get(next_gate).map_or(VehicleInput::IDLE, |gate| steer_toward(&pose, gate));

        engine.advance(FRAME_DELTA, &input);
        sim_time += FRAME_DELTA;
        if engine.race().phase() == RacePhase::PostEnd {
            cruise_time += FRAME_DELTA;
        }

        if sim_time >= next_report {
            next_report += 1.0;
            let speed = engine
                .vehicle()
                .and_then(|vehicle| engine.world().body_state(vehicle.body()))
                .map_or(0.0, |state| state.linear_velocity.norm());
            log::info!(
                "t={sim_time:>6.1}s  {:?}  lap {}  gate {}/{}  speed {speed:>5.1}  fuel {:.2}  {} visible",
                engine.race().phase(),
                engine.race().lap(),
                engine.race().next_checkpoint(),
                gates.len(),
                engine.vehicle().map_or(0.0, |vehicle| vehicle.fuel()),
                engine.visible_objects(&pose.translation.vector, &(pose.rotation * Vec3::x())).len(),
            );
        }
    }

    log::info!(
        "Simulated {sim_time:.1}s in {:.1}ms, race time {:.2}s, phase {:?}",
        stopwatch.elapsed_millis(),
        engine.race().time(),
        engine.race().phase()
    );
    Ok(())
}

fn main() {
    logging::init();
    log::info!("Starting hover drive demo");
    if let Err(err) = run() {
        log::error!("Drive demo failed: {err}");
        std::process::exit(1);
    }
}
