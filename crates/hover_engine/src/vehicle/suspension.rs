//! Raycast suspension
//!
//! Four wheel probes and one frame probe are cast along the vehicle's local
//! down axis every tick. Hits on triggers and on the vehicle itself are
//! skipped after the fact, the world returning every shape crossed.
//!
//! Two policies turn the probes into forces. The default one runs a spring
//! damper per wheel with lateral friction and anti-roll bars. On sticky road
//! sections a single spring at the frame center, a constant downward bias
//! and an orientation pull toward the road normal keep the vehicle glued to
//! loops and walls.

use super::tuning::VehicleTuning;
use crate::foundation::math::utils::{rotation_between, slerp_towards};
use crate::foundation::math::{forward_axis, right_axis, up_axis, Pose, Vec3};
use crate::physics::{BodyHandle, BodyState, ForceMode, Layer, ObjectRegistry, PhysicsWorld, RaycastHit};

/// Wheel anchors of the frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Wheel {
    /// Front left
    LeftFront,
    /// Front right
    RightFront,
    /// Rear left
    LeftRear,
    /// Rear right
    RightRear,
}

impl Wheel {
    /// Every wheel, in probe order
    pub const ALL: [Self; 4] = [Self::LeftFront, Self::RightFront, Self::LeftRear, Self::RightRear];

    /// Left and right wheels coupled by an anti-roll bar
    pub const ANTI_ROLL_PAIRS: [(Self, Self); 2] = [(Self::LeftFront, Self::RightFront), (Self::LeftRear, Self::RightRear)];

    /// Position in probe order
    pub const fn index(self) -> usize {
        match self {
            Self::LeftFront => 0,
            Self::RightFront => 1,
            Self::LeftRear => 2,
            Self::RightRear => 3,
        }
    }

    /// Anchor in the frame's local space, at the bottom corners of the box
    pub fn local_offset(self, half_extents: &Vec3) -> Vec3 {
        let (along, across) = match self {
            Self::LeftFront => (1.0, -1.0),
            Self::RightFront => (1.0, 1.0),
            Self::LeftRear => (-1.0, -1.0),
            Self::RightRear => (-1.0, 1.0),
        };
        Vec3::new(along * half_extents.x, -half_extents.y, across * half_extents.z)
    }
}

/// Ground found under a probe
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroundHit {
    /// Distance from the probe origin
    pub distance: f32,
    /// World hit position
    pub position: Vec3,
    /// Surface normal
    pub normal: Vec3,
    /// Layer of the hit object, default for shapes without object
    pub layer: Layer,
    /// Sliding friction of the surface
    pub dynamic_friction: f32,
}

/// Probe result of one wheel
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WheelHitInfo {
    /// Probe origin in world space
    pub origin: Vec3,
    /// Closest supporting hit
    pub hit: Option<GroundHit>,
}

impl WheelHitInfo {
    /// Fraction of the hover height left below the wheel, 1 when airborne
    pub fn travel(&self, hover_height: f32) -> f32 {
        self.hit.map_or(1.0, |hit| hit.distance / hover_height)
    }
}

/// Every probe of one tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroundProbe {
    /// Wheel probes, in [`Wheel::ALL`] order
    pub wheels: [WheelHitInfo; 4],
    /// Frame center probe
    pub frame: Option<GroundHit>,
    /// Whether any probe crossed a boost plate
    pub over_boost_plate: bool,
    /// Vehicle up axis at probe time
    pub up: Vec3,
}

impl GroundProbe {
    /// Whether the frame probe found ground
    pub fn is_grounded(&self) -> bool {
        self.frame.is_some()
    }

    /// Whether the sticky road policy applies
    pub fn is_sticky(&self) -> bool {
        self.frame.is_some_and(|hit| hit.layer.contains(Layer::STICKY_ROAD))
    }

    /// Probe result of one wheel
    pub fn wheel(&self, wheel: Wheel) -> &WheelHitInfo {
        &self.wheels[wheel.index()]
    }

    /// Number of wheels over ground
    pub fn wheels_on_ground(&self) -> usize {
        self.wheels.iter().filter(|wheel| wheel.hit.is_some()).count()
    }
}

/// Closest hit able to support the vehicle, and whether any hit is a boost plate
///
/// `hits` must be sorted closest first.
pub fn closest_ground_hit(hits: &[RaycastHit], objects: &ObjectRegistry) -> (Option<GroundHit>, bool) {
    let mut ground = None;
    let mut boost = false;
    for hit in hits {
        let layer = match objects.layer_of(&hit.token) {
            Some(layer) => layer,
            None if hit.token.is_empty() => Layer::DEFAULT,
            None => {
                log::warn!("Raycast hit a shape whose object no longer exists");
                Layer::DEFAULT
            }
        };
        boost |= layer.contains(Layer::BOOST_PLATE);
        if ground.is_none() && layer.supports_vehicle() {
            ground = Some(GroundHit {
                distance: hit.distance,
                position: hit.position,
                normal: hit.normal,
                layer,
                dynamic_friction: hit.material.dynamic_friction,
            });
        }
    }
    (ground, boost)
}

/// Cast every suspension probe from the frame's current pose
pub fn probe_ground(
    world: &dyn PhysicsWorld,
    objects: &ObjectRegistry,
    pose: &Pose,
    tuning: &VehicleTuning,
) -> GroundProbe {
    let up = pose.rotation * up_axis();
    let down = -up;
    let mut over_boost_plate = false;

    let mut cast = |origin: Vec3| {
        let hits = world.raycast(origin, down, tuning.hover_height, tuning.max_raycast_hits);
        let (hit, boost) = closest_ground_hit(&hits, objects);
        over_boost_plate |= boost;
        hit
    };

    let wheels = Wheel::ALL.map(|wheel| {
        let origin = pose.transform_point(&wheel.local_offset(&tuning.frame_half_extents).into()).coords;
        WheelHitInfo { origin, hit: cast(origin) }
    });
    let frame_origin = pose.transform_point(&Vec3::new(0.0, -tuning.frame_half_extents.y, 0.0).into()).coords;
    let frame = cast(frame_origin);

    GroundProbe { wheels, frame, over_boost_plate, up }
}

/// Apply the suspension policy selected by the frame probe
///
/// Does nothing when the frame probe found no ground.
pub fn apply_suspension(
    world: &mut dyn PhysicsWorld,
    body: BodyHandle,
    state: &BodyState,
    probe: &GroundProbe,
    tuning: &VehicleTuning,
) {
    if probe.is_sticky() {
        apply_sticky(world, body, state, probe, tuning);
    } else if probe.is_grounded() {
        apply_wheel_springs(world, body, state, probe, tuning);
        apply_anti_roll(world, body, probe, tuning);
    }
}

/// Spring pushing along `up` for a compression ratio, damped by the upward speed
fn spring_force(compression: f32, up: &Vec3, velocity: &Vec3, tuning: &VehicleTuning) -> Vec3 {
    let upward_speed = velocity.dot(up);
    up * (compression * tuning.stiffness - tuning.damping * upward_speed)
}

/// Velocity component parallel to a surface
fn tangential(velocity: &Vec3, normal: &Vec3) -> Vec3 {
    velocity - normal * velocity.dot(normal)
}

fn apply_wheel_springs(
    world: &mut dyn PhysicsWorld,
    body: BodyHandle,
    state: &BodyState,
    probe: &GroundProbe,
    tuning: &VehicleTuning,
) {
    let share = 1.0 / Wheel::ALL.len() as f32;
    for wheel in &probe.wheels {
        let Some(hit) = wheel.hit else { continue };
        let compression = 1.0 - hit.distance / tuning.hover_height;
        let spring = spring_force(compression, &probe.up, &state.linear_velocity, tuning) * share;
        world.add_force_at_position(body, spring, wheel.origin, ForceMode::Force);

        // friction acts on the center of mass, it never twists the frame
        let slide = tangential(&state.linear_velocity, &hit.normal);
        let friction = -slide * hit.dynamic_friction * share;
        world.add_force(body, friction, ForceMode::Acceleration);
        log::trace!("Wheel spring {spring:?} friction {friction:?} at {:?}", wheel.origin);
    }
}

/// Couple left and right wheels so the frame resists rolling
pub fn apply_anti_roll(world: &mut dyn PhysicsWorld, body: BodyHandle, probe: &GroundProbe, tuning: &VehicleTuning) {
    for (left, right) in Wheel::ANTI_ROLL_PAIRS {
        let (left, right) = (probe.wheel(left), probe.wheel(right));
        if left.hit.is_none() && right.hit.is_none() {
            continue;
        }
        let force = (left.travel(tuning.hover_height) - right.travel(tuning.hover_height)) * tuning.anti_roll;
        if left.hit.is_some() {
            world.add_force_at_position(body, -probe.up * force, left.origin, ForceMode::Force);
        }
        if right.hit.is_some() {
            world.add_force_at_position(body, probe.up * force, right.origin, ForceMode::Force);
        }
    }
}

fn apply_sticky(
    world: &mut dyn PhysicsWorld,
    body: BodyHandle,
    state: &BodyState,
    probe: &GroundProbe,
    tuning: &VehicleTuning,
) {
    let Some(frame) = probe.frame else { return };

    let compression = 1.0 - frame.distance / tuning.hover_height;
    let force = spring_force(compression, &probe.up, &state.linear_velocity, tuning)
        - probe.up * tuning.downward_acceleration * tuning.mass;
    world.add_force(body, force, ForceMode::Force);

    let friction = -tangential(&state.linear_velocity, &frame.normal) * frame.dynamic_friction;
    world.add_force(body, friction, ForceMode::Acceleration);

    let ground_normal: Vec3 = probe.wheels.iter().filter_map(|wheel| wheel.hit.map(|hit| hit.normal)).sum();
    if let Some(ground_normal) = ground_normal.try_normalize(f32::EPSILON) {
        let target = rotation_between(&probe.up, &ground_normal) * state.pose.rotation;
        let rotation = slerp_towards(&state.pose.rotation, &target, tuning.sticky_alignment);
        world.set_global_pose(body, Pose::from_parts(state.pose.translation, rotation));
    }
}

/// Local axes of a pose in world space, as (forward, up, right)
pub fn frame_axes(pose: &Pose) -> (Vec3, Vec3, Vec3) {
    (pose.rotation * forward_axis(), pose.rotation * up_axis(), pose.rotation * right_axis())
}
