//! Minimal in-process physics world
//!
//! Boxes only, integrated with semi-implicit Euler and a scalar inertia.
//! Touching boxes are reported through the contact filter but never pushed
//! apart: the sandbox answers raycasts and moves bodies, it does not solve
//! contacts.

use std::collections::HashSet;

use slotmap::SlotMap;

use super::filter::{FilterDecision, PairFlags};
use super::world::{
    BodyDesc, BodyHandle, BodyKind, BodyState, ContactFilter, ForceMode, PhysicsError, PhysicsWorld, RaycastHit,
};
use crate::foundation::math::{Pose, Quat, Vec3};
use crate::spatial::QuadTreeRegion;

/// Gravity of a new sandbox
pub const DEFAULT_GRAVITY: Vec3 = Vec3::new(0.0, -9.8, 0.0);

#[derive(Debug, Clone)]
struct SandboxBody {
    desc: BodyDesc,
    pose: Pose,
    linear_velocity: Vec3,
    angular_velocity: Vec3,
    gravity: bool,
    inverse_mass: f32,
    inverse_inertia: f32,
    linear_acceleration: Vec3,
    angular_acceleration: Vec3,
}

impl SandboxBody {
    fn is_dynamic(&self) -> bool {
        self.inverse_mass > 0.0
    }

    /// Scale a vector given in `mode` to a velocity change rate or delta
    fn scale(&self, vector: Vec3, mode: ForceMode, inverse: f32) -> Vec3 {
        match mode {
            ForceMode::Force | ForceMode::Impulse => vector * inverse,
            ForceMode::Acceleration => vector,
        }
    }

    fn apply_linear(&mut self, force: Vec3, mode: ForceMode) {
        let scaled = self.scale(force, mode, self.inverse_mass);
        match mode {
            ForceMode::Impulse => self.linear_velocity += scaled,
            ForceMode::Force | ForceMode::Acceleration => self.linear_acceleration += scaled,
        }
    }

    fn apply_angular(&mut self, torque: Vec3, mode: ForceMode) {
        let scaled = self.scale(torque, mode, self.inverse_inertia);
        match mode {
            ForceMode::Impulse => self.angular_velocity += scaled,
            ForceMode::Force | ForceMode::Acceleration => self.angular_acceleration += scaled,
        }
    }

    /// Ground plane bounds of the rotated box, as x/z
    fn world_bounds(&self) -> (Vec3, Vec3) {
        let rotation = self.pose.rotation.to_rotation_matrix();
        let extent = rotation.matrix().abs() * self.desc.half_extents;
        let center = self.pose.translation.vector;
        (center - extent, center + extent)
    }

    fn raycast(&self, origin: &Vec3, direction: &Vec3, max_distance: f32) -> Option<(f32, Vec3)> {
        let local_origin = self.pose.inverse_transform_point(&(*origin).into());
        let local_direction = self.pose.inverse_transform_vector(direction);
        let half = self.desc.half_extents;

        let mut enter = f32::NEG_INFINITY;
        let mut exit = f32::INFINITY;
        let mut enter_normal = Vec3::zeros();
        for axis in 0..3 {
            let o = local_origin[axis];
            let d = local_direction[axis];
            if d.abs() < f32::EPSILON {
                if o.abs() > half[axis] {
                    return None;
                }
                continue;
            }
            let near = (-half[axis] - o) / d;
            let far = (half[axis] - o) / d;
            let (t0, t1, sign) = if near < far { (near, far, -1.0) } else { (far, near, 1.0) };
            if t0 > enter {
                enter = t0;
                enter_normal = Vec3::zeros();
                enter_normal[axis] = sign;
            }
            exit = exit.min(t1);
        }

        if exit < enter.max(0.0) {
            return None;
        }
        if enter < 0.0 {
            // started inside the box
            return Some((0.0, -direction));
        }
        if enter > max_distance {
            return None;
        }
        Some((enter, self.pose.transform_vector(&enter_normal)))
    }
}

/// In-process world of boxes
#[derive(Debug)]
pub struct SandboxWorld {
    bodies: SlotMap<BodyHandle, SandboxBody>,
    gravity: Vec3,
    touching: HashSet<(BodyHandle, BodyHandle)>,
}

impl Default for SandboxWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl SandboxWorld {
    /// Create an empty world with standard gravity
    pub fn new() -> Self {
        Self::with_gravity(DEFAULT_GRAVITY)
    }

    /// Create an empty world with custom gravity
    pub fn with_gravity(gravity: Vec3) -> Self {
        Self {
            bodies: SlotMap::with_key(),
            gravity,
            touching: HashSet::new(),
        }
    }

    /// Number of bodies
    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    /// Ground footprint of a body, x/z projected
    pub fn footprint(&self, body: BodyHandle) -> Option<QuadTreeRegion> {
        self.bodies.get(body).map(|body| {
            let (min, max) = body.world_bounds();
            QuadTreeRegion::new(min.x, min.z, max.x, max.z)
        })
    }

    /// Pairs of bodies currently overlapping
    pub fn touching_pairs(&self) -> usize {
        self.touching.len()
    }

    fn integrate(&mut self, dt: f32) {
        let gravity = self.gravity;
        for body in self.bodies.values_mut().filter(|body| body.is_dynamic()) {
            let mut acceleration = body.linear_acceleration;
            if body.gravity {
                acceleration += gravity;
            }
            body.linear_velocity += acceleration * dt;
            if let Some(max_speed) = body.desc.max_linear_speed {
                let speed = body.linear_velocity.norm();
                if speed > max_speed {
                    body.linear_velocity *= max_speed / speed;
                }
            }
            body.angular_velocity += body.angular_acceleration * dt;

            body.pose.translation.vector += body.linear_velocity * dt;
            let spin = Quat::from_scaled_axis(body.angular_velocity * dt);
            body.pose.rotation = Quat::new_normalize((spin * body.pose.rotation).into_inner());

            body.linear_acceleration = Vec3::zeros();
            body.angular_acceleration = Vec3::zeros();
        }
    }

    fn detect_overlaps(&self) -> HashSet<(BodyHandle, BodyHandle)> {
        let bounds: Vec<(BodyHandle, bool, (Vec3, Vec3))> = self
            .bodies
            .iter()
            .map(|(handle, body)| (handle, body.is_dynamic(), body.world_bounds()))
            .collect();

        let mut overlapping = HashSet::new();
        for (index, (handle_a, dynamic_a, (min_a, max_a))) in bounds.iter().enumerate() {
            for (handle_b, dynamic_b, (min_b, max_b)) in &bounds[index + 1..] {
                if !dynamic_a && !dynamic_b {
                    continue;
                }
                let overlap = (0..3).all(|axis| min_a[axis] <= max_b[axis] && min_b[axis] <= max_a[axis]);
                if overlap {
                    let pair = if handle_a < handle_b { (*handle_a, *handle_b) } else { (*handle_b, *handle_a) };
                    overlapping.insert(pair);
                }
            }
        }
        overlapping
    }
}

impl PhysicsWorld for SandboxWorld {
    fn create_body(&mut self, desc: BodyDesc) -> Result<BodyHandle, PhysicsError> {
        if desc.half_extents.iter().any(|extent| !extent.is_finite() || *extent <= 0.0) {
            return Err(PhysicsError::InvalidBody(format!("half extents {:?}", desc.half_extents)));
        }
        let (inverse_mass, inverse_inertia) = match desc.kind {
            BodyKind::Static => (0.0, 0.0),
            BodyKind::Dynamic { mass } if mass.is_finite() && mass > 0.0 => {
                let inertia = mass * desc.half_extents.norm_squared() * 2.0 / 9.0;
                (1.0 / mass, 1.0 / inertia)
            }
            BodyKind::Dynamic { mass } => return Err(PhysicsError::InvalidBody(format!("mass {mass}"))),
        };

        let handle = self.bodies.insert(SandboxBody {
            desc,
            pose: desc.pose,
            linear_velocity: Vec3::zeros(),
            angular_velocity: Vec3::zeros(),
            gravity: desc.gravity,
            inverse_mass,
            inverse_inertia,
            linear_acceleration: Vec3::zeros(),
            angular_acceleration: Vec3::zeros(),
        });
        log::debug!("Created sandbox body {handle:?} ({:?})", desc.kind);
        Ok(handle)
    }

    fn remove_body(&mut self, body: BodyHandle) -> bool {
        self.touching.retain(|(a, b)| *a != body && *b != body);
        self.bodies.remove(body).is_some()
    }

    fn contains(&self, body: BodyHandle) -> bool {
        self.bodies.contains_key(body)
    }

    fn body_state(&self, body: BodyHandle) -> Option<BodyState> {
        self.bodies.get(body).map(|body| BodyState {
            pose: body.pose,
            linear_velocity: body.linear_velocity,
            angular_velocity: body.angular_velocity,
        })
    }

    fn set_global_pose(&mut self, body: BodyHandle, pose: Pose) {
        if let Some(body) = self.bodies.get_mut(body) {
            body.pose = pose;
        }
    }

    fn set_linear_velocity(&mut self, body: BodyHandle, velocity: Vec3) {
        if let Some(body) = self.bodies.get_mut(body).filter(|body| body.is_dynamic()) {
            body.linear_velocity = velocity;
        }
    }

    fn set_angular_velocity(&mut self, body: BodyHandle, velocity: Vec3) {
        if let Some(body) = self.bodies.get_mut(body).filter(|body| body.is_dynamic()) {
            body.angular_velocity = velocity;
        }
    }

    fn set_gravity_enabled(&mut self, body: BodyHandle, enabled: bool) {
        if let Some(body) = self.bodies.get_mut(body) {
            body.gravity = enabled;
        }
    }

    fn add_force(&mut self, body: BodyHandle, force: Vec3, mode: ForceMode) {
        if let Some(body) = self.bodies.get_mut(body).filter(|body| body.is_dynamic()) {
            body.apply_linear(force, mode);
        }
    }

    fn add_force_at_position(&mut self, body: BodyHandle, force: Vec3, position: Vec3, mode: ForceMode) {
        if let Some(body) = self.bodies.get_mut(body).filter(|body| body.is_dynamic()) {
            let arm = position - body.pose.translation.vector;
            body.apply_linear(force, mode);
            body.apply_angular(arm.cross(&force), mode);
        }
    }

    fn add_torque(&mut self, body: BodyHandle, torque: Vec3, mode: ForceMode) {
        if let Some(body) = self.bodies.get_mut(body).filter(|body| body.is_dynamic()) {
            body.apply_angular(torque, mode);
        }
    }

    fn raycast(&self, origin: Vec3, direction: Vec3, max_distance: f32, max_hits: usize) -> Vec<RaycastHit> {
        let Some(direction) = direction.try_normalize(f32::EPSILON) else {
            return Vec::new();
        };
        let mut hits: Vec<RaycastHit> = self
            .bodies
            .values()
            .filter_map(|body| {
                body.raycast(&origin, &direction, max_distance).map(|(distance, normal)| RaycastHit {
                    token: body.desc.token,
                    distance,
                    position: origin + direction * distance,
                    normal,
                    material: body.desc.material,
                })
            })
            .collect();
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits.truncate(max_hits);
        hits
    }

    fn step(&mut self, dt: f32, filter: &mut dyn ContactFilter) {
        if dt <= 0.0 {
            return;
        }
        self.integrate(dt);

        let overlapping = self.detect_overlaps();
        for pair in overlapping.difference(&self.touching) {
            let (Some(a), Some(b)) = (self.bodies.get(pair.0), self.bodies.get(pair.1)) else {
                continue;
            };
            let (token_a, token_b) = (a.desc.token, b.desc.token);
            if let FilterDecision::Keep(flags) = filter.filter_pair(&token_a, &token_b) {
                if flags.contains(PairFlags::NOTIFY_TOUCH_FOUND) {
                    filter.on_contact(&token_a, &token_b);
                }
            }
        }
        self.touching = overlapping;
    }
}
