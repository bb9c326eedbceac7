//! Scripted physics world for tests
//!
//! Bodies never move on their own: `step` only counts. Raycasts are answered
//! from a fixed list of infinite planes, and every applied force is recorded.

use slotmap::SlotMap;

use super::filter::FilterToken;
use super::world::{
    BodyDesc, BodyHandle, BodyState, ContactFilter, ForceMode, PhysicsError, PhysicsWorld, RaycastHit,
    SurfaceMaterial,
};
use crate::foundation::math::{Pose, Vec3};

/// Infinite one-sided plane answering raycasts
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScriptedSurface {
    /// Any point of the plane
    pub point: Vec3,
    /// Front facing normal
    pub normal: Vec3,
    /// Identity token reported on hits
    pub token: FilterToken,
    /// Material reported on hits
    pub material: SurfaceMaterial,
}

impl ScriptedSurface {
    /// Horizontal ground at `height`
    pub fn ground(height: f32, token: FilterToken) -> Self {
        Self {
            point: Vec3::new(0.0, height, 0.0),
            normal: Vec3::new(0.0, 1.0, 0.0),
            token,
            material: SurfaceMaterial::default(),
        }
    }
}

/// Where a recorded force went
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AppliedKind {
    /// At the center of mass
    Force,
    /// At a world position
    ForceAt(Vec3),
    /// Pure torque
    Torque,
}

/// A recorded force application
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Applied {
    /// Target body
    pub body: BodyHandle,
    /// Application point
    pub kind: AppliedKind,
    /// Applied vector
    pub vector: Vec3,
    /// Force mode
    pub mode: ForceMode,
}

#[derive(Debug, Clone, Copy)]
struct ScriptedBody {
    state: BodyState,
    gravity: bool,
}

/// Physics world driven entirely by the test
#[derive(Debug, Default)]
pub struct ScriptedWorld {
    bodies: SlotMap<BodyHandle, ScriptedBody>,
    /// Planes answering raycasts
    pub surfaces: Vec<ScriptedSurface>,
    /// Every force applied since the last [`ScriptedWorld::clear_applied`]
    pub applied: Vec<Applied>,
    /// Number of steps taken
    pub steps: usize,
    /// Number of raycasts issued
    pub raycasts: std::cell::Cell<usize>,
}

impl ScriptedWorld {
    /// Create a world without surfaces
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a world answering raycasts with the given planes
    pub fn with_surfaces(surfaces: Vec<ScriptedSurface>) -> Self {
        Self { surfaces, ..Self::default() }
    }

    /// Whether gravity applies to a body
    pub fn gravity_enabled(&self, body: BodyHandle) -> Option<bool> {
        self.bodies.get(body).map(|body| body.gravity)
    }

    /// Forget recorded forces
    pub fn clear_applied(&mut self) {
        self.applied.clear();
    }

    /// Sum of recorded center of mass vectors for a mode
    pub fn total_force(&self, mode: ForceMode) -> Vec3 {
        self.applied
            .iter()
            .filter(|applied| applied.mode == mode && !matches!(applied.kind, AppliedKind::Torque))
            .map(|applied| applied.vector)
            .sum()
    }

    fn record(&mut self, body: BodyHandle, kind: AppliedKind, vector: Vec3, mode: ForceMode) {
        if self.bodies.contains_key(body) {
            self.applied.push(Applied { body, kind, vector, mode });
        }
    }
}

impl PhysicsWorld for ScriptedWorld {
    fn create_body(&mut self, desc: BodyDesc) -> Result<BodyHandle, PhysicsError> {
        Ok(self.bodies.insert(ScriptedBody {
            state: BodyState {
                pose: desc.pose,
                linear_velocity: Vec3::zeros(),
                angular_velocity: Vec3::zeros(),
            },
            gravity: desc.gravity,
        }))
    }

    fn remove_body(&mut self, body: BodyHandle) -> bool {
        self.bodies.remove(body).is_some()
    }

    fn contains(&self, body: BodyHandle) -> bool {
        self.bodies.contains_key(body)
    }

    fn body_state(&self, body: BodyHandle) -> Option<BodyState> {
        self.bodies.get(body).map(|body| body.state)
    }

    fn set_global_pose(&mut self, body: BodyHandle, pose: Pose) {
        if let Some(body) = self.bodies.get_mut(body) {
            body.state.pose = pose;
        }
    }

    fn set_linear_velocity(&mut self, body: BodyHandle, velocity: Vec3) {
        if let Some(body) = self.bodies.get_mut(body) {
            body.state.linear_velocity = velocity;
        }
    }

    fn set_angular_velocity(&mut self, body: BodyHandle, velocity: Vec3) {
        if let Some(body) = self.bodies.get_mut(body) {
            body.state.angular_velocity = velocity;
        }
    }

    fn set_gravity_enabled(&mut self, body: BodyHandle, enabled: bool) {
        if let Some(body) = self.bodies.get_mut(body) {
            body.gravity = enabled;
        }
    }

    fn add_force(&mut self, body: BodyHandle, force: Vec3, mode: ForceMode) {
        self.record(body, AppliedKind::Force, force, mode);
    }

    fn add_force_at_position(&mut self, body: BodyHandle, force: Vec3, position: Vec3, mode: ForceMode) {
        self.record(body, AppliedKind::ForceAt(position), force, mode);
    }

    fn add_torque(&mut self, body: BodyHandle, torque: Vec3, mode: ForceMode) {
        self.record(body, AppliedKind::Torque, torque, mode);
    }

    fn raycast(&self, origin: Vec3, direction: Vec3, max_distance: f32, max_hits: usize) -> Vec<RaycastHit> {
        self.raycasts.set(self.raycasts.get() + 1);
        let Some(direction) = direction.try_normalize(f32::EPSILON) else {
            return Vec::new();
        };
        let mut hits: Vec<RaycastHit> = self
            .surfaces
            .iter()
            .filter_map(|surface| {
                let facing = direction.dot(&surface.normal);
                if facing >= 0.0 {
                    return None;
                }
                let distance = (surface.point - origin).dot(&surface.normal) / facing;
                (0.0..=max_distance).contains(&distance).then(|| RaycastHit {
                    token: surface.token,
                    distance,
                    position: origin + direction * distance,
                    normal: surface.normal,
                    material: surface.material,
                })
            })
            .collect();
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits.truncate(max_hits);
        hits
    }

    fn step(&mut self, _dt: f32, _filter: &mut dyn ContactFilter) {
        self.steps += 1;
    }
}
