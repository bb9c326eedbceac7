//! Interface of the rigid-body world the game drives
//!
//! The game never solves contacts itself. It applies forces, reads poses and
//! casts rays through [`PhysicsWorld`], and decides what happens to contact
//! pairs through a [`ContactFilter`] handed to each step.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::filter::{FilterDecision, FilterToken};
use crate::foundation::math::{Pose, Vec3};

slotmap::new_key_type! {
    /// Handle to a body owned by a physics world
    pub struct BodyHandle;
}

/// How an applied vector changes the body's motion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ForceMode {
    /// Force integrated over the step, scaled by inverse mass
    Force,
    /// Instant change of momentum
    Impulse,
    /// Acceleration integrated over the step, mass independent
    Acceleration,
}

/// Friction and bounce of a surface
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SurfaceMaterial {
    /// Friction coefficient at rest
    pub static_friction: f32,
    /// Friction coefficient while sliding
    pub dynamic_friction: f32,
    /// Bounciness, 0 absorbs everything
    pub restitution: f32,
}

impl SurfaceMaterial {
    /// Create a material, rejecting negative or non finite coefficients
    pub fn new(static_friction: f32, dynamic_friction: f32, restitution: f32) -> Result<Self, PhysicsError> {
        let valid = [static_friction, dynamic_friction, restitution]
            .iter()
            .all(|value| value.is_finite() && *value >= 0.0);
        if !valid || restitution > 1.0 {
            return Err(PhysicsError::InvalidMaterial {
                static_friction,
                dynamic_friction,
                restitution,
            });
        }
        Ok(Self { static_friction, dynamic_friction, restitution })
    }
}

impl Default for SurfaceMaterial {
    fn default() -> Self {
        Self { static_friction: 0.5, dynamic_friction: 0.5, restitution: 0.1 }
    }
}

/// One shape crossed by a ray
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RaycastHit {
    /// Identity token of the hit shape
    pub token: FilterToken,
    /// Distance from the ray origin
    pub distance: f32,
    /// World hit position
    pub position: Vec3,
    /// Surface normal at the hit
    pub normal: Vec3,
    /// Material of the hit shape
    pub material: SurfaceMaterial,
}

/// Kinematic state of a body
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyState {
    /// Global pose
    pub pose: Pose,
    /// World linear velocity
    pub linear_velocity: Vec3,
    /// World angular velocity
    pub angular_velocity: Vec3,
}

impl BodyState {
    /// Velocity of a world point rigidly attached to the body
    pub fn velocity_at(&self, point: &Vec3) -> Vec3 {
        let arm = point - self.pose.translation.vector;
        self.linear_velocity + self.angular_velocity.cross(&arm)
    }
}

/// Whether a body moves
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BodyKind {
    /// Never moves, ignores forces
    Static,
    /// Integrated every step
    Dynamic {
        /// Body mass
        mass: f32,
    },
}

/// Description of a box body to create
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyDesc {
    /// Static or dynamic
    pub kind: BodyKind,
    /// Initial pose
    pub pose: Pose,
    /// Box half extents in the body frame
    pub half_extents: Vec3,
    /// Surface material
    pub material: SurfaceMaterial,
    /// Identity token of the game object owning the shape
    pub token: FilterToken,
    /// Whether gravity applies
    pub gravity: bool,
    /// Linear speed cap
    pub max_linear_speed: Option<f32>,
}

impl BodyDesc {
    /// Immovable box
    pub fn fixed(pose: Pose, half_extents: Vec3) -> Self {
        Self {
            kind: BodyKind::Static,
            pose,
            half_extents,
            material: SurfaceMaterial::default(),
            token: FilterToken::EMPTY,
            gravity: false,
            max_linear_speed: None,
        }
    }

    /// Moving box under gravity
    pub fn dynamic(pose: Pose, half_extents: Vec3, mass: f32) -> Self {
        Self {
            kind: BodyKind::Dynamic { mass },
            gravity: true,
            ..Self::fixed(pose, half_extents)
        }
    }

    /// Set the surface material
    #[must_use]
    pub fn with_material(mut self, material: SurfaceMaterial) -> Self {
        self.material = material;
        self
    }

    /// Tag the shape with a game object identity
    #[must_use]
    pub fn with_token(mut self, token: FilterToken) -> Self {
        self.token = token;
        self
    }

    /// Cap the linear speed
    #[must_use]
    pub fn with_max_linear_speed(mut self, speed: f32) -> Self {
        self.max_linear_speed = Some(speed);
        self
    }
}

/// Physics world failures
#[derive(Debug, Error, PartialEq)]
pub enum PhysicsError {
    /// The handle does not name a live body
    #[error("unknown physics body {0:?}")]
    UnknownBody(BodyHandle),
    /// Material coefficients out of range
    #[error("invalid material (static {static_friction}, dynamic {dynamic_friction}, restitution {restitution})")]
    InvalidMaterial {
        /// Static friction given
        static_friction: f32,
        /// Dynamic friction given
        dynamic_friction: f32,
        /// Restitution given
        restitution: f32,
    },
    /// The body description cannot be simulated
    #[error("invalid body: {0}")]
    InvalidBody(String),
}

/// Game side decision point for contact pairs found during a step
pub trait ContactFilter {
    /// Decide what the solver does with a new pair of touching shapes
    fn filter_pair(&mut self, a: &FilterToken, b: &FilterToken) -> FilterDecision;

    /// Called for kept pairs that requested touch notifications
    fn on_contact(&mut self, a: &FilterToken, b: &FilterToken);
}

/// Filter keeping every pair without reporting anything
#[derive(Debug, Default, Clone, Copy)]
pub struct AcceptAll;

impl ContactFilter for AcceptAll {
    fn filter_pair(&mut self, _a: &FilterToken, _b: &FilterToken) -> FilterDecision {
        FilterDecision::Keep(super::filter::PairFlags::CONTACT_DEFAULT)
    }

    fn on_contact(&mut self, _a: &FilterToken, _b: &FilterToken) {}
}

/// Rigid-body world driven by the game
///
/// Body setters on unknown handles are ignored: a stale handle during a
/// frame is not worth failing the tick over.
pub trait PhysicsWorld {
    /// Create a body
    fn create_body(&mut self, desc: BodyDesc) -> Result<BodyHandle, PhysicsError>;

    /// Destroy a body, returning whether it existed
    fn remove_body(&mut self, body: BodyHandle) -> bool;

    /// Whether the handle names a live body
    fn contains(&self, body: BodyHandle) -> bool;

    /// Current pose and velocities
    fn body_state(&self, body: BodyHandle) -> Option<BodyState>;

    /// Teleport a body
    fn set_global_pose(&mut self, body: BodyHandle, pose: Pose);

    /// Overwrite the linear velocity
    fn set_linear_velocity(&mut self, body: BodyHandle, velocity: Vec3);

    /// Overwrite the angular velocity
    fn set_angular_velocity(&mut self, body: BodyHandle, velocity: Vec3);

    /// Toggle gravity on a body
    fn set_gravity_enabled(&mut self, body: BodyHandle, enabled: bool);

    /// Apply a vector at the center of mass
    fn add_force(&mut self, body: BodyHandle, force: Vec3, mode: ForceMode);

    /// Apply a vector at a world position, producing torque
    fn add_force_at_position(&mut self, body: BodyHandle, force: Vec3, position: Vec3, mode: ForceMode);

    /// Apply a torque
    fn add_torque(&mut self, body: BodyHandle, torque: Vec3, mode: ForceMode);

    /// Every shape crossed by the ray, closest first, at most `max_hits`
    fn raycast(&self, origin: Vec3, direction: Vec3, max_distance: f32, max_hits: usize) -> Vec<RaycastHit>;

    /// Advance the simulation
    fn step(&mut self, dt: f32, filter: &mut dyn ContactFilter);
}
