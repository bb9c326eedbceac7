//! # Hover Engine
//!
//! Simulation core of a hover-racing game.
//!
//! ## Features
//!
//! - **Quad-tree**: arena backed ground-plane index rebuilt every frame for culling
//! - **Curves**: cubic Bezier tracks, even resampling and their text file format
//! - **Vehicle**: raycast suspension and a ground/air/reset movement state machine
//! - **Physics bridge**: object identity through shape filter data and collision policies
//! - **Sandbox world**: an in-process physics world for tools, demos and tests
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use hover_engine::prelude::*;
//!
//! fn main() -> Result<(), EngineError> {
//!     let mut engine = Engine::new(EngineConfig::default(), SandboxWorld::new());
//!     engine.add_object(
//!         GameObject::new("ground", Layer::DEFAULT),
//!         Some(BodyDesc::fixed(Pose::translation(0.0, -0.5, 0.0), Vec3::new(500.0, 0.5, 500.0))),
//!     )?;
//!     engine.spawn_player(Pose::translation(0.0, 1.5, 0.0))?;
//!     engine.start_race()?;
//!
//!     let input = VehicleInput { forward: 1.0, ..VehicleInput::IDLE };
//!     for _ in 0..600 {
//!         engine.advance(1.0 / 60.0, &input);
//!     }
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod curve;
pub mod engine;
pub mod foundation;
pub mod physics;
pub mod race;
pub mod spatial;
pub mod vehicle;

#[cfg(test)]
mod tests;

pub use engine::{Engine, EngineConfig, EngineError};

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        config::Config,
        curve::{BezierControlPoint, BezierCurve, DiscreteCurve, EvenDiscretizationSettings, TrackPath},
        foundation::math::{Pose, Quat, Vec2, Vec3},
        physics::{BodyDesc, GameObject, Layer, ObjectKey, PhysicsWorld, SandboxWorld, TriggerAction},
        race::{RaceLogic, RacePhase},
        spatial::{QuadTree, QuadTreeRegion, QuadTreeSearch},
        vehicle::{MovementState, VehicleController, VehicleInput, VehicleTuning},
        Engine, EngineConfig, EngineError,
    };
}
