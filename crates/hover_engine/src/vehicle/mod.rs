//! Hover vehicle
//!
//! A raycast suspension holds the frame body above the ground while a
//! movement state machine turns player commands into forces. After the race
//! an auto-pilot takes over and cruises along the track.

mod autopilot;
mod controller;
mod input;
mod suspension;
mod tuning;

pub use autopilot::Autopilot;
pub use controller::{MovementState, VehicleController};
pub use input::VehicleInput;
pub use suspension::{
    apply_anti_roll, apply_suspension, closest_ground_hit, frame_axes, probe_ground, GroundHit, GroundProbe, Wheel,
    WheelHitInfo,
};
pub use tuning::VehicleTuning;
