//! Vehicle handling constants

use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::foundation::math::Vec3;
use crate::physics::{PhysicsError, SurfaceMaterial};

/// Handling of a hover vehicle
///
/// Forces are in world units per second squared unless noted, times in
/// seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VehicleTuning {
    /// Linear speed cap of the frame body
    pub max_speed: f32,
    /// Yaw applied per tick at full turn input, radians
    pub turning_speed: f32,
    /// Asymptote of the acceleration ramp
    pub max_acceleration: f32,
    /// Time constant of the acceleration ramp
    pub tau: f32,
    /// Downward bias of the sticky road policy
    pub downward_acceleration: f32,
    /// Airborne time after which a jump becomes a fall
    pub air_control_time: f32,
    /// Air control torque scale
    pub air_control: f32,
    /// Rotation lock after a jump pad launch
    pub roll_inactivity_time: f32,
    /// Fuel regained per second over a boost plate
    pub fuel_regeneration_speed: f32,
    /// Suspension ray length
    pub hover_height: f32,
    /// Spring stiffness
    pub stiffness: f32,
    /// Spring damping
    pub damping: f32,
    /// Speed dependent force pressing the vehicle on the ground
    pub down_acceleration_scale: f32,
    /// Anti-roll bar stiffness
    pub anti_roll: f32,
    /// Frame mass
    pub mass: f32,
    /// Half size of the frame box, local x forward, y up, z right
    pub frame_half_extents: Vec3,
    /// Angular velocity damping applied every tick
    pub angular_drag: f32,
    /// Gravity added on top of the world's
    pub extra_gravity: f32,
    /// Hits collected per suspension ray
    pub max_raycast_hits: usize,
    /// Length of a reset, position blend then orientation blend
    pub reset_duration: f32,
    /// Per tick blend of the reset toward its target
    pub reset_blend: f32,
    /// Per tick blend of the orientation toward the road on sticky sections
    pub sticky_alignment: f32,
    /// Acceleration multiplier while boosting
    pub boost_multiplier: f32,
    /// Share of the acceleration ramp used when braking
    pub brake_scale: f32,
    /// Friction at rest of the frame
    pub static_friction: f32,
    /// Sliding friction of the frame
    pub dynamic_friction: f32,
    /// Bounciness of the frame
    pub restitution: f32,
    /// Post-race cruise speed
    pub autopilot_speed: f32,
    /// Distance ahead of the vehicle the auto-pilot aims at
    pub autopilot_look_ahead: f32,
    /// Per tick blend of the auto-pilot orientation
    pub autopilot_turn_blend: f32,
}

impl Default for VehicleTuning {
    fn default() -> Self {
        Self {
            max_speed: 115.0,
            turning_speed: 0.04,
            max_acceleration: 85.0,
            tau: 1.0,
            downward_acceleration: 20.0,
            air_control_time: 2.0,
            air_control: 20.0,
            roll_inactivity_time: 0.1,
            fuel_regeneration_speed: 1.0 / 3.0,
            hover_height: 2.0,
            stiffness: 400.0,
            damping: 20.0,
            down_acceleration_scale: 200.0,
            anti_roll: 200.0,
            mass: 1.0,
            frame_half_extents: Vec3::new(2.0, 0.5, 1.0),
            angular_drag: 10.0,
            extra_gravity: 9.8,
            max_raycast_hits: 10,
            reset_duration: 1.0,
            reset_blend: 0.1,
            sticky_alignment: 0.5,
            boost_multiplier: 2.0,
            brake_scale: 0.9,
            static_friction: 0.5,
            dynamic_friction: 0.6,
            restitution: 0.3,
            autopilot_speed: 80.0,
            autopilot_look_ahead: 10.0,
            autopilot_turn_blend: 0.1,
        }
    }
}

impl Config for VehicleTuning {}

impl VehicleTuning {
    /// Acceleration reached after holding the throttle for `time`
    pub fn acceleration_curve(&self, time: f32) -> f32 {
        self.max_acceleration * (1.0 - (-time / self.tau).exp())
    }

    /// Upper bound of the acceleration and braking timers
    pub fn max_ramp_time(&self) -> f32 {
        5.0 * self.tau
    }

    /// Material of the frame body
    pub fn material(&self) -> Result<SurfaceMaterial, PhysicsError> {
        SurfaceMaterial::new(self.static_friction, self.dynamic_friction, self.restitution)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_acceleration_ramp() {
        let tuning = VehicleTuning::default();
        assert_relative_eq!(tuning.acceleration_curve(0.0), 0.0);
        assert_relative_eq!(tuning.acceleration_curve(1.0), 85.0 * (1.0 - (-1.0_f32).exp()));
        assert!(tuning.acceleration_curve(tuning.max_ramp_time()) > 84.0);
    }

    #[test]
    fn test_default_material_is_valid() {
        let material = VehicleTuning::default().material().unwrap();
        assert_relative_eq!(material.dynamic_friction, 0.6);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let tuning: VehicleTuning = toml::from_str("max_speed = 90.0\n").unwrap();
        assert_relative_eq!(tuning.max_speed, 90.0);
        assert_relative_eq!(tuning.hover_height, 2.0);
    }
}
