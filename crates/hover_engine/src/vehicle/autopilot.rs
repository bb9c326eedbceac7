//! Post-race cruise along the track center line

use super::tuning::VehicleTuning;
use crate::curve::DiscreteCurve;
use crate::foundation::math::utils::{look_rotation, slerp_towards};
use crate::foundation::math::{forward_axis, up_axis, Pose, Vec3};
use crate::physics::{BodyHandle, PhysicsWorld};

/// Kinematic driver following a resampled track
///
/// Every tick the vehicle aims at the track point nearest to a spot ahead of
/// its nose, turns part of the way toward it and is teleported forward.
#[derive(Debug, Clone)]
pub struct Autopilot {
    path: DiscreteCurve,
    look_ahead: f32,
    speed: f32,
    turn_blend: f32,
}

impl Autopilot {
    /// Follow `path` with the cruise settings of `tuning`
    pub fn new(path: DiscreteCurve, tuning: &VehicleTuning) -> Self {
        Self {
            path,
            look_ahead: tuning.autopilot_look_ahead,
            speed: tuning.autopilot_speed,
            turn_blend: tuning.autopilot_turn_blend,
        }
    }

    /// Followed path
    pub fn path(&self) -> &DiscreteCurve {
        &self.path
    }

    /// Pose reached after `dt` seconds from `pose`
    pub fn next_pose(&self, pose: &Pose, dt: f32) -> Pose {
        let position = pose.translation.vector;
        let aim = pose.transform_point(&(forward_axis() * self.look_ahead).into()).coords;
        let (_, target) = self.path.nearest_point(&aim);

        let rotation = look_rotation(&(target - position), &up_axis())
            .map_or(pose.rotation, |look| slerp_towards(&pose.rotation, &look, self.turn_blend));
        let position: Vec3 = position + rotation * forward_axis() * self.speed * dt;
        Pose::from_parts(position.into(), rotation)
    }

    /// Move the body one tick along the path, stopping its own motion
    pub fn drive(&self, world: &mut dyn PhysicsWorld, body: BodyHandle, dt: f32) {
        let Some(state) = world.body_state(body) else { return };
        let pose = self.next_pose(&state.pose, dt);
        world.set_global_pose(body, pose);
        world.set_linear_velocity(body, Vec3::zeros());
        world.set_angular_velocity(body, Vec3::zeros());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Quat;
    use approx::assert_relative_eq;

    fn straight_path() -> DiscreteCurve {
        DiscreteCurve::new((0..100).map(|i| Vec3::new(i as f32 * 2.0, 0.0, 0.0)).collect()).unwrap()
    }

    #[test]
    fn test_cruises_along_straight_path() {
        let pilot = Autopilot::new(straight_path(), &VehicleTuning::default());
        let pose = pilot.next_pose(&Pose::translation(10.0, 0.0, 0.0), 0.5);
        assert_relative_eq!(pose.translation.vector, Vec3::new(50.0, 0.0, 0.0), epsilon = 1e-3);
        assert_relative_eq!(pose.rotation.angle(), 0.0, epsilon = 1e-3);
    }

    #[test]
    fn test_turns_gradually_toward_path() {
        let pilot = Autopilot::new(straight_path(), &VehicleTuning::default());
        // beside the path, heading 45 degrees across it
        let start = Pose::from_parts(
            Vec3::new(10.0, 0.0, -5.0).into(),
            Quat::from_axis_angle(&Vec3::y_axis(), -std::f32::consts::FRAC_PI_4),
        );
        let pose = pilot.next_pose(&start, 1.0 / 60.0);
        let turned = pose.rotation.angle_to(&start.rotation);
        assert!(turned > 0.0);
        assert!(turned < std::f32::consts::FRAC_PI_4);
    }
}
