//! Hover vehicle movement state machine
//!
//! The controller owns no physics: it reads the frame body's state from the
//! world and pushes forces back every tick, according to its movement state.

use super::input::VehicleInput;
use super::suspension::{self, closest_ground_hit, frame_axes, GroundProbe};
use super::tuning::VehicleTuning;
use crate::foundation::math::utils::{lerp_vec, rotation_between, slerp_towards};
use crate::foundation::math::{up_axis, Pose, Quat, Vec3};
use crate::physics::{
    BodyDesc, BodyHandle, BodyState, FilterToken, ForceMode, ObjectRegistry, PhysicsError, PhysicsWorld,
};

/// Movement state of a vehicle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MovementState {
    /// Supported by the suspension
    #[default]
    OnGround,
    /// Airborne with fading air control
    Jumping,
    /// Airborne for longer than the air control time
    Falling,
    /// Gravity off, blending toward a recovery pose
    Resetting,
}

/// Drives a frame body from player commands
#[derive(Debug, Clone)]
pub struct VehicleController {
    body: BodyHandle,
    tuning: VehicleTuning,
    state: MovementState,
    can_control: bool,
    roll_mode: bool,
    fuel: f32,
    boosting: bool,
    air_time: f32,
    jump_chrono: f32,
    jump_force: f32,
    acceleration_time: f32,
    deceleration_time: f32,
    reset_elapsed: f32,
    reset_position: Vec3,
    reset_up: Vec3,
    checkpoint: Pose,
    last_probe: Option<GroundProbe>,
}

impl VehicleController {
    /// Create the frame body at `spawn` and a controller driving it
    pub fn spawn(
        world: &mut dyn PhysicsWorld,
        tuning: VehicleTuning,
        spawn: Pose,
        token: FilterToken,
    ) -> Result<Self, PhysicsError> {
        let desc = BodyDesc::dynamic(spawn, tuning.frame_half_extents, tuning.mass)
            .with_material(tuning.material()?)
            .with_max_linear_speed(tuning.max_speed)
            .with_token(token);
        let body = world.create_body(desc)?;
        log::info!("Spawned vehicle at {:?}", spawn.translation.vector);
        Ok(Self::attach(body, tuning, spawn))
    }

    /// Drive an existing body
    pub fn attach(body: BodyHandle, tuning: VehicleTuning, checkpoint: Pose) -> Self {
        Self {
            body,
            tuning,
            state: MovementState::OnGround,
            can_control: true,
            roll_mode: false,
            fuel: 1.0,
            boosting: false,
            air_time: 0.0,
            jump_chrono: 0.0,
            jump_force: 0.0,
            acceleration_time: 0.0,
            deceleration_time: 0.0,
            reset_elapsed: 0.0,
            reset_position: checkpoint.translation.vector,
            reset_up: up_axis(),
            checkpoint,
            last_probe: None,
        }
    }

    /// Frame body
    pub fn body(&self) -> BodyHandle {
        self.body
    }

    /// Handling constants
    pub fn tuning(&self) -> &VehicleTuning {
        &self.tuning
    }

    /// Current movement state
    pub fn state(&self) -> MovementState {
        self.state
    }

    /// Boost fuel in `[0, 1]`
    pub fn fuel(&self) -> f32 {
        self.fuel
    }

    /// Whether boost is burning this tick
    pub fn is_boosting(&self) -> bool {
        self.boosting
    }

    /// Time spent airborne since the last jump started
    pub fn air_time(&self) -> f32 {
        self.air_time
    }

    /// Whether player input is accepted
    pub fn can_control(&self) -> bool {
        self.can_control
    }

    /// Accept or freeze player input
    pub fn set_can_control(&mut self, can_control: bool) {
        self.can_control = can_control;
    }

    /// Probes of the last tick that cast them
    pub fn last_probe(&self) -> Option<&GroundProbe> {
        self.last_probe.as_ref()
    }

    /// Pose respawns go back to
    pub fn checkpoint(&self) -> &Pose {
        &self.checkpoint
    }

    /// Set the pose respawns go back to
    pub fn set_checkpoint(&mut self, pose: Pose) {
        self.checkpoint = pose;
    }

    /// Add boost fuel, capped at a full tank
    pub fn add_fuel(&mut self, amount: f32) {
        self.fuel = (self.fuel + amount).clamp(0.0, 1.0);
    }

    /// Current pose of the frame
    pub fn pose(&self, world: &dyn PhysicsWorld) -> Option<Pose> {
        world.body_state(self.body).map(|state| state.pose)
    }

    /// Queue an upward launch for the next ground tick
    ///
    /// Turning stops realigning the velocity for a short while so the launch
    /// is not cancelled by the driver steering. Ignored while resetting.
    pub fn jump(&mut self, world: &mut dyn PhysicsWorld, force: f32) {
        if self.state == MovementState::Resetting {
            log::debug!("Jump ignored while resetting");
            return;
        }
        self.jump_force = force;
        self.jump_chrono = self.tuning.roll_inactivity_time;
        self.change_state(world, MovementState::OnGround);
    }

    /// Teleport the frame and stop it
    pub fn reset_position(&self, world: &mut dyn PhysicsWorld, pose: Pose) {
        world.set_global_pose(self.body, pose);
        world.set_linear_velocity(self.body, Vec3::zeros());
        world.set_angular_velocity(self.body, Vec3::zeros());
    }

    /// Teleport back to the last checkpoint
    pub fn respawn(&self, world: &mut dyn PhysicsWorld) {
        log::debug!("Respawning at checkpoint {:?}", self.checkpoint.translation.vector);
        self.reset_position(world, self.checkpoint);
    }

    /// Look for the nearest surface around the frame and blend onto it
    ///
    /// Rays are cast both ways along every local axis. The first one finding
    /// ground sets the recovery target one hover height off the surface.
    /// Returns whether a surface was found.
    pub fn begin_recovery(&mut self, world: &mut dyn PhysicsWorld, objects: &ObjectRegistry) -> bool {
        let Some(state) = world.body_state(self.body) else { return false };
        let (forward, up, right) = frame_axes(&state.pose);
        let origin = state.pose.translation.vector;

        let found = [forward, -forward, right, -right, up, -up].into_iter().find_map(|direction| {
            let hits = world.raycast(origin, direction, self.tuning.hover_height, self.tuning.max_raycast_hits);
            closest_ground_hit(&hits, objects).0.map(|hit| (direction, hit))
        });

        let Some((direction, hit)) = found else {
            log::warn!("Vehicle recovery found no surface around {origin:?}");
            return false;
        };
        self.reset_position = hit.position - direction * self.tuning.hover_height;
        self.reset_up = hit.normal;
        self.change_state(world, MovementState::Resetting);
        true
    }

    /// Advance one physics tick
    pub fn update(&mut self, world: &mut dyn PhysicsWorld, objects: &ObjectRegistry, input: &VehicleInput, dt: f32) {
        let input = if self.can_control { input.clamped() } else { VehicleInput::IDLE };
        self.handle_inputs(world, objects, &input, dt);

        self.jump_chrono -= dt;
        match self.state {
            MovementState::OnGround => self.ground_tick(world, objects, &input, dt),
            MovementState::Jumping => self.jump_tick(world, objects, &input, dt),
            MovementState::Falling => self.fall_tick(world, objects, &input, dt),
            MovementState::Resetting => self.reset_tick(world, dt),
        }
    }

    fn handle_inputs(&mut self, world: &mut dyn PhysicsWorld, objects: &ObjectRegistry, input: &VehicleInput, dt: f32) {
        if input.boost && self.fuel > 0.0 {
            self.fuel -= dt;
            self.boosting = self.fuel > 0.0;
        } else {
            self.boosting = false;
        }
        self.fuel = self.fuel.max(0.0);
        self.roll_mode = input.roll_modifier;

        if input.respawn {
            self.respawn(world);
        }
        if input.recover {
            self.begin_recovery(world, objects);
        }
    }

    fn change_state(&mut self, world: &mut dyn PhysicsWorld, state: MovementState) {
        if self.state == state {
            return;
        }
        match state {
            MovementState::Jumping if self.state != MovementState::Falling => self.air_time = 0.0,
            MovementState::Resetting => {
                self.reset_elapsed = 0.0;
                world.set_gravity_enabled(self.body, false);
                world.set_linear_velocity(self.body, Vec3::zeros());
                world.set_angular_velocity(self.body, Vec3::zeros());
            }
            _ => {}
        }
        log::debug!("Vehicle state {:?} -> {state:?}", self.state);
        self.state = state;
    }

    fn ground_tick(&mut self, world: &mut dyn PhysicsWorld, objects: &ObjectRegistry, input: &VehicleInput, dt: f32) {
        let Some(state) = world.body_state(self.body) else { return };
        let (_, up, right) = frame_axes(&state.pose);

        let max_ramp = self.tuning.max_ramp_time();
        let (acceleration_step, deceleration_step) = match input.forward {
            f if f > 0.0 => (dt, -dt),
            f if f < 0.0 => (-dt, dt),
            _ => (-dt, -dt),
        };
        self.acceleration_time = (self.acceleration_time + acceleration_step).clamp(0.0, max_ramp);
        self.deceleration_time = (self.deceleration_time + deceleration_step).clamp(0.0, max_ramp);

        let boost = if self.boosting { self.tuning.boost_multiplier } else { 1.0 };
        let acceleration_scale = self.tuning.acceleration_curve(self.acceleration_time) * boost;
        let deceleration_scale = self.tuning.acceleration_curve(self.deceleration_time) * self.tuning.brake_scale;

        // yaw around the frame's own vertical
        let vertical = state.pose.rotation * Vec3::y_axis();
        let yaw = Quat::from_axis_angle(&vertical, -self.tuning.turning_speed * input.turn);
        let rotation = yaw * state.pose.rotation;
        if input.turn != 0.0 {
            world.set_global_pose(self.body, Pose::from_parts(state.pose.translation, rotation));
        }
        let (forward, _, _) = frame_axes(&Pose::from_parts(state.pose.translation, rotation));

        let throttle = if input.forward > 0.0 {
            forward * input.forward * acceleration_scale
        } else {
            forward * input.forward * deceleration_scale
        };
        world.add_force(self.body, throttle, ForceMode::Acceleration);
        world.add_force(self.body, right * self.tuning.max_acceleration * input.strafe, ForceMode::Acceleration);

        if self.jump_chrono < 0.0 && input.turn != 0.0 {
            // keep the velocity along the new heading, sideways motion is left alone
            let velocity = state.linear_velocity;
            let heading = match forward.dot(&velocity) {
                alignment if alignment > 0.0 => Some(forward),
                alignment if alignment < 0.0 => Some(-forward),
                _ => None,
            };
            if let Some(heading) = heading {
                world.set_linear_velocity(self.body, heading * velocity.norm());
            }
        } else if self.jump_force != 0.0 {
            world.add_force(self.body, up_axis() * self.jump_force, ForceMode::Impulse);
            self.jump_force = 0.0;
        }

        self.apply_drag_and_gravity(world, &state);
        let probe = self.handle_raycasts(world, objects, dt);

        if self.state == MovementState::OnGround {
            if let (Some(probe), Some(state)) = (probe, world.body_state(self.body)) {
                suspension::apply_suspension(world, self.body, &state, &probe, &self.tuning);
            }
        }

        let speed_ratio = state.linear_velocity.norm() / self.tuning.max_speed;
        world.add_force(self.body, -up * self.tuning.down_acceleration_scale * speed_ratio, ForceMode::Acceleration);
    }

    fn jump_tick(&mut self, world: &mut dyn PhysicsWorld, objects: &ObjectRegistry, input: &VehicleInput, dt: f32) {
        self.air_time += dt;
        if self.air_time > self.tuning.air_control_time {
            self.change_state(world, MovementState::Falling);
            self.fall_tick(world, objects, input, dt);
            return;
        }

        let Some(state) = world.body_state(self.body) else { return };
        let (_, _, right) = frame_axes(&state.pose);
        let control = (self.tuning.air_control_time - self.air_time).clamp(0.0, 1.0);
        world.add_force(
            self.body,
            right * self.tuning.max_acceleration * control * input.strafe,
            ForceMode::Acceleration,
        );
        self.airborne_tick(world, objects, input, &state, dt);
    }

    fn fall_tick(&mut self, world: &mut dyn PhysicsWorld, objects: &ObjectRegistry, input: &VehicleInput, dt: f32) {
        let Some(state) = world.body_state(self.body) else { return };
        self.airborne_tick(world, objects, input, &state, dt);
    }

    /// Forces shared by every airborne state
    fn airborne_tick(
        &mut self,
        world: &mut dyn PhysicsWorld,
        objects: &ObjectRegistry,
        input: &VehicleInput,
        state: &BodyState,
        dt: f32,
    ) {
        let (forward, up, right) = frame_axes(&state.pose);
        if self.jump_chrono < 0.0 {
            let steer = if self.roll_mode { forward * input.turn } else { -up * input.turn };
            let torque = (steer + right * input.forward) * self.tuning.air_control;
            world.add_torque(self.body, torque, ForceMode::Acceleration);
        }
        if self.boosting {
            world.add_force(self.body, forward * self.tuning.max_acceleration, ForceMode::Acceleration);
        }
        self.apply_drag_and_gravity(world, state);
        self.handle_raycasts(world, objects, dt);
    }

    fn reset_tick(&mut self, world: &mut dyn PhysicsWorld, dt: f32) {
        self.reset_elapsed += dt;
        if self.reset_elapsed > self.tuning.reset_duration {
            self.reset_elapsed = 0.0;
            world.set_gravity_enabled(self.body, true);
            self.change_state(world, MovementState::OnGround);
            return;
        }

        let Some(state) = world.body_state(self.body) else { return };
        let blend = self.tuning.reset_blend;
        let pose = if self.reset_elapsed < self.tuning.reset_duration * 0.5 {
            let position = lerp_vec(&state.pose.translation.vector, &self.reset_position, blend);
            Pose::from_parts(position.into(), state.pose.rotation)
        } else {
            let up = state.pose.rotation * up_axis();
            let target = rotation_between(&up, &self.reset_up) * state.pose.rotation;
            Pose::from_parts(state.pose.translation, slerp_towards(&state.pose.rotation, &target, blend))
        };
        world.set_global_pose(self.body, pose);
    }

    /// Rotation damping and the extra weight applied in every moving state
    fn apply_drag_and_gravity(&self, world: &mut dyn PhysicsWorld, state: &BodyState) {
        world.add_torque(self.body, -state.angular_velocity * self.tuning.angular_drag, ForceMode::Acceleration);
        world.add_force(self.body, -up_axis() * self.tuning.extra_gravity, ForceMode::Acceleration);
    }

    /// Probe the ground and update fuel and the grounded state from it
    fn handle_raycasts(
        &mut self,
        world: &mut dyn PhysicsWorld,
        objects: &ObjectRegistry,
        dt: f32,
    ) -> Option<GroundProbe> {
        let pose = world.body_state(self.body)?.pose;
        let probe = suspension::probe_ground(world, objects, &pose, &self.tuning);

        if probe.over_boost_plate {
            self.add_fuel(dt * self.tuning.fuel_regeneration_speed);
        }
        let next = match (probe.is_grounded(), self.state) {
            (true, _) => MovementState::OnGround,
            (false, MovementState::Falling) => MovementState::Falling,
            (false, _) => MovementState::Jumping,
        };
        self.change_state(world, next);

        self.last_probe = Some(probe);
        Some(probe)
    }
}
