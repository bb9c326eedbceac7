//! Core engine implementation
//!
//! The engine owns every collaborator of a race: the physics world, the
//! game objects, the collision dispatcher, the visibility quad-tree, the
//! player's vehicle and the race rules. Nothing is global, the application
//! holds the engine and drives it frame by frame.

use std::rc::Rc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{Config, ConfigError};
use crate::curve::{CurveError, DiscreteCurve};
use crate::foundation::math::{Pose, Vec2, Vec3};
use crate::foundation::time::FixedTimestep;
use crate::physics::{
    BodyDesc, CollisionDispatcher, FilterToken, GameObject, Layer, ObjectKey, ObjectRegistry, PhysicsError,
    PhysicsEventHandler, PhysicsWorld, TriggerAction, TriggerRules,
};
use crate::race::{CheckpointOutcome, RaceLogic};
use crate::spatial::{QuadTree, QuadTreeConfig, QuadTreeError, QuadTreeRegion, RegionSearch, ViewWedgeSearch};
use crate::vehicle::{Autopilot, VehicleController, VehicleInput, VehicleTuning};

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Simulation tick
    pub fixed_step: f32,
    /// Longest physics step, longer ticks are shortened
    pub max_physics_step: f32,
    /// Delay between the finish line and the end screen
    pub end_duration: f32,
    /// Laps to complete
    pub laps: u32,
    /// Culling distance of the view wedge
    pub view_distance: f32,
    /// Half aperture of the view wedge, radians
    pub view_half_angle: f32,
    /// Ground area covered by the visibility tree
    pub spanning_region: QuadTreeRegion,
    /// Visibility tree tuning
    pub quad_tree: QuadTreeConfig,
    /// Player vehicle handling
    pub vehicle: VehicleTuning,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            fixed_step: 1.0 / 60.0,
            max_physics_step: 1.0 / 30.0,
            end_duration: 2.0,
            laps: 1,
            view_distance: 400.0,
            view_half_angle: 0.8,
            spanning_region: QuadTreeRegion::new(-2048.0, -2048.0, 2048.0, 2048.0),
            quad_tree: QuadTreeConfig::default(),
            vehicle: VehicleTuning::default(),
        }
    }
}

impl Config for EngineConfig {}

/// Engine errors
#[derive(Error, Debug)]
pub enum EngineError {
    /// Physics body creation failed
    #[error("Physics error: {0}")]
    Physics(#[from] PhysicsError),

    /// Track curve could not be built or loaded
    #[error("Curve error: {0}")]
    Curve(#[from] CurveError),

    /// Configuration could not be loaded
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Object outside the visibility tree
    #[error("Spatial index error: {0}")]
    QuadTree(#[from] QuadTreeError),

    /// The operation needs a player vehicle
    #[error("No player vehicle spawned")]
    NoPlayer,
}

/// Item stored in the visibility tree
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisibleObject {
    /// Object drawn
    pub key: ObjectKey,
    /// Its ground footprint
    pub footprint: QuadTreeRegion,
}

fn footprint_of(object: &VisibleObject) -> QuadTreeRegion {
    object.footprint
}

/// Quad-tree of drawable object footprints
pub type VisibilityTree = QuadTree<VisibleObject, fn(&VisibleObject) -> QuadTreeRegion>;

struct Player {
    key: ObjectKey,
    controller: VehicleController,
}

/// Main engine struct
///
/// Generic over the physics world so the same game runs on the sandbox or
/// on a real solver.
pub struct Engine<W: PhysicsWorld> {
    config: EngineConfig,
    world: W,
    objects: ObjectRegistry,
    dispatcher: CollisionDispatcher,
    trigger_rules: Rc<TriggerRules>,
    visibility: VisibilityTree,
    player: Option<Player>,
    race: RaceLogic,
    autopilot: Option<Autopilot>,
    clock: FixedTimestep,
}

impl<W: PhysicsWorld> Engine<W> {
    /// Create an engine driving `world`
    pub fn new(config: EngineConfig, world: W) -> Self {
        log::info!("Initializing engine...");
        let trigger_rules = Rc::new(TriggerRules::new());
        let mut dispatcher = CollisionDispatcher::new();
        dispatcher.add_handler(trigger_rules.clone());

        let visibility = QuadTree::with_config(
            config.spanning_region,
            footprint_of as fn(&VisibleObject) -> QuadTreeRegion,
            config.quad_tree.clone(),
        );
        let race = RaceLogic::new(0, config.laps, config.end_duration, Pose::identity());
        let clock = FixedTimestep::new(config.fixed_step);

        Self {
            config,
            world,
            objects: ObjectRegistry::new(),
            dispatcher,
            trigger_rules,
            visibility,
            player: None,
            race,
            autopilot: None,
            clock,
        }
    }

    /// Engine configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Physics world
    pub fn world(&self) -> &W {
        &self.world
    }

    /// Physics world, mutably
    pub fn world_mut(&mut self) -> &mut W {
        &mut self.world
    }

    /// Game objects
    pub fn objects(&self) -> &ObjectRegistry {
        &self.objects
    }

    /// Race progression
    pub fn race(&self) -> &RaceLogic {
        &self.race
    }

    /// Player vehicle, once spawned
    pub fn vehicle(&self) -> Option<&VehicleController> {
        self.player.as_ref().map(|player| &player.controller)
    }

    /// Player object, once spawned
    pub fn player_key(&self) -> Option<ObjectKey> {
        self.player.as_ref().map(|player| player.key)
    }

    /// Register an additional collision handler
    pub fn add_event_handler(&mut self, handler: Rc<dyn PhysicsEventHandler>) {
        self.dispatcher.add_handler(handler);
    }

    /// Add a game object, with a physics body when `body` is given
    ///
    /// The body's identity token is set to the new object.
    pub fn add_object(&mut self, object: GameObject, body: Option<BodyDesc>) -> Result<ObjectKey, EngineError> {
        let key = self.objects.insert(object);
        if let Some(desc) = body {
            match self.world.create_body(desc.with_token(FilterToken::encode(key))) {
                Ok(handle) => {
                    if let Some(object) = self.objects.get_mut(key) {
                        object.body = Some(handle);
                    }
                }
                Err(err) => {
                    self.objects.remove(key);
                    return Err(err.into());
                }
            }
        }
        Ok(key)
    }

    /// Remove a game object and its body
    pub fn remove_object(&mut self, key: ObjectKey) -> Option<GameObject> {
        let object = self.objects.remove(key)?;
        if let Some(body) = object.body {
            self.world.remove_body(body);
        }
        Some(object)
    }

    /// Spawn the player vehicle at `pose` and make it the race start
    pub fn spawn_player(&mut self, pose: Pose) -> Result<ObjectKey, EngineError> {
        if let Some(previous) = self.player.take() {
            self.remove_object(previous.key);
        }
        let key = self.objects.insert(GameObject::new("player", Layer::PLAYER));
        let controller =
            match VehicleController::spawn(&mut self.world, self.config.vehicle.clone(), pose, FilterToken::encode(key)) {
                Ok(controller) => controller,
                Err(err) => {
                    self.objects.remove(key);
                    return Err(err.into());
                }
            };
        if let Some(object) = self.objects.get_mut(key) {
            object.body = Some(controller.body());
        }
        self.player = Some(Player { key, controller });
        self.race.set_respawn_pose(pose);
        Ok(key)
    }

    /// Start the race over every checkpoint trigger registered so far
    pub fn start_race(&mut self) -> Result<(), EngineError> {
        let player = self.player.as_mut().ok_or(EngineError::NoPlayer)?;
        let start = *player.controller.checkpoint();
        let last_checkpoint = self
            .objects
            .iter()
            .filter_map(|(_, object)| match object.trigger {
                Some(TriggerAction::Checkpoint { id, .. }) => Some(id),
                _ => None,
            })
            .max()
            .unwrap_or(0);

        self.race = RaceLogic::new(last_checkpoint, self.config.laps, self.config.end_duration, start);
        player.controller.set_can_control(true);
        log::info!("Race started: {} checkpoints, {} laps", last_checkpoint + 1, self.config.laps);
        Ok(())
    }

    /// Track the vehicle follows on its own once the race is over
    pub fn set_post_race_track(&mut self, path: DiscreteCurve) {
        self.autopilot = Some(Autopilot::new(path, &self.config.vehicle));
    }

    /// Skip the race and let the auto-pilot drive, for demo backgrounds
    pub fn set_to_end_game(&mut self) {
        self.race.set_to_end_game();
        if let Some(player) = self.player.as_mut() {
            player.controller.set_can_control(false);
        }
    }

    /// Feed a frame delta and run the fixed ticks it covers
    pub fn advance(&mut self, frame_delta: f32, input: &VehicleInput) -> u32 {
        let steps = self.clock.advance(frame_delta);
        let step = self.clock.step();
        for _ in 0..steps {
            self.tick(step, input);
        }
        steps
    }

    /// Run one simulation tick
    pub fn tick(&mut self, dt: f32, input: &VehicleInput) {
        let dt = dt.min(self.config.max_physics_step);

        if let Some(player) = self.player.as_mut() {
            match (&self.autopilot, self.race.is_over()) {
                (Some(autopilot), true) => autopilot.drive(&mut self.world, player.controller.body(), dt),
                _ => player.controller.update(&mut self.world, &self.objects, input, dt),
            }
        }

        self.world.step(dt, &mut self.dispatcher.filter(&self.objects));
        self.dispatcher.broadcast_collisions(&self.objects);
        for trigger in self.trigger_rules.take_triggered() {
            self.trigger(trigger);
        }

        if self.race.update(dt) {
            log::info!("End screen due");
        }
        self.rebuild_visibility();
    }

    /// Apply the gameplay action of a trigger the player touched
    pub fn trigger(&mut self, key: ObjectKey) {
        let Some(action) = self.objects.get(key).and_then(|object| object.trigger) else {
            return;
        };
        let Some(player) = self.player.as_mut() else { return };
        let controller = &mut player.controller;

        match action {
            TriggerAction::Checkpoint { id, respawn } => match self.race.validate_checkpoint(id, respawn) {
                CheckpointOutcome::Ignored => {}
                CheckpointOutcome::Finished => {
                    controller.set_checkpoint(respawn);
                    controller.set_can_control(false);
                }
                CheckpointOutcome::Validated { .. } | CheckpointOutcome::LapCompleted { .. } => {
                    log::debug!("Crossed checkpoint {id}");
                    controller.set_checkpoint(respawn);
                }
            },
            TriggerAction::KillZone => controller.respawn(&mut self.world),
            TriggerAction::JumpPad { force } => controller.jump(&mut self.world, force),
            TriggerAction::BoostSquare { fuel } => controller.add_fuel(fuel),
        }
    }

    /// Refill the visibility tree from the live objects
    pub fn rebuild_visibility(&mut self) {
        self.refresh_player_footprint();
        self.visibility.clear();
        let visible = self.objects.iter().filter_map(|(key, object)| {
            object.footprint.map(|footprint| VisibleObject { key, footprint })
        });
        let mut rejected = 0;
        for item in visible {
            if self.visibility.add(item).is_err() {
                rejected += 1;
            }
        }
        if rejected > 0 {
            log::warn!("{rejected} objects lie outside the visibility tree");
        }
        log::trace!("Visibility tree rebuilt with {} objects", self.visibility.len());
    }

    /// Objects inside the camera's view wedge, from the last rebuild
    pub fn visible_objects(&self, camera_position: &Vec3, camera_direction: &Vec3) -> Vec<ObjectKey> {
        let search = ViewWedgeSearch::new(
            Vec2::new(camera_position.x, camera_position.z),
            Vec2::new(camera_direction.x, camera_direction.z),
            self.config.view_half_angle,
            self.config.view_distance,
        );
        let mut keys = Vec::new();
        self.visibility.collect_map_in_shape(&search, |item| item.key, &mut keys);
        keys
    }

    /// Objects whose footprint touches `bounds`, from the last rebuild
    pub fn objects_in(&self, bounds: &QuadTreeRegion) -> Vec<ObjectKey> {
        let mut keys = Vec::new();
        self.visibility.collect_map_in_shape(&RegionSearch::new(*bounds), |item| item.key, &mut keys);
        keys
    }

    /// Visibility tree of the last rebuild
    pub fn visibility(&self) -> &VisibilityTree {
        &self.visibility
    }

    fn refresh_player_footprint(&mut self) {
        let Some(player) = self.player.as_ref() else { return };
        let Some(pose) = player.controller.pose(&self.world) else { return };
        let half = player.controller.tuning().frame_half_extents;
        let reach = half.x.hypot(half.z);
        let center = pose.translation.vector;
        if let Some(object) = self.objects.get_mut(player.key) {
            object.footprint = Some(QuadTreeRegion::from_center(center.x, center.z, reach, reach));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::SandboxWorld;
    use crate::race::RacePhase;
    use crate::vehicle::MovementState;
    use approx::assert_relative_eq;

    const DT: f32 = 1.0 / 60.0;

    fn engine() -> Engine<SandboxWorld> {
        let mut engine = Engine::new(EngineConfig::default(), SandboxWorld::new());
        engine
            .add_object(
                GameObject::new("ground", Layer::DEFAULT),
                Some(BodyDesc::fixed(Pose::translation(0.0, -0.5, 0.0), Vec3::new(200.0, 0.5, 200.0))),
            )
            .unwrap();
        engine
    }

    fn trigger_box(engine: &mut Engine<SandboxWorld>, x: f32, action: TriggerAction) -> ObjectKey {
        engine
            .add_object(
                GameObject::new("trigger", Layer::DEFAULT).with_trigger(action),
                Some(BodyDesc::fixed(Pose::translation(x, 2.0, 0.0), Vec3::new(1.0, 3.0, 10.0))),
            )
            .unwrap()
    }

    #[test]
    fn test_objects_carry_their_body() {
        let mut engine = engine();
        let key = trigger_box(&mut engine, 50.0, TriggerAction::KillZone);
        let body = engine.objects().get(key).unwrap().body.unwrap();
        assert!(engine.world().contains(body));

        engine.remove_object(key);
        assert!(!engine.world().contains(body));
    }

    #[test]
    fn test_failed_body_leaves_no_object() {
        let mut engine = engine();
        let count = engine.objects().len();
        let result = engine.add_object(
            GameObject::new("broken", Layer::DEFAULT),
            Some(BodyDesc::fixed(Pose::identity(), Vec3::zeros())),
        );
        assert!(matches!(result, Err(EngineError::Physics(_))));
        assert_eq!(engine.objects().len(), count);
    }

    #[test]
    fn test_race_needs_a_player() {
        let mut engine = engine();
        assert!(matches!(engine.start_race(), Err(EngineError::NoPlayer)));
    }

    #[test]
    fn test_touching_last_checkpoint_ends_race() {
        let mut engine = engine();
        let finish = Pose::translation(0.0, 2.0, 0.0);
        trigger_box(&mut engine, 0.0, TriggerAction::Checkpoint { id: 0, respawn: finish });
        engine.spawn_player(Pose::translation(0.0, 2.0, 0.0)).unwrap();
        engine.start_race().unwrap();

        engine.tick(DT, &VehicleInput::IDLE);
        assert_eq!(engine.race().phase(), RacePhase::Ended);
        assert!(!engine.vehicle().unwrap().can_control());
    }

    #[test]
    fn test_trigger_actions() {
        let mut engine = engine();
        let start = Pose::translation(0.0, 2.0, 0.0);
        engine.spawn_player(start).unwrap();
        let jump = trigger_box(&mut engine, 100.0, TriggerAction::JumpPad { force: 30.0 });
        let kill = trigger_box(&mut engine, 120.0, TriggerAction::KillZone);
        let boost = trigger_box(&mut engine, 140.0, TriggerAction::BoostSquare { fuel: 0.5 });

        let input = VehicleInput { boost: true, ..VehicleInput::IDLE };
        for _ in 0..30 {
            engine.tick(DT, &input);
        }
        let drained = engine.vehicle().unwrap().fuel();
        assert!(drained < 0.6);
        engine.trigger(boost);
        assert_relative_eq!(engine.vehicle().unwrap().fuel(), (drained + 0.5).min(1.0), epsilon = 1e-5);

        engine.trigger(jump);
        assert_eq!(engine.vehicle().unwrap().state(), MovementState::OnGround);

        let body = engine.vehicle().unwrap().body();
        engine.world_mut().set_global_pose(body, Pose::translation(30.0, -40.0, 0.0));
        engine.trigger(kill);
        assert_eq!(engine.world().body_state(body).unwrap().pose, start);
    }

    #[test]
    fn test_visibility_follows_objects() {
        let mut engine = engine();
        let ahead = engine
            .add_object(
                GameObject::new("tree", Layer::DEFAULT).with_footprint(QuadTreeRegion::from_center(50.0, 0.0, 1.0, 1.0)),
                None,
            )
            .unwrap();
        let behind = engine
            .add_object(
                GameObject::new("rock", Layer::DEFAULT).with_footprint(QuadTreeRegion::from_center(-50.0, 0.0, 1.0, 1.0)),
                None,
            )
            .unwrap();
        engine.spawn_player(Pose::translation(0.0, 2.0, 0.0)).unwrap();
        engine.rebuild_visibility();

        let visible = engine.visible_objects(&Vec3::zeros(), &Vec3::new(1.0, 0.0, 0.0));
        assert!(visible.contains(&ahead));
        assert!(!visible.contains(&behind));
        assert!(visible.contains(&engine.player_key().unwrap()));

        let around = engine.objects_in(&QuadTreeRegion::from_center(-50.0, 0.0, 5.0, 5.0));
        assert_eq!(around, vec![behind]);
    }

    #[test]
    fn test_autopilot_takes_over_after_race() {
        let mut engine = engine();
        engine.spawn_player(Pose::translation(0.0, 2.0, 0.0)).unwrap();
        let path = DiscreteCurve::new((0..200).map(|i| Vec3::new(i as f32, 2.0, 0.0)).collect()).unwrap();
        engine.set_post_race_track(path);
        engine.set_to_end_game();

        engine.tick(DT, &VehicleInput { forward: -1.0, ..VehicleInput::IDLE });
        let state = engine.world().body_state(engine.vehicle().unwrap().body()).unwrap();
        assert!(state.pose.translation.vector.x > 1.0);
    }

    #[test]
    fn test_advance_runs_fixed_ticks() {
        let mut engine = engine();
        engine.spawn_player(Pose::translation(0.0, 2.0, 0.0)).unwrap();
        assert_eq!(engine.advance(DT * 2.5, &VehicleInput::IDLE), 2);
        assert_eq!(engine.advance(DT * 0.75, &VehicleInput::IDLE), 1);
    }
}
