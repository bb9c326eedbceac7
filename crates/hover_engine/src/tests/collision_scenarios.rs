//! Object identity and collision policy through a stepping world

use std::cell::RefCell;
use std::rc::Rc;

use crate::foundation::math::{Pose, Vec3};
use crate::physics::{
    BodyDesc, CollisionDispatcher, CollisionPair, CollisionResponse, FilterToken, GameObject, Layer, ObjectKey,
    ObjectRegistry, PhysicsEventHandler, PhysicsWorld, SandboxWorld,
};

struct Policy(CollisionResponse);

impl PhysicsEventHandler for Policy {
    fn should_objects_collide(&self, _a: &GameObject, _b: &GameObject) -> CollisionResponse {
        self.0
    }
}

#[derive(Default)]
struct Recorder {
    pairs: RefCell<Vec<CollisionPair>>,
}

impl PhysicsEventHandler for Recorder {
    fn on_object_collision(&self, a: ObjectKey, b: ObjectKey, _objects: &ObjectRegistry) {
        self.pairs.borrow_mut().push(CollisionPair::new(a, b));
    }
}

/// Two overlapping boxes, each carrying the token of its own object
fn overlapping_pair() -> (SandboxWorld, ObjectRegistry, CollisionPair) {
    let mut world = SandboxWorld::with_gravity(Vec3::zeros());
    let mut objects = ObjectRegistry::new();
    let wall = objects.insert(GameObject::new("wall", Layer::DEFAULT));
    let car = objects.insert(GameObject::new("car", Layer::PLAYER));
    world
        .create_body(BodyDesc::fixed(Pose::identity(), Vec3::repeat(1.0)).with_token(FilterToken::encode(wall)))
        .unwrap();
    world
        .create_body(
            BodyDesc::dynamic(Pose::translation(1.5, 0.0, 0.0), Vec3::repeat(1.0), 1.0)
                .with_token(FilterToken::encode(car)),
        )
        .unwrap();
    (world, objects, CollisionPair::new(wall, car))
}

fn dispatcher(policies: &[CollisionResponse]) -> (CollisionDispatcher, Rc<Recorder>) {
    let mut dispatcher = CollisionDispatcher::new();
    for &response in policies {
        dispatcher.add_handler(Rc::new(Policy(response)));
    }
    let recorder = Rc::new(Recorder::default());
    dispatcher.add_handler(recorder.clone());
    (dispatcher, recorder)
}

fn step(world: &mut SandboxWorld, dispatcher: &mut CollisionDispatcher, objects: &ObjectRegistry) -> Vec<CollisionPair> {
    world.step(1.0 / 60.0, &mut dispatcher.filter(objects));
    dispatcher.broadcast_collisions(objects)
}

#[test]
fn test_tokens_survive_registry_churn() {
    let mut objects = ObjectRegistry::new();
    let mut keys: Vec<ObjectKey> = (0..200).map(|i| objects.insert(GameObject::new(format!("o{i}"), Layer::DEFAULT))).collect();

    let removed: Vec<ObjectKey> = keys.iter().copied().step_by(2).collect();
    for key in &removed {
        objects.remove(*key);
    }
    keys.retain(|key| !removed.contains(key));
    keys.extend((0..150).map(|i| objects.insert(GameObject::new(format!("n{i}"), Layer::BOOST_PLATE))));

    for key in &keys {
        let token = FilterToken::encode(*key);
        assert!(!token.is_empty());
        assert_eq!(token.decode(), Some(*key));
        assert_eq!(FilterToken::from_words(token.words()), token);
        assert_eq!(objects.resolve(&token).map(|(resolved, _)| resolved), Some(*key));
    }
    // reused slots carry a new version, old tokens stay dead
    for key in &removed {
        assert!(objects.resolve(&FilterToken::encode(*key)).is_none());
    }
}

#[test]
fn test_ignore_beats_collide_whatever_the_order() {
    for policies in [
        [CollisionResponse::Collide, CollisionResponse::Ignore],
        [CollisionResponse::Ignore, CollisionResponse::Collide],
    ] {
        let (mut world, objects, _) = overlapping_pair();
        let (mut dispatcher, recorder) = dispatcher(&policies);

        assert!(step(&mut world, &mut dispatcher, &objects).is_empty());
        assert!(recorder.pairs.borrow().is_empty());
        assert_eq!(world.touching_pairs(), 1);
    }
}

#[test]
fn test_colliding_pair_is_reported_once_while_touching() {
    let (mut world, objects, pair) = overlapping_pair();
    let (mut dispatcher, recorder) = dispatcher(&[CollisionResponse::Collide]);

    assert_eq!(step(&mut world, &mut dispatcher, &objects), vec![pair]);
    for _ in 0..5 {
        assert!(step(&mut world, &mut dispatcher, &objects).is_empty());
    }
    assert_eq!(*recorder.pairs.borrow(), vec![pair]);
}

#[test]
fn test_report_only_beats_collide() {
    let (mut world, objects, pair) = overlapping_pair();
    let (mut dispatcher, recorder) = dispatcher(&[CollisionResponse::Collide, CollisionResponse::ReportOnly]);

    assert_eq!(step(&mut world, &mut dispatcher, &objects), vec![pair]);
    assert_eq!(*recorder.pairs.borrow(), vec![pair]);
}

#[test]
fn test_shapes_without_objects_keep_default_contact() {
    let mut world = SandboxWorld::with_gravity(Vec3::zeros());
    let objects = ObjectRegistry::new();
    world.create_body(BodyDesc::fixed(Pose::identity(), Vec3::repeat(1.0))).unwrap();
    world
        .create_body(BodyDesc::dynamic(Pose::translation(1.0, 0.0, 0.0), Vec3::repeat(1.0), 1.0))
        .unwrap();
    let (mut dispatcher, recorder) = dispatcher(&[CollisionResponse::Ignore]);

    // kept with default flags, but nothing to report without identities
    assert!(step(&mut world, &mut dispatcher, &objects).is_empty());
    assert!(recorder.pairs.borrow().is_empty());
}
