//! Collision response policy and deferred collision events
//!
//! Handlers are asked how every new contact pair between two game objects
//! should be treated. Pairs reported during a step are deduplicated and
//! broadcast once to every handler after the step.

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use super::filter::{FilterDecision, FilterToken, PairFlags};
use super::layers::Layer;
use super::object::{GameObject, ObjectKey, ObjectRegistry};
use super::world::ContactFilter;

/// How a pair of objects reacts when touching
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum CollisionResponse {
    /// Regular contact
    #[default]
    Collide,
    /// No physical response, the pair is reported after the step
    ReportOnly,
    /// The pair is dropped entirely
    Ignore,
}

/// Receiver of collision policy questions and collision events
///
/// Handlers are shared with the dispatcher, state they keep goes behind
/// interior mutability.
pub trait PhysicsEventHandler {
    /// Response wanted for a pair of objects
    fn should_objects_collide(&self, _a: &GameObject, _b: &GameObject) -> CollisionResponse {
        CollisionResponse::Collide
    }

    /// A reported pair touched during the last step
    fn on_object_collision(&self, _a: ObjectKey, _b: ObjectKey, _objects: &ObjectRegistry) {}
}

/// Unordered pair of colliding objects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CollisionPair {
    /// Object with the smaller key
    pub object_a: ObjectKey,
    /// Object with the larger key
    pub object_b: ObjectKey,
}

impl CollisionPair {
    /// Create a collision pair (always stores the smaller key first)
    pub fn new(object_a: ObjectKey, object_b: ObjectKey) -> Self {
        if object_a <= object_b {
            Self { object_a, object_b }
        } else {
            Self { object_a: object_b, object_b: object_a }
        }
    }
}

/// Routes contact filtering and collision events to the registered handlers
#[derive(Default)]
pub struct CollisionDispatcher {
    handlers: Vec<Rc<dyn PhysicsEventHandler>>,
    pending: HashSet<CollisionPair>,
}

impl CollisionDispatcher {
    /// Create a dispatcher without handlers
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler, consulted in registration order
    pub fn add_handler(&mut self, handler: Rc<dyn PhysicsEventHandler>) {
        self.handlers.push(handler);
    }

    /// Number of registered handlers
    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    /// Combined response of every handler: any ignore wins, then any report
    pub fn resolve(&self, a: &GameObject, b: &GameObject) -> CollisionResponse {
        self.handlers
            .iter()
            .map(|handler| handler.should_objects_collide(a, b))
            .max()
            .unwrap_or_default()
    }

    /// Decide what the solver does with a pair of shapes
    ///
    /// Shapes without a game object keep the default response. A token
    /// pointing at a removed object is treated the same way.
    pub fn filter_pair(&mut self, objects: &ObjectRegistry, a: &FilterToken, b: &FilterToken) -> FilterDecision {
        if a.is_empty() || b.is_empty() {
            return FilterDecision::Keep(PairFlags::DEFAULT_RESPONSE);
        }
        let (Some((key_a, object_a)), Some((key_b, object_b))) = (objects.resolve(a), objects.resolve(b)) else {
            log::warn!("Contact pair references an object that no longer exists");
            return FilterDecision::Keep(PairFlags::DEFAULT_RESPONSE);
        };

        match self.resolve(object_a, object_b) {
            CollisionResponse::Ignore => FilterDecision::Kill,
            CollisionResponse::ReportOnly => {
                self.register_collision(key_a, key_b);
                FilterDecision::Kill
            }
            CollisionResponse::Collide => FilterDecision::Keep(PairFlags::DEFAULT_RESPONSE),
        }
    }

    /// Record a pair for the next broadcast
    pub fn register_collision(&mut self, a: ObjectKey, b: ObjectKey) {
        self.pending.insert(CollisionPair::new(a, b));
    }

    /// Pairs waiting for the next broadcast
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Send every recorded pair to every handler once and forget them
    pub fn broadcast_collisions(&mut self, objects: &ObjectRegistry) -> Vec<CollisionPair> {
        let pairs: Vec<CollisionPair> = self.pending.drain().collect();
        for pair in &pairs {
            for handler in &self.handlers {
                handler.on_object_collision(pair.object_a, pair.object_b, objects);
            }
        }
        if !pairs.is_empty() {
            log::trace!("Broadcast {} collision pairs", pairs.len());
        }
        pairs
    }

    /// Contact filter for one physics step
    pub fn filter<'a>(&'a mut self, objects: &'a ObjectRegistry) -> DispatchFilter<'a> {
        DispatchFilter { dispatcher: self, objects }
    }
}

/// [`ContactFilter`] view of a dispatcher bound to the object registry
pub struct DispatchFilter<'a> {
    dispatcher: &'a mut CollisionDispatcher,
    objects: &'a ObjectRegistry,
}

impl ContactFilter for DispatchFilter<'_> {
    fn filter_pair(&mut self, a: &FilterToken, b: &FilterToken) -> FilterDecision {
        self.dispatcher.filter_pair(self.objects, a, b)
    }

    fn on_contact(&mut self, a: &FilterToken, b: &FilterToken) {
        if let (Some(key_a), Some(key_b)) = (a.decode(), b.decode()) {
            if self.objects.get(key_a).is_some() && self.objects.get(key_b).is_some() {
                self.dispatcher.register_collision(key_a, key_b);
            }
        }
    }
}

/// Stock rules for trigger volumes
///
/// Triggers never push anything: every pair involving one is report only.
/// Player contacts with a trigger are queued for the game to act on.
#[derive(Debug, Default)]
pub struct TriggerRules {
    triggered: RefCell<Vec<ObjectKey>>,
}

impl TriggerRules {
    /// Create the rules with an empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Triggers touched by the player since the last call
    pub fn take_triggered(&self) -> Vec<ObjectKey> {
        self.triggered.take()
    }
}

impl PhysicsEventHandler for TriggerRules {
    fn should_objects_collide(&self, a: &GameObject, b: &GameObject) -> CollisionResponse {
        if a.layer.contains(Layer::TRIGGER) || b.layer.contains(Layer::TRIGGER) {
            CollisionResponse::ReportOnly
        } else {
            CollisionResponse::Collide
        }
    }

    fn on_object_collision(&self, a: ObjectKey, b: ObjectKey, objects: &ObjectRegistry) {
        let (Some(object_a), Some(object_b)) = (objects.get(a), objects.get(b)) else {
            return;
        };
        let trigger = if object_a.layer.contains(Layer::PLAYER) && object_b.layer.contains(Layer::TRIGGER) {
            b
        } else if object_b.layer.contains(Layer::PLAYER) && object_a.layer.contains(Layer::TRIGGER) {
            a
        } else {
            return;
        };
        self.triggered.borrow_mut().push(trigger);
    }
}
