//! Bridge between game objects and the rigid-body world
//!
//! The solver itself sits behind [`PhysicsWorld`]. This module owns what the
//! game layers on top of it: gameplay layers, identity tokens carried through
//! shape filter data, the object arena those tokens resolve into, and the
//! collision response policy.

mod events;
mod filter;
mod layers;
mod object;
mod sandbox;
mod world;

#[cfg(test)]
pub(crate) mod testing;

pub use events::{CollisionDispatcher, CollisionPair, CollisionResponse, DispatchFilter, PhysicsEventHandler, TriggerRules};
pub use filter::{FilterDecision, FilterToken, PairFlags, FILTER_WORDS};
pub use layers::Layer;
pub use object::{GameObject, ObjectKey, ObjectRegistry, TriggerAction};
pub use sandbox::{SandboxWorld, DEFAULT_GRAVITY};
pub use world::{
    AcceptAll, BodyDesc, BodyHandle, BodyKind, BodyState, ContactFilter, ForceMode, PhysicsError, PhysicsWorld,
    RaycastHit, SurfaceMaterial,
};
