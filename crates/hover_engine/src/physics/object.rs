//! Arena of game objects referenced by the physics world
//!
//! Physics shapes never point at game objects directly: they carry a
//! [`FilterToken`] encoding the object's [`ObjectKey`], resolved here. A
//! removed object leaves a stale key that simply resolves to nothing.

use slotmap::SlotMap;

use super::filter::FilterToken;
use super::layers::Layer;
use super::world::BodyHandle;
use crate::foundation::math::Pose;
use crate::spatial::QuadTreeRegion;

slotmap::new_key_type! {
    /// Stable handle to a game object
    pub struct ObjectKey;
}

/// Gameplay reaction of a trigger volume touched by the player
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TriggerAction {
    /// Race checkpoint, respawning at `respawn` once validated
    Checkpoint {
        /// Position in the checkpoint sequence
        id: u32,
        /// Pose the player is put back at after a respawn
        respawn: Pose,
    },
    /// Out of bounds volume sending the player back to its checkpoint
    KillZone,
    /// Launches the vehicle upward
    JumpPad {
        /// Upward impulse
        force: f32,
    },
    /// Adds boost fuel
    BoostSquare {
        /// Fuel fraction gained
        fuel: f32,
    },
}

/// A game object
///
/// Every capability is optional: scenery may only be visible, a trigger
/// only has a body and an action.
#[derive(Debug, Clone, PartialEq)]
pub struct GameObject {
    /// Display name, used in logs
    pub name: String,
    /// Gameplay layer
    pub layer: Layer,
    /// Physics body, when the object collides
    pub body: Option<BodyHandle>,
    /// Ground footprint, when the object is drawn
    pub footprint: Option<QuadTreeRegion>,
    /// Reaction to the player entering the object
    pub trigger: Option<TriggerAction>,
}

impl GameObject {
    /// Create an object without any capability
    pub fn new(name: impl Into<String>, layer: Layer) -> Self {
        Self {
            name: name.into(),
            layer,
            body: None,
            footprint: None,
            trigger: None,
        }
    }

    /// Set the ground footprint
    #[must_use]
    pub fn with_footprint(mut self, footprint: QuadTreeRegion) -> Self {
        self.footprint = Some(footprint);
        self
    }

    /// Make the object a trigger volume
    #[must_use]
    pub fn with_trigger(mut self, action: TriggerAction) -> Self {
        self.layer |= Layer::TRIGGER;
        self.trigger = Some(action);
        self
    }
}

/// Owner of every game object
#[derive(Debug, Default)]
pub struct ObjectRegistry {
    objects: SlotMap<ObjectKey, GameObject>,
}

impl ObjectRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an object
    pub fn insert(&mut self, object: GameObject) -> ObjectKey {
        self.objects.insert(object)
    }

    /// Remove an object, its key becomes stale
    pub fn remove(&mut self, key: ObjectKey) -> Option<GameObject> {
        self.objects.remove(key)
    }

    /// Look an object up
    pub fn get(&self, key: ObjectKey) -> Option<&GameObject> {
        self.objects.get(key)
    }

    /// Look an object up mutably
    pub fn get_mut(&mut self, key: ObjectKey) -> Option<&mut GameObject> {
        self.objects.get_mut(key)
    }

    /// Resolve the token found on a physics shape
    pub fn resolve(&self, token: &FilterToken) -> Option<(ObjectKey, &GameObject)> {
        let key = token.decode()?;
        self.objects.get(key).map(|object| (key, object))
    }

    /// Layer of the object behind a token, `None` for unknown shapes
    pub fn layer_of(&self, token: &FilterToken) -> Option<Layer> {
        self.resolve(token).map(|(_, object)| object.layer)
    }

    /// Iterate over every object
    pub fn iter(&self) -> impl Iterator<Item = (ObjectKey, &GameObject)> {
        self.objects.iter()
    }

    /// Number of live objects
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}
