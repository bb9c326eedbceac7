//! Gameplay layers attached to collidable objects
//!
//! Layers are bit flags so they can be stored together, even though
//! gameplay treats every object as belonging to a single layer.

use bitflags::bitflags;

bitflags! {
    /// Gameplay role of a collidable object
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Layer: u8 {
        /// The player vehicle's own collider
        const PLAYER = 1 << 1;
        /// Volumes that report overlaps without physical response
        const TRIGGER = 1 << 2;
        /// Road sections that glue the vehicle to their surface
        const STICKY_ROAD = 1 << 3;
        /// Surfaces regenerating boost fuel when driven over
        const BOOST_PLATE = 1 << 4;
    }
}

impl Layer {
    /// Plain scenery, no flag set
    pub const DEFAULT: Self = Self::empty();

    /// Whether a raycast hit on this layer can count as ground.
    ///
    /// Triggers and the vehicle itself are returned by raycasts but must be
    /// skipped when looking for a supporting surface.
    pub fn supports_vehicle(self) -> bool {
        !self.intersects(Self::TRIGGER | Self::PLAYER)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_layer_is_empty() {
        assert_eq!(Layer::default(), Layer::DEFAULT);
        assert!(Layer::DEFAULT.is_empty());
    }

    #[test]
    fn test_ground_candidates() {
        assert!(Layer::DEFAULT.supports_vehicle());
        assert!(Layer::STICKY_ROAD.supports_vehicle());
        assert!(Layer::BOOST_PLATE.supports_vehicle());
        assert!(!Layer::TRIGGER.supports_vehicle());
        assert!(!Layer::PLAYER.supports_vehicle());
        assert!(!(Layer::BOOST_PLATE | Layer::TRIGGER).supports_vehicle());
    }
}
