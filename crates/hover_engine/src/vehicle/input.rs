//! Per tick player commands

/// Commands sampled from the player's device for one tick
///
/// Axes are in `[-1, 1]`. Positive `forward` accelerates, negative brakes
/// then reverses. Positive `turn` and `strafe` go right.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct VehicleInput {
    /// Throttle axis
    pub forward: f32,
    /// Steering axis
    pub turn: f32,
    /// Lateral thrust axis
    pub strafe: f32,
    /// Burn boost fuel
    pub boost: bool,
    /// Air control rolls instead of yawing
    pub roll_modifier: bool,
    /// Go back to the last checkpoint
    pub respawn: bool,
    /// Put the vehicle back on the nearest surface
    pub recover: bool,
}

impl VehicleInput {
    /// Neutral input
    pub const IDLE: Self = Self {
        forward: 0.0,
        turn: 0.0,
        strafe: 0.0,
        boost: false,
        roll_modifier: false,
        respawn: false,
        recover: false,
    };

    /// Same commands with every axis clamped to `[-1, 1]`, NaN read as 0
    #[must_use]
    pub fn clamped(self) -> Self {
        let axis = |value: f32| if value.is_nan() { 0.0 } else { value.clamp(-1.0, 1.0) };
        Self {
            forward: axis(self.forward),
            turn: axis(self.turn),
            strafe: axis(self.strafe),
            ..self
        }
    }
}
