//! Math utilities and types
//!
//! Thin aliases over `nalgebra` plus the handful of scalar helpers the
//! simulation needs. The physics convention used throughout the crate is
//! right-handed with local `+X` forward, `+Y` up and `+Z` right.

pub use nalgebra::{
    Vector2, Vector3,
    Matrix3,
    Quaternion,
    Unit,
};

/// 2D vector type
pub type Vec2 = Vector2<f32>;

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 3x3 matrix type
pub type Mat3 = Matrix3<f32>;

/// Quaternion type for rotations
pub type Quat = nalgebra::UnitQuaternion<f32>;

/// Rigid pose (position + orientation) of a physics actor
pub type Pose = nalgebra::Isometry3<f32>;

/// Local-frame forward axis of a vehicle frame
pub fn forward_axis() -> Vec3 {
    Vec3::new(1.0, 0.0, 0.0)
}

/// Local-frame up axis of a vehicle frame
pub fn up_axis() -> Vec3 {
    Vec3::new(0.0, 1.0, 0.0)
}

/// Local-frame right axis of a vehicle frame
pub fn right_axis() -> Vec3 {
    Vec3::new(0.0, 0.0, 1.0)
}

/// Math utility functions
pub mod utils {
    use super::{Mat3, Quat, Vec3};

    /// Linear interpolation between two vectors
    pub fn lerp_vec(a: &Vec3, b: &Vec3, t: f32) -> Vec3 {
        a + (b - a) * t
    }

    /// Fractional part of `x`, always in `[0, 1)`
    pub fn fract(x: f32) -> f32 {
        x - x.floor()
    }

    /// Modulo that never returns a negative index
    pub fn positive_modulo(value: i64, modulus: usize) -> usize {
        // `modulus` is a collection length, far below i64::MAX
        #[allow(clippy::cast_possible_wrap, clippy::cast_sign_loss, clippy::cast_possible_truncation)]
        let wrapped = value.rem_euclid(modulus as i64) as usize;
        wrapped
    }

    /// Shortest rotation carrying direction `from` onto direction `to`.
    ///
    /// Opposite or degenerate directions yield the identity.
    pub fn rotation_between(from: &Vec3, to: &Vec3) -> Quat {
        Quat::rotation_between(from, to).unwrap_or_else(Quat::identity)
    }

    /// Move `from` a fraction `t` of the way toward `to` along the shortest arc.
    ///
    /// Nearly equal orientations snap to `to`.
    pub fn slerp_towards(from: &Quat, to: &Quat, t: f32) -> Quat {
        from.try_slerp(to, t, f32::EPSILON).unwrap_or(*to)
    }

    /// Orientation whose local forward (`+X`) looks along `direction` with
    /// its local up as close as possible to `world_up`.
    ///
    /// Returns `None` when `direction` is null or parallel to `world_up`.
    pub fn look_rotation(direction: &Vec3, world_up: &Vec3) -> Option<Quat> {
        let forward = direction.try_normalize(f32::EPSILON)?;
        let right = forward.cross(world_up).try_normalize(f32::EPSILON)?;
        let up = right.cross(&forward);
        let basis = Mat3::from_columns(&[forward, up, right]);
        let rotation = nalgebra::Rotation3::from_matrix_unchecked(basis);
        Some(Quat::from_rotation_matrix(&rotation))
    }
}
