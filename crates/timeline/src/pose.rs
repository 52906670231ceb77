use bevy::prelude::*;

/// Forward vectors whose horizontal part is shorter than this are treated as
/// vertical and replaced by [`Pose::FALLBACK_FORWARD`].
const FLAT_EPSILON: f32 = 1e-3;

/// Position + orientation of an actor at one fixed tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub position: Vec3,
    pub rotation: Quat,
}

impl Default for Pose {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Pose {
    pub const IDENTITY: Self = Self {
        position: Vec3::ZERO,
        rotation: Quat::IDENTITY,
    };

    /// World forward used when a facing has no horizontal component.
    pub const FALLBACK_FORWARD: Vec3 = Vec3::NEG_Z;

    pub fn new(position: Vec3, rotation: Quat) -> Self {
        Self { position, rotation }
    }

    pub fn at(position: Vec3) -> Self {
        Self::new(position, Quat::IDENTITY)
    }

    pub fn from_transform(transform: &Transform) -> Self {
        Self::new(transform.translation, transform.rotation)
    }

    pub fn to_transform(self) -> Transform {
        Transform::from_translation(self.position).with_rotation(self.rotation)
    }

    /// Facing direction (`-Z` in local space).
    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::NEG_Z
    }

    /// Facing projected onto the ground plane, unit length.
    ///
    /// A near-vertical facing falls back to [`Pose::FALLBACK_FORWARD`].
    pub fn flat_forward(&self) -> Vec3 {
        let mut forward = self.forward();
        forward.y = 0.0;
        if forward.length() < FLAT_EPSILON {
            return Self::FALLBACK_FORWARD;
        }
        forward.normalize()
    }
}

/// Upright rotation facing along the horizontal part of `direction`.
///
/// Returns `None` when `direction` has no usable horizontal component.
pub fn flat_look_rotation(direction: Vec3) -> Option<Quat> {
    let flat = Vec3::new(direction.x, 0.0, direction.z);
    if flat.length_squared() <= 1e-4 {
        return None;
    }
    Some(Transform::IDENTITY.looking_to(flat, Vec3::Y).rotation)
}
