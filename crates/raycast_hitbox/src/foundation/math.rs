//! Math utilities and types
//!
//! Thin aliases over nalgebra plus the rigid `Transform` used by bodies,
//! skeletal joints and debug rays.

pub use nalgebra::{Quaternion, Unit, Vector3, Vector4};

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4D vector type, used for RGBA colors
pub type Vec4 = Vector4<f32>;

/// Quaternion type for rotations
pub type Quat = Unit<Quaternion<f32>>;

/// Squared length below which a direction is treated as degenerate
pub const DEGENERATE_LENGTH_SQUARED: f32 = 1.0e-12;

/// Transform representing position, rotation, and scale
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    /// Position in 3D space
    pub position: Vec3,

    /// Rotation quaternion
    pub rotation: Quat,

    /// Scale factors
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::zeros(),
            rotation: Quat::identity(),
            scale: Vec3::new(1.0, 1.0, 1.0),
        }
    }
}

impl Transform {
    /// Create a new identity transform
    pub fn identity() -> Self {
        Self::default()
    }

    /// Create a transform with only position
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Create a transform with position and rotation
    pub fn from_position_rotation(position: Vec3, rotation: Quat) -> Self {
        Self {
            position,
            rotation,
            ..Default::default()
        }
    }

    /// Orientation placed at `from` whose local -Z axis points at `to`.
    ///
    /// A degenerate pair (`from == to`) keeps the identity rotation.
    pub fn looking_at(from: Vec3, to: Vec3) -> Self {
        let forward = to - from;
        if forward.magnitude_squared() < DEGENERATE_LENGTH_SQUARED {
            return Self::from_position(from);
        }

        // Pick an up vector that is not parallel to the look direction
        let direction = forward.normalize();
        let up = if direction.y.abs() > 0.999 {
            Vec3::z()
        } else {
            Vec3::y()
        };

        // face_towards aligns +Z; flip so -Z is forward like a camera
        let rotation = Quat::face_towards(&-direction, &up);
        Self::from_position_rotation(from, rotation)
    }

    /// Forward (-Z) axis of this transform in world space
    pub fn forward(&self) -> Vec3 {
        self.rotation * -Vec3::z()
    }

    /// Apply this transform to a point given in local space
    pub fn transform_point(&self, point: Vec3) -> Vec3 {
        self.position + self.rotation * self.scale.component_mul(&point)
    }
}
