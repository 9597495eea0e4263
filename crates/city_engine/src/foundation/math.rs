//! Math utilities and types
//!
//! Provides the fundamental math types used for placing entities in the
//! 3D city and for building instance transforms.

pub use nalgebra::{Matrix4, Vector2, Vector3, Vector4};

/// 2D vector type
pub type Vec2 = Vector2<f32>;

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4D vector type
pub type Vec4 = Vector4<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// 3D point type
pub type Point3 = nalgebra::Point3<f32>;

/// Euclidean distance between two points in world space
pub fn distance(a: Vec3, b: Vec3) -> f32 {
    (a - b).magnitude()
}

/// Build the model matrix for a batched instance slot: translation to the
/// entity's visual center combined with a non-uniform scale carrying the
/// entity's width/height/depth.
pub fn instance_matrix(position: Vec3, scale: Vec3) -> Mat4 {
    Mat4::new_translation(&position) * Mat4::new_nonuniform_scaling(&scale)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_distance() {
        let a = Vec3::new(1.0, 0.0, 0.0);
        let b = Vec3::new(4.0, 4.0, 0.0);
        assert_relative_eq!(distance(a, b), 5.0, epsilon = 1e-6);
    }

    #[test]
    fn test_instance_matrix_places_and_scales() {
        let m = instance_matrix(Vec3::new(2.0, 3.0, 4.0), Vec3::new(1.0, 5.0, 1.0));

        // Translation column carries the position
        assert_relative_eq!(m.m14, 2.0, epsilon = 1e-6);
        assert_relative_eq!(m.m24, 3.0, epsilon = 1e-6);
        assert_relative_eq!(m.m34, 4.0, epsilon = 1e-6);

        // Diagonal carries the non-uniform scale
        assert_relative_eq!(m.m11, 1.0, epsilon = 1e-6);
        assert_relative_eq!(m.m22, 5.0, epsilon = 1e-6);
        assert_relative_eq!(m.m33, 1.0, epsilon = 1e-6);
    }
}
