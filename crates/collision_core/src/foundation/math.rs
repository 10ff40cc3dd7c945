//! Math utilities and types
//!
//! Thin aliases over `nalgebra` plus the handful of helpers every
//! collision primitive needs (component-wise min/max, axis access,
//! affine transforms).

pub use nalgebra::{
    Vector3, Vector4,
    Matrix3, Matrix4,
    Quaternion,
    Unit,
};

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4D vector type
pub type Vec4 = Vector4<f32>;

/// 3x3 matrix type
pub type Mat3 = Matrix3<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// 3D point type
pub type Point3 = nalgebra::Point3<f32>;

/// Quaternion type for rotations
pub type Quat = Unit<Quaternion<f32>>;

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

    /// Create a transform from all three components
    pub fn new(position: Vec3, rotation: Quat, scale: Vec3) -> Self {
        Self { position, rotation, scale }
    }

    /// Convert to a transformation matrix (translation * rotation * scale)
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::new_translation(&self.position)
            * self.rotation.to_homogeneous()
            * Mat4::new_nonuniform_scaling(&self.scale)
    }

    /// Rotation part as a 3x3 matrix
    pub fn rotation_matrix(&self) -> Mat3 {
        self.rotation.to_rotation_matrix().into_inner()
    }

    /// Apply this transform to a point
    pub fn transform_point(&self, point: Vec3) -> Vec3 {
        self.to_matrix().transform_point(&Point3::from(point)).coords
    }

    /// Apply this transform to a direction (no translation)
    pub fn transform_vector(&self, vector: Vec3) -> Vec3 {
        self.to_matrix().transform_vector(&vector)
    }

    /// Inverse of the full affine matrix, `None` when a scale axis is zero
    pub fn inverse_matrix(&self) -> Option<Mat4> {
        self.to_matrix().try_inverse()
    }

    /// Combine this transform with another (`self` applied after `other`)
    pub fn combine(&self, other: &Transform) -> Transform {
        Transform {
            position: self.position + self.rotation * (self.scale.component_mul(&other.position)),
            rotation: self.rotation * other.rotation,
            scale: self.scale.component_mul(&other.scale),
        }
    }
}

/// Extension trait for `Vec3` with the axis helpers used by the SAT code
pub trait Vec3Ext {
    /// Index of the largest component (0 = X, 1 = Y, 2 = Z)
    fn longest_axis(&self) -> usize;

    /// Largest component
    fn max_component(&self) -> f32;

    /// Unit vector along axis `i`
    fn axis(i: usize) -> Vec3;
}

impl Vec3Ext for Vec3 {
    fn longest_axis(&self) -> usize {
        if self.x >= self.y && self.x >= self.z {
            0
        } else if self.y >= self.z {
            1
        } else {
            2
        }
    }

    fn max_component(&self) -> f32 {
        self.x.max(self.y).max(self.z)
    }

    fn axis(i: usize) -> Vec3 {
        match i {
            0 => Vec3::x(),
            1 => Vec3::y(),
            _ => Vec3::z(),
        }
    }
}

/// Extension trait for `Mat4` with projection helpers
pub trait Mat4Ext {
    /// Create a perspective projection matrix with `[0, 1]` clip depth
    fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4;

    /// Create an orthographic projection matrix with `[0, 1]` clip depth
    fn orthographic(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Mat4;
}

impl Mat4Ext for Mat4 {
    fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4 {
        // Looks down -Z, clip w = -z_view
        let tan_half_fovy = (fov_y * 0.5).tan();

        let mut result = Mat4::zeros();
        result[(0, 0)] = 1.0 / (aspect * tan_half_fovy);
        result[(1, 1)] = 1.0 / tan_half_fovy;
        result[(2, 2)] = far / (near - far);
        result[(2, 3)] = -(near * far) / (far - near);
        result[(3, 2)] = -1.0;
        result
    }

    fn orthographic(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Mat4 {
        let mut result = Mat4::identity();
        result[(0, 0)] = 2.0 / (right - left);
        result[(1, 1)] = 2.0 / (top - bottom);
        result[(2, 2)] = -1.0 / (far - near);
        result[(0, 3)] = -(right + left) / (right - left);
        result[(1, 3)] = -(top + bottom) / (top - bottom);
        result[(2, 3)] = -near / (far - near);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const EPSILON: f32 = 1e-5;

    #[test]
    fn test_transform_point_applies_scale_rotation_translation() {
        let transform = Transform::new(
            Vec3::new(10.0, 0.0, 0.0),
            Quat::from_axis_angle(&Vec3::z_axis(), std::f32::consts::FRAC_PI_2),
            Vec3::new(2.0, 2.0, 2.0),
        );
        let p = transform.transform_point(Vec3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(p, Vec3::new(10.0, 2.0, 0.0), epsilon = EPSILON);
    }

    #[test]
    fn test_inverse_matrix_round_trip() {
        let transform = Transform::new(
            Vec3::new(1.0, -2.0, 3.0),
            Quat::from_axis_angle(&Vec3::y_axis(), 0.7),
            Vec3::new(1.0, 3.0, 0.5),
        );
        let inv = transform.inverse_matrix().expect("invertible");
        let p = Vec3::new(4.0, 5.0, 6.0);
        let back = inv.transform_point(&Point3::from(transform.transform_point(p))).coords;
        assert_relative_eq!(back, p, epsilon = 1e-4);
    }

    #[test]
    fn test_zero_scale_has_no_inverse() {
        let transform = Transform::new(Vec3::zeros(), Quat::identity(), Vec3::new(1.0, 0.0, 1.0));
        assert!(transform.inverse_matrix().is_none());
    }

    #[test]
    fn test_longest_axis() {
        assert_eq!(Vec3::new(3.0, 1.0, 2.0).longest_axis(), 0);
        assert_eq!(Vec3::new(1.0, 3.0, 2.0).longest_axis(), 1);
        assert_eq!(Vec3::new(1.0, 2.0, 3.0).longest_axis(), 2);
    }
}
