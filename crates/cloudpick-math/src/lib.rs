#![warn(missing_docs)]

//! Math types for cloudpick.
//!
//! Thin nalgebra aliases for points, vectors and unit directions, plus the
//! affine [`Transform`] that places a point cloud in world space.

use nalgebra::{Matrix3, Matrix4, Rotation3, Unit, Vector3};
use serde::{Deserialize, Serialize};

/// A point in 3D space.
pub type Point3 = nalgebra::Point3<f64>;

/// A vector in 3D space.
pub type Vec3 = Vector3<f64>;

/// A unit (normalized) direction vector in 3D space.
pub type Dir3 = Unit<Vector3<f64>>;

/// A 4x4 affine transformation (object space to world space).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    /// The underlying homogeneous matrix.
    pub matrix: Matrix4<f64>,
}

impl Transform {
    /// Identity transform.
    pub fn identity() -> Self {
        Self {
            matrix: Matrix4::identity(),
        }
    }

    /// Wrap an existing homogeneous matrix.
    pub fn from_matrix(matrix: Matrix4<f64>) -> Self {
        Self { matrix }
    }

    /// Translation by `offset`.
    pub fn translation(offset: Vec3) -> Self {
        Self {
            matrix: Matrix4::new_translation(&offset),
        }
    }

    /// Non-uniform scale about the origin.
    pub fn scale(sx: f64, sy: f64, sz: f64) -> Self {
        Self {
            matrix: Matrix4::new_nonuniform_scaling(&Vec3::new(sx, sy, sz)),
        }
    }

    /// Uniform scale about the origin.
    pub fn uniform_scale(s: f64) -> Self {
        Self::scale(s, s, s)
    }

    /// Rotation about `axis` through the origin by `angle` radians.
    pub fn rotation(axis: &Dir3, angle: f64) -> Self {
        Self {
            matrix: Rotation3::from_axis_angle(axis, angle).to_homogeneous(),
        }
    }

    /// Compose: the result applies `other` first, then `self`.
    pub fn then(&self, other: &Transform) -> Self {
        Self {
            matrix: self.matrix * other.matrix,
        }
    }

    /// Transform a point (translation applies).
    pub fn apply_point(&self, p: &Point3) -> Point3 {
        self.matrix.transform_point(p)
    }

    /// Transform a direction vector (translation ignored).
    pub fn apply_vec(&self, v: &Vec3) -> Vec3 {
        self.matrix.transform_vector(v)
    }

    /// Inverse of this transform, if the matrix is invertible.
    pub fn inverse(&self) -> Option<Self> {
        self.matrix.try_inverse().map(|matrix| Self { matrix })
    }

    /// The upper-left 3x3 (rotation and scale) block.
    pub fn linear(&self) -> Matrix3<f64> {
        self.matrix.fixed_view::<3, 3>(0, 0).into_owned()
    }

    /// Per-axis scale factors: the lengths of the linear part's columns.
    pub fn scale_factors(&self) -> Vec3 {
        let m = self.linear();
        Vec3::new(
            m.column(0).norm(),
            m.column(1).norm(),
            m.column(2).norm(),
        )
    }

    /// Average of the three per-axis scale factors.
    pub fn mean_scale(&self) -> f64 {
        let s = self.scale_factors();
        (s.x + s.y + s.z) / 3.0
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_identity_transform() {
        let t = Transform::identity();
        let p = Point3::new(1.0, 2.0, 3.0);
        assert_relative_eq!(t.apply_point(&p), p);
    }

    #[test]
    fn test_translation_ignores_vectors() {
        let t = Transform::translation(Vec3::new(10.0, 20.0, 30.0));
        let p = t.apply_point(&Point3::new(1.0, 2.0, 3.0));
        assert_relative_eq!(p, Point3::new(11.0, 22.0, 33.0));
        let v = t.apply_vec(&Vec3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(v, Vec3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn test_then_applies_right_first() {
        let translate = Transform::translation(Vec3::new(1.0, 0.0, 0.0));
        let scale = Transform::uniform_scale(2.0);
        let p = scale.then(&translate).apply_point(&Point3::origin());
        assert_relative_eq!(p, Point3::new(2.0, 0.0, 0.0));
    }

    #[test]
    fn test_inverse_round_trip() {
        let t = Transform::translation(Vec3::new(1.0, 2.0, 3.0))
            .then(&Transform::scale(2.0, 4.0, 0.5));
        let inv = t.inverse().unwrap();
        let p = Point3::new(5.0, 6.0, 7.0);
        assert_relative_eq!(inv.apply_point(&t.apply_point(&p)), p, epsilon = 1e-12);
    }

    #[test]
    fn test_singular_has_no_inverse() {
        assert!(Transform::scale(1.0, 0.0, 1.0).inverse().is_none());
    }

    #[test]
    fn test_scale_factors_survive_rotation() {
        let axis = Dir3::new_normalize(Vec3::z());
        let t = Transform::rotation(&axis, FRAC_PI_2).then(&Transform::scale(2.0, 3.0, 4.0));
        let s = t.scale_factors();
        assert_relative_eq!(s, Vec3::new(2.0, 3.0, 4.0), epsilon = 1e-12);
        assert_relative_eq!(t.mean_scale(), 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_rotation_z_quarter_turn() {
        let axis = Dir3::new_normalize(Vec3::z());
        let p = Transform::rotation(&axis, FRAC_PI_2).apply_point(&Point3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(p, Point3::new(0.0, 1.0, 0.0), epsilon = 1e-12);
    }
}
