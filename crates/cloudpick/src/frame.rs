//! Mapping world-space pick rays into a cloud's local frame.

use cloudpick_bvh::Ray;
use cloudpick_math::{Dir3, Point3, Transform};

use crate::{PickError, Result};

/// Cached inverse and scale of a cloud's world transform.
///
/// Build a new frame whenever the transform changes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalFrame {
    world: Transform,
    inverse: Transform,
    mean_scale: f64,
}

impl LocalFrame {
    /// Frame for a cloud placed by `world`.
    pub fn new(world: &Transform) -> Result<Self> {
        let inverse = world.inverse().ok_or(PickError::DegenerateTransform)?;
        let mean_scale = world.mean_scale();
        if !mean_scale.is_finite() || mean_scale <= 0.0 {
            return Err(PickError::DegenerateTransform);
        }
        Ok(Self {
            world: *world,
            inverse,
            mean_scale,
        })
    }

    /// Frame of a cloud that lives in world space.
    pub fn identity() -> Self {
        Self {
            world: Transform::identity(),
            inverse: Transform::identity(),
            mean_scale: 1.0,
        }
    }

    /// The world transform this frame was built from.
    pub fn world(&self) -> &Transform {
        &self.world
    }

    /// Average per-axis scale of the world transform.
    pub fn mean_scale(&self) -> f64 {
        self.mean_scale
    }

    /// Express a world-space ray in local coordinates, renormalizing its direction.
    pub fn to_local_ray(&self, ray: &Ray) -> Ray {
        let origin = self.inverse.apply_point(&ray.origin);
        let direction = self.inverse.apply_vec(ray.direction.as_ref());
        Ray::new(origin, Dir3::new_normalize(direction))
    }

    /// World-space threshold rescaled to local distances.
    pub fn local_threshold(&self, threshold: f64) -> f64 {
        threshold / self.mean_scale
    }

    /// Map a local point back to world space.
    pub fn to_world_point(&self, p: &Point3) -> Point3 {
        self.world.apply_point(p)
    }
}

impl Default for LocalFrame {
    fn default() -> Self {
        Self::identity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use cloudpick_math::Vec3;

    #[test]
    fn test_identity_frame_is_passthrough() {
        let frame = LocalFrame::identity();
        let ray = Ray::from_vector(Point3::new(1.0, 2.0, 3.0), Vec3::new(0.0, 1.0, 0.0)).unwrap();
        let local = frame.to_local_ray(&ray);
        assert_relative_eq!(local.origin, ray.origin);
        assert_relative_eq!(local.direction.into_inner(), ray.direction.into_inner());
        assert_eq!(frame.local_threshold(0.25), 0.25);
    }

    #[test]
    fn test_scaled_frame() {
        let world = Transform::translation(Vec3::new(10.0, 0.0, 0.0))
            .then(&Transform::uniform_scale(2.0));
        let frame = LocalFrame::new(&world).unwrap();
        let ray = Ray::from_vector(Point3::new(10.0, 0.0, -4.0), Vec3::new(0.0, 0.0, 3.0)).unwrap();
        let local = frame.to_local_ray(&ray);
        assert_relative_eq!(local.origin, Point3::new(0.0, 0.0, -2.0), epsilon = 1e-12);
        assert_relative_eq!(local.direction.into_inner(), Vec3::z(), epsilon = 1e-12);
        assert_relative_eq!(frame.local_threshold(0.1), 0.05, epsilon = 1e-15);
        assert_relative_eq!(
            frame.to_world_point(&Point3::new(1.0, 0.0, 0.0)),
            Point3::new(12.0, 0.0, 0.0),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_nonuniform_scale_uses_mean() {
        let frame = LocalFrame::new(&Transform::scale(1.0, 2.0, 6.0)).unwrap();
        assert_relative_eq!(frame.mean_scale(), 3.0, epsilon = 1e-12);
        assert_relative_eq!(frame.local_threshold(0.3), 0.1, epsilon = 1e-12);
    }

    #[test]
    fn test_singular_transform_rejected() {
        assert!(matches!(
            LocalFrame::new(&Transform::scale(0.0, 1.0, 1.0)),
            Err(PickError::DegenerateTransform)
        ));
    }
}
