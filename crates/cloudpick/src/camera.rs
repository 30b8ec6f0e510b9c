//! Pick-ray construction from pointer coordinates.

use cloudpick_bvh::Ray;
use cloudpick_math::{Dir3, Point3, Vec3};
use serde::{Deserialize, Serialize};

use crate::{PickError, Result};

/// A pinhole perspective camera.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerspectiveCamera {
    /// Eye position.
    pub position: Point3,
    /// Point the camera looks at.
    pub target: Point3,
    /// Approximate up direction.
    pub up: Vec3,
    /// Vertical field of view in degrees.
    pub fov_y_degrees: f64,
    /// Viewport width divided by height.
    pub aspect: f64,
    /// Near clip distance.
    pub near: f64,
    /// Far clip distance.
    pub far: f64,
}

impl Default for PerspectiveCamera {
    fn default() -> Self {
        Self {
            position: Point3::new(3.0, 3.0, 3.0),
            target: Point3::origin(),
            up: Vec3::y(),
            fov_y_degrees: 75.0,
            aspect: 1.0,
            near: 0.1,
            far: 100.0,
        }
    }
}

/// Normalized device coordinates of a pixel: x right, y up, both in `[-1, 1]`.
pub fn ndc_from_pixel(x: f64, y: f64, width: f64, height: f64) -> (f64, f64) {
    (x / width * 2.0 - 1.0, -(y / height) * 2.0 + 1.0)
}

impl PerspectiveCamera {
    /// Orthonormal (right, up, forward) basis of the view.
    fn basis(&self) -> Result<(Vec3, Vec3, Vec3)> {
        let forward = Dir3::try_new(self.target - self.position, f64::EPSILON)
            .ok_or(PickError::DegenerateCamera("target coincides with position"))?
            .into_inner();
        let right = Dir3::try_new(forward.cross(&self.up), f64::EPSILON)
            .ok_or(PickError::DegenerateCamera("up is parallel to the view direction"))?
            .into_inner();
        let up = right.cross(&forward);
        Ok((right, up, forward))
    }

    /// Ray from the eye through the given NDC position.
    pub fn ray_from_ndc(&self, ndc_x: f64, ndc_y: f64) -> Result<Ray> {
        let (right, up, forward) = self.basis()?;
        let half_h = (self.fov_y_degrees.to_radians() * 0.5).tan();
        let half_w = half_h * self.aspect;
        let dir = forward + right * (ndc_x * half_w) + up * (ndc_y * half_h);
        Ok(Ray::new(self.position, Dir3::new_normalize(dir)))
    }

    /// Ray through a pixel of a `width` x `height` viewport.
    pub fn ray_from_pixel(&self, x: f64, y: f64, width: f64, height: f64) -> Result<Ray> {
        let (nx, ny) = ndc_from_pixel(x, y, width, height);
        self.ray_from_ndc(nx, ny)
    }
}
