//! Ray representation and basic ray-geometry tests.

use cloudpick_math::{Dir3, Point3, Vec3};

use crate::Aabb3;

/// A half-line in 3D space defined by origin and unit direction.
#[derive(Debug, Clone, Copy)]
pub struct Ray {
    /// Origin point of the ray.
    pub origin: Point3,
    /// Unit direction of the ray.
    pub direction: Dir3,
    /// Precomputed reciprocal of direction components for fast AABB tests.
    inv_direction: Vec3,
    /// Sign of direction components (0 if positive, 1 if negative).
    sign: [usize; 3],
}

impl Ray {
    /// Create a new ray from origin and an already normalized direction.
    pub fn new(origin: Point3, direction: Dir3) -> Self {
        let inv = direction.map(|c| 1.0 / c);
        let sign = [
            usize::from(inv.x < 0.0),
            usize::from(inv.y < 0.0),
            usize::from(inv.z < 0.0),
        ];
        Self {
            origin,
            direction,
            inv_direction: inv,
            sign,
        }
    }

    /// Create a ray from a raw direction vector, normalizing it.
    ///
    /// Returns `None` when the vector is too short to define a direction.
    pub fn from_vector(origin: Point3, direction: Vec3) -> Option<Self> {
        Dir3::try_new(direction, f64::EPSILON).map(|dir| Self::new(origin, dir))
    }

    /// Ray from `origin` through `target`.
    pub fn through(origin: Point3, target: Point3) -> Option<Self> {
        Self::from_vector(origin, target - origin)
    }

    /// Evaluate the ray at parameter `t`: `origin + t * direction`.
    #[inline]
    pub fn at(&self, t: f64) -> Point3 {
        self.origin + t * self.direction.as_ref()
    }

    /// Signed distance along the ray to the projection of `p`.
    #[inline]
    pub fn along(&self, p: &Point3) -> f64 {
        (p - self.origin).dot(self.direction.as_ref())
    }

    /// Closest point of the half-line to `p`.
    ///
    /// Points behind the origin project onto the origin itself.
    #[inline]
    pub fn closest_point_to_point(&self, p: &Point3) -> Point3 {
        let t = self.along(p);
        if t < 0.0 {
            self.origin
        } else {
            self.at(t)
        }
    }

    /// Squared distance from `p` to the half-line.
    ///
    /// For points in front of the origin this is the squared perpendicular
    /// distance to the ray's line.
    #[inline]
    pub fn distance_sq_to_point(&self, p: &Point3) -> f64 {
        (self.closest_point_to_point(p) - p).norm_squared()
    }

    /// Test ray-AABB intersection using the slab method.
    ///
    /// Returns `Some((t_min, t_max))` if the ray intersects the box,
    /// where `t_min` and `t_max` are the entry and exit parameters
    /// (`t_min` is clamped to zero when the origin is inside).
    /// Axis-parallel rays are tested against the slab directly so that an
    /// origin lying on a face never produces `0 * inf`.
    #[inline]
    pub fn intersect_aabb(&self, aabb: &Aabb3) -> Option<(f64, f64)> {
        let bounds = [aabb.min, aabb.max];
        let mut t_min = f64::NEG_INFINITY;
        let mut t_max = f64::INFINITY;

        for axis in 0..3 {
            let o = self.origin[axis];
            if self.direction[axis] == 0.0 {
                if o < aabb.min[axis] || o > aabb.max[axis] {
                    return None;
                }
                continue;
            }
            let inv = self.inv_direction[axis];
            let near = (bounds[self.sign[axis]][axis] - o) * inv;
            let far = (bounds[1 - self.sign[axis]][axis] - o) * inv;
            t_min = t_min.max(near);
            t_max = t_max.min(far);
        }

        if t_max >= t_min && t_max >= 0.0 {
            Some((t_min.max(0.0), t_max))
        } else {
            None
        }
    }

    /// Whether the ray touches the box at all.
    #[inline]
    pub fn intersects_aabb(&self, aabb: &Aabb3) -> bool {
        self.intersect_aabb(aabb).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn ray(origin: [f64; 3], dir: [f64; 3]) -> Ray {
        Ray::from_vector(Point3::from(origin), Vec3::from(dir)).unwrap()
    }

    fn unit_box() -> Aabb3 {
        Aabb3::new(Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 1.0, 1.0))
    }

    #[test]
    fn test_ray_at() {
        let r = ray([0.0, 0.0, 0.0], [1.0, 0.0, 0.0]);
        assert_relative_eq!(r.at(5.0), Point3::new(5.0, 0.0, 0.0));
    }

    #[test]
    fn test_zero_direction_rejected() {
        assert!(Ray::from_vector(Point3::origin(), Vec3::zeros()).is_none());
    }

    #[test]
    fn test_ray_aabb_hit() {
        let r = ray([-5.0, 0.5, 0.5], [1.0, 0.0, 0.0]);
        let (t_min, t_max) = r.intersect_aabb(&unit_box()).unwrap();
        assert_relative_eq!(t_min, 5.0, epsilon = 1e-10);
        assert_relative_eq!(t_max, 6.0, epsilon = 1e-10);
    }

    #[test]
    fn test_ray_aabb_miss() {
        let r = ray([-5.0, 5.0, 5.0], [1.0, 0.0, 0.0]);
        assert!(r.intersect_aabb(&unit_box()).is_none());
    }

    #[test]
    fn test_ray_inside_aabb() {
        let r = ray([0.5, 0.5, 0.5], [1.0, 0.0, 0.0]);
        let (t_min, t_max) = r.intersect_aabb(&unit_box()).unwrap();
        assert_eq!(t_min, 0.0);
        assert_relative_eq!(t_max, 0.5, epsilon = 1e-10);
    }

    #[test]
    fn test_ray_aabb_behind() {
        let r = ray([-5.0, 0.5, 0.5], [-1.0, 0.0, 0.0]);
        assert!(r.intersect_aabb(&unit_box()).is_none());
    }

    #[test]
    fn test_ray_aabb_diagonal() {
        let r = ray([-1.0, -1.0, -1.0], [1.0, 1.0, 1.0]);
        assert!(r.intersects_aabb(&unit_box()));
    }

    #[test]
    fn test_axis_parallel_on_face() {
        // Origin on the x = 0 face, travelling along +z.
        let r = ray([0.0, 0.5, -3.0], [0.0, 0.0, 1.0]);
        assert!(r.intersects_aabb(&unit_box()));
        // Degenerate (flat) box, as a leaf over collinear points produces.
        let flat = Aabb3::new(Point3::new(0.0, 0.0, 0.0), Point3::new(0.0, 0.0, 10.0));
        assert!(r.intersects_aabb(&Aabb3::new(
            Point3::new(0.0, 0.5, 0.0),
            Point3::new(0.0, 0.5, 10.0)
        )));
        assert!(!r.intersects_aabb(&flat));
        assert!(r.intersects_aabb(&flat.expanded(0.5)));
    }

    #[test]
    fn test_empty_box_never_hit() {
        let r = ray([0.0, 0.0, -1.0], [0.0, 0.0, 1.0]);
        assert!(!r.intersects_aabb(&Aabb3::empty()));
    }

    #[test]
    fn test_distance_sq_perpendicular() {
        let r = ray([0.0, 0.0, 0.0], [0.0, 0.0, 1.0]);
        assert_relative_eq!(r.distance_sq_to_point(&Point3::new(3.0, 4.0, 7.0)), 25.0);
        assert_relative_eq!(r.along(&Point3::new(3.0, 4.0, 7.0)), 7.0);
    }

    #[test]
    fn test_distance_sq_behind_origin_uses_origin() {
        let r = ray([0.0, 0.0, 0.0], [0.0, 0.0, 1.0]);
        let p = Point3::new(1.0, 0.0, -2.0);
        assert_eq!(r.closest_point_to_point(&p), r.origin);
        assert_relative_eq!(r.distance_sq_to_point(&p), 5.0);
    }
}
