//! Axis-aligned bounding boxes.

use cloudpick_math::{Point3, Vec3};
use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box in 3D.
///
/// A box built with [`Aabb3::empty`] is inverted (`min > max`) until the
/// first point is included; every other box keeps `min <= max`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb3 {
    /// Minimum corner.
    pub min: Point3,
    /// Maximum corner.
    pub max: Point3,
}

impl Aabb3 {
    /// Create an AABB from min and max corners.
    pub fn new(min: Point3, max: Point3) -> Self {
        Self { min, max }
    }

    /// Create an empty (inverted) AABB suitable for expansion.
    pub fn empty() -> Self {
        Self {
            min: Point3::new(f64::INFINITY, f64::INFINITY, f64::INFINITY),
            max: Point3::new(f64::NEG_INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
        }
    }

    /// Tight box around a set of points.
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Point3>) -> Self {
        let mut aabb = Self::empty();
        for p in points {
            aabb.include_point(p);
        }
        aabb
    }

    /// True until a point has been included.
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    /// Expand this AABB to include a point.
    pub fn include_point(&mut self, p: &Point3) {
        self.min = self.min.inf(p);
        self.max = self.max.sup(p);
    }

    /// Smallest box containing both.
    pub fn union(&self, other: &Aabb3) -> Aabb3 {
        Aabb3 {
            min: self.min.inf(&other.min),
            max: self.max.sup(&other.max),
        }
    }

    /// Copy of this box with every face pushed outward by `margin`.
    pub fn expanded(&self, margin: f64) -> Aabb3 {
        let m = Vec3::repeat(margin);
        Aabb3 {
            min: self.min - m,
            max: self.max + m,
        }
    }

    /// Center of the box.
    pub fn centroid(&self) -> Point3 {
        nalgebra::center(&self.min, &self.max)
    }

    /// Edge lengths along each axis.
    pub fn extent(&self) -> Vec3 {
        self.max - self.min
    }

    /// Total area of the six faces.
    pub fn surface_area(&self) -> f64 {
        if self.is_empty() {
            return 0.0;
        }
        let d = self.extent();
        2.0 * (d.x * d.y + d.y * d.z + d.z * d.x)
    }

    /// Inclusive containment test.
    pub fn contains_point(&self, p: &Point3) -> bool {
        (0..3).all(|i| p[i] >= self.min[i] && p[i] <= self.max[i])
    }

    /// Squared distance from `p` to the closest point of the box (zero inside).
    pub fn distance_sq_to_point(&self, p: &Point3) -> f64 {
        let clamped = p.sup(&self.min).inf(&self.max);
        (clamped - p).norm_squared()
    }

    /// Distance from `p` to the closest point of the box (zero inside).
    pub fn distance_to_point(&self, p: &Point3) -> f64 {
        self.distance_sq_to_point(p).sqrt()
    }

    /// The eight corners, bit `i` of the index selecting max on axis `i`.
    pub fn corners(&self) -> [Point3; 8] {
        std::array::from_fn(|i| {
            Point3::new(
                if i & 1 == 0 { self.min.x } else { self.max.x },
                if i & 2 == 0 { self.min.y } else { self.max.y },
                if i & 4 == 0 { self.min.z } else { self.max.z },
            )
        })
    }
}

impl Default for Aabb3 {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn unit() -> Aabb3 {
        Aabb3::new(Point3::origin(), Point3::new(1.0, 1.0, 1.0))
    }

    #[test]
    fn test_empty_then_include() {
        let mut aabb = Aabb3::empty();
        assert!(aabb.is_empty());
        aabb.include_point(&Point3::new(1.0, -2.0, 3.0));
        assert!(!aabb.is_empty());
        assert_eq!(aabb.min, aabb.max);
    }

    #[test]
    fn test_from_points() {
        let pts = [Point3::new(0.0, 5.0, -1.0), Point3::new(2.0, 1.0, 4.0)];
        let aabb = Aabb3::from_points(&pts);
        assert_eq!(aabb.min, Point3::new(0.0, 1.0, -1.0));
        assert_eq!(aabb.max, Point3::new(2.0, 5.0, 4.0));
    }

    #[test]
    fn test_expanded_pushes_all_faces() {
        let aabb = unit().expanded(0.5);
        assert_eq!(aabb.min, Point3::new(-0.5, -0.5, -0.5));
        assert_eq!(aabb.max, Point3::new(1.5, 1.5, 1.5));
    }

    #[test]
    fn test_distance_inside_is_zero() {
        assert_eq!(unit().distance_to_point(&Point3::new(0.5, 0.2, 0.9)), 0.0);
    }

    #[test]
    fn test_distance_to_face_and_corner() {
        let aabb = unit();
        assert_relative_eq!(aabb.distance_to_point(&Point3::new(0.5, 0.5, -2.0)), 2.0);
        assert_relative_eq!(
            aabb.distance_to_point(&Point3::new(2.0, 2.0, 2.0)),
            3.0f64.sqrt()
        );
    }

    #[test]
    fn test_surface_area() {
        let aabb = Aabb3::new(Point3::origin(), Point3::new(1.0, 2.0, 3.0));
        assert_relative_eq!(aabb.surface_area(), 22.0);
        assert_eq!(Aabb3::empty().surface_area(), 0.0);
    }

    #[test]
    fn test_corners_cover_box() {
        let aabb = unit();
        let corners = aabb.corners();
        assert_eq!(corners[0], aabb.min);
        assert_eq!(corners[7], aabb.max);
        assert!(corners.iter().all(|c| aabb.contains_point(c)));
    }

    #[test]
    fn test_union() {
        let a = unit();
        let b = Aabb3::new(Point3::new(2.0, 2.0, 2.0), Point3::new(3.0, 3.0, 3.0));
        let u = a.union(&b);
        assert_eq!(u.min, a.min);
        assert_eq!(u.max, b.max);
    }
}
