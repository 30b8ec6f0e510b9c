//! Closest-point queries along a ray.
//!
//! A point qualifies when it lies strictly in front of the ray origin and its
//! squared distance to the ray is below `threshold²`. Among qualifying points
//! the one nearest to the ray origin wins. The accelerated query drives a
//! [`ClosestPointVisitor`] through [`Bvh::shapecast`]; the brute-force query
//! scans the point slice with the same test and serves as the oracle.

use cloudpick_bvh::{Aabb3, Bvh, PointPrimitive, Ray, ShapecastVisitor};
use cloudpick_math::Point3;
use log::trace;
use serde::{Deserialize, Serialize};

/// The closest qualifying point of a query.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointHit {
    /// Index of the point in the queried point set.
    pub index: usize,
    /// Position of the point.
    pub point: Point3,
    /// Distance from the ray origin to the point.
    pub distance: f64,
    /// Distance from the ray origin to the point's projection on the ray.
    pub along_ray: f64,
    /// Perpendicular distance from the point to the ray.
    pub distance_to_ray: f64,
}

/// Outcome of a query: the best hit, or `None` when nothing qualifies.
pub type QueryResult = Option<PointHit>;

/// Whether traversal may skip boxes that cannot beat the running best.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Pruning {
    /// Skip nodes whose box lies farther from the origin than the best hit.
    #[default]
    DistanceOrdered,
    /// Visit every node the inflated-box test lets through.
    Exhaustive,
}

/// Evaluate one point against a ray.
///
/// Returns a hit when the point is in front of the origin and within the
/// threshold. A zero threshold admits only points exactly on the ray.
#[inline]
pub fn evaluate_point(ray: &Ray, index: usize, point: &Point3, threshold_sq: f64) -> Option<PointHit> {
    let along_ray = ray.along(point);
    if along_ray <= 0.0 {
        return None;
    }
    let distance_sq_to_ray = ray.distance_sq_to_point(point);
    let qualifies = distance_sq_to_ray < threshold_sq
        || (threshold_sq == 0.0 && distance_sq_to_ray == 0.0);
    if !qualifies {
        return None;
    }
    Some(PointHit {
        index,
        point: *point,
        distance: (point - ray.origin).norm(),
        along_ray,
        distance_to_ray: distance_sq_to_ray.sqrt(),
    })
}

/// Whether `hit` replaces `best`: strictly closer, or equally close with a
/// lower index. Traversal order never decides a tie.
#[inline]
fn improves(hit: &PointHit, best: &QueryResult) -> bool {
    best.map_or(true, |b| {
        hit.distance < b.distance || (hit.distance == b.distance && hit.index < b.index)
    })
}

/// Shapecast visitor that tracks the closest qualifying point.
#[derive(Debug, Clone)]
pub struct ClosestPointVisitor<'r> {
    ray: &'r Ray,
    threshold: f64,
    threshold_sq: f64,
    pruning: Pruning,
    best: QueryResult,
}

impl<'r> ClosestPointVisitor<'r> {
    /// Start a query for `ray` with a non-negative `threshold`.
    pub fn new(ray: &'r Ray, threshold: f64, pruning: Pruning) -> Self {
        debug_assert!(threshold >= 0.0, "threshold must be non-negative");
        Self {
            ray,
            threshold,
            threshold_sq: threshold * threshold,
            pruning,
            best: None,
        }
    }

    /// Distance of the best hit so far, `+inf` before the first.
    pub fn best_distance(&self) -> f64 {
        self.best.map_or(f64::INFINITY, |hit| hit.distance)
    }

    /// The best hit found.
    pub fn into_result(self) -> QueryResult {
        self.best
    }
}

impl ShapecastVisitor for ClosestPointVisitor<'_> {
    fn ordering_key(&mut self, aabb: &Aabb3) -> f64 {
        aabb.distance_to_point(&self.ray.origin)
    }

    fn should_prune(&mut self, aabb: &Aabb3, key: f64) -> bool {
        // Every point in the box is at least `key` from the origin.
        if self.pruning == Pruning::DistanceOrdered && key > self.best_distance() {
            return true;
        }
        // A point just outside the tight box can still be within threshold.
        !self.ray.intersects_aabb(&aabb.expanded(self.threshold))
    }

    fn visit_leaf(&mut self, index: usize, point: &PointPrimitive) {
        if let Some(hit) = evaluate_point(self.ray, index, &point.position, self.threshold_sq) {
            if improves(&hit, &self.best) {
                self.best = Some(hit);
            }
        }
    }
}

/// Closest point to `ray` within `threshold`, using the hierarchy.
pub fn closest_point(ray: &Ray, bvh: &Bvh, threshold: f64) -> QueryResult {
    closest_point_with(ray, bvh, threshold, Pruning::DistanceOrdered)
}

/// Same as [`closest_point`] with distance pruning disabled.
pub fn closest_point_unpruned(ray: &Ray, bvh: &Bvh, threshold: f64) -> QueryResult {
    closest_point_with(ray, bvh, threshold, Pruning::Exhaustive)
}

/// Closest point query with an explicit pruning mode.
pub fn closest_point_with(ray: &Ray, bvh: &Bvh, threshold: f64, pruning: Pruning) -> QueryResult {
    let mut visitor = ClosestPointVisitor::new(ray, threshold, pruning);
    let stats = bvh.shapecast(&mut visitor);
    trace!(
        "closest_point({:?}): visited {} nodes, pruned {}, tested {} points",
        pruning,
        stats.nodes_visited,
        stats.nodes_pruned,
        stats.primitives_tested
    );
    visitor.into_result()
}

/// Closest point by scanning every primitive, ignoring any hierarchy.
pub fn brute_force_closest(ray: &Ray, points: &[PointPrimitive], threshold: f64) -> QueryResult {
    debug_assert!(threshold >= 0.0, "threshold must be non-negative");
    let threshold_sq = threshold * threshold;
    let mut best: QueryResult = None;
    for (index, p) in points.iter().enumerate() {
        if let Some(hit) = evaluate_point(ray, index, &p.position, threshold_sq) {
            if improves(&hit, &best) {
                best = Some(hit);
            }
        }
    }
    best
}
