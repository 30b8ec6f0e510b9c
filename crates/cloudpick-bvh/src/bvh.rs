//! Bounding Volume Hierarchy over point primitives.
//!
//! Uses a binned Surface Area Heuristic (SAH) for construction. Leaves
//! reference a contiguous range of a reordered index list, so the tree holds
//! no per-leaf allocations.

use std::ops::Range;
use std::sync::Arc;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::{Aabb3, PointPrimitive};

/// Construction parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildOptions {
    /// Subsets at or below this size become leaves.
    pub max_leaf_size: usize,
    /// Number of SAH buckets per axis.
    pub bins: usize,
    /// Subsets larger than this build their halves on the rayon pool.
    pub parallel_threshold: usize,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            max_leaf_size: 8,
            bins: 12,
            parallel_threshold: 65_536,
        }
    }
}

/// A BVH node - either a leaf referencing points or an internal node with children.
#[derive(Debug, Clone)]
pub enum BvhNode {
    /// Leaf node covering `count` entries of the index list starting at `first`.
    Leaf {
        /// Tight bounding box of the leaf's points.
        aabb: Aabb3,
        /// First entry in the hierarchy's index list.
        first: usize,
        /// Number of points in this leaf.
        count: usize,
    },
    /// Internal node with two children.
    Internal {
        /// Axis-aligned bounding box of this node.
        aabb: Aabb3,
        /// Left child node.
        left: Box<BvhNode>,
        /// Right child node.
        right: Box<BvhNode>,
    },
}

impl BvhNode {
    /// Bounding box of this node.
    pub fn aabb(&self) -> &Aabb3 {
        match self {
            BvhNode::Leaf { aabb, .. } | BvhNode::Internal { aabb, .. } => aabb,
        }
    }

    /// Whether this node holds primitives.
    pub fn is_leaf(&self) -> bool {
        matches!(self, BvhNode::Leaf { .. })
    }

    /// The two children of an internal node.
    pub fn children(&self) -> Option<(&BvhNode, &BvhNode)> {
        match self {
            BvhNode::Internal { left, right, .. } => Some((left, right)),
            BvhNode::Leaf { .. } => None,
        }
    }
}

/// Bounding Volume Hierarchy over a static point set.
///
/// Immutable once built; share it across threads by reference.
#[derive(Debug, Clone)]
pub struct Bvh {
    root: Option<BvhNode>,
    points: Arc<[PointPrimitive]>,
    indices: Vec<usize>,
}

impl Bvh {
    /// Build a BVH from a point set using binned SAH construction.
    pub fn build(points: impl Into<Arc<[PointPrimitive]>>, options: &BuildOptions) -> Self {
        let points: Arc<[PointPrimitive]> = points.into();
        let mut indices: Vec<usize> = (0..points.len())
            .filter(|&i| points[i].position.iter().all(|c| c.is_finite()))
            .collect();
        let skipped = points.len() - indices.len();
        if skipped > 0 {
            warn!("{skipped} points with non-finite coordinates left out of the BVH");
        }

        let options = BuildOptions {
            max_leaf_size: options.max_leaf_size.max(1),
            bins: options.bins.max(2),
            ..*options
        };

        let root = if indices.is_empty() {
            None
        } else {
            Some(build_node(&points, &mut indices, 0, &options))
        };

        let bvh = Self {
            root,
            points,
            indices,
        };
        debug!(
            "built BVH over {} points: {} nodes, {} leaves, depth {}",
            bvh.len(),
            bvh.node_count(),
            bvh.leaf_count(),
            bvh.depth()
        );
        bvh
    }

    /// Root node, or `None` when no point has finite coordinates.
    pub fn root(&self) -> Option<&BvhNode> {
        self.root.as_ref()
    }

    /// Bounding box of the whole set (empty box when there are no points).
    pub fn root_aabb(&self) -> Aabb3 {
        self.root
            .as_ref()
            .map(|root| *root.aabb())
            .unwrap_or_else(Aabb3::empty)
    }

    /// All primitives in their original order.
    pub fn points(&self) -> &[PointPrimitive] {
        &self.points
    }

    /// Shared handle to the point set.
    pub fn points_arc(&self) -> Arc<[PointPrimitive]> {
        Arc::clone(&self.points)
    }

    /// Number of primitives.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the hierarchy holds no primitives.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Primitives of a leaf as `(original index, primitive)` pairs.
    ///
    /// Internal nodes yield nothing.
    pub fn leaf_primitives<'a>(
        &'a self,
        node: &BvhNode,
    ) -> impl Iterator<Item = (usize, &'a PointPrimitive)> + 'a {
        let range: Range<usize> = match node {
            BvhNode::Leaf { first, count, .. } => *first..*first + *count,
            BvhNode::Internal { .. } => 0..0,
        };
        self.indices[range]
            .iter()
            .map(move |&i| (i, &self.points[i]))
    }

    /// Number of levels (0 for an empty tree, 1 for a single leaf).
    pub fn depth(&self) -> usize {
        let mut max_depth = 0;
        self.walk(|_, depth| max_depth = max_depth.max(depth + 1));
        max_depth
    }

    /// Total number of nodes.
    pub fn node_count(&self) -> usize {
        let mut count = 0;
        self.walk(|_, _| count += 1);
        count
    }

    /// Number of leaf nodes.
    pub fn leaf_count(&self) -> usize {
        let mut count = 0;
        self.walk(|node, _| count += usize::from(node.is_leaf()));
        count
    }

    /// Visit every node depth-first (left before right) with its depth, root = 0.
    pub fn walk(&self, mut f: impl FnMut(&BvhNode, usize)) {
        let mut stack: Vec<(&BvhNode, usize)> = self.root.iter().map(|r| (r, 0)).collect();
        while let Some((node, depth)) = stack.pop() {
            f(node, depth);
            if let Some((left, right)) = node.children() {
                stack.push((right, depth + 1));
                stack.push((left, depth + 1));
            }
        }
    }
}

/// Build a BVH node recursively using SAH.
///
/// `indices` is the slice of the global index list this node owns;
/// `offset` is where that slice starts in the global list.
fn build_node(
    points: &[PointPrimitive],
    indices: &mut [usize],
    offset: usize,
    options: &BuildOptions,
) -> BvhNode {
    let bounds = Aabb3::from_points(indices.iter().map(|&i| &points[i].position));

    if indices.len() <= options.max_leaf_size {
        return leaf(bounds, offset, indices.len());
    }

    let extent = bounds.extent();
    if extent.x <= 0.0 && extent.y <= 0.0 && extent.z <= 0.0 {
        // Every point is coincident; no split can separate them.
        return leaf(bounds, offset, indices.len());
    }

    let mid = match find_best_split(points, indices, &bounds, options.bins) {
        Some((axis, pos)) => partition_points(points, indices, axis, pos),
        None => 0,
    };

    // Fallback if partition fails: median along the widest axis
    let mid = if mid == 0 || mid == indices.len() {
        median_split(points, indices, extent.imax())
    } else {
        mid
    };

    let (left_idx, right_idx) = indices.split_at_mut(mid);
    let (left, right) = if left_idx.len() + right_idx.len() > options.parallel_threshold {
        rayon::join(
            || build_node(points, left_idx, offset, options),
            || build_node(points, right_idx, offset + mid, options),
        )
    } else {
        (
            build_node(points, left_idx, offset, options),
            build_node(points, right_idx, offset + mid, options),
        )
    };

    BvhNode::Internal {
        aabb: bounds,
        left: Box::new(left),
        right: Box::new(right),
    }
}

fn leaf(aabb: Aabb3, first: usize, count: usize) -> BvhNode {
    BvhNode::Leaf { aabb, first, count }
}

/// Find the best split axis and position using binned SAH.
///
/// Returns `None` when no axis produces a split with both sides populated.
fn find_best_split(
    points: &[PointPrimitive],
    indices: &[usize],
    bounds: &Aabb3,
    bins: usize,
) -> Option<(usize, f64)> {
    let extent = bounds.extent();
    let total_area = bounds.surface_area();

    let mut best: Option<(f64, usize, f64)> = None;
    let mut counts = vec![0usize; bins];
    let mut boxes = vec![Aabb3::empty(); bins];
    let mut right_area = vec![0.0f64; bins];
    let mut right_count = vec![0usize; bins];

    for axis in 0..3 {
        let axis_extent = extent[axis];
        if axis_extent < 1e-12 {
            continue;
        }
        let axis_min = bounds.min[axis];

        counts.iter_mut().for_each(|c| *c = 0);
        boxes.iter_mut().for_each(|b| *b = Aabb3::empty());

        for &i in indices {
            let p = &points[i].position;
            let b = bucket_of(p[axis], axis_min, axis_extent, bins);
            counts[b] += 1;
            boxes[b].include_point(p);
        }

        // Suffix sweep: right side of split `s` is buckets `s..bins`.
        let mut acc_box = Aabb3::empty();
        let mut acc_count = 0;
        for s in (1..bins).rev() {
            acc_box = acc_box.union(&boxes[s]);
            acc_count += counts[s];
            right_area[s] = acc_box.surface_area();
            right_count[s] = acc_count;
        }

        // Prefix sweep, evaluating cost at each boundary.
        let mut acc_box = Aabb3::empty();
        let mut acc_count = 0;
        for s in 1..bins {
            acc_box = acc_box.union(&boxes[s - 1]);
            acc_count += counts[s - 1];
            if acc_count == 0 || right_count[s] == 0 {
                continue;
            }

            // SAH cost: traversal + P(left) * N_left + P(right) * N_right
            let cost = if total_area > 0.0 {
                0.125
                    + acc_box.surface_area() / total_area * acc_count as f64
                    + right_area[s] / total_area * right_count[s] as f64
            } else {
                // Collinear points: every box is flat, balance the counts instead.
                (acc_count as f64 - right_count[s] as f64).abs()
            };

            if best.map_or(true, |(best_cost, _, _)| cost < best_cost) {
                let pos = axis_min + (s as f64 / bins as f64) * axis_extent;
                best = Some((cost, axis, pos));
            }
        }
    }

    best.map(|(_, axis, pos)| (axis, pos))
}

#[inline]
fn bucket_of(c: f64, axis_min: f64, axis_extent: f64, bins: usize) -> usize {
    let b = ((c - axis_min) / axis_extent * bins as f64) as usize;
    b.min(bins - 1)
}

/// Partition indices by coordinate along an axis; returns the split point.
fn partition_points(points: &[PointPrimitive], indices: &mut [usize], axis: usize, pos: f64) -> usize {
    let mut left = 0;
    let mut right = indices.len();

    while left < right {
        if points[indices[left]].position[axis] < pos {
            left += 1;
        } else {
            right -= 1;
            indices.swap(left, right);
        }
    }

    left
}

/// Split at the median coordinate along `axis`.
fn median_split(points: &[PointPrimitive], indices: &mut [usize], axis: usize) -> usize {
    let mid = indices.len() / 2;
    indices.select_nth_unstable_by(mid, |&a, &b| {
        points[a].position[axis].total_cmp(&points[b].position[axis])
    });
    mid
}
