//! Ordered, prunable traversal of a [`Bvh`].
//!
//! A shapecast walks the tree depth-first with an explicit stack. At every
//! internal node the visitor scores both children, and the lower-scored
//! child is visited first. The prune test runs when a node is popped, so a
//! bound tightened by an earlier leaf applies to every node still waiting on
//! the stack.

use crate::{Aabb3, Bvh, BvhNode, PointPrimitive};

/// Query logic plugged into [`Bvh::shapecast`].
pub trait ShapecastVisitor {
    /// Visitation priority of a node's box; lower is visited first.
    fn ordering_key(&mut self, aabb: &Aabb3) -> f64;

    /// Whether to skip the subtree under `aabb`, given its ordering key.
    fn should_prune(&mut self, aabb: &Aabb3, key: f64) -> bool;

    /// Test one primitive of a leaf that survived pruning.
    fn visit_leaf(&mut self, index: usize, point: &PointPrimitive);
}

/// Counters collected during one shapecast.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShapecastStats {
    /// Nodes that passed the prune test.
    pub nodes_visited: usize,
    /// Nodes rejected by the prune test.
    pub nodes_pruned: usize,
    /// Primitives handed to [`ShapecastVisitor::visit_leaf`].
    pub primitives_tested: usize,
}

impl Bvh {
    /// Run `visitor` over the hierarchy.
    pub fn shapecast<V: ShapecastVisitor>(&self, visitor: &mut V) -> ShapecastStats {
        let mut stats = ShapecastStats::default();
        let Some(root) = self.root() else {
            return stats;
        };

        let mut stack: Vec<(&BvhNode, f64)> = Vec::with_capacity(64);
        let root_key = visitor.ordering_key(root.aabb());
        stack.push((root, root_key));

        while let Some((node, key)) = stack.pop() {
            if visitor.should_prune(node.aabb(), key) {
                stats.nodes_pruned += 1;
                continue;
            }
            stats.nodes_visited += 1;

            match node {
                BvhNode::Leaf { .. } => {
                    for (index, point) in self.leaf_primitives(node) {
                        stats.primitives_tested += 1;
                        visitor.visit_leaf(index, point);
                    }
                }
                BvhNode::Internal { left, right, .. } => {
                    let left_key = visitor.ordering_key(left.aabb());
                    let right_key = visitor.ordering_key(right.aabb());
                    // The closer child goes on top of the stack.
                    if right_key < left_key {
                        stack.push((left, left_key));
                        stack.push((right, right_key));
                    } else {
                        stack.push((right, right_key));
                        stack.push((left, left_key));
                    }
                }
            }
        }

        stats
    }
}
