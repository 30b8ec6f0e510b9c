//! Wireframe view of a hierarchy's boxes, for debugging traversal depth.

use cloudpick_bvh::{Aabb3, Bvh, BvhNode};
use cloudpick_math::Point3;
use serde::Serialize;

/// One box of the helper wireframe.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HelperBox {
    /// The node's bounding box.
    pub aabb: Aabb3,
    /// Depth of the node, root = 0.
    pub depth: usize,
    /// Whether the node is a leaf.
    pub is_leaf: bool,
}

/// Collects the boxes of a hierarchy down to a depth limit.
///
/// Changing the depth does not touch the box list; call
/// [`BvhVisualizer::update`] afterwards.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BvhVisualizer {
    depth: usize,
    boxes: Vec<HelperBox>,
}

impl BvhVisualizer {
    /// Empty visualizer that will show levels `0..=depth`.
    pub fn new(depth: usize) -> Self {
        Self {
            depth,
            boxes: Vec::new(),
        }
    }

    /// Current depth limit.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Change the depth limit.
    pub fn set_depth(&mut self, depth: usize) {
        self.depth = depth;
    }

    /// Rebuild the box list from `bvh`.
    pub fn update(&mut self, bvh: &Bvh) {
        self.boxes.clear();
        let mut stack: Vec<(&BvhNode, usize)> = bvh.root().into_iter().map(|r| (r, 0)).collect();
        while let Some((node, depth)) = stack.pop() {
            self.boxes.push(HelperBox {
                aabb: *node.aabb(),
                depth,
                is_leaf: node.is_leaf(),
            });
            if depth == self.depth {
                continue;
            }
            if let Some((left, right)) = node.children() {
                stack.push((right, depth + 1));
                stack.push((left, depth + 1));
            }
        }
    }

    /// Boxes from the last update, parents before children.
    pub fn boxes(&self) -> &[HelperBox] {
        &self.boxes
    }

    /// Wireframe edges, twelve per box.
    pub fn line_segments(&self) -> Vec<[Point3; 2]> {
        let mut segments = Vec::with_capacity(self.boxes.len() * 12);
        for helper in &self.boxes {
            let corners = helper.aabb.corners();
            for i in 0..8 {
                for bit in [1, 2, 4] {
                    if i & bit == 0 {
                        segments.push([corners[i], corners[i | bit]]);
                    }
                }
            }
        }
        segments
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cloudpick_bvh::{BuildOptions, PointPrimitive};

    fn bvh(n: usize) -> Bvh {
        let points: Vec<PointPrimitive> = (0..n)
            .map(|i| PointPrimitive::new(Point3::new(i as f64, (i % 7) as f64, 0.0)))
            .collect();
        Bvh::build(
            points,
            &BuildOptions {
                max_leaf_size: 2,
                ..BuildOptions::default()
            },
        )
    }

    #[test]
    fn test_depth_zero_is_root_only() {
        let tree = bvh(64);
        let mut helper = BvhVisualizer::new(0);
        helper.update(&tree);
        assert_eq!(helper.boxes().len(), 1);
        assert_eq!(helper.boxes()[0].aabb, tree.root_aabb());
        assert_eq!(helper.line_segments().len(), 12);
    }

    #[test]
    fn test_depth_limit_respected() {
        let tree = bvh(64);
        let mut helper = BvhVisualizer::new(2);
        helper.update(&tree);
        assert!(helper.boxes().iter().all(|b| b.depth <= 2));
        let mut expected = 0;
        tree.walk(|_, depth| expected += usize::from(depth <= 2));
        assert_eq!(helper.boxes().len(), expected);
    }

    #[test]
    fn test_set_depth_then_update() {
        let tree = bvh(64);
        let mut helper = BvhVisualizer::new(1);
        helper.update(&tree);
        let shallow = helper.boxes().len();
        helper.set_depth(tree.depth());
        assert_eq!(helper.boxes().len(), shallow);
        helper.update(&tree);
        assert_eq!(helper.boxes().len(), tree.node_count());
    }

    #[test]
    fn test_empty_hierarchy_has_no_boxes() {
        let mut helper = BvhVisualizer::new(5);
        helper.update(&bvh(0));
        assert!(helper.boxes().is_empty());
        assert!(helper.line_segments().is_empty());
    }
}
