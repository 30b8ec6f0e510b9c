#![warn(missing_docs)]

//! Point bounding volume hierarchy for cloudpick.
//!
//! This crate is the hierarchy side of point picking: it partitions a static
//! point set into a binary tree of axis-aligned boxes and exposes an ordered,
//! prunable traversal the query engine drives.
//!
//! # Architecture
//!
//! - [`Aabb3`] - Axis-aligned box with inflate and distance helpers
//! - [`Ray`] - Half-line with slab intersection and point distances
//! - [`PointPrimitive`] - A point plus its color
//! - [`bvh`] - Tree construction (binned SAH) and inspection
//! - [`shapecast`] - Best-first traversal driven by a [`ShapecastVisitor`]
//!
//! # Example
//!
//! ```
//! use cloudpick_bvh::{BuildOptions, Bvh, PointPrimitive};
//! use cloudpick_math::Point3;
//!
//! let points: Vec<PointPrimitive> = (0..100)
//!     .map(|i| PointPrimitive::new(Point3::new(i as f64, 0.0, 0.0)))
//!     .collect();
//! let bvh = Bvh::build(points, &BuildOptions::default());
//! assert_eq!(bvh.len(), 100);
//! assert!(bvh.depth() > 1);
//! ```

mod aabb;
mod point;
mod ray;
pub mod bvh;
pub mod shapecast;

pub use aabb::Aabb3;
pub use bvh::{BuildOptions, Bvh, BvhNode};
pub use point::PointPrimitive;
pub use ray::Ray;
pub use shapecast::{ShapecastStats, ShapecastVisitor};
