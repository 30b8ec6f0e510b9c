#![warn(missing_docs)]

//! Real-time closest-point picking against large point clouds.
//!
//! Given a pick ray and a distance threshold, finds the single point nearest
//! to the ray origin among the points within threshold of the ray. Queries
//! run on a [`Bvh`] with a best-first, branch-and-bound shapecast, fast enough
//! to answer every pointer move over millions of points.
//!
//! # Architecture
//!
//! - [`query`] - The closest-point visitor, accelerated and brute-force queries
//! - [`LocalFrame`] - World-to-local ray and threshold mapping
//! - [`PointCloudPicker`] - Points, hierarchy and transform owned together
//! - [`PickSettings`] - Explicit per-pick configuration
//! - [`PerspectiveCamera`] - Pick rays from pointer coordinates
//! - [`BvhVisualizer`] - Depth-limited wireframe of the hierarchy
//!
//! # Example
//!
//! ```
//! use cloudpick::{closest_point, BuildOptions, Bvh, PointPrimitive, Ray};
//! use cloudpick_math::{Point3, Vec3};
//!
//! let points: Vec<PointPrimitive> = [0.0, 5.0, 10.0]
//!     .iter()
//!     .map(|&z| PointPrimitive::new(Point3::new(0.0, 0.0, z)))
//!     .collect();
//! let bvh = Bvh::build(points, &BuildOptions::default());
//!
//! let ray = Ray::from_vector(Point3::new(0.0, 0.0, -1.0), Vec3::z()).unwrap();
//! let hit = closest_point(&ray, &bvh, 0.1).unwrap();
//! assert_eq!(hit.point, Point3::origin());
//! assert!((hit.distance - 1.0).abs() < 1e-12);
//! ```

mod camera;
mod error;
mod frame;
mod picker;
mod settings;
mod visualizer;
pub mod query;

pub use camera::{ndc_from_pixel, PerspectiveCamera};
pub use error::{PickError, Result};
pub use frame::LocalFrame;
pub use picker::{Pick, PointCloudPicker};
pub use query::{
    brute_force_closest, closest_point, closest_point_unpruned, closest_point_with, PointHit,
    Pruning, QueryResult,
};
pub use settings::{PickMode, PickSettings};
pub use visualizer::{BvhVisualizer, HelperBox};

pub use cloudpick_bvh::{Aabb3, BuildOptions, Bvh, BvhNode, PointPrimitive, Ray};
