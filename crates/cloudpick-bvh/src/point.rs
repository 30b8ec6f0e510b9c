//! Point primitives stored in the hierarchy.

use cloudpick_math::Point3;
use serde::{Deserialize, Serialize};

/// A single point of the cloud.
///
/// Only `position` takes part in queries; `color` rides along for the
/// presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointPrimitive {
    /// Position in the cloud's local frame.
    pub position: Point3,
    /// RGB color.
    pub color: [u8; 3],
}

impl PointPrimitive {
    /// A white point at `position`.
    pub fn new(position: Point3) -> Self {
        Self {
            position,
            color: [255, 255, 255],
        }
    }

    /// A point with an explicit color.
    pub fn with_color(position: Point3, color: [u8; 3]) -> Self {
        Self { position, color }
    }
}

impl From<Point3> for PointPrimitive {
    fn from(position: Point3) -> Self {
        Self::new(position)
    }
}
