//! A point cloud paired with its hierarchy and world placement.

use std::sync::Arc;

use cloudpick_bvh::{BuildOptions, Bvh, PointPrimitive, Ray};
use cloudpick_math::{Point3, Transform};
use log::{debug, info};
use rayon::prelude::*;
use serde::Serialize;

use crate::query::{brute_force_closest, closest_point, PointHit};
use crate::{LocalFrame, PickError, PickMode, PickSettings, Result};

/// A pick answered in world space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Pick {
    /// The hit in the cloud's local frame.
    pub hit: PointHit,
    /// Picked point in world space, where a marker goes.
    pub world_point: Point3,
    /// Distance from the world-space ray origin to `world_point`.
    pub world_distance: f64,
}

/// Owns a point set, its optional hierarchy and its world transform.
///
/// The picker is usable in brute-force mode as soon as it exists; accelerated
/// picks need [`PointCloudPicker::is_ready`].
#[derive(Debug, Clone)]
pub struct PointCloudPicker {
    points: Arc<[PointPrimitive]>,
    bvh: Option<Bvh>,
    frame: LocalFrame,
}

impl PointCloudPicker {
    /// Picker over `points` with no hierarchy yet, placed at the world origin.
    pub fn new(points: impl Into<Arc<[PointPrimitive]>>) -> Self {
        Self {
            points: points.into(),
            bvh: None,
            frame: LocalFrame::identity(),
        }
    }

    /// Picker around an existing hierarchy.
    pub fn from_hierarchy(bvh: Bvh) -> Self {
        Self {
            points: bvh.points_arc(),
            bvh: Some(bvh),
            frame: LocalFrame::identity(),
        }
    }

    /// Build the hierarchy over the current points.
    pub fn build(&mut self, options: &BuildOptions) {
        let bvh = Bvh::build(Arc::clone(&self.points), options);
        info!(
            "hierarchy ready: {} points, depth {}",
            bvh.len(),
            bvh.depth()
        );
        self.bvh = Some(bvh);
    }

    /// Replace points and hierarchy with a freshly built one.
    pub fn replace_hierarchy(&mut self, bvh: Bvh) {
        self.points = bvh.points_arc();
        self.bvh = Some(bvh);
    }

    /// Whether accelerated picks can run.
    pub fn is_ready(&self) -> bool {
        self.bvh.is_some()
    }

    /// The point set.
    pub fn points(&self) -> &[PointPrimitive] {
        &self.points
    }

    /// The hierarchy, once built.
    pub fn hierarchy(&self) -> Option<&Bvh> {
        self.bvh.as_ref()
    }

    /// Current world transform.
    pub fn transform(&self) -> &Transform {
        self.frame.world()
    }

    /// Move the cloud; recomputes the local frame.
    pub fn set_transform(&mut self, world: Transform) -> Result<()> {
        self.frame = LocalFrame::new(&world)?;
        debug!("cloud transform updated, mean scale {}", self.frame.mean_scale());
        Ok(())
    }

    /// Closest point to a world-space ray under `settings`.
    ///
    /// Settings outside their numeric ranges are rejected with
    /// [`PickError::InvalidSettings`].
    pub fn pick(&self, world_ray: &Ray, settings: &PickSettings) -> Result<Option<Pick>> {
        settings.validate()?;
        let ray = self.frame.to_local_ray(world_ray);
        let threshold = self.frame.local_threshold(settings.raycast_threshold);

        let hit = match settings.mode {
            PickMode::Accelerated => {
                let bvh = self.bvh.as_ref().ok_or(PickError::NotReady)?;
                closest_point(&ray, bvh, threshold)
            }
            PickMode::BruteForce => brute_force_closest(&ray, &self.points, threshold),
        };

        Ok(hit.map(|hit| {
            let world_point = self.frame.to_world_point(&hit.point);
            Pick {
                hit,
                world_point,
                world_distance: (world_point - world_ray.origin).norm(),
            }
        }))
    }

    /// Answer many rays in parallel against the shared hierarchy.
    pub fn pick_batch(&self, world_rays: &[Ray], settings: &PickSettings) -> Result<Vec<Option<Pick>>> {
        settings.validate()?;
        if settings.mode == PickMode::Accelerated && !self.is_ready() {
            return Err(PickError::NotReady);
        }
        world_rays
            .par_iter()
            .map(|ray| self.pick(ray, settings))
            .collect()
    }
}
