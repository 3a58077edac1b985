//! The clip tool: collect up to three surface points, derive a clip plane,
//! split every brush.

use carve_kernel_brush::Brush;
use carve_kernel_math::{Aabb3, Plane, Point3, Ray, Vec3};
use carve_kernel_poly::{PolyhedronError, Result};

use crate::grid::Grid;
use crate::handles::BrushMap;

/// Which side(s) of the clip plane survive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClipSide {
    /// Keep the piece behind the plane.
    #[default]
    Back,
    /// Keep the piece in front of the plane.
    Front,
    /// Keep both pieces as separate brushes.
    Both,
}

/// Collects clip points and performs the split.
#[derive(Debug, Clone)]
pub struct ClipTool {
    grid: Grid,
    world_bounds: Aabb3,
    points: Vec<Point3>,
    /// Side selection toggled by the user.
    pub keep: ClipSide,
}

impl ClipTool {
    /// A new tool with no points placed.
    pub fn new(grid: Grid, world_bounds: Aabb3) -> Self {
        Self {
            grid,
            world_bounds,
            points: Vec::new(),
            keep: ClipSide::default(),
        }
    }

    /// The placed clip points, oldest first.
    pub fn points(&self) -> &[Point3] {
        &self.points
    }

    /// Whether enough points exist to derive a plane.
    pub fn can_clip(&self) -> bool {
        self.points.len() >= 2
    }

    /// Pick a point on the nearest brush surface under `ray`, snap it to
    /// the grid, and add it. At most three points are kept.
    pub fn add_point(&mut self, brushes: &BrushMap, ray: &Ray) -> Option<Point3> {
        if self.points.len() >= 3 {
            return None;
        }
        let t = brushes
            .values()
            .filter_map(|b| b.intersect_ray(ray))
            .min_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))?;
        let point = self.grid.snap_point(&ray.at(t));
        if self.points.iter().any(|p| (p - point).norm() < 1e-9) {
            return None;
        }
        self.points.push(point);
        Some(point)
    }

    /// Remove the most recently placed point.
    pub fn remove_last_point(&mut self) -> Option<Point3> {
        self.points.pop()
    }

    /// Drop all points.
    pub fn reset(&mut self) {
        self.points.clear();
    }

    /// The clip plane of the current points.
    ///
    /// Three points span the plane directly. Two points need a third
    /// direction, taken from the caller's current view so the cut matches
    /// what the user sees.
    pub fn clip_plane(&self, view_direction: &Vec3) -> Option<Plane> {
        match self.points.len() {
            3 => Plane::from_points(&self.points[0], &self.points[1], &self.points[2]),
            2 => {
                let third = self.points[0] + view_direction;
                Plane::from_points(&self.points[0], &self.points[1], &third)
            }
            _ => None,
        }
    }

    /// Split every brush by the current plane, keeping the configured
    /// side(s). Brushes entirely on a removed side disappear; fails with
    /// `EmptyResult` when the clip would delete everything, leaving the
    /// brush set untouched.
    pub fn perform(&mut self, brushes: &mut BrushMap, view_direction: &Vec3) -> Result<()> {
        let plane = self
            .clip_plane(view_direction)
            .ok_or(PolyhedronError::TargetNotFound)?;

        let ids: Vec<_> = brushes.keys().collect();
        let mut replacements: Vec<(crate::handles::BrushId, Vec<Brush>)> = Vec::new();
        let mut any_kept = false;
        for id in ids {
            let result = brushes[id].clip(&plane, &self.world_bounds)?;
            let mut kept = Vec::new();
            match self.keep {
                ClipSide::Back => kept.extend(result.back),
                ClipSide::Front => kept.extend(result.front),
                ClipSide::Both => {
                    kept.extend(result.back);
                    kept.extend(result.front);
                }
            }
            any_kept |= !kept.is_empty();
            replacements.push((id, kept));
        }
        if !any_kept {
            return Err(PolyhedronError::EmptyResult);
        }

        for (id, kept) in replacements {
            brushes.remove(id);
            for brush in kept {
                brushes.insert(brush);
            }
        }
        self.points.clear();
        Ok(())
    }
}
