//! Clipping a polyhedron against the half-space behind a plane.

use carve_kernel_math::{Aabb3, Plane, Point3, PointStatus, Tolerance};
use carve_kernel_topo::TopologyError;

use crate::build::{canonicalize_loops, sort_by_winding};
use crate::{Polyhedron, PolyhedronError, Result};

/// Outcome of a successful clip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClipStatus {
    /// Nothing was in front of the plane; the polyhedron is untouched.
    Unchanged,
    /// Geometry in front of the plane was removed and the cut capped.
    Clipped,
}

impl Polyhedron {
    /// Remove everything in front of `plane` and cap the cut with a polygon
    /// on the plane.
    ///
    /// Returns [`ClipStatus::Unchanged`] when no vertex is in front, fails
    /// with `EmptyResult` when no vertex is behind, and fails with
    /// `DegenerateBrush` when the remainder is too thin to stand on its own.
    /// On any failure the polyhedron is untouched.
    pub fn clip(&mut self, plane: &Plane, world_bounds: &Aabb3) -> Result<ClipStatus> {
        let tol = self.tol;
        let mut any_above = false;
        let mut any_below = false;
        for v in self.topo.vertices.values() {
            match plane.point_status(&v.point, &tol) {
                PointStatus::Above => any_above = true,
                PointStatus::Below => any_below = true,
                PointStatus::Inside => {}
            }
        }
        if !any_above {
            return Ok(ClipStatus::Unchanged);
        }
        if !any_below {
            return Err(PolyhedronError::EmptyResult);
        }

        // Clip every face polygon against the half-space, collecting the
        // points the cut introduces for the cap.
        let mut polygons: Vec<Vec<Point3>> = Vec::new();
        let mut cap: Vec<Point3> = Vec::new();
        for (face_id, _) in &self.topo.faces {
            let clipped = clip_polygon(&self.topo.face_points(face_id), plane, &tol);
            if clipped.len() < 3 {
                continue;
            }
            for p in &clipped {
                if plane.point_status(p, &tol) == PointStatus::Inside
                    && !cap.iter().any(|q| tol.points_equal(q, p))
                {
                    cap.push(*p);
                }
            }
            polygons.push(clipped);
        }

        if cap.len() >= 3 {
            let mut order: Vec<usize> = (0..cap.len()).collect();
            sort_by_winding(&cap, &mut order, &plane.normal);
            polygons.push(order.into_iter().map(|i| cap[i]).collect());
        }

        let (positions, face_loops) = index_polygons(&polygons, &tol);
        let (positions, face_loops) = canonicalize_loops(&positions, face_loops, &tol);
        let candidate = Self::from_polygons(&positions, &face_loops, tol)?;
        if !world_bounds.contains_point(&candidate.bounds().min, &tol)
            || !world_bounds.contains_point(&candidate.bounds().max, &tol)
        {
            return Err(PolyhedronError::DegenerateBrush(TopologyError::NotConvex));
        }

        let mut candidate = candidate;
        candidate.merge_coplanar_faces();
        *self = candidate;
        Ok(ClipStatus::Clipped)
    }
}

/// Sutherland-Hodgman clip of one polygon against the back half-space.
fn clip_polygon(points: &[Point3], plane: &Plane, tol: &Tolerance) -> Vec<Point3> {
    let mut out = Vec::with_capacity(points.len() + 1);
    for i in 0..points.len() {
        let a = &points[i];
        let b = &points[(i + 1) % points.len()];
        let da = plane.signed_distance(a);
        let db = plane.signed_distance(b);
        let a_in = da <= tol.linear;
        let b_in = db <= tol.linear;

        if a_in {
            out.push(*a);
        }
        if a_in != b_in {
            let frac = da / (da - db);
            out.push(a + (b - a) * frac);
        }
    }

    // Crossings can land on existing vertices; drop duplicates.
    let mut dedup: Vec<Point3> = Vec::with_capacity(out.len());
    for p in out {
        if !dedup.iter().any(|q| tol.points_equal(q, &p)) {
            dedup.push(p);
        }
    }
    dedup
}

/// Share positions between polygons by tolerance equality and re-express
/// them as index loops.
pub(crate) fn index_polygons(
    polygons: &[Vec<Point3>],
    tol: &Tolerance,
) -> (Vec<Point3>, Vec<Vec<usize>>) {
    let mut positions: Vec<Point3> = Vec::new();
    let mut loops = Vec::with_capacity(polygons.len());
    for polygon in polygons {
        let mut loop_indices = Vec::with_capacity(polygon.len());
        for p in polygon {
            let idx = positions
                .iter()
                .position(|q| tol.points_equal(q, p))
                .unwrap_or_else(|| {
                    positions.push(*p);
                    positions.len() - 1
                });
            // The dedupe above can collapse two polygon corners onto one
            // shared position; skip the repeat to keep loops simple.
            if loop_indices.last() != Some(&idx) {
                loop_indices.push(idx);
            }
        }
        if loop_indices.first() == loop_indices.last() && loop_indices.len() > 1 {
            loop_indices.pop();
        }
        loops.push(loop_indices);
    }
    (positions, loops)
}
