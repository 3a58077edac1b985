//! Moving vertices, edges, and faces while preserving convexity.
//!
//! All three operations funnel into one engine: displace the targeted
//! vertices, reject moves that would turn the solid inside out or merge
//! unrelated vertices, and rebuild the result as the convex hull of the
//! displaced point set. Edge collapses and face splits fall out of hull
//! membership instead of being separate cases.

use carve_kernel_math::{Aabb3, Point3, PointStatus, Transform, Vec3};

use crate::{Polyhedron, PolyhedronError, Result};

/// What a successful move did to the targeted handles.
#[derive(Debug, Clone, PartialEq)]
pub struct MoveOutcome {
    /// Displaced target positions that survive as vertices of the result.
    /// A position is absent when the vertex was absorbed by the hull.
    pub new_positions: Vec<Point3>,
}

impl Polyhedron {
    /// Move the vertex at `position` by `delta`.
    ///
    /// The vertex may merge with an edge-connected neighbor or be absorbed
    /// entirely; see [`MoveOutcome`]. Fails with `WouldDegenerate` when the
    /// move would invert the solid or merge vertices that share no edge.
    pub fn move_vertex(
        &mut self,
        position: &Point3,
        delta: &Vec3,
        world_bounds: &Aabb3,
    ) -> Result<MoveOutcome> {
        self.move_vertices(std::slice::from_ref(position), delta, world_bounds, false)
    }

    /// Move the edge whose center is at `center` by `delta`.
    ///
    /// Both endpoints are displaced together; the move fails when either
    /// endpoint would be lost.
    pub fn move_edge(
        &mut self,
        center: &Point3,
        delta: &Vec3,
        world_bounds: &Aabb3,
    ) -> Result<MoveOutcome> {
        let he = self.edge_at(center).ok_or(PolyhedronError::TargetNotFound)?;
        let (a, b) = self.topo.edge_points(he);
        self.move_vertices(&[a, b], delta, world_bounds, true)
    }

    /// Move the face whose centroid is at `centroid` by `delta`.
    ///
    /// All boundary vertices are displaced together; the move fails when any
    /// of them would be lost.
    pub fn move_face(
        &mut self,
        centroid: &Point3,
        delta: &Vec3,
        world_bounds: &Aabb3,
    ) -> Result<MoveOutcome> {
        let face = self
            .face_at(centroid)
            .ok_or(PolyhedronError::TargetNotFound)?;
        let targets = self.topo.face_points(face);
        self.move_vertices(&targets, delta, world_bounds, true)
    }

    /// The shared move engine. Atomic over all targets: either the whole
    /// displaced set validates and is swapped in, or nothing changes.
    pub fn move_vertices(
        &mut self,
        targets: &[Point3],
        delta: &Vec3,
        world_bounds: &Aabb3,
        require_all_survive: bool,
    ) -> Result<MoveOutcome> {
        let tol = self.tol;

        let target_ids: Vec<_> = targets
            .iter()
            .map(|p| self.vertex_at(p).ok_or(PolyhedronError::TargetNotFound))
            .collect::<Result<_>>()?;

        // A target's travel segment must not puncture a face it does not
        // touch: crossing such a plane back-to-front at a point on that
        // face's polygon turns the solid inside out.
        for &vid in &target_ids {
            let start = self.topo.vertices[vid].point;
            let end = start + delta;
            let incident = self.topo.vertex_incident_faces(vid);
            for (face_id, face) in &self.topo.faces {
                if incident.contains(&face_id) {
                    continue;
                }
                let d0 = face.plane.signed_distance(&start);
                let d1 = face.plane.signed_distance(&end);
                if d0 < -tol.linear && d1 > tol.linear {
                    let crossing = start + delta * (d0 / (d0 - d1));
                    if self.face_contains_point(face_id, &crossing) {
                        return Err(PolyhedronError::WouldDegenerate);
                    }
                }
            }
        }

        // Landing on a vertex is a merge, and merging is only legal along
        // an existing edge.
        for &vid in &target_ids {
            let landed = self.topo.vertices[vid].point + delta;
            let neighbors = self.topo.vertex_adjacent_vertices(vid);
            for (other, vertex) in &self.topo.vertices {
                if other == vid || target_ids.contains(&other) {
                    continue;
                }
                if tol.points_equal(&landed, &vertex.point) && !neighbors.contains(&other) {
                    return Err(PolyhedronError::WouldDegenerate);
                }
            }
        }

        let displaced: Vec<Point3> = self
            .topo
            .vertices
            .iter()
            .map(|(vid, v)| {
                if target_ids.contains(&vid) {
                    v.point + delta
                } else {
                    v.point
                }
            })
            .collect();

        let candidate = Polyhedron::convex_hull(&displaced, tol)
            .map_err(|_| PolyhedronError::WouldDegenerate)?;

        let b = candidate.bounds();
        if !world_bounds.contains_point(&b.min, &tol) || !world_bounds.contains_point(&b.max, &tol)
        {
            return Err(PolyhedronError::WouldDegenerate);
        }

        let mut new_positions = Vec::with_capacity(target_ids.len());
        for &vid in &target_ids {
            let landed = self.topo.vertices[vid].point + delta;
            if candidate.vertex_at(&landed).is_some() {
                new_positions.push(landed);
            } else if require_all_survive {
                return Err(PolyhedronError::WouldDegenerate);
            }
        }

        *self = candidate;
        Ok(MoveOutcome { new_positions })
    }

    /// Translate the whole polyhedron. Fails with `WouldDegenerate` when the
    /// result leaves `world_bounds`.
    pub fn translate(&mut self, delta: &Vec3, world_bounds: &Aabb3) -> Result<()> {
        let (mut positions, loops) = self.to_polygons();
        for p in &mut positions {
            *p += delta;
        }
        self.commit(&positions, &loops, world_bounds)
    }

    /// Apply an affine transform to the whole polyhedron.
    ///
    /// Fails with `DegenerateBrush` when the transform flattens or mirrors
    /// the solid, and with `WouldDegenerate` when the result leaves
    /// `world_bounds`.
    pub fn transform(&mut self, t: &Transform, world_bounds: &Aabb3) -> Result<()> {
        let (positions, loops) = self.to_polygons();
        let positions: Vec<Point3> = positions.iter().map(|p| t.apply_point(p)).collect();
        self.commit(&positions, &loops, world_bounds)
    }

    pub(crate) fn face_contains_point(
        &self,
        face_id: carve_kernel_topo::FaceId,
        p: &Point3,
    ) -> bool {
        let face = &self.topo.faces[face_id];
        if face.plane.point_status(p, &self.tol) != PointStatus::Inside {
            return false;
        }
        let points = self.topo.face_points(face_id);
        for i in 0..points.len() {
            let a = &points[i];
            let b = &points[(i + 1) % points.len()];
            let side = (b - a).cross(&(p - a)).dot(&face.plane.normal);
            if side < -self.tol.linear {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use carve_kernel_math::{Aabb3, Dir3, Tolerance};
    use std::f64::consts::FRAC_PI_2;

    fn world() -> Aabb3 {
        Aabb3::new(
            Point3::new(-4096.0, -4096.0, -4096.0),
            Point3::new(4096.0, 4096.0, 4096.0),
        )
    }

    fn cube(size: f64) -> Polyhedron {
        let aabb = Aabb3::new(Point3::new(0.0, 0.0, 0.0), Point3::new(size, size, size));
        Polyhedron::from_bounds(&aabb, Tolerance::DEFAULT).unwrap()
    }

    #[test]
    fn pull_corner_outward_keeps_topology() {
        let mut poly = cube(64.0);
        let outcome = poly
            .move_vertex(
                &Point3::new(64.0, 64.0, 64.0),
                &Vec3::new(16.0, 16.0, 16.0),
                &world(),
            )
            .unwrap();
        assert_eq!(outcome.new_positions, vec![Point3::new(80.0, 80.0, 80.0)]);
        assert_eq!(poly.vertex_count(), 8);
        assert!(poly.is_valid());
        assert!(poly.vertex_at(&Point3::new(80.0, 80.0, 80.0)).is_some());
    }

    #[test]
    fn move_and_inverse_move_round_trip() {
        let mut poly = cube(64.0);
        let delta = Vec3::new(16.0, 8.0, 24.0);
        poly.move_vertex(&Point3::new(64.0, 64.0, 64.0), &delta, &world())
            .unwrap();
        poly.move_vertex(&Point3::new(80.0, 72.0, 88.0), &(-delta), &world())
            .unwrap();
        assert_eq!(poly.vertex_count(), 8);
        assert_eq!(poly.face_count(), 6);
        assert_relative_eq!(poly.volume(), 64.0 * 64.0 * 64.0, epsilon = 1e-6);
    }

    #[test]
    fn drag_through_opposite_face_is_rejected() {
        let mut poly = cube(64.0);
        let err = poly
            .move_vertex(
                &Point3::new(0.0, 0.0, 0.0),
                &Vec3::new(128.0, 128.0, 128.0),
                &world(),
            )
            .unwrap_err();
        assert_eq!(err, PolyhedronError::WouldDegenerate);
        // Receiver untouched.
        assert!(poly.vertex_at(&Point3::new(0.0, 0.0, 0.0)).is_some());
        assert_relative_eq!(poly.volume(), 64.0 * 64.0 * 64.0, epsilon = 1e-9);
    }

    #[test]
    fn vertex_merges_with_edge_connected_neighbor() {
        let mut poly = cube(64.0);
        let outcome = poly
            .move_vertex(
                &Point3::new(0.0, 0.0, 64.0),
                &Vec3::new(64.0, 0.0, 0.0),
                &world(),
            )
            .unwrap();
        assert_eq!(outcome.new_positions, vec![Point3::new(64.0, 0.0, 64.0)]);
        assert_eq!(poly.vertex_count(), 7);
        assert!(poly.is_valid());
    }

    #[test]
    fn landing_on_unconnected_vertex_is_rejected() {
        let mut poly = cube(64.0);
        // Across the face diagonal: no shared edge.
        let err = poly
            .move_vertex(
                &Point3::new(0.0, 0.0, 64.0),
                &Vec3::new(64.0, 64.0, 0.0),
                &world(),
            )
            .unwrap_err();
        assert_eq!(err, PolyhedronError::WouldDegenerate);
    }

    #[test]
    fn pushed_in_vertex_is_absorbed() {
        let mut poly = cube(64.0);
        // Pull a corner out into a spike first, then push it back past its
        // original position so it lands strictly inside the hull of the rest.
        poly.move_vertex(
            &Point3::new(64.0, 64.0, 64.0),
            &Vec3::new(32.0, 32.0, 32.0),
            &world(),
        )
        .unwrap();
        let outcome = poly
            .move_vertex(
                &Point3::new(96.0, 96.0, 96.0),
                &Vec3::new(-60.0, -60.0, -60.0),
                &world(),
            )
            .unwrap();
        assert!(outcome.new_positions.is_empty());
        assert_eq!(poly.vertex_count(), 7);
        assert!(poly.is_valid());
    }

    #[test]
    fn edge_move_keeps_both_endpoints() {
        let mut poly = cube(64.0);
        let center = Point3::new(32.0, 0.0, 64.0);
        let outcome = poly
            .move_edge(&center, &Vec3::new(0.0, 0.0, 16.0), &world())
            .unwrap();
        assert_eq!(outcome.new_positions.len(), 2);
        assert_eq!(poly.vertex_count(), 8);
        assert!(poly.vertex_at(&Point3::new(0.0, 0.0, 80.0)).is_some());
        assert!(poly.vertex_at(&Point3::new(64.0, 0.0, 80.0)).is_some());
    }

    #[test]
    fn face_move_translates_the_whole_boundary() {
        let mut poly = cube(64.0);
        let centroid = Point3::new(32.0, 32.0, 64.0);
        let outcome = poly
            .move_face(&centroid, &Vec3::new(0.0, 0.0, 32.0), &world())
            .unwrap();
        assert_eq!(outcome.new_positions.len(), 4);
        assert_relative_eq!(poly.bounds().max.z, 96.0, epsilon = 1e-9);
        assert_eq!(poly.face_count(), 6);
    }

    #[test]
    fn edge_move_losing_an_endpoint_is_rejected() {
        let mut poly = cube(64.0);
        // Push the top front edge into the interior: both endpoints would be
        // absorbed, so the move is refused and nothing changes.
        let err = poly
            .move_edge(
                &Point3::new(32.0, 0.0, 64.0),
                &Vec3::new(0.0, 32.0, -32.0),
                &world(),
            )
            .unwrap_err();
        assert_eq!(err, PolyhedronError::WouldDegenerate);
        assert_eq!(poly.vertex_count(), 8);
        assert_eq!(poly.face_count(), 6);
    }

    #[test]
    fn move_out_of_world_bounds_is_rejected() {
        let small = Aabb3::new(
            Point3::new(-128.0, -128.0, -128.0),
            Point3::new(128.0, 128.0, 128.0),
        );
        let mut poly = cube(64.0);
        let err = poly
            .move_vertex(
                &Point3::new(64.0, 64.0, 64.0),
                &Vec3::new(100.0, 0.0, 0.0),
                &small,
            )
            .unwrap_err();
        assert_eq!(err, PolyhedronError::WouldDegenerate);
    }

    #[test]
    fn missing_target_reports_not_found() {
        let mut poly = cube(64.0);
        let err = poly
            .move_vertex(&Point3::new(5.0, 5.0, 5.0), &Vec3::x(), &world())
            .unwrap_err();
        assert_eq!(err, PolyhedronError::TargetNotFound);
    }

    #[test]
    fn translate_shifts_bounds() {
        let mut poly = cube(64.0);
        poly.translate(&Vec3::new(10.0, 0.0, -4.0), &world()).unwrap();
        let b = poly.bounds();
        assert_relative_eq!(b.min.x, 10.0, epsilon = 1e-9);
        assert_relative_eq!(b.min.z, -4.0, epsilon = 1e-9);
        assert!(poly.is_valid());
    }

    #[test]
    fn translate_out_of_world_bounds_is_rejected() {
        let small = Aabb3::new(
            Point3::new(-128.0, -128.0, -128.0),
            Point3::new(128.0, 128.0, 128.0),
        );
        let mut poly = cube(64.0);
        let err = poly
            .translate(&Vec3::new(100.0, 0.0, 0.0), &small)
            .unwrap_err();
        assert_eq!(err, PolyhedronError::WouldDegenerate);
        assert_relative_eq!(poly.bounds().min.x, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn rotate_quarter_turn_about_center() {
        let mut poly = cube(64.0);
        let t = Transform::rotation_about_axis(
            &Point3::new(32.0, 32.0, 32.0),
            &Dir3::new_normalize(Vec3::z()),
            FRAC_PI_2,
        );
        poly.transform(&t, &world()).unwrap();
        assert!(poly.is_valid());
        assert_relative_eq!(poly.volume(), 64.0 * 64.0 * 64.0, epsilon = 1e-6);
        let b = poly.bounds();
        assert_relative_eq!(b.min.x, 0.0, epsilon = 1e-9);
        assert_relative_eq!(b.max.y, 64.0, epsilon = 1e-9);
    }
}
