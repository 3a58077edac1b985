//! Point containment, ray picking, and position-keyed element lookup.

use carve_kernel_math::{Point3, PointStatus, Ray};
use carve_kernel_topo::{FaceId, HalfEdgeId, VertexId};

use crate::Polyhedron;

impl Polyhedron {
    /// True when the point is inside or on the boundary, within tolerance.
    pub fn contains(&self, p: &Point3) -> bool {
        self.topo
            .faces
            .values()
            .all(|f| f.plane.point_status(p, &self.tol) != PointStatus::Above)
    }

    /// Distance along `ray` to the nearest face hit, if any.
    ///
    /// From outside this is the entry distance. From inside the solid the
    /// ray still reports the exit face, so picking keeps working when the
    /// viewpoint is within a brush.
    pub fn intersect_ray(&self, ray: &Ray) -> Option<f64> {
        let mut nearest: Option<f64> = None;
        for (face_id, face) in &self.topo.faces {
            let Some(t) = ray.intersect_plane(&face.plane) else {
                continue;
            };
            if !self.face_contains_point(face_id, &ray.at(t)) {
                continue;
            }
            if nearest.map_or(true, |n| t < n) {
                nearest = Some(t);
            }
        }
        nearest
    }

    /// The face hit nearest along `ray`, with its distance.
    pub fn pick_face(&self, ray: &Ray) -> Option<(FaceId, f64)> {
        let mut nearest: Option<(FaceId, f64)> = None;
        for (face_id, face) in &self.topo.faces {
            let Some(t) = ray.intersect_plane(&face.plane) else {
                continue;
            };
            if !self.face_contains_point(face_id, &ray.at(t)) {
                continue;
            }
            if nearest.map_or(true, |(_, n)| t < n) {
                nearest = Some((face_id, t));
            }
        }
        nearest
    }

    /// The vertex at `position`, within tolerance.
    pub fn vertex_at(&self, position: &Point3) -> Option<VertexId> {
        self.topo
            .vertices
            .iter()
            .find(|(_, v)| self.tol.points_equal(&v.point, position))
            .map(|(id, _)| id)
    }

    /// True when a vertex sits at `position`.
    pub fn has_vertex(&self, position: &Point3) -> bool {
        self.vertex_at(position).is_some()
    }

    /// The edge whose midpoint is at `center`, as its representative
    /// half-edge.
    pub fn edge_at(&self, center: &Point3) -> Option<HalfEdgeId> {
        self.topo
            .edges()
            .into_iter()
            .map(|(he, _)| he)
            .find(|&he| self.tol.points_equal(&self.topo.edge_center(he), center))
    }

    /// The face whose centroid is at `centroid`.
    pub fn face_at(&self, centroid: &Point3) -> Option<FaceId> {
        self.topo
            .faces
            .keys()
            .find(|&f| self.tol.points_equal(&self.topo.face_centroid(f), centroid))
    }

    /// All vertex positions.
    pub fn vertex_positions(&self) -> Vec<Point3> {
        self.topo.points()
    }

    /// Midpoints of all edges.
    pub fn edge_centers(&self) -> Vec<Point3> {
        self.topo
            .edges()
            .into_iter()
            .map(|(he, _)| self.topo.edge_center(he))
            .collect()
    }

    /// Centroids of all faces.
    pub fn face_centroids(&self) -> Vec<Point3> {
        self.topo
            .faces
            .keys()
            .map(|f| self.topo.face_centroid(f))
            .collect()
    }
}
