#![warn(missing_docs)]

//! Half-edge topology arena for convex solids.
//!
//! Vertices, half-edges, and faces live in slotmap arenas and refer to each
//! other through stable typed keys instead of references. Every construction
//! path funnels through [`Topology::from_polygons`], which pairs twins,
//! caches face planes, and validates closure before handing the result out.

use std::collections::HashMap;

use carve_kernel_math::{Plane, Point3, PointStatus, Tolerance, Vec3};
use slotmap::{new_key_type, SlotMap};
use thiserror::Error;

new_key_type! {
    /// Stable key of a vertex in the arena.
    pub struct VertexId;
    /// Stable key of a half-edge in the arena.
    pub struct HalfEdgeId;
    /// Stable key of a face in the arena.
    pub struct FaceId;
}

/// Errors raised while building or validating a topology.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TopologyError {
    /// A face loop has fewer than three vertices.
    #[error("face with fewer than 3 vertices")]
    FaceTooSmall,
    /// A face loop references a vertex index out of range.
    #[error("face references vertex index {0} out of range")]
    VertexIndexOutOfRange(usize),
    /// A half-edge has no twin, so the surface is not watertight.
    #[error("open surface: a half-edge has no twin")]
    OpenSurface,
    /// The same directed edge appears in two face loops.
    #[error("non-manifold edge: directed edge appears twice")]
    NonManifoldEdge,
    /// A face plane could not be computed from its boundary.
    #[error("degenerate face plane")]
    DegenerateFacePlane,
    /// An edge is shorter than the linear tolerance.
    #[error("edge shorter than tolerance")]
    ShortEdge,
    /// A face encloses (near) zero area.
    #[error("face with near-zero area")]
    ZeroAreaFace,
    /// A vertex lies strictly in front of some face plane.
    #[error("not convex: a vertex lies in front of a face plane")]
    NotConvex,
    /// A vertex is referenced by no face loop.
    #[error("isolated vertex")]
    IsolatedVertex,
}

/// Result alias for topology operations.
pub type Result<T> = std::result::Result<T, TopologyError>;

// =============================================================================
// Records
// =============================================================================

/// A vertex with its position and one outgoing half-edge.
#[derive(Debug, Clone, Copy)]
pub struct Vertex {
    /// Position in world space.
    pub point: Point3,
    /// One half-edge leaving this vertex.
    pub half_edge: HalfEdgeId,
}

/// A directed edge along one face boundary.
#[derive(Debug, Clone, Copy)]
pub struct HalfEdge {
    /// Vertex this half-edge leaves from.
    pub origin: VertexId,
    /// The oppositely directed half-edge on the neighboring face.
    pub twin: HalfEdgeId,
    /// Next half-edge around the same face, counter-clockwise from outside.
    pub next: HalfEdgeId,
    /// Face this half-edge bounds.
    pub face: FaceId,
}

/// A face with one boundary half-edge and its cached plane.
#[derive(Debug, Clone, Copy)]
pub struct Face {
    /// One half-edge on this face's boundary.
    pub half_edge: HalfEdgeId,
    /// Boundary plane, normal pointing out of the solid.
    pub plane: Plane,
}

// =============================================================================
// Topology
// =============================================================================

/// The half-edge arena of one closed convex surface.
#[derive(Debug, Clone, Default)]
pub struct Topology {
    /// Vertex arena.
    pub vertices: SlotMap<VertexId, Vertex>,
    /// Half-edge arena.
    pub half_edges: SlotMap<HalfEdgeId, HalfEdge>,
    /// Face arena.
    pub faces: SlotMap<FaceId, Face>,
}

impl Topology {
    /// Build a closed topology from shared positions and per-face index loops.
    ///
    /// Each loop lists vertex indices counter-clockwise as seen from outside.
    /// Twins are paired by matching opposite directed index pairs; the result
    /// is validated for closure and non-degeneracy before it is returned.
    pub fn from_polygons(
        positions: &[Point3],
        face_loops: &[Vec<usize>],
        tol: &Tolerance,
    ) -> Result<Self> {
        let mut topo = Topology::default();

        let vertex_ids: Vec<VertexId> = positions
            .iter()
            .map(|p| {
                topo.vertices.insert(Vertex {
                    point: *p,
                    half_edge: HalfEdgeId::default(),
                })
            })
            .collect();

        // Directed index pair -> half-edge, for twin pairing.
        let mut edge_map: HashMap<(usize, usize), HalfEdgeId> = HashMap::new();

        for loop_indices in face_loops {
            let n = loop_indices.len();
            if n < 3 {
                return Err(TopologyError::FaceTooSmall);
            }
            for &i in loop_indices {
                if i >= positions.len() {
                    return Err(TopologyError::VertexIndexOutOfRange(i));
                }
            }

            let plane = face_plane(positions, loop_indices)
                .ok_or(TopologyError::DegenerateFacePlane)?;
            let face_id = topo.faces.insert(Face {
                half_edge: HalfEdgeId::default(),
                plane,
            });

            let he_ids: Vec<HalfEdgeId> = loop_indices
                .iter()
                .map(|&i| {
                    topo.half_edges.insert(HalfEdge {
                        origin: vertex_ids[i],
                        twin: HalfEdgeId::default(),
                        next: HalfEdgeId::default(),
                        face: face_id,
                    })
                })
                .collect();

            for k in 0..n {
                let a = loop_indices[k];
                let b = loop_indices[(k + 1) % n];
                let he = he_ids[k];
                topo.half_edges[he].next = he_ids[(k + 1) % n];
                topo.vertices[vertex_ids[a]].half_edge = he;

                if edge_map.insert((a, b), he).is_some() {
                    return Err(TopologyError::NonManifoldEdge);
                }
            }
            topo.faces[face_id].half_edge = he_ids[0];
        }

        // Pair twins across opposite directed edges.
        for (&(a, b), &he) in &edge_map {
            let twin = *edge_map.get(&(b, a)).ok_or(TopologyError::OpenSurface)?;
            topo.half_edges[he].twin = twin;
        }

        if topo
            .vertices
            .values()
            .any(|v| !topo.half_edges.contains_key(v.half_edge))
        {
            return Err(TopologyError::IsolatedVertex);
        }

        topo.check_closure()?;
        topo.check_nondegenerate(tol)?;
        Ok(topo)
    }

    // =========================================================================
    // Counts
    // =========================================================================

    /// Number of vertices.
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Number of undirected edges.
    pub fn edge_count(&self) -> usize {
        self.half_edges.len() / 2
    }

    /// Number of faces.
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    // =========================================================================
    // Traversal
    // =========================================================================

    /// Vertex the half-edge points at.
    pub fn destination(&self, he: HalfEdgeId) -> VertexId {
        self.half_edges[self.half_edges[he].next].origin
    }

    /// Half-edge ids around a face, in winding order.
    pub fn face_half_edges(&self, face: FaceId) -> Vec<HalfEdgeId> {
        let start = self.faces[face].half_edge;
        let mut out = Vec::new();
        let mut he = start;
        loop {
            out.push(he);
            he = self.half_edges[he].next;
            if he == start {
                break;
            }
        }
        out
    }

    /// Vertex ids around a face, in winding order.
    pub fn face_vertices(&self, face: FaceId) -> Vec<VertexId> {
        self.face_half_edges(face)
            .into_iter()
            .map(|he| self.half_edges[he].origin)
            .collect()
    }

    /// Vertex positions around a face, in winding order.
    pub fn face_points(&self, face: FaceId) -> Vec<Point3> {
        self.face_vertices(face)
            .into_iter()
            .map(|v| self.vertices[v].point)
            .collect()
    }

    /// Arithmetic centroid of a face's boundary vertices.
    pub fn face_centroid(&self, face: FaceId) -> Point3 {
        let points = self.face_points(face);
        let sum = points.iter().fold(Vec3::zeros(), |acc, p| acc + p.coords);
        Point3::from(sum / points.len() as f64)
    }

    /// Undirected edges as twin pairs, each reported once.
    ///
    /// The representative half-edge is the one whose key sorts first.
    pub fn edges(&self) -> Vec<(HalfEdgeId, HalfEdgeId)> {
        let mut out = Vec::with_capacity(self.half_edges.len() / 2);
        for (id, he) in &self.half_edges {
            if id < he.twin {
                out.push((id, he.twin));
            }
        }
        out
    }

    /// Midpoint of the edge carried by a half-edge.
    pub fn edge_center(&self, he: HalfEdgeId) -> Point3 {
        let a = self.vertices[self.half_edges[he].origin].point;
        let b = self.vertices[self.destination(he)].point;
        nalgebra::center(&a, &b)
    }

    /// Both endpoint positions of the edge carried by a half-edge.
    pub fn edge_points(&self, he: HalfEdgeId) -> (Point3, Point3) {
        (
            self.vertices[self.half_edges[he].origin].point,
            self.vertices[self.destination(he)].point,
        )
    }

    /// Half-edges leaving a vertex, one per incident face.
    pub fn vertex_outgoing(&self, vertex: VertexId) -> Vec<HalfEdgeId> {
        let start = self.vertices[vertex].half_edge;
        let mut out = Vec::new();
        let mut he = start;
        loop {
            out.push(he);
            // twin points back at `vertex`; its next leaves `vertex` again.
            he = self.half_edges[self.half_edges[he].twin].next;
            if he == start {
                break;
            }
        }
        out
    }

    /// Faces incident to a vertex.
    pub fn vertex_incident_faces(&self, vertex: VertexId) -> Vec<FaceId> {
        self.vertex_outgoing(vertex)
            .into_iter()
            .map(|he| self.half_edges[he].face)
            .collect()
    }

    /// Vertices connected to a vertex by an edge.
    pub fn vertex_adjacent_vertices(&self, vertex: VertexId) -> Vec<VertexId> {
        self.vertex_outgoing(vertex)
            .into_iter()
            .map(|he| self.destination(he))
            .collect()
    }

    /// All vertex positions in arena order.
    pub fn points(&self) -> Vec<Point3> {
        self.vertices.values().map(|v| v.point).collect()
    }

    // =========================================================================
    // Validation
    // =========================================================================

    /// Verify twin involution and that every half-edge sits in one face loop.
    pub fn check_closure(&self) -> Result<()> {
        for (id, he) in &self.half_edges {
            let twin = self
                .half_edges
                .get(he.twin)
                .ok_or(TopologyError::OpenSurface)?;
            if twin.twin != id {
                return Err(TopologyError::OpenSurface);
            }
        }

        let mut seen = 0usize;
        for (face_id, _) in &self.faces {
            for he in self.face_half_edges(face_id) {
                if self.half_edges[he].face != face_id {
                    return Err(TopologyError::OpenSurface);
                }
                seen += 1;
            }
        }
        if seen != self.half_edges.len() {
            return Err(TopologyError::OpenSurface);
        }
        Ok(())
    }

    /// Verify every vertex is on or behind every face plane.
    pub fn check_convexity(&self, tol: &Tolerance) -> Result<()> {
        for face in self.faces.values() {
            for vertex in self.vertices.values() {
                if face.plane.point_status(&vertex.point, tol) == PointStatus::Above {
                    return Err(TopologyError::NotConvex);
                }
            }
        }
        Ok(())
    }

    /// Verify edges have length and faces have at least 3 vertices and area.
    pub fn check_nondegenerate(&self, tol: &Tolerance) -> Result<()> {
        for (he, _) in self.edges() {
            let (a, b) = self.edge_points(he);
            if tol.points_equal(&a, &b) {
                return Err(TopologyError::ShortEdge);
            }
        }
        for (face_id, _) in &self.faces {
            let points = self.face_points(face_id);
            if points.len() < 3 {
                return Err(TopologyError::FaceTooSmall);
            }
            if polygon_area(&points) < tol.linear * tol.linear {
                return Err(TopologyError::ZeroAreaFace);
            }
        }
        Ok(())
    }
}

// =============================================================================
// Polygon helpers
// =============================================================================

/// Newell normal of a polygon, not normalized. Zero for degenerate loops.
pub fn newell_normal(points: &[Point3]) -> Vec3 {
    let mut normal = Vec3::zeros();
    for i in 0..points.len() {
        let p = &points[i];
        let q = &points[(i + 1) % points.len()];
        normal.x += (p.y - q.y) * (p.z + q.z);
        normal.y += (p.z - q.z) * (p.x + q.x);
        normal.z += (p.x - q.x) * (p.y + q.y);
    }
    normal
}

/// Area of a planar polygon.
pub fn polygon_area(points: &[Point3]) -> f64 {
    newell_normal(points).norm() / 2.0
}

fn face_plane(positions: &[Point3], loop_indices: &[usize]) -> Option<Plane> {
    let points: Vec<Point3> = loop_indices.iter().map(|&i| positions[i]).collect();
    let normal = newell_normal(&points);
    let sum = points.iter().fold(Vec3::zeros(), |acc, p| acc + p.coords);
    let centroid = Point3::from(sum / points.len() as f64);
    Plane::from_point_and_normal(&centroid, &normal)
}
