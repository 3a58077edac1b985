#![warn(missing_docs)]

//! Convex polyhedra for brush editing.
//!
//! A [`Polyhedron`] wraps a half-edge [`Topology`] together with the
//! tolerance it was built under. Every mutating operation is a transaction:
//! it assembles a candidate, validates closure, convexity, and thickness,
//! and swaps the candidate in only on success. On failure the receiver is
//! left untouched and the error names what went wrong.

use std::collections::HashMap;

use carve_kernel_math::{Aabb3, Point3, Tolerance};
use carve_kernel_topo::{Topology, TopologyError};
use thiserror::Error;

mod build;
mod clip;
mod merge;
mod moves;
mod query;

pub use clip::ClipStatus;
pub use moves::MoveOutcome;

/// Errors raised by polyhedron operations. All are recoverable and leave
/// the receiver unchanged.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PolyhedronError {
    /// The operation would produce geometry that cannot stand on its own:
    /// open, non-convex, thinner than tolerance, or fewer than 4 vertices.
    #[error("degenerate brush: {0}")]
    DegenerateBrush(#[from] TopologyError),
    /// The operation removed all geometry (e.g. a clip kept nothing).
    #[error("operation leaves no geometry")]
    EmptyResult,
    /// The requested move would invert, self-intersect, or illegally merge
    /// the polyhedron and was refused.
    #[error("move would degenerate the polyhedron")]
    WouldDegenerate,
    /// No vertex, edge, or face was found at the addressed position.
    #[error("no element at the addressed position")]
    TargetNotFound,
}

/// Result alias for polyhedron operations.
pub type Result<T> = std::result::Result<T, PolyhedronError>;

/// A closed convex polyhedron with cached face planes.
#[derive(Debug, Clone)]
pub struct Polyhedron {
    topo: Topology,
    tol: Tolerance,
}

impl Polyhedron {
    /// Build and fully validate a polyhedron from positions and face loops.
    ///
    /// This is the single funnel behind every constructor and every
    /// transaction commit.
    pub fn from_polygons(
        positions: &[Point3],
        face_loops: &[Vec<usize>],
        tol: Tolerance,
    ) -> Result<Self> {
        let topo = Topology::from_polygons(positions, face_loops, &tol)?;
        let poly = Self { topo, tol };
        poly.validate()?;
        Ok(poly)
    }

    /// The underlying half-edge topology.
    pub fn topology(&self) -> &Topology {
        &self.topo
    }

    /// The tolerance this polyhedron was built under.
    pub fn tolerance(&self) -> &Tolerance {
        &self.tol
    }

    /// Number of vertices.
    pub fn vertex_count(&self) -> usize {
        self.topo.vertex_count()
    }

    /// Number of undirected edges.
    pub fn edge_count(&self) -> usize {
        self.topo.edge_count()
    }

    /// Number of faces.
    pub fn face_count(&self) -> usize {
        self.topo.face_count()
    }

    /// True when the polyhedron encloses a volume and passes every check.
    ///
    /// Constructors only hand out valid polyhedra; this re-check exists for
    /// callers that must gate rendering or persistence.
    pub fn is_valid(&self) -> bool {
        self.vertex_count() >= 4 && self.validate().is_ok()
    }

    /// Extract shared positions and per-face index loops, in stable face
    /// order. The inverse of [`Polyhedron::from_polygons`].
    pub fn to_polygons(&self) -> (Vec<Point3>, Vec<Vec<usize>>) {
        let mut positions = Vec::with_capacity(self.topo.vertex_count());
        let mut index_of: HashMap<carve_kernel_topo::VertexId, usize> = HashMap::new();
        let mut loops = Vec::with_capacity(self.topo.face_count());

        for (face_id, _) in &self.topo.faces {
            let mut loop_indices = Vec::new();
            for vid in self.topo.face_vertices(face_id) {
                let idx = *index_of.entry(vid).or_insert_with(|| {
                    positions.push(self.topo.vertices[vid].point);
                    positions.len() - 1
                });
                loop_indices.push(idx);
            }
            loops.push(loop_indices);
        }
        (positions, loops)
    }

    /// Axis-aligned bounds of all vertices.
    pub fn bounds(&self) -> Aabb3 {
        let mut aabb = Aabb3::empty();
        for v in self.topo.vertices.values() {
            aabb.include_point(&v.point);
        }
        aabb
    }

    /// Enclosed volume, by summing signed pyramid volumes over the faces.
    pub fn volume(&self) -> f64 {
        let mut total = 0.0;
        for (face_id, _) in &self.topo.faces {
            let points = self.topo.face_points(face_id);
            let a = &points[0];
            for w in points[1..].windows(2) {
                let b = &w[0];
                let c = &w[1];
                total += a.coords.dot(&b.coords.cross(&c.coords));
            }
        }
        total / 6.0
    }

    // =========================================================================
    // Validation
    // =========================================================================

    pub(crate) fn validate(&self) -> Result<()> {
        if self.vertex_count() < 4 {
            return Err(PolyhedronError::DegenerateBrush(
                TopologyError::FaceTooSmall,
            ));
        }
        self.topo.check_closure()?;
        self.topo.check_nondegenerate(&self.tol)?;
        self.topo.check_convexity(&self.tol)?;
        self.check_thickness()?;
        Ok(())
    }

    /// Every face must have interior depth behind it, so slabs thinner than
    /// the tolerance are rejected as a whole.
    fn check_thickness(&self) -> Result<()> {
        for face in self.topo.faces.values() {
            let depth = self
                .topo
                .vertices
                .values()
                .map(|v| -face.plane.signed_distance(&v.point))
                .fold(0.0, f64::max);
            if depth <= self.tol.linear {
                return Err(PolyhedronError::DegenerateBrush(
                    TopologyError::ZeroAreaFace,
                ));
            }
        }
        Ok(())
    }

    /// Commit a candidate topology described as polygons, replacing `self`
    /// only when the candidate validates and stays inside `world_bounds`.
    pub(crate) fn commit(
        &mut self,
        positions: &[Point3],
        face_loops: &[Vec<usize>],
        world_bounds: &Aabb3,
    ) -> Result<()> {
        let mut candidate = Self::from_polygons(positions, face_loops, self.tol)?;
        let b = candidate.bounds();
        if !world_bounds.contains_point(&b.min, &self.tol)
            || !world_bounds.contains_point(&b.max, &self.tol)
        {
            return Err(PolyhedronError::WouldDegenerate);
        }
        candidate.merge_coplanar_faces();
        *self = candidate;
        Ok(())
    }
}
