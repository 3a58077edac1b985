#![warn(missing_docs)]

//! The carve brush geometry kernel.
//!
//! Convex half-edge polyhedra for level-editor brushes, per-face texture
//! attributes, and the interactive tool layer that edits them. This facade
//! re-exports the kernel crates under one roof:
//!
//! - [`math`]: points, planes, rays, bounds, tolerances.
//! - [`topo`]: the half-edge arena.
//! - [`poly`]: polyhedron construction, clipping, vertex moves, queries.
//! - [`brush`]: brushes with textured faces.
//! - [`tools`]: grids, handles, drag tracking, and the editing tools.

pub use carve_kernel_brush as brush;
pub use carve_kernel_math as math;
pub use carve_kernel_poly as poly;
pub use carve_kernel_topo as topo;
pub use carve_tools as tools;

pub use carve_kernel_brush::{Brush, BrushClipResult, BrushFace, FaceAttributes};
pub use carve_kernel_math::{Aabb3, Dir3, Plane, Point3, Ray, Tolerance, Vec3};
pub use carve_kernel_poly::{ClipStatus, MoveOutcome, Polyhedron, PolyhedronError};
pub use carve_tools::{BrushId, BrushMap, Grid, HandleManager};
