#![warn(missing_docs)]

//! Brushes: convex polyhedra carrying per-face texture attributes.
//!
//! A [`Brush`] pairs a [`Polyhedron`] with attribute records keyed by face
//! plane. Geometry mutations delegate to the polyhedron and then rebind the
//! records: a face that kept its plane keeps its record, a new face copies
//! the record of the surviving face with the nearest normal, and records of
//! vanished faces are dropped.

use carve_kernel_math::{Aabb3, Plane, Point3, Ray, Tolerance, Transform, Vec3};
use carve_kernel_poly::{ClipStatus, MoveOutcome, Polyhedron, PolyhedronError, Result};

mod attributes;

pub use attributes::{ContentFlags, FaceAttributes, SurfaceFlags, TextureProjection};

/// One face of a brush, as consumed by renderers and pickers.
#[derive(Debug, Clone, PartialEq)]
pub struct BrushFace {
    /// Boundary polygon, counter-clockwise from outside.
    pub polygon: Vec<Point3>,
    /// The face plane, normal pointing out.
    pub plane: Plane,
    /// Texture attributes bound to this face.
    pub attributes: FaceAttributes,
}

/// The pieces a brush clip produces. At least one side is present.
#[derive(Debug, Clone)]
pub struct BrushClipResult {
    /// The piece behind the clip plane.
    pub back: Option<Brush>,
    /// The piece in front of the clip plane.
    pub front: Option<Brush>,
}

/// A convex solid with textured faces.
#[derive(Debug, Clone)]
pub struct Brush {
    poly: Polyhedron,
    face_attrs: Vec<(Plane, FaceAttributes)>,
    bounds: Aabb3,
}

impl Brush {
    /// An axis-aligned box brush with the same attributes on every face.
    pub fn from_bounds(aabb: &Aabb3, attrs: FaceAttributes, tol: Tolerance) -> Result<Self> {
        let poly = Polyhedron::from_bounds(aabb, tol)?;
        Ok(Self::bind(poly, |_| attrs.clone()))
    }

    /// Rebuild a brush from stored face planes and their attributes, the
    /// load path of a map reader.
    pub fn from_faces(
        faces: &[(Plane, FaceAttributes)],
        world_bounds: &Aabb3,
        tol: Tolerance,
    ) -> Result<Self> {
        let planes: Vec<Plane> = faces.iter().map(|(p, _)| *p).collect();
        let poly = Polyhedron::from_planes(&planes, world_bounds, tol)?;
        let tol = *poly.tolerance();
        Ok(Self::bind(poly, |plane| {
            faces
                .iter()
                .find(|(p, _)| tol.planes_equal(p, plane))
                .or_else(|| {
                    faces
                        .iter()
                        .max_by(|(a, _), (b, _)| {
                            let da = a.normal.dot(&plane.normal);
                            let db = b.normal.dot(&plane.normal);
                            da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
                        })
                })
                .map(|(_, a)| a.clone())
                .unwrap_or_default()
        }))
    }

    fn bind(poly: Polyhedron, mut attrs_for: impl FnMut(&Plane) -> FaceAttributes) -> Self {
        let face_attrs = poly
            .topology()
            .faces
            .values()
            .map(|f| (f.plane, attrs_for(&f.plane)))
            .collect();
        let bounds = poly.bounds();
        Self {
            poly,
            face_attrs,
            bounds,
        }
    }

    /// The underlying polyhedron.
    pub fn polyhedron(&self) -> &Polyhedron {
        &self.poly
    }

    /// Cached axis-aligned bounds, refreshed by every mutation.
    pub fn bounds(&self) -> &Aabb3 {
        &self.bounds
    }

    /// Faces with their bound attributes, in stable arena order.
    pub fn faces(&self) -> Vec<BrushFace> {
        let tol = self.poly.tolerance();
        self.poly
            .topology()
            .faces
            .iter()
            .map(|(face_id, f)| {
                // Binding is refreshed after every mutation, so every face
                // has a record.
                let attributes = self
                    .face_attrs
                    .iter()
                    .find(|(p, _)| tol.planes_equal(p, &f.plane))
                    .map(|(_, a)| a.clone())
                    .unwrap_or_default();
                BrushFace {
                    polygon: self.poly.topology().face_points(face_id),
                    plane: f.plane,
                    attributes,
                }
            })
            .collect()
    }

    /// Attributes of the face on `plane`, if the brush has such a face.
    pub fn face_attributes(&self, plane: &Plane) -> Option<&FaceAttributes> {
        let tol = self.poly.tolerance();
        self.face_attrs
            .iter()
            .find(|(p, _)| tol.planes_equal(p, plane))
            .map(|(_, a)| a)
    }

    /// Replace the attributes of the face on `plane`.
    pub fn set_face_attributes(&mut self, plane: &Plane, attrs: FaceAttributes) -> Result<()> {
        let tol = *self.poly.tolerance();
        let slot = self
            .face_attrs
            .iter_mut()
            .find(|(p, _)| tol.planes_equal(p, plane))
            .ok_or(PolyhedronError::TargetNotFound)?;
        slot.1 = attrs;
        Ok(())
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Move the vertex at `position` by `delta`. See
    /// [`Polyhedron::move_vertex`].
    pub fn move_vertex(
        &mut self,
        position: &Point3,
        delta: &Vec3,
        world_bounds: &Aabb3,
    ) -> Result<MoveOutcome> {
        let outcome = self.poly.move_vertex(position, delta, world_bounds)?;
        self.rebind();
        Ok(outcome)
    }

    /// Move the edge centered at `center` by `delta`.
    pub fn move_edge(
        &mut self,
        center: &Point3,
        delta: &Vec3,
        world_bounds: &Aabb3,
    ) -> Result<MoveOutcome> {
        let outcome = self.poly.move_edge(center, delta, world_bounds)?;
        self.rebind();
        Ok(outcome)
    }

    /// Move the face whose centroid is `centroid` by `delta`.
    pub fn move_face(
        &mut self,
        centroid: &Point3,
        delta: &Vec3,
        world_bounds: &Aabb3,
    ) -> Result<MoveOutcome> {
        let outcome = self.poly.move_face(centroid, delta, world_bounds)?;
        self.rebind();
        Ok(outcome)
    }

    /// Translate the whole brush.
    pub fn translate(&mut self, delta: &Vec3, world_bounds: &Aabb3) -> Result<()> {
        self.poly.translate(delta, world_bounds)?;
        self.rebind();
        Ok(())
    }

    /// Apply an affine transform to the whole brush.
    pub fn transform(&mut self, t: &Transform, world_bounds: &Aabb3) -> Result<()> {
        self.poly.transform(t, world_bounds)?;
        self.rebind();
        Ok(())
    }

    /// Split the brush by `plane` into the piece behind and the piece in
    /// front. Fails with `EmptyResult` only when neither side has volume.
    pub fn clip(&self, plane: &Plane, world_bounds: &Aabb3) -> Result<BrushClipResult> {
        let back = self.clip_side(plane, world_bounds);
        let front = self.clip_side(&plane.flipped(), world_bounds);
        if back.is_none() && front.is_none() {
            return Err(PolyhedronError::EmptyResult);
        }
        Ok(BrushClipResult { back, front })
    }

    fn clip_side(&self, plane: &Plane, world_bounds: &Aabb3) -> Option<Brush> {
        let mut piece = self.clone();
        match piece.poly.clip(plane, world_bounds) {
            Ok(ClipStatus::Unchanged) => Some(piece),
            Ok(ClipStatus::Clipped) => {
                piece.rebind();
                Some(piece)
            }
            // A vanished or sliver side is simply absent from the result.
            Err(_) => None,
        }
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// True when the point is inside or on the brush.
    pub fn contains(&self, p: &Point3) -> bool {
        self.poly.contains(p)
    }

    /// Distance along `ray` to the nearest face hit.
    pub fn intersect_ray(&self, ray: &Ray) -> Option<f64> {
        self.poly.intersect_ray(ray)
    }

    /// Rebind attribute records to the current face set.
    fn rebind(&mut self) {
        let tol = *self.poly.tolerance();
        let old = std::mem::take(&mut self.face_attrs);
        self.face_attrs = self
            .poly
            .topology()
            .faces
            .values()
            .map(|f| {
                let attrs = old
                    .iter()
                    .find(|(p, _)| tol.planes_equal(p, &f.plane))
                    .or_else(|| {
                        old.iter().max_by(|(a, _), (b, _)| {
                            let da = a.normal.dot(&f.plane.normal);
                            let db = b.normal.dot(&f.plane.normal);
                            da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
                        })
                    })
                    .map(|(_, a)| a.clone())
                    .unwrap_or_default();
                (f.plane, attrs)
            })
            .collect();
        self.bounds = self.poly.bounds();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn world() -> Aabb3 {
        Aabb3::new(
            Point3::new(-4096.0, -4096.0, -4096.0),
            Point3::new(4096.0, 4096.0, 4096.0),
        )
    }

    fn box_brush() -> Brush {
        let aabb = Aabb3::new(Point3::new(0.0, 0.0, 0.0), Point3::new(64.0, 64.0, 64.0));
        Brush::from_bounds(&aabb, FaceAttributes::with_texture("base/floor"), Tolerance::DEFAULT)
            .unwrap()
    }

    #[test]
    fn box_brush_has_six_textured_faces() {
        let brush = box_brush();
        let faces = brush.faces();
        assert_eq!(faces.len(), 6);
        for face in &faces {
            assert_eq!(face.attributes.texture_name, "base/floor");
            assert_eq!(face.polygon.len(), 4);
        }
        assert_relative_eq!(brush.bounds().max.x, 64.0, epsilon = 1e-9);
    }

    #[test]
    fn attributes_survive_a_face_move() {
        let mut brush = box_brush();
        let top = Plane::from_point_and_normal(&Point3::new(0.0, 0.0, 64.0), &Vec3::z()).unwrap();
        brush
            .set_face_attributes(&top, FaceAttributes::with_texture("base/sky"))
            .unwrap();

        brush
            .move_face(
                &Point3::new(32.0, 32.0, 64.0),
                &Vec3::new(0.0, 0.0, 32.0),
                &world(),
            )
            .unwrap();

        let moved_top =
            Plane::from_point_and_normal(&Point3::new(0.0, 0.0, 96.0), &Vec3::z()).unwrap();
        // The plane moved, so the record rebinds by nearest normal.
        assert_eq!(
            brush.face_attributes(&moved_top).unwrap().texture_name,
            "base/sky"
        );
        assert_relative_eq!(brush.bounds().max.z, 96.0, epsilon = 1e-9);
    }

    #[test]
    fn clip_produces_two_textured_pieces() {
        let brush = box_brush();
        let plane = Plane::from_point_and_normal(&Point3::new(32.0, 0.0, 0.0), &Vec3::x()).unwrap();
        let result = brush.clip(&plane, &world()).unwrap();
        let back = result.back.unwrap();
        let front = result.front.unwrap();
        assert_relative_eq!(back.bounds().max.x, 32.0, epsilon = 1e-9);
        assert_relative_eq!(front.bounds().min.x, 32.0, epsilon = 1e-9);
        // Cap faces copy attributes from a surviving face.
        for face in back.faces() {
            assert_eq!(face.attributes.texture_name, "base/floor");
        }
    }

    #[test]
    fn clip_missing_the_brush_keeps_it_whole_on_one_side() {
        let brush = box_brush();
        let plane =
            Plane::from_point_and_normal(&Point3::new(200.0, 0.0, 0.0), &Vec3::x()).unwrap();
        let result = brush.clip(&plane, &world()).unwrap();
        assert!(result.back.is_some());
        assert!(result.front.is_none());
        assert_relative_eq!(result.back.unwrap().bounds().max.x, 64.0, epsilon = 1e-9);
    }

    #[test]
    fn load_path_rebuilds_from_planes() {
        let brush = box_brush();
        let stored: Vec<(Plane, FaceAttributes)> = brush
            .faces()
            .iter()
            .map(|f| (f.plane, f.attributes.clone()))
            .collect();
        let reloaded = Brush::from_faces(&stored, &world(), Tolerance::DEFAULT).unwrap();
        assert_eq!(reloaded.faces().len(), 6);
        assert_relative_eq!(reloaded.bounds().max.y, 64.0, epsilon = 1e-9);
        assert_eq!(reloaded.faces()[0].attributes.texture_name, "base/floor");
    }

    #[test]
    fn vertex_move_rebinds_every_new_face() {
        let mut brush = box_brush();
        brush
            .move_vertex(
                &Point3::new(64.0, 64.0, 64.0),
                &Vec3::new(16.0, 16.0, 16.0),
                &world(),
            )
            .unwrap();
        // Pulling a corner replaces three faces; every face must still carry
        // a record.
        for face in brush.faces() {
            assert_eq!(face.attributes.texture_name, "base/floor");
        }
        assert!(brush.face_attributes(&brush.faces()[0].plane).is_some());
    }
}
