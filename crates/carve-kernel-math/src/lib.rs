#![warn(missing_docs)]

//! Math types for the carve brush geometry kernel.
//!
//! Thin wrappers around nalgebra providing domain-specific types for
//! interactive level-editor geometry: points, vectors, planes, rays,
//! bounding boxes, and the tolerance policy used by every comparison
//! in the kernel.

use nalgebra::{Matrix4, Unit, Vector2, Vector3, Vector4};
use serde::{Deserialize, Serialize};

/// A point in 3D space.
pub type Point3 = nalgebra::Point3<f64>;

/// A vector in 3D space.
pub type Vec3 = Vector3<f64>;

/// A unit (normalized) direction vector in 3D space.
pub type Dir3 = Unit<Vector3<f64>>;

/// A point in 2D texture/parameter space.
pub type Point2 = nalgebra::Point2<f64>;

/// A vector in 2D space.
pub type Vec2 = Vector2<f64>;

// =============================================================================
// Tolerance
// =============================================================================

/// Tolerance constants for geometric comparisons.
///
/// One linear epsilon is used for every position-equality, plane-membership,
/// and merge decision in the kernel, so that a vertex cannot oscillate
/// between merged and separate across successive small moves.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tolerance {
    /// Linear distance tolerance in world units.
    pub linear: f64,
    /// Angular tolerance for normal comparisons, as 1 - cos(angle).
    pub angular: f64,
}

impl Tolerance {
    /// Default tolerances for level-editor world scale (units ~ 1 texel).
    pub const DEFAULT: Self = Self {
        linear: 1e-3,
        angular: 1e-6,
    };

    /// Create a tolerance scaled to a given world unit size.
    pub fn for_world_scale(unit: f64) -> Self {
        Self {
            linear: unit * 1e-3,
            angular: 1e-6,
        }
    }

    /// Check if two points are coincident within tolerance.
    pub fn points_equal(&self, a: &Point3, b: &Point3) -> bool {
        (a - b).norm() < self.linear
    }

    /// Check if a scalar distance is effectively zero.
    pub fn is_zero(&self, d: f64) -> bool {
        d.abs() < self.linear
    }

    /// Check if two unit normals point the same way within tolerance.
    pub fn normals_equal(&self, a: &Vec3, b: &Vec3) -> bool {
        a.dot(b) > 1.0 - self.angular
    }

    /// Check if two angles in radians are equal within tolerance.
    pub fn angles_equal(&self, a: f64, b: f64) -> bool {
        (a - b).abs() < self.angular
    }

    /// Check if two planes are equal within tolerance (same orientation).
    pub fn planes_equal(&self, a: &Plane, b: &Plane) -> bool {
        self.normals_equal(&a.normal, &b.normal) && self.is_zero(a.distance - b.distance)
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Classification of a point against a plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointStatus {
    /// Strictly in front of the plane (positive side, outside).
    Above,
    /// On the plane within tolerance.
    Inside,
    /// Strictly behind the plane (negative side).
    Below,
}

// =============================================================================
// Plane
// =============================================================================

/// An oriented plane in normal + distance form.
///
/// Points `p` on the plane satisfy `normal · p == distance`. The normal is
/// kept unit length by construction; the positive side is "outside" for
/// brush face planes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Plane {
    /// Unit normal of the plane.
    pub normal: Vec3,
    /// Signed distance from the origin along the normal.
    pub distance: f64,
}

impl Plane {
    /// Create a plane from a (not necessarily unit) normal and a point on it.
    ///
    /// Returns `None` if the normal is degenerate.
    pub fn from_point_and_normal(point: &Point3, normal: &Vec3) -> Option<Self> {
        let n = normal.norm();
        if n < 1e-12 {
            return None;
        }
        let normal = normal / n;
        Some(Self {
            distance: normal.dot(&point.coords),
            normal,
        })
    }

    /// Create a plane through three points with normal `(b-a) × (c-a)`.
    ///
    /// Returns `None` if the points are (nearly) collinear.
    pub fn from_points(a: &Point3, b: &Point3, c: &Point3) -> Option<Self> {
        let normal = (b - a).cross(&(c - a));
        Self::from_point_and_normal(a, &normal)
    }

    /// A point on the plane (the projection of the origin).
    pub fn anchor(&self) -> Point3 {
        Point3::from(self.normal * self.distance)
    }

    /// Signed distance from a point to this plane (positive = in front).
    pub fn signed_distance(&self, p: &Point3) -> f64 {
        self.normal.dot(&p.coords) - self.distance
    }

    /// Classify a point against this plane.
    pub fn point_status(&self, p: &Point3, tol: &Tolerance) -> PointStatus {
        let d = self.signed_distance(p);
        if d > tol.linear {
            PointStatus::Above
        } else if d < -tol.linear {
            PointStatus::Below
        } else {
            PointStatus::Inside
        }
    }

    /// Orthogonal projection of a point onto this plane.
    pub fn project_point(&self, p: &Point3) -> Point3 {
        p - self.normal * self.signed_distance(p)
    }

    /// The plane with the same carrier but opposite orientation.
    pub fn flipped(&self) -> Self {
        Self {
            normal: -self.normal,
            distance: -self.distance,
        }
    }

    /// Translate the plane by a vector.
    pub fn translated(&self, delta: &Vec3) -> Self {
        Self {
            normal: self.normal,
            distance: self.distance + self.normal.dot(delta),
        }
    }

    /// Solve the intersection point of three planes.
    ///
    /// Returns `None` when the planes are (nearly) parallel or meet in a
    /// line rather than a point.
    pub fn triple_intersection(p1: &Plane, p2: &Plane, p3: &Plane) -> Option<Point3> {
        let n1 = &p1.normal;
        let n2 = &p2.normal;
        let n3 = &p3.normal;

        let det = n1.dot(&n2.cross(n3));
        if det.abs() < 1e-9 {
            return None;
        }

        let p = (n2.cross(n3) * p1.distance
            + n3.cross(n1) * p2.distance
            + n1.cross(n2) * p3.distance)
            / det;
        Some(Point3::from(p))
    }
}

// =============================================================================
// Line
// =============================================================================

/// An infinite line defined by a point and a unit direction.
#[derive(Debug, Clone, Copy)]
pub struct Line3 {
    /// A point on the line.
    pub point: Point3,
    /// Unit direction of the line.
    pub direction: Dir3,
}

impl Line3 {
    /// Create a line from a point and a (not necessarily unit) direction.
    pub fn new(point: Point3, direction: Vec3) -> Self {
        Self {
            point,
            direction: Dir3::new_normalize(direction),
        }
    }

    /// Evaluate the line at parameter `t`.
    pub fn at(&self, t: f64) -> Point3 {
        self.point + t * self.direction.as_ref()
    }

    /// Parameter of the orthogonal projection of `p` onto this line.
    pub fn project_param(&self, p: &Point3) -> f64 {
        (p - self.point).dot(self.direction.as_ref())
    }

    /// Orthogonal projection of `p` onto this line.
    pub fn project_point(&self, p: &Point3) -> Point3 {
        self.at(self.project_param(p))
    }
}

/// Closest point to `p` on the segment `[a, b]`.
pub fn closest_point_on_segment(p: &Point3, a: &Point3, b: &Point3) -> Point3 {
    let ab = b - a;
    let len_sq = ab.norm_squared();
    if len_sq < 1e-24 {
        return *a;
    }
    let t = ((p - a).dot(&ab) / len_sq).clamp(0.0, 1.0);
    a + ab * t
}

// =============================================================================
// Ray
// =============================================================================

/// A ray in 3D space defined by origin and unit direction.
#[derive(Debug, Clone, Copy)]
pub struct Ray {
    /// Origin point of the ray.
    pub origin: Point3,
    /// Unit direction of the ray.
    pub direction: Dir3,
}

impl Ray {
    /// Create a new ray from origin and direction.
    ///
    /// The direction will be normalized.
    pub fn new(origin: Point3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: Dir3::new_normalize(direction),
        }
    }

    /// Evaluate the ray at parameter `t`: `origin + t * direction`.
    #[inline]
    pub fn at(&self, t: f64) -> Point3 {
        self.origin + t * self.direction.as_ref()
    }

    /// Intersect with a plane.
    ///
    /// Returns the ray parameter of the hit, or `None` when the ray is
    /// parallel to the plane or the hit lies behind the origin.
    pub fn intersect_plane(&self, plane: &Plane) -> Option<f64> {
        let denom = plane.normal.dot(self.direction.as_ref());
        if denom.abs() < 1e-12 {
            return None;
        }
        let t = -plane.signed_distance(&self.origin) / denom;
        (t >= 0.0).then_some(t)
    }

    /// Test ray-AABB intersection using the slab method.
    ///
    /// Returns `Some((t_min, t_max))` with the entry and exit parameters,
    /// or `None` if the ray misses the box.
    pub fn intersect_aabb(&self, aabb: &Aabb3) -> Option<(f64, f64)> {
        let mut t_min = f64::NEG_INFINITY;
        let mut t_max = f64::INFINITY;

        for i in 0..3 {
            let d = self.direction[i];
            if d.abs() < 1e-12 {
                if self.origin[i] < aabb.min[i] || self.origin[i] > aabb.max[i] {
                    return None;
                }
            } else {
                let inv = 1.0 / d;
                let mut t1 = (aabb.min[i] - self.origin[i]) * inv;
                let mut t2 = (aabb.max[i] - self.origin[i]) * inv;
                if t1 > t2 {
                    std::mem::swap(&mut t1, &mut t2);
                }
                t_min = t_min.max(t1);
                t_max = t_max.min(t2);
            }
        }

        (t_max >= t_min && t_max >= 0.0).then_some((t_min.max(0.0), t_max))
    }

    /// Parameter of the point on this ray closest to the given line.
    ///
    /// Returns `None` when ray and line are parallel.
    pub fn closest_param_to_line(&self, line: &Line3) -> Option<f64> {
        let d1 = self.direction.as_ref();
        let d2 = line.direction.as_ref();
        let r = self.origin - line.point;

        let a = d1.dot(d1);
        let b = d1.dot(d2);
        let e = d2.dot(d2);
        let denom = a * e - b * b;
        if denom.abs() < 1e-12 {
            return None;
        }
        let c = d1.dot(&r);
        let f = d2.dot(&r);
        Some((b * f - c * e) / denom)
    }
}

// =============================================================================
// Bounding box
// =============================================================================

/// Axis-aligned bounding box in 3D.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb3 {
    /// Minimum corner.
    pub min: Point3,
    /// Maximum corner.
    pub max: Point3,
}

impl Aabb3 {
    /// Create an AABB from min and max corners.
    pub fn new(min: Point3, max: Point3) -> Self {
        Self { min, max }
    }

    /// Create an empty (inverted) AABB suitable for expansion.
    pub fn empty() -> Self {
        Self {
            min: Point3::new(f64::INFINITY, f64::INFINITY, f64::INFINITY),
            max: Point3::new(f64::NEG_INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
        }
    }

    /// Expand this AABB to include a point.
    pub fn include_point(&mut self, p: &Point3) {
        for i in 0..3 {
            self.min[i] = self.min[i].min(p[i]);
            self.max[i] = self.max[i].max(p[i]);
        }
    }

    /// Test if the box contains a point (boundary counts, within `tol`).
    pub fn contains_point(&self, p: &Point3, tol: &Tolerance) -> bool {
        (0..3).all(|i| p[i] >= self.min[i] - tol.linear && p[i] <= self.max[i] + tol.linear)
    }

    /// Test if two AABBs overlap (touching counts as overlap).
    pub fn overlaps(&self, other: &Aabb3) -> bool {
        (0..3).all(|i| self.min[i] <= other.max[i] && self.max[i] >= other.min[i])
    }

    /// Expand the AABB by a margin in all directions.
    pub fn expand(&mut self, margin: f64) {
        for i in 0..3 {
            self.min[i] -= margin;
            self.max[i] += margin;
        }
    }

    /// Center of the box.
    pub fn center(&self) -> Point3 {
        nalgebra::center(&self.min, &self.max)
    }

    /// Edge lengths of the box.
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// True if any extent is smaller than the tolerance.
    pub fn is_degenerate(&self, tol: &Tolerance) -> bool {
        let s = self.size();
        s.x < tol.linear || s.y < tol.linear || s.z < tol.linear
    }
}

// =============================================================================
// Transform
// =============================================================================

/// A 4x4 affine transformation matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct Transform {
    /// The underlying 4x4 matrix.
    pub matrix: Matrix4<f64>,
}

impl Transform {
    /// Identity transform.
    pub fn identity() -> Self {
        Self {
            matrix: Matrix4::identity(),
        }
    }

    /// Translation by `delta`.
    pub fn translation(delta: &Vec3) -> Self {
        let mut m = Matrix4::identity();
        m[(0, 3)] = delta.x;
        m[(1, 3)] = delta.y;
        m[(2, 3)] = delta.z;
        Self { matrix: m }
    }

    /// Rotation about an arbitrary axis through `center` by `angle` radians.
    ///
    /// Uses Rodrigues' rotation formula.
    pub fn rotation_about_axis(center: &Point3, axis: &Dir3, angle: f64) -> Self {
        let (s, c) = angle.sin_cos();
        let t = 1.0 - c;
        let (x, y, z) = (axis.as_ref().x, axis.as_ref().y, axis.as_ref().z);
        let mut r = Matrix4::identity();
        r[(0, 0)] = t * x * x + c;
        r[(0, 1)] = t * x * y - s * z;
        r[(0, 2)] = t * x * z + s * y;
        r[(1, 0)] = t * x * y + s * z;
        r[(1, 1)] = t * y * y + c;
        r[(1, 2)] = t * y * z - s * x;
        r[(2, 0)] = t * x * z - s * y;
        r[(2, 1)] = t * y * z + s * x;
        r[(2, 2)] = t * z * z + c;

        let to_origin = Self::translation(&(-center.coords));
        let back = Self::translation(&center.coords);
        back.then(&Self { matrix: r }).then(&to_origin)
    }

    /// Compose: apply `other` first, then `self`.
    pub fn then(&self, other: &Transform) -> Self {
        Self {
            matrix: self.matrix * other.matrix,
        }
    }

    /// Transform a point.
    pub fn apply_point(&self, p: &Point3) -> Point3 {
        let v = self.matrix * Vector4::new(p.x, p.y, p.z, 1.0);
        Point3::new(v.x, v.y, v.z)
    }

    /// Transform a direction vector (ignores translation).
    pub fn apply_vec(&self, v: &Vec3) -> Vec3 {
        let r = self.matrix * Vector4::new(v.x, v.y, v.z, 0.0);
        Vec3::new(r.x, r.y, r.z)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    #[test]
    fn plane_from_points_ccw_normal() {
        let p = Plane::from_points(
            &Point3::new(0.0, 0.0, 5.0),
            &Point3::new(1.0, 0.0, 5.0),
            &Point3::new(0.0, 1.0, 5.0),
        )
        .unwrap();
        assert_relative_eq!(p.normal.z, 1.0, epsilon = 1e-12);
        assert_relative_eq!(p.distance, 5.0, epsilon = 1e-12);
        assert_relative_eq!(p.signed_distance(&Point3::new(3.0, 4.0, 7.0)), 2.0, epsilon = 1e-12);
    }

    #[test]
    fn plane_from_collinear_points_fails() {
        let p = Plane::from_points(
            &Point3::new(0.0, 0.0, 0.0),
            &Point3::new(1.0, 1.0, 1.0),
            &Point3::new(2.0, 2.0, 2.0),
        );
        assert!(p.is_none());
    }

    #[test]
    fn triple_intersection_of_box_corner() {
        let px = Plane::from_point_and_normal(&Point3::new(4.0, 0.0, 0.0), &Vec3::x()).unwrap();
        let py = Plane::from_point_and_normal(&Point3::new(0.0, 5.0, 0.0), &Vec3::y()).unwrap();
        let pz = Plane::from_point_and_normal(&Point3::new(0.0, 0.0, 6.0), &Vec3::z()).unwrap();
        let p = Plane::triple_intersection(&px, &py, &pz).unwrap();
        assert_relative_eq!(p.x, 4.0, epsilon = 1e-12);
        assert_relative_eq!(p.y, 5.0, epsilon = 1e-12);
        assert_relative_eq!(p.z, 6.0, epsilon = 1e-12);
    }

    #[test]
    fn triple_intersection_parallel_fails() {
        let a = Plane::from_point_and_normal(&Point3::origin(), &Vec3::x()).unwrap();
        let b = Plane::from_point_and_normal(&Point3::new(1.0, 0.0, 0.0), &Vec3::x()).unwrap();
        let c = Plane::from_point_and_normal(&Point3::origin(), &Vec3::y()).unwrap();
        assert!(Plane::triple_intersection(&a, &b, &c).is_none());
    }

    #[test]
    fn ray_plane_intersection() {
        let plane = Plane::from_point_and_normal(&Point3::new(0.0, 0.0, 2.0), &Vec3::z()).unwrap();
        let ray = Ray::new(Point3::new(1.0, 1.0, 10.0), Vec3::new(0.0, 0.0, -1.0));
        let t = ray.intersect_plane(&plane).unwrap();
        assert_relative_eq!(t, 8.0, epsilon = 1e-12);

        // Behind the origin
        let away = Ray::new(Point3::new(0.0, 0.0, 10.0), Vec3::z());
        assert!(away.intersect_plane(&plane).is_none());
    }

    #[test]
    fn ray_aabb_slab() {
        let aabb = Aabb3::new(Point3::origin(), Point3::new(2.0, 2.0, 2.0));
        let ray = Ray::new(Point3::new(-1.0, 1.0, 1.0), Vec3::x());
        let (t0, t1) = ray.intersect_aabb(&aabb).unwrap();
        assert_relative_eq!(t0, 1.0, epsilon = 1e-12);
        assert_relative_eq!(t1, 3.0, epsilon = 1e-12);

        let miss = Ray::new(Point3::new(-1.0, 5.0, 1.0), Vec3::x());
        assert!(miss.intersect_aabb(&aabb).is_none());
    }

    #[test]
    fn ray_closest_to_line() {
        let ray = Ray::new(Point3::new(0.0, 0.0, 5.0), Vec3::new(0.0, 0.0, -1.0));
        let line = Line3::new(Point3::new(1.0, 0.0, 0.0), Vec3::y());
        let t = ray.closest_param_to_line(&line).unwrap();
        assert_relative_eq!(t, 5.0, epsilon = 1e-12);
    }

    #[test]
    fn segment_closest_point_clamps() {
        let a = Point3::origin();
        let b = Point3::new(10.0, 0.0, 0.0);
        let c = closest_point_on_segment(&Point3::new(20.0, 3.0, 0.0), &a, &b);
        assert_relative_eq!((c - b).norm(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn rotation_about_offset_axis() {
        let center = Point3::new(1.0, 0.0, 0.0);
        let t = Transform::rotation_about_axis(&center, &Dir3::new_normalize(Vec3::z()), PI);
        let r = t.apply_point(&Point3::new(2.0, 0.0, 0.0));
        assert_relative_eq!(r.x, 0.0, epsilon = 1e-12);
        assert_relative_eq!(r.y, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn tolerance_plane_equality() {
        let tol = Tolerance::DEFAULT;
        let a = Plane::from_point_and_normal(&Point3::new(0.0, 0.0, 1.0), &Vec3::z()).unwrap();
        let b = Plane::from_point_and_normal(&Point3::new(5.0, 5.0, 1.0 + 1e-5), &Vec3::z()).unwrap();
        assert!(tol.planes_equal(&a, &b));
        assert!(!tol.planes_equal(&a, &a.flipped()));
    }
}
