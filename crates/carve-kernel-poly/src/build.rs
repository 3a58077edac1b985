//! Constructors: axis-aligned boxes, half-space intersections, convex hulls.

use carve_kernel_math::{Aabb3, Plane, Point3, PointStatus, Tolerance, Vec3};
use carve_kernel_topo::TopologyError;

use crate::{Polyhedron, PolyhedronError, Result};

impl Polyhedron {
    /// The canonical 8-vertex, 6-face box filling `aabb`.
    pub fn from_bounds(aabb: &Aabb3, tol: Tolerance) -> Result<Self> {
        if aabb.is_degenerate(&tol) {
            return Err(PolyhedronError::DegenerateBrush(
                TopologyError::ZeroAreaFace,
            ));
        }
        let (lo, hi) = (aabb.min, aabb.max);
        let positions = [
            Point3::new(lo.x, lo.y, lo.z),
            Point3::new(hi.x, lo.y, lo.z),
            Point3::new(hi.x, hi.y, lo.z),
            Point3::new(lo.x, hi.y, lo.z),
            Point3::new(lo.x, lo.y, hi.z),
            Point3::new(hi.x, lo.y, hi.z),
            Point3::new(hi.x, hi.y, hi.z),
            Point3::new(lo.x, hi.y, hi.z),
        ];
        // Counter-clockwise seen from outside.
        let face_loops = [
            vec![0, 3, 2, 1],
            vec![4, 5, 6, 7],
            vec![0, 1, 5, 4],
            vec![2, 3, 7, 6],
            vec![0, 4, 7, 3],
            vec![1, 2, 6, 5],
        ];
        Self::from_polygons(&positions, &face_loops, tol)
    }

    /// Intersect the half-spaces behind `planes` into a bounded solid.
    ///
    /// Candidate vertices come from all plane triples, filtered to those on
    /// or behind every plane, then deduplicated by tolerance. Planes that
    /// end up supporting fewer than three vertices are dropped as redundant.
    /// An unbounded or empty configuration fails with `DegenerateBrush`.
    pub fn from_planes(planes: &[Plane], world_bounds: &Aabb3, tol: Tolerance) -> Result<Self> {
        let mut vertices: Vec<Point3> = Vec::new();

        for i in 0..planes.len() {
            for j in (i + 1)..planes.len() {
                for k in (j + 1)..planes.len() {
                    let Some(p) = Plane::triple_intersection(&planes[i], &planes[j], &planes[k])
                    else {
                        continue;
                    };
                    if !planes
                        .iter()
                        .all(|pl| pl.point_status(&p, &tol) != PointStatus::Above)
                    {
                        continue;
                    }
                    if !vertices.iter().any(|v| tol.points_equal(v, &p)) {
                        vertices.push(p);
                    }
                }
            }
        }

        if vertices.len() < 4 {
            return Err(PolyhedronError::DegenerateBrush(
                TopologyError::ZeroAreaFace,
            ));
        }
        if !vertices.iter().all(|v| world_bounds.contains_point(v, &tol)) {
            return Err(PolyhedronError::DegenerateBrush(
                TopologyError::NotConvex,
            ));
        }

        let (positions, face_loops) = assemble_faces(&vertices, planes, &tol)?;
        Self::from_polygons(&positions, &face_loops, tol)
    }

    /// The convex hull of a point set, as the intersection of its supporting
    /// planes. Coplanar faces come out merged, so the result is canonical.
    pub fn convex_hull(points: &[Point3], tol: Tolerance) -> Result<Self> {
        let mut supports: Vec<Plane> = Vec::new();

        for i in 0..points.len() {
            for j in (i + 1)..points.len() {
                for k in (j + 1)..points.len() {
                    let Some(plane) = Plane::from_points(&points[i], &points[j], &points[k])
                    else {
                        continue;
                    };
                    let mut above = false;
                    let mut below = false;
                    for p in points {
                        match plane.point_status(p, &tol) {
                            PointStatus::Above => above = true,
                            PointStatus::Below => below = true,
                            PointStatus::Inside => {}
                        }
                        if above && below {
                            break;
                        }
                    }
                    let oriented = match (above, below) {
                        (false, _) => plane,
                        (true, false) => plane.flipped(),
                        (true, true) => continue,
                    };
                    if !supports.iter().any(|s| tol.planes_equal(s, &oriented)) {
                        supports.push(oriented);
                    }
                }
            }
        }

        if supports.len() < 4 {
            return Err(PolyhedronError::DegenerateBrush(
                TopologyError::ZeroAreaFace,
            ));
        }

        // Interior points fall out here: they sit on no supporting plane.
        let mut hull_points: Vec<Point3> = Vec::new();
        for p in points {
            let on_support = supports
                .iter()
                .any(|s| s.point_status(p, &tol) == PointStatus::Inside);
            if on_support && !hull_points.iter().any(|q| tol.points_equal(q, p)) {
                hull_points.push(*p);
            }
        }

        let (positions, face_loops) = assemble_faces(&hull_points, &supports, &tol)?;
        Self::from_polygons(&positions, &face_loops, tol)
    }
}

/// Build one winding-sorted index loop per plane from a shared vertex set,
/// dropping planes with fewer than three members and compacting away unused
/// positions.
pub(crate) fn assemble_faces(
    vertices: &[Point3],
    planes: &[Plane],
    tol: &Tolerance,
) -> Result<(Vec<Point3>, Vec<Vec<usize>>)> {
    let mut loops: Vec<Vec<usize>> = Vec::new();

    for plane in planes {
        let members: Vec<usize> = (0..vertices.len())
            .filter(|&i| plane.point_status(&vertices[i], tol) == PointStatus::Inside)
            .collect();
        if members.len() < 3 {
            continue;
        }
        let loop_indices = convex_loop(vertices, members, &plane.normal, tol);
        if loop_indices.len() < 3 {
            continue;
        }
        loops.push(loop_indices);
    }

    if loops.len() < 4 {
        return Err(PolyhedronError::DegenerateBrush(
            TopologyError::OpenSurface,
        ));
    }

    Ok(compact_loops(vertices, loops))
}

/// Boundary loop of a coplanar point set, counter-clockwise around `normal`.
///
/// Sorts by angle about the centroid, then peels off points that do not
/// make a left turn: points interior to the polygon and points collinear on
/// its boundary both disappear here, which keeps face loops strictly convex.
pub(crate) fn convex_loop(
    vertices: &[Point3],
    mut members: Vec<usize>,
    normal: &Vec3,
    tol: &Tolerance,
) -> Vec<usize> {
    sort_by_winding(vertices, &mut members, normal);

    loop {
        let n = members.len();
        if n < 3 {
            return members;
        }
        let mut removed = false;
        let mut kept = Vec::with_capacity(n);
        for i in 0..n {
            let prev = vertices[members[(i + n - 1) % n]];
            let here = vertices[members[i]];
            let next = vertices[members[(i + 1) % n]];
            let turn = (here - prev).cross(&(next - here)).dot(normal);
            if turn <= tol.linear * (next - prev).norm() {
                removed = true;
            } else {
                kept.push(members[i]);
            }
        }
        if !removed {
            return members;
        }
        members = kept;
    }
}

/// Remove vertices collinear with their loop neighbors, drop loops that
/// shrink below a triangle, then compact away unused positions.
pub(crate) fn canonicalize_loops(
    positions: &[Point3],
    loops: Vec<Vec<usize>>,
    tol: &Tolerance,
) -> (Vec<Point3>, Vec<Vec<usize>>) {
    let loops: Vec<Vec<usize>> = loops
        .into_iter()
        .map(|mut loop_indices| {
            loop {
                let n = loop_indices.len();
                if n < 3 {
                    break;
                }
                let mut removed = false;
                let mut kept = Vec::with_capacity(n);
                for i in 0..n {
                    let prev = positions[loop_indices[(i + n - 1) % n]];
                    let here = positions[loop_indices[i]];
                    let next = positions[loop_indices[(i + 1) % n]];
                    let chord = next - prev;
                    let off = (here - prev).cross(&chord).norm();
                    if chord.norm() > tol.linear && off < tol.linear * chord.norm() {
                        removed = true;
                    } else {
                        kept.push(loop_indices[i]);
                    }
                }
                if !removed {
                    break;
                }
                loop_indices = kept;
            }
            loop_indices
        })
        .filter(|l| l.len() >= 3)
        .collect();

    compact_loops(positions, loops)
}

fn compact_loops(
    vertices: &[Point3],
    mut loops: Vec<Vec<usize>>,
) -> (Vec<Point3>, Vec<Vec<usize>>) {
    let mut remap = vec![usize::MAX; vertices.len()];
    let mut positions = Vec::new();
    for loop_indices in &mut loops {
        for idx in loop_indices.iter_mut() {
            if remap[*idx] == usize::MAX {
                remap[*idx] = positions.len();
                positions.push(vertices[*idx]);
            }
            *idx = remap[*idx];
        }
    }
    (positions, loops)
}

/// Sort vertex indices counter-clockwise around `normal` as seen from the
/// normal side, by angle about their centroid.
pub(crate) fn sort_by_winding(vertices: &[Point3], indices: &mut [usize], normal: &Vec3) {
    let centroid = indices
        .iter()
        .fold(Vec3::zeros(), |acc, &i| acc + vertices[i].coords)
        / indices.len() as f64;

    let reference = if normal.x.abs() < 0.9 {
        Vec3::x()
    } else {
        Vec3::y()
    };
    let u = normal.cross(&reference).normalize();
    let v = normal.cross(&u).normalize();

    indices.sort_by(|&a, &b| {
        let da = vertices[a].coords - centroid;
        let db = vertices[b].coords - centroid;
        let angle_a = da.dot(&v).atan2(da.dot(&u));
        let angle_b = db.dot(&v).atan2(db.dot(&u));
        angle_a.partial_cmp(&angle_b).unwrap_or(std::cmp::Ordering::Equal)
    });
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

    #[test]
    fn box_counts_and_volume() {
        let aabb = Aabb3::new(Point3::new(0.0, 0.0, 0.0), Point3::new(2.0, 3.0, 4.0));
        let poly = Polyhedron::from_bounds(&aabb, Tolerance::DEFAULT).unwrap();
        assert_eq!(poly.vertex_count(), 8);
        assert_eq!(poly.edge_count(), 12);
        assert_eq!(poly.face_count(), 6);
        assert_relative_eq!(poly.volume(), 24.0, epsilon = 1e-9);
        assert!(poly.is_valid());
    }

    #[test]
    fn degenerate_box_rejected() {
        let aabb = Aabb3::new(Point3::new(0.0, 0.0, 0.0), Point3::new(2.0, 3.0, 0.0));
        assert!(Polyhedron::from_bounds(&aabb, Tolerance::DEFAULT).is_err());
    }

    fn box_planes(lo: Point3, hi: Point3) -> Vec<Plane> {
        vec![
            Plane::from_point_and_normal(&hi, &Vec3::x()).unwrap(),
            Plane::from_point_and_normal(&lo, &-Vec3::x()).unwrap(),
            Plane::from_point_and_normal(&hi, &Vec3::y()).unwrap(),
            Plane::from_point_and_normal(&lo, &-Vec3::y()).unwrap(),
            Plane::from_point_and_normal(&hi, &Vec3::z()).unwrap(),
            Plane::from_point_and_normal(&lo, &-Vec3::z()).unwrap(),
        ]
    }

    #[test]
    fn half_space_intersection_builds_known_box() {
        let planes = box_planes(Point3::new(-8.0, -8.0, 0.0), Point3::new(8.0, 8.0, 16.0));
        let poly = Polyhedron::from_planes(&planes, &world(), Tolerance::DEFAULT).unwrap();
        assert_eq!(poly.vertex_count(), 8);
        assert_eq!(poly.face_count(), 6);
        let b = poly.bounds();
        assert_relative_eq!(b.min.x, -8.0, epsilon = 1e-9);
        assert_relative_eq!(b.max.z, 16.0, epsilon = 1e-9);
    }

    #[test]
    fn redundant_plane_is_dropped() {
        let mut planes = box_planes(Point3::new(0.0, 0.0, 0.0), Point3::new(8.0, 8.0, 8.0));
        // A seventh plane entirely outside the box.
        planes.push(Plane::from_point_and_normal(&Point3::new(100.0, 0.0, 0.0), &Vec3::x()).unwrap());
        let poly = Polyhedron::from_planes(&planes, &world(), Tolerance::DEFAULT).unwrap();
        assert_eq!(poly.face_count(), 6);
    }

    #[test]
    fn unbounded_configuration_rejected() {
        let mut planes = box_planes(Point3::new(0.0, 0.0, 0.0), Point3::new(8.0, 8.0, 8.0));
        planes.remove(4); // open the top
        assert!(Polyhedron::from_planes(&planes, &world(), Tolerance::DEFAULT).is_err());
    }

    #[test]
    fn contradictory_planes_rejected() {
        let a = Plane::from_point_and_normal(&Point3::new(0.0, 0.0, 0.0), &Vec3::x()).unwrap();
        let b = Plane::from_point_and_normal(&Point3::new(1.0, 0.0, 0.0), &-Vec3::x()).unwrap();
        assert!(Polyhedron::from_planes(&[a, b], &world(), Tolerance::DEFAULT).is_err());
    }

    #[test]
    fn hull_of_box_corners_with_interior_point() {
        let mut points = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(4.0, 0.0, 0.0),
            Point3::new(4.0, 4.0, 0.0),
            Point3::new(0.0, 4.0, 0.0),
            Point3::new(0.0, 0.0, 4.0),
            Point3::new(4.0, 0.0, 4.0),
            Point3::new(4.0, 4.0, 4.0),
            Point3::new(0.0, 4.0, 4.0),
        ];
        points.push(Point3::new(2.0, 2.0, 2.0)); // interior, must vanish
        let poly = Polyhedron::convex_hull(&points, Tolerance::DEFAULT).unwrap();
        assert_eq!(poly.vertex_count(), 8);
        assert_eq!(poly.face_count(), 6);
        assert_relative_eq!(poly.volume(), 64.0, epsilon = 1e-9);
    }

    #[test]
    fn hull_of_tetrahedron() {
        let points = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(8.0, 0.0, 0.0),
            Point3::new(0.0, 8.0, 0.0),
            Point3::new(0.0, 0.0, 8.0),
        ];
        let poly = Polyhedron::convex_hull(&points, Tolerance::DEFAULT).unwrap();
        assert_eq!(poly.vertex_count(), 4);
        assert_eq!(poly.face_count(), 4);
        assert_eq!(poly.edge_count(), 6);
    }

    #[test]
    fn hull_of_coplanar_points_rejected() {
        let points = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(8.0, 0.0, 0.0),
            Point3::new(8.0, 8.0, 0.0),
            Point3::new(0.0, 8.0, 0.0),
        ];
        assert!(Polyhedron::convex_hull(&points, Tolerance::DEFAULT).is_err());
    }
}
