//! Merging coplanar neighbor faces into single polygons.

use carve_kernel_math::Plane;

use crate::build::{canonicalize_loops, convex_loop};
use crate::Polyhedron;

impl Polyhedron {
    /// Merge faces whose planes coincide within tolerance and eliminate the
    /// collinear vertices the merge strands.
    ///
    /// Runs at the end of every mutating operation; running it again on an
    /// already canonical polyhedron changes nothing. A rebuild that fails to
    /// validate leaves the polyhedron as it was.
    pub fn merge_coplanar_faces(&mut self) {
        let tol = self.tol;
        let (positions, loops) = self.to_polygons();
        let planes: Vec<Plane> = self.topo.faces.values().map(|f| f.plane).collect();

        // Group loops by plane equality. Loops and planes share face order.
        let mut group_of = vec![usize::MAX; loops.len()];
        let mut group_planes: Vec<Plane> = Vec::new();
        for (i, plane) in planes.iter().enumerate() {
            let found = group_planes
                .iter()
                .position(|g| tol.planes_equal(g, plane));
            group_of[i] = match found {
                Some(g) => g,
                None => {
                    group_planes.push(*plane);
                    group_planes.len() - 1
                }
            };
        }

        let mut merged: Vec<Vec<usize>> = Vec::with_capacity(group_planes.len());
        for (g, plane) in group_planes.iter().enumerate() {
            let members: Vec<usize> = loops
                .iter()
                .enumerate()
                .filter(|(i, _)| group_of[*i] == g)
                .flat_map(|(_, l)| l.iter().copied())
                .collect();
            let mut unique = Vec::with_capacity(members.len());
            for idx in members {
                if !unique.contains(&idx) {
                    unique.push(idx);
                }
            }
            merged.push(convex_loop(&positions, unique, &plane.normal, &tol));
        }

        let (positions, merged) = canonicalize_loops(&positions, merged, &tol);
        if let Ok(candidate) = Self::from_polygons(&positions, &merged, tol) {
            *self = candidate;
        }
    }
}
