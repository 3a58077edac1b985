//! The editor grid: spatial and angular snapping.

use std::f64::consts::PI;

use carve_kernel_math::{Point3, Vec3};

/// A uniform snapping grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Grid {
    /// Grid spacing in world units.
    pub size: f64,
    /// Angular snap increment in radians.
    pub angle: f64,
}

impl Grid {
    /// 15 degree default angular increment.
    pub const DEFAULT_ANGLE: f64 = PI / 12.0;

    /// A grid with the given spacing and the default angular increment.
    pub fn new(size: f64) -> Self {
        Self {
            size: size.max(f64::MIN_POSITIVE),
            angle: Self::DEFAULT_ANGLE,
        }
    }

    /// Snap a scalar to the nearest grid multiple.
    pub fn snap(&self, v: f64) -> f64 {
        (v / self.size).round() * self.size
    }

    /// Snap each component of a point.
    pub fn snap_point(&self, p: &Point3) -> Point3 {
        Point3::new(self.snap(p.x), self.snap(p.y), self.snap(p.z))
    }

    /// Snap each component of a displacement.
    pub fn snap_delta(&self, d: &Vec3) -> Vec3 {
        Vec3::new(self.snap(d.x), self.snap(d.y), self.snap(d.z))
    }

    /// Snap an angle to the nearest increment.
    pub fn snap_angle(&self, a: f64) -> f64 {
        (a / self.angle).round() * self.angle
    }
}

impl Default for Grid {
    fn default() -> Self {
        Self::new(16.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn scalar_and_point_snapping() {
        let grid = Grid::new(16.0);
        assert_relative_eq!(grid.snap(23.0), 16.0);
        assert_relative_eq!(grid.snap(-9.0), -16.0);
        let p = grid.snap_point(&Point3::new(7.0, 25.0, -3.0));
        assert_eq!(p, Point3::new(0.0, 32.0, 0.0));
    }

    #[test]
    fn angle_snapping_uses_fifteen_degrees() {
        let grid = Grid::new(16.0);
        let snapped = grid.snap_angle(0.3);
        assert_relative_eq!(snapped, PI / 12.0, epsilon = 1e-12);
    }
}
