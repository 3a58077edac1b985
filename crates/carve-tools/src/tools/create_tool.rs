//! Dragging out new box brushes on a base plane.

use carve_kernel_brush::{Brush, FaceAttributes};
use carve_kernel_math::{Aabb3, Plane, Point3, Ray, Tolerance, Vec3};
use carve_kernel_poly::{PolyhedronError, Result};

use crate::drag::{pick_on_plane, snap_to_grid, DragState, HandlePositionProposer};
use crate::grid::Grid;
use crate::tools::ToolState;

struct CreateDrag {
    state: DragState,
    proposer: HandlePositionProposer,
    base_plane: Plane,
    first_corner: Point3,
    second_corner: Point3,
}

/// Creates box brushes by dragging a footprint across a base plane; the
/// box is extruded by one default height along the flat axis.
pub struct CreateBrushTool {
    grid: Grid,
    world_bounds: Aabb3,
    tol: Tolerance,
    /// Attributes applied to every face of a created brush.
    pub attributes: FaceAttributes,
    state: ToolState,
    drag: Option<CreateDrag>,
}

impl CreateBrushTool {
    /// A new, inactive tool.
    pub fn new(grid: Grid, world_bounds: Aabb3, tol: Tolerance) -> Self {
        Self {
            grid,
            world_bounds,
            tol,
            attributes: FaceAttributes::default(),
            state: ToolState::Inactive,
            drag: None,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ToolState {
        self.state
    }

    /// Activate the tool.
    pub fn activate(&mut self) {
        self.state = ToolState::Hovering;
    }

    /// Deactivate, dropping any drag.
    pub fn deactivate(&mut self) {
        self.drag = None;
        self.state = ToolState::Inactive;
    }

    /// Anchor the first corner where `ray` hits `base_plane`.
    pub fn begin_drag(&mut self, ray: &Ray, base_plane: Plane) -> bool {
        if self.state != ToolState::Hovering {
            return false;
        }
        let Some(t) = ray.intersect_plane(&base_plane) else {
            return false;
        };
        let corner = self.grid.snap_point(&ray.at(t));
        self.drag = Some(CreateDrag {
            state: DragState {
                initial_handle_position: corner,
                current_handle_position: corner,
                handle_offset: Vec3::zeros(),
            },
            proposer: HandlePositionProposer::new(
                pick_on_plane(base_plane),
                snap_to_grid(self.grid),
            ),
            base_plane,
            first_corner: corner,
            second_corner: corner,
        });
        self.state = ToolState::Dragging;
        true
    }

    /// Track the opposite footprint corner.
    pub fn update_drag(&mut self, ray: &Ray) {
        let Some(drag) = self.drag.as_mut() else {
            return;
        };
        let Some(proposed) = drag.proposer.propose(ray, &drag.state) else {
            return;
        };
        drag.state.current_handle_position = proposed;
        drag.second_corner = proposed;
    }

    /// The bounds the current drag would create.
    pub fn preview_bounds(&self) -> Option<Aabb3> {
        let drag = self.drag.as_ref()?;
        Some(self.drag_bounds(drag))
    }

    fn drag_bounds(&self, drag: &CreateDrag) -> Aabb3 {
        let mut aabb = Aabb3::empty();
        aabb.include_point(&drag.first_corner);
        aabb.include_point(&drag.second_corner);
        // Extrude the base plane's axis away from the plane. Other flat
        // axes stay flat and fail construction.
        let height = self.grid.size.max(1.0);
        for i in 0..3 {
            if aabb.max[i] - aabb.min[i] < self.tol.linear
                && drag.base_plane.normal[i].abs() > 0.5
            {
                if drag.base_plane.normal[i] < 0.0 {
                    aabb.min[i] -= height;
                } else {
                    aabb.max[i] += height;
                }
            }
        }
        aabb
    }

    /// Finish the drag and build the brush. Fails with `DegenerateBrush`
    /// when the footprint never opened up, leaving the tool hovering.
    pub fn end_drag(&mut self) -> Result<Brush> {
        let drag = self.drag.take().ok_or(PolyhedronError::TargetNotFound)?;
        self.state = ToolState::Hovering;
        let aabb = self.drag_bounds(&drag);
        if !self.world_bounds.contains_point(&aabb.min, &self.tol)
            || !self.world_bounds.contains_point(&aabb.max, &self.tol)
        {
            return Err(PolyhedronError::WouldDegenerate);
        }
        Brush::from_bounds(&aabb, self.attributes.clone(), self.tol)
    }

    /// Cancel the drag without creating anything.
    pub fn cancel_drag(&mut self) {
        self.drag = None;
        if self.state == ToolState::Dragging {
            self.state = ToolState::Hovering;
        }
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

    fn ground() -> Plane {
        Plane::from_point_and_normal(&Point3::origin(), &Vec3::z()).unwrap()
    }

    fn down_ray_at(x: f64, y: f64) -> Ray {
        Ray::new(Point3::new(x, y, 100.0), Vec3::new(0.0, 0.0, -1.0))
    }

    #[test]
    fn drag_out_a_box_on_the_ground() {
        let mut tool = CreateBrushTool::new(Grid::new(16.0), world(), Tolerance::DEFAULT);
        tool.activate();

        assert!(tool.begin_drag(&down_ray_at(3.0, 2.0), ground()));
        assert_eq!(tool.state(), ToolState::Dragging);
        tool.update_drag(&down_ray_at(61.0, 30.0));

        let brush = tool.end_drag().unwrap();
        let b = brush.bounds();
        assert_relative_eq!(b.min.x, 0.0, epsilon = 1e-9);
        assert_relative_eq!(b.max.x, 64.0, epsilon = 1e-9);
        assert_relative_eq!(b.max.y, 32.0, epsilon = 1e-9);
        // Flat on the ground, extruded up one grid step.
        assert_relative_eq!(b.min.z, 0.0, epsilon = 1e-9);
        assert_relative_eq!(b.max.z, 16.0, epsilon = 1e-9);
        assert_eq!(tool.state(), ToolState::Hovering);
    }

    #[test]
    fn degenerate_footprint_fails() {
        let mut tool = CreateBrushTool::new(Grid::new(16.0), world(), Tolerance::DEFAULT);
        tool.activate();
        tool.begin_drag(&down_ray_at(3.0, 2.0), ground());
        // No movement: the footprint is a point, the box has two flat axes
        // but only the plane axis is extruded.
        assert!(tool.end_drag().is_err());
    }

    #[test]
    fn cancel_creates_nothing() {
        let mut tool = CreateBrushTool::new(Grid::new(16.0), world(), Tolerance::DEFAULT);
        tool.activate();
        tool.begin_drag(&down_ray_at(3.0, 2.0), ground());
        tool.cancel_drag();
        assert_eq!(tool.state(), ToolState::Hovering);
        assert!(tool.preview_bounds().is_none());
    }
}
