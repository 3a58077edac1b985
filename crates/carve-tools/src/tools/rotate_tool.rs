//! Rotating brushes by dragging a rim handle around an axis.

use carve_kernel_math::{Aabb3, Dir3, Point3, Ray, Transform, Vec3};

use crate::drag::{
    pick_on_circle, reject_axis, signed_angle, snap_angle_about_axis, DragState, DragStatus,
    HandlePositionProposer,
};
use crate::grid::Grid;
use crate::handles::{BrushId, BrushMap};
use crate::tools::ToolState;

struct RotateDrag {
    state: DragState,
    proposer: HandlePositionProposer,
    snapshot: BrushMap,
    targets: Vec<BrushId>,
    center: Point3,
    axis: Dir3,
    applied_angle: f64,
}

/// Rotates a set of brushes about a fixed axis, snapping the swept angle.
pub struct RotateTool {
    grid: Grid,
    world_bounds: Aabb3,
    state: ToolState,
    drag: Option<RotateDrag>,
}

impl RotateTool {
    /// A new, inactive tool.
    pub fn new(grid: Grid, world_bounds: Aabb3) -> Self {
        Self {
            grid,
            world_bounds,
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

    /// Begin rotating `targets` about `axis` through `center`, dragging the
    /// rim handle at `handle`.
    pub fn begin_drag(
        &mut self,
        brushes: &BrushMap,
        targets: Vec<BrushId>,
        center: Point3,
        axis: Dir3,
        handle: Point3,
    ) -> bool {
        if self.state != ToolState::Hovering {
            return false;
        }
        let radius = reject_axis(&(handle - center), &axis).norm();
        if radius < 1e-9 || targets.is_empty() {
            return false;
        }
        let proposer = HandlePositionProposer::new(
            pick_on_circle(center, axis, radius),
            snap_angle_about_axis(self.grid, center, axis),
        );
        self.drag = Some(RotateDrag {
            state: DragState {
                initial_handle_position: handle,
                current_handle_position: handle,
                handle_offset: Vec3::zeros(),
            },
            proposer,
            snapshot: brushes.clone(),
            targets,
            center,
            axis,
            applied_angle: 0.0,
        });
        self.state = ToolState::Dragging;
        true
    }

    /// The total snapped angle applied so far.
    pub fn applied_angle(&self) -> f64 {
        self.drag.as_ref().map_or(0.0, |d| d.applied_angle)
    }

    /// Feed one pointer frame. The rotation is always applied to the
    /// pre-drag snapshot at the total swept angle, so repeated frames do
    /// not accumulate error.
    pub fn update_drag(&mut self, brushes: &mut BrushMap, ray: &Ray) -> DragStatus {
        let Some(drag) = self.drag.as_mut() else {
            return DragStatus::Deny;
        };
        let Some(proposed) = drag.proposer.propose(ray, &drag.state) else {
            return DragStatus::Continue;
        };
        let start = reject_axis(&(drag.state.initial_handle_position - drag.center), &drag.axis);
        let swept = reject_axis(&(proposed - drag.center), &drag.axis);
        let total = signed_angle(&start, &swept, &drag.axis);
        if (total - drag.applied_angle).abs() < 1e-12 {
            return DragStatus::Continue;
        }

        let rotation = Transform::rotation_about_axis(&drag.center, &drag.axis, total);
        let mut trial = drag.snapshot.clone();
        for &id in &drag.targets {
            let Some(brush) = trial.get_mut(id) else {
                continue;
            };
            if brush.transform(&rotation, &self.world_bounds).is_err() {
                return DragStatus::Continue;
            }
        }

        *brushes = trial;
        drag.applied_angle = total;
        drag.state.current_handle_position = proposed;
        DragStatus::Continue
    }

    /// End the drag, keeping the rotation.
    pub fn end_drag(&mut self) {
        self.drag = None;
        if self.state == ToolState::Dragging {
            self.state = ToolState::Hovering;
        }
    }

    /// Cancel the drag, restoring the pre-drag brushes.
    pub fn cancel_drag(&mut self, brushes: &mut BrushMap) {
        if let Some(drag) = self.drag.take() {
            *brushes = drag.snapshot;
        }
        if self.state == ToolState::Dragging {
            self.state = ToolState::Hovering;
        }
    }
}
