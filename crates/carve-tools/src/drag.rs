//! Composable drag handling: pickers map pointer rays to candidate handle
//! positions, snappers quantize them, and the tracker runs the drag loop
//! against a delegate.
//!
//! A picker miss or a snap miss yields no proposal for that frame and the
//! drag keeps its last good position, so handles never jump when the
//! pointer leaves the picking geometry.

use carve_kernel_math::{Dir3, Line3, Plane, Point3, Ray, Vec3};

use crate::grid::Grid;

/// The positions a drag is anchored to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragState {
    /// Handle position when the drag started (or was last reset).
    pub initial_handle_position: Point3,
    /// Handle position of the last accepted frame.
    pub current_handle_position: Point3,
    /// Offset from the initial pick hit to the handle, applied to every
    /// subsequent pick so the handle does not jump to the cursor.
    pub handle_offset: Vec3,
}

/// Maps a pointer ray to a raw handle position.
pub type DragHandlePicker = Box<dyn FnMut(&Ray, &DragState) -> Option<Point3>>;

/// Quantizes a picked handle position.
pub type DragHandleSnapper = Box<dyn FnMut(&Ray, &DragState, Point3) -> Option<Point3>>;

/// A snapper composed after a picker.
pub struct HandlePositionProposer {
    pick: DragHandlePicker,
    snap: DragHandleSnapper,
}

impl HandlePositionProposer {
    /// Compose `snap` after `pick`.
    pub fn new(pick: DragHandlePicker, snap: DragHandleSnapper) -> Self {
        Self { pick, snap }
    }

    /// Propose a handle position for this frame's pointer ray.
    pub fn propose(&mut self, ray: &Ray, state: &DragState) -> Option<Point3> {
        let picked = (self.pick)(ray, state)?;
        (self.snap)(ray, state, picked)
    }
}

// =============================================================================
// Pickers
// =============================================================================

/// Drag along an infinite line.
pub fn pick_on_line(line: Line3) -> DragHandlePicker {
    Box::new(move |ray, state| {
        let t = ray.closest_param_to_line(&line)?;
        Some(line.project_point(&ray.at(t)) + state.handle_offset)
    })
}

/// Drag across a plane.
pub fn pick_on_plane(plane: Plane) -> DragHandlePicker {
    Box::new(move |ray, state| {
        let t = ray.intersect_plane(&plane)?;
        Some(ray.at(t) + state.handle_offset)
    })
}

/// Drag around a fixed-radius circle: hits on the circle's plane project
/// radially onto the rim.
pub fn pick_on_circle(center: Point3, normal: Dir3, radius: f64) -> DragHandlePicker {
    Box::new(move |ray, state| {
        let plane = Plane::from_point_and_normal(&center, normal.as_ref())?;
        let t = ray.intersect_plane(&plane)?;
        // Offset the hit before projecting so the proposal stays on the rim.
        let spoke = ray.at(t) + state.handle_offset - center;
        let len = spoke.norm();
        if len < 1e-9 {
            return None;
        }
        Some(center + spoke * (radius / len))
    })
}

/// Drag across brush surfaces: the caller supplies the ray cast and the
/// picker reports the nearest hit.
pub fn pick_on_surface(
    mut cast: impl FnMut(&Ray) -> Option<Point3> + 'static,
) -> DragHandlePicker {
    Box::new(move |ray, state| Some(cast(ray)? + state.handle_offset))
}

// =============================================================================
// Snappers
// =============================================================================

/// Pass the picked position through untouched.
pub fn snap_nothing() -> DragHandleSnapper {
    Box::new(|_, _, proposed| Some(proposed))
}

/// Snap the displacement from the initial handle position to the grid, so a
/// handle that starts off-grid stays off-grid by the same amount.
pub fn snap_delta_to_grid(grid: Grid) -> DragHandleSnapper {
    Box::new(move |_, state, proposed| {
        let delta = proposed - state.initial_handle_position;
        Some(state.initial_handle_position + grid.snap_delta(&delta))
    })
}

/// Snap the proposed position itself to the grid.
pub fn snap_to_grid(grid: Grid) -> DragHandleSnapper {
    Box::new(move |_, _, proposed| Some(grid.snap_point(&proposed)))
}

/// Snap the angle swept about `axis` since the drag started.
pub fn snap_angle_about_axis(grid: Grid, center: Point3, axis: Dir3) -> DragHandleSnapper {
    Box::new(move |_, state, proposed| {
        let start = reject_axis(&(state.initial_handle_position - center), &axis);
        let swept = reject_axis(&(proposed - center), &axis);
        if start.norm() < 1e-9 || swept.norm() < 1e-9 {
            return None;
        }
        let angle = signed_angle(&start, &swept, &axis);
        let snapped = grid.snap_angle(angle);
        let rotated = rotate_about(&start, &axis, snapped);
        Some(center + rotated)
    })
}

pub(crate) fn reject_axis(v: &Vec3, axis: &Dir3) -> Vec3 {
    v - axis.as_ref() * v.dot(axis.as_ref())
}

pub(crate) fn signed_angle(from: &Vec3, to: &Vec3, axis: &Dir3) -> f64 {
    let cross = from.cross(to);
    cross.dot(axis.as_ref()).atan2(from.dot(to))
}

pub(crate) fn rotate_about(v: &Vec3, axis: &Dir3, angle: f64) -> Vec3 {
    let (s, c) = angle.sin_cos();
    let a = axis.as_ref();
    v * c + a.cross(v) * s + a * (a.dot(v) * (1.0 - c))
}

// =============================================================================
// Tracker
// =============================================================================

/// Per-frame verdict of a drag delegate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragStatus {
    /// The frame was applied; the drag continues.
    Continue,
    /// The frame was refused; the handle sticks at its last good position.
    Deny,
    /// The delegate considers the drag complete.
    End,
}

/// A replacement drag configuration after a modifier key change.
pub struct DragConfigUpdate {
    /// The proposer to use from now on.
    pub proposer: HandlePositionProposer,
    /// Whether the initial handle position resets to the current one.
    pub reset_initial: bool,
}

/// Receives the drag lifecycle. `Context` carries whatever mutable state
/// the delegate edits, typically the brush set.
pub trait DragDelegate {
    /// External state threaded through every callback.
    type Context;

    /// Called once when the drag starts; returns the initial proposer.
    fn start(&mut self, ctx: &mut Self::Context, state: &DragState) -> HandlePositionProposer;

    /// Called for every frame with a new proposed handle position.
    fn drag(&mut self, ctx: &mut Self::Context, state: &DragState, proposed: &Point3)
        -> DragStatus;

    /// Called when the drag ends normally.
    fn end(&mut self, ctx: &mut Self::Context, state: &DragState);

    /// Called when the drag is cancelled; the delegate must restore the
    /// pre-drag state.
    fn cancel(&mut self, ctx: &mut Self::Context, state: &DragState);

    /// Called when modifier keys change mid-drag; return a replacement
    /// configuration to re-pick, or `None` to keep the current one.
    fn modifier_key_change(
        &mut self,
        _ctx: &mut Self::Context,
        _state: &DragState,
    ) -> Option<DragConfigUpdate> {
        None
    }
}

/// Runs one drag from start to end or cancel.
pub struct HandleDragTracker<D: DragDelegate> {
    delegate: D,
    proposer: HandlePositionProposer,
    state: DragState,
}

impl<D: DragDelegate> HandleDragTracker<D> {
    /// Start a drag at `initial_handle_position`. `handle_offset` is the
    /// offset from the initial pick hit to the handle.
    pub fn start(
        mut delegate: D,
        ctx: &mut D::Context,
        initial_handle_position: Point3,
        handle_offset: Vec3,
    ) -> Self {
        let state = DragState {
            initial_handle_position,
            current_handle_position: initial_handle_position,
            handle_offset,
        };
        let proposer = delegate.start(ctx, &state);
        Self {
            delegate,
            proposer,
            state,
        }
    }

    /// The current drag state.
    pub fn state(&self) -> &DragState {
        &self.state
    }

    /// Feed one pointer frame. Returns `DragStatus::End` when the delegate
    /// finished the drag; the caller must then drop the tracker.
    pub fn update(&mut self, ctx: &mut D::Context, ray: &Ray) -> DragStatus {
        let Some(proposed) = self.proposer.propose(ray, &self.state) else {
            return DragStatus::Continue;
        };
        if proposed == self.state.current_handle_position {
            return DragStatus::Continue;
        }
        match self.delegate.drag(ctx, &self.state, &proposed) {
            DragStatus::Continue => {
                self.state.current_handle_position = proposed;
                DragStatus::Continue
            }
            DragStatus::Deny => DragStatus::Continue,
            DragStatus::End => {
                self.delegate.end(ctx, &self.state);
                DragStatus::End
            }
        }
    }

    /// End the drag normally.
    pub fn finish(mut self, ctx: &mut D::Context) {
        self.delegate.end(ctx, &self.state);
    }

    /// Cancel the drag; the delegate restores the pre-drag state.
    pub fn cancel(mut self, ctx: &mut D::Context) {
        self.delegate.cancel(ctx, &self.state);
    }

    /// Report a modifier key change, possibly swapping the proposer and
    /// re-anchoring the drag.
    pub fn modifier_key_change(&mut self, ctx: &mut D::Context, ray: &Ray) -> DragStatus {
        if let Some(update) = self.delegate.modifier_key_change(ctx, &self.state) {
            self.proposer = update.proposer;
            if update.reset_initial {
                self.state.initial_handle_position = self.state.current_handle_position;
            }
            return self.update(ctx, ray);
        }
        DragStatus::Continue
    }
}
