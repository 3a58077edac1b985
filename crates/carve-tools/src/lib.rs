#![warn(missing_docs)]

//! Interactive editing tools for brush geometry.
//!
//! The pieces compose bottom-up: a [`Grid`](grid::Grid) quantizes
//! positions and angles, [`HandleManager`](handles::HandleManager) tracks
//! position-keyed vertex/edge/face handles across brushes, the
//! [`drag`] module turns pointer rays into snapped handle positions, and
//! the [`tools`] module assembles those into the move, rotate, clip, and
//! create tools an editor exposes.

pub mod drag;
pub mod grid;
pub mod handles;
pub mod tools;

pub use drag::{
    pick_on_circle, pick_on_line, pick_on_plane, pick_on_surface, snap_angle_about_axis,
    snap_delta_to_grid, snap_nothing, snap_to_grid, DragConfigUpdate, DragDelegate,
    DragHandlePicker, DragHandleSnapper, DragState, DragStatus, HandleDragTracker,
    HandlePositionProposer,
};
pub use grid::Grid;
pub use handles::{BrushId, BrushMap, HandleEntry, HandleKind, HandleManager};
pub use tools::{
    ClipSide, ClipTool, CreateBrushTool, EdgeMoveAdapter, FaceMoveAdapter, MoveTool,
    MoveToolAdapter, RotateTool, ToolState, VertexMoveAdapter,
};
