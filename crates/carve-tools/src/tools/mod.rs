//! Interactive tool state machines.
//!
//! Every tool walks the same four-state cycle: inactive until activated,
//! hovering while the pointer roams, dragging between a successful drag
//! start and its end or cancel, and back to inactive on deactivation.
//! Dragging takes a snapshot of the edited brushes first, so cancel can
//! restore the exact pre-drag geometry.

mod clip_tool;
mod create_tool;
mod move_tool;
mod rotate_tool;

pub use clip_tool::{ClipSide, ClipTool};
pub use create_tool::CreateBrushTool;
pub use move_tool::{
    EdgeMoveAdapter, FaceMoveAdapter, MoveTool, MoveToolAdapter, VertexMoveAdapter,
};
pub use rotate_tool::RotateTool;

/// Lifecycle state shared by all tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ToolState {
    /// Not receiving input.
    #[default]
    Inactive,
    /// Active, tracking the pointer, no drag in progress.
    Hovering,
    /// A drag is in progress.
    Dragging,
}
