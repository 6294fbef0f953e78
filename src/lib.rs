//! inkfill
//!
//! Path-to-fill accumulation for vector shapes: a fill builder records one sub-path's
//! outline straight into a render group's vertex buffer, then a tessellator turns that
//! outline into triangle-list geometry in the same (or another) render group.
//!
//! Design rule: keep this file thin.

pub mod ffi;
pub mod fill;
pub mod render;
pub mod tessellate;
pub mod util;

pub use fill::{AppendStatus, EndStatus, FillInfo, Skip};
pub use render::{Color, Point, RenderGroup, RenderGroupId, RenderGroups, Vertex, VertexBuffer};
pub use tessellate::{EarcutTessellator, Outline, TessError, Tessellator};
pub use util::config::{FillRule, InkConfig};
pub use util::logging::init_logger;
