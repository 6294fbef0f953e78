//! Renderer-owned geometry: vertices, vertex buffers and render groups.
//!
//! Design rule: nothing in here knows about fills or tessellation.

mod group;
mod vertex;

pub use group::{RenderGroup, RenderGroupId, RenderGroups};
pub use vertex::{Color, Point, Vertex, VertexBuffer};
