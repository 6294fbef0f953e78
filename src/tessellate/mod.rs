//! Fill tessellation: turn an accumulated outline into triangle-list geometry.
//!
//! Design constraints:
//! - Tessellators only append to the target group. Vertices already in the buffer,
//!   including other builders' outlines and triangles, are never rewritten.
//! - Expansion is total: any outline a fill builder can produce (empty, degenerate,
//!   self-intersecting) is accepted. Failures are reported, never panicked on.

mod earcut;

pub use earcut::EarcutTessellator;

use crate::render::{RenderGroup, Vertex};

#[derive(Debug, thiserror::Error)]
pub enum TessError {
    #[error("earcut could not triangulate the outline")]
    EarcutFailed,
    #[error("triangulation produced {0} indices, not a whole number of triangles")]
    InvalidTriangulation(usize),
}

/// One builder's outline, snapshotted from its render group.
#[derive(Clone, Copy, Debug)]
pub struct Outline<'a> {
    /// Outline vertices in append order.
    pub vertices: &'a [Vertex],
    /// Offsets into `vertices` where a `move_to` started a contour.
    ///
    /// Empty when the outline was built with `line_to` only; the whole outline is
    /// then a single contour.
    pub contour_starts: &'a [u32],
}

impl<'a> Outline<'a> {
    pub fn new(vertices: &'a [Vertex], contour_starts: &'a [u32]) -> Self {
        Self { vertices, contour_starts }
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Split the outline at its contour starts.
    pub fn contours(self) -> impl Iterator<Item = &'a [Vertex]> {
        let len = self.vertices.len();
        let mut bounds: Vec<usize> = Vec::with_capacity(self.contour_starts.len() + 2);
        bounds.push(0);
        bounds.extend(
            self.contour_starts
                .iter()
                .map(|&s| s as usize)
                .filter(|&s| s > 0 && s < len),
        );
        bounds.push(len);
        bounds.sort_unstable();
        bounds.dedup();

        let vertices = self.vertices;
        (0..bounds.len().saturating_sub(1))
            .map(move |i| &vertices[bounds[i]..bounds[i + 1]])
            .filter(|c| !c.is_empty())
    }
}

/// Converts an outline into fill geometry appended to `target`.
///
/// Returns the number of vertices appended.
pub trait Tessellator {
    fn expand_render_group(&mut self, outline: Outline<'_>, target: &mut RenderGroup) -> Result<usize, TessError>;
}
