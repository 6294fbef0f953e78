use std::ops::Range;

use crate::render::vertex::{Vertex, VertexBuffer};

/// The unit of GPU-uploadable geometry for one shape.
///
/// Owns its vertex buffer. Fill builders and tessellators only ever borrow it.
/// The buffer mixes raw outline vertices and triangle-list geometry; `triangle_ranges`
/// records which spans a draw stage should submit as triangles.
#[derive(Clone, Debug)]
pub struct RenderGroup {
    vertices: Option<VertexBuffer>,
    triangle_ranges: Vec<Range<usize>>,
}

impl Default for RenderGroup {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderGroup {
    pub fn new() -> Self {
        Self { vertices: Some(VertexBuffer::new()), triangle_ranges: Vec::new() }
    }

    /// A group with no vertex storage attached. Appends into it are ignored.
    pub fn without_buffer() -> Self {
        Self { vertices: None, triangle_ranges: Vec::new() }
    }

    pub fn vertices(&self) -> Option<&VertexBuffer> {
        self.vertices.as_ref()
    }

    pub fn vertices_mut(&mut self) -> Option<&mut VertexBuffer> {
        self.vertices.as_mut()
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.as_ref().map(VertexBuffer::len).unwrap_or(0)
    }

    /// Append a triangle list (3 vertices per triangle) and remember its span.
    ///
    /// Returns the appended range, empty when the group has no buffer or `tris` is empty.
    pub fn push_triangles(&mut self, tris: &[Vertex]) -> Range<usize> {
        let Some(buf) = self.vertices.as_mut() else {
            return 0..0;
        };
        let start = buf.len();
        if tris.is_empty() {
            return start..start;
        }
        buf.extend_from_slice(tris);
        let range = start..buf.len();
        self.triangle_ranges.push(range.clone());
        range
    }

    pub fn triangle_ranges(&self) -> &[Range<usize>] {
        &self.triangle_ranges
    }

    pub fn triangle_count(&self) -> usize {
        self.triangle_ranges.iter().map(|r| r.len() / 3).sum()
    }

    pub fn clear(&mut self) {
        if let Some(buf) = self.vertices.as_mut() {
            buf.clear();
        }
        self.triangle_ranges.clear();
    }
}

/// Non-owning handle to a `RenderGroup` living in a `RenderGroups` arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RenderGroupId(usize);

impl RenderGroupId {
    /// Rebuild a handle from `index()`, e.g. one that crossed the C ABI.
    pub fn from_index(index: usize) -> Self {
        Self(index)
    }

    pub fn index(self) -> usize {
        self.0
    }
}

/// Arena of render groups for one shape.
///
/// Removed slots stay vacant so outstanding ids resolve to `None` instead of to a
/// different group.
#[derive(Debug, Default)]
pub struct RenderGroups {
    slots: Vec<Option<RenderGroup>>,
}

impl RenderGroups {
    pub fn new() -> Self {
        Self { slots: Vec::new() }
    }

    pub fn insert(&mut self, group: RenderGroup) -> RenderGroupId {
        let id = RenderGroupId(self.slots.len());
        self.slots.push(Some(group));
        id
    }

    pub fn get(&self, id: RenderGroupId) -> Option<&RenderGroup> {
        self.slots.get(id.0).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, id: RenderGroupId) -> Option<&mut RenderGroup> {
        self.slots.get_mut(id.0).and_then(Option::as_mut)
    }

    pub fn remove(&mut self, id: RenderGroupId) -> Option<RenderGroup> {
        self.slots.get_mut(id.0).and_then(Option::take)
    }

    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = (RenderGroupId, &RenderGroup)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.as_ref().map(|g| (RenderGroupId(i), g)))
    }
}
