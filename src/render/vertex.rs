use bytemuck::{Pod, Zeroable};

/// A 2D outline point in the shape's local space.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

impl From<(f32, f32)> for Point {
    fn from((x, y): (f32, f32)) -> Self {
        Self { x, y }
    }
}

/// Straight (not pre-multiplied) RGBA8 color.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const OPAQUE_BLACK: Self = Self { r: 0, g: 0, b: 0, a: 255 };
}

/// One vertex of a render group: position plus RGBA8 color.
///
/// Layout is `#[repr(C)]` with no padding (12 bytes), so a buffer of these can be
/// uploaded as-is.
#[derive(Copy, Clone, Pod, Zeroable, Debug, Default, PartialEq)]
#[repr(C)]
pub struct Vertex {
    pub x: f32,
    pub y: f32,
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Vertex {
    pub fn new(position: Point, color: Color) -> Self {
        Self {
            x: position.x,
            y: position.y,
            r: color.r,
            g: color.g,
            b: color.b,
            a: color.a,
        }
    }

    /// Vertex as appended by the fill builder: position copied verbatim, color reset to
    /// opaque black. Later stages overwrite the color from the fill.
    pub fn outline(position: Point) -> Self {
        Self::new(position, Color::OPAQUE_BLACK)
    }

    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn color(&self) -> Color {
        Color { r: self.r, g: self.g, b: self.b, a: self.a }
    }
}

/// Growable vertex storage owned by a `RenderGroup`.
///
/// Insertion order is meaningful: it encodes outline point order before tessellation
/// and triangle topology after.
#[derive(Clone, Debug, Default)]
pub struct VertexBuffer {
    vertices: Vec<Vertex>,
}

impl VertexBuffer {
    pub fn new() -> Self {
        Self { vertices: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self { vertices: Vec::with_capacity(capacity) }
    }

    /// Append an opaque-black vertex at `position` and return its index.
    pub fn push(&mut self, position: Point) -> usize {
        self.push_vertex(Vertex::outline(position))
    }

    pub fn push_vertex(&mut self, vertex: Vertex) -> usize {
        let index = self.vertices.len();
        self.vertices.push(vertex);
        index
    }

    pub fn extend_from_slice(&mut self, vertices: &[Vertex]) {
        self.vertices.extend_from_slice(vertices);
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Vertex> {
        self.vertices.get(index)
    }

    pub fn as_slice(&self) -> &[Vertex] {
        &self.vertices
    }

    /// Raw bytes for a GPU upload stage.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    pub fn clear(&mut self) {
        self.vertices.clear();
    }
}
