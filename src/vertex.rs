//! Vertices to be passed on to the GPU in vertex buffers and such.

use std::mem::size_of;

use nalgebra_glm as glm;

/// A vertex position, in normalized device coordinates, to be sent to the GPU.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Vertex {
    pub pos: glm::Vec3,
}

/// Describes how one shader input location reads its data out of the bound
/// vertex buffer. Mirrors the arguments of `glVertexAttribPointer`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct VertexAttribute {
    pub location: u32,
    /// Number of components per vertex.
    pub size: i32,
    pub data_type: u32,
    pub normalized: bool,
    /// Zero means tightly packed.
    pub stride: i32,
    pub offset: i32,
}

impl Vertex {
    /// Create a new vertex at some position.
    pub fn new(pos: glm::Vec3) -> Self {
        Self { pos }
    }

    /// The hard-coded triangle. The vertex shader shrinks it to 40% of its
    /// size before rasterization.
    pub fn triangle() -> [Self; 3] {
        [
            Self::new(glm::vec3(-1.0, -1.0, 0.0)),
            Self::new(glm::vec3(1.0, -1.0, 0.0)),
            Self::new(glm::vec3(0.0, 1.0, 0.0)),
        ]
    }

    /// Return attribute descriptions specifying how to access each part of a
    /// vertex. There's only a position, at location 0.
    pub const fn attribute_descriptions() -> [VertexAttribute; 1] {
        [VertexAttribute {
            location: 0,
            size: (size_of::<Self>() / size_of::<f32>()) as i32,
            data_type: glow::FLOAT,
            normalized: false,
            stride: 0,
            offset: 0,
        }]
    }
}

/// View a slice of vertices as the raw bytes that get uploaded to the GPU.
pub fn vertex_bytes(vertices: &[Vertex]) -> &[u8] {
    // SAFETY: `Vertex` is `#[repr(C)]` and made only of `f32`s, so it has no
    // padding and every byte is initialized.
    unsafe {
        std::slice::from_raw_parts(
            vertices.as_ptr().cast::<u8>(),
            vertices.len() * size_of::<Vertex>(),
        )
    }
}
