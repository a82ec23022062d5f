//! Functions for dealing with vertex buffers and vertex arrays.

use color_eyre::{eyre::eyre, Result};
use glow::HasContext;
use tracing::debug;

use crate::{
    app::AppData,
    vertex::{vertex_bytes, Vertex},
};

/// Upload the triangle into a vertex buffer and describe its layout in a
/// vertex array, both stored in `data`.
#[tracing::instrument(level = "DEBUG", skip_all)]
pub(crate) unsafe fn create_vertex_buffer(gl: &glow::Context, data: &mut AppData) -> Result<()> {
    data.vertices = Vertex::triangle().to_vec();

    let vertex_array = gl
        .create_vertex_array()
        .map_err(|e| eyre!("Failed to create vertex array: {e}"))?;
    gl.bind_vertex_array(Some(vertex_array));

    let vertex_buffer = gl
        .create_buffer()
        .map_err(|e| eyre!("Failed to create vertex buffer: {e}"))?;
    gl.bind_buffer(glow::ARRAY_BUFFER, Some(vertex_buffer));

    // The triangle never changes after this.
    gl.buffer_data_u8_slice(
        glow::ARRAY_BUFFER,
        vertex_bytes(&data.vertices),
        glow::STATIC_DRAW,
    );

    // The vertex array remembers the attribute layout and the buffer it reads from.
    for attribute in Vertex::attribute_descriptions() {
        gl.vertex_attrib_pointer_f32(
            attribute.location,
            attribute.size,
            attribute.data_type,
            attribute.normalized,
            attribute.stride,
            attribute.offset,
        );
        gl.enable_vertex_attrib_array(attribute.location);
    }

    gl.bind_buffer(glow::ARRAY_BUFFER, None);
    gl.bind_vertex_array(None);

    data.vertex_array = Some(vertex_array);
    data.vertex_buffer = Some(vertex_buffer);

    debug!(vertex_count = data.vertices.len(), "Uploaded vertex buffer");

    Ok(())
}

/// Destroy the vertex buffer and array created in [`create_vertex_buffer()`].
pub(crate) unsafe fn destroy_vertex_buffer(gl: &glow::Context, data: &mut AppData) {
    if let Some(vertex_buffer) = data.vertex_buffer.take() {
        gl.delete_buffer(vertex_buffer);
    }
    if let Some(vertex_array) = data.vertex_array.take() {
        gl.delete_vertex_array(vertex_array);
    }
}
