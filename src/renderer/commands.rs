//! Recording and replaying the per-frame draw commands.

use glow::HasContext;
use tracing::debug;

use crate::CLEAR_COLOR;

/// One GL call made while drawing a frame.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum DrawCommand {
    ClearColor([f32; 4]),
    Clear(u32),
    UseProgram(Option<glow::Program>),
    BindVertexArray(Option<glow::VertexArray>),
    DrawArrays { mode: u32, first: i32, count: i32 },
}

/// Record the commands for drawing a single triangle. These never change, so
/// they're recorded once and then replayed every frame with [`submit()`].
///
/// A `None` program still gets drawn with; GL treats it as program 0.
#[tracing::instrument(level = "DEBUG", skip_all)]
pub(crate) fn record_frame_commands(
    program: Option<glow::Program>,
    vertex_array: Option<glow::VertexArray>,
) -> Vec<DrawCommand> {
    debug!(
        has_program = program.is_some(),
        "Recording drawing commands for rendering a single triangle."
    );

    vec![
        DrawCommand::ClearColor(CLEAR_COLOR),
        DrawCommand::Clear(glow::COLOR_BUFFER_BIT),
        DrawCommand::UseProgram(program),
        DrawCommand::BindVertexArray(vertex_array),
        DrawCommand::DrawArrays {
            mode: glow::TRIANGLES,
            first: 0,
            count: 3,
        },
        DrawCommand::BindVertexArray(None),
        DrawCommand::UseProgram(None),
    ]
}

/// Issue recorded commands against the current context.
pub(crate) unsafe fn submit(gl: &glow::Context, commands: &[DrawCommand]) {
    for command in commands {
        match *command {
            DrawCommand::ClearColor([r, g, b, a]) => gl.clear_color(r, g, b, a),
            DrawCommand::Clear(mask) => gl.clear(mask),
            DrawCommand::UseProgram(program) => gl.use_program(program),
            DrawCommand::BindVertexArray(vertex_array) => gl.bind_vertex_array(vertex_array),
            DrawCommand::DrawArrays { mode, first, count } => gl.draw_arrays(mode, first, count),
        }
    }
}
