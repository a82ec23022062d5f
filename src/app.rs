use crate::{
    renderer::{
        buffers::{create_vertex_buffer, destroy_vertex_buffer},
        commands::{record_frame_commands, submit, DrawCommand},
        pipeline::{create_pipeline, destroy_pipeline, ShaderErrorPolicy},
        validation::enable_debug_output,
    },
    vertex::Vertex,
};

use color_eyre::{eyre::Context, Result};
use glow::HasContext;
use glutin::{PossiblyCurrent, WindowedContext};
use thiserror::Error;
use tracing::{debug, info};
use winit::{
    dpi::PhysicalSize,
    event::{Event, WindowEvent},
    event_loop::ControlFlow,
};

/// Whether the render loop should keep going.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum LoopState {
    #[default]
    Running,
    /// The window was asked to close. There's no way back from here.
    Closing,
}

impl LoopState {
    /// Work out the next state after seeing `event`.
    pub fn on_event(self, event: &Event<'_, ()>) -> Self {
        match event {
            Event::WindowEvent {
                event: WindowEvent::CloseRequested,
                ..
            } => Self::Closing,
            _ => self,
        }
    }

    #[inline]
    pub fn should_render(self) -> bool {
        self == Self::Running
    }

    /// The control flow the event loop should run with in this state. While
    /// running, poll continuously and never sleep.
    pub fn control_flow(self) -> ControlFlow {
        match self {
            Self::Running => ControlFlow::Poll,
            Self::Closing => ControlFlow::Exit,
        }
    }
}

/// A frame that couldn't be put on screen.
#[derive(Debug, Error)]
pub enum FrameError {
    #[error("Failed to present frame: {0}")]
    Present(#[from] glutin::ContextError),
}

impl FrameError {
    /// The code the process should exit with when this error ends it.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Present(_) => 1,
        }
    }
}

/// Our OpenGL app.
pub struct App {
    gl: glow::Context,
    data: AppData,

    /// Replayed every frame.
    commands: Vec<DrawCommand>,

    state: LoopState,
}

/// GL handles and associated data used by our [`App`].
#[derive(Clone, Debug, Default)]
pub(crate) struct AppData {
    pub vertices: Vec<Vertex>,
    pub vertex_buffer: Option<glow::Buffer>,
    pub vertex_array: Option<glow::VertexArray>,

    /// `None` if the program couldn't even be generated.
    pub program: Option<glow::Program>,
}

impl App {
    /// Creates the app on top of a current GL context: sets the viewport,
    /// uploads the triangle, and builds the shader program.
    ///
    /// Shader errors are dealt with according to `shader_policy`. Under
    /// [`ShaderErrorPolicy::LogAndContinue`] this succeeds even when the
    /// program is unusable.
    ///
    /// # Safety
    ///
    /// `gl` must have been loaded from `context`, and `context` must be
    /// current on this thread.
    #[tracing::instrument(level = "DEBUG", name = "App::create", skip_all)]
    pub unsafe fn create(
        context: &WindowedContext<PossiblyCurrent>,
        mut gl: glow::Context,
        shader_policy: ShaderErrorPolicy,
    ) -> Result<Self> {
        let mut data = AppData::default();

        enable_debug_output(&mut gl);

        let size = context.window().inner_size();
        debug!(width = size.width, height = size.height, "Setting viewport");
        gl.viewport(0, 0, size.width as i32, size.height as i32);

        debug!("Creating vertex buffer");
        create_vertex_buffer(&gl, &mut data)?;

        debug!("Creating shader program");
        create_pipeline(&gl, &mut data, shader_policy)
            .wrap_err("Error building the shader program")?;

        let commands = record_frame_commands(data.program, data.vertex_array);

        Ok(Self {
            gl,
            data,
            commands,
            state: LoopState::Running,
        })
    }

    #[inline]
    pub fn state(&self) -> LoopState {
        self.state
    }

    /// Feed an event from the event loop into the app's loop state.
    pub fn handle_event(&mut self, event: &Event<'_, ()>) -> LoopState {
        self.state = self.state.on_event(event);
        self.state
    }

    /// Render a frame and present it.
    ///
    /// # Safety
    ///
    /// `context` must be the context the app was created with, still current.
    pub unsafe fn render(
        &mut self,
        context: &WindowedContext<PossiblyCurrent>,
    ) -> Result<(), FrameError> {
        submit(&self.gl, &self.commands);

        context.swap_buffers()?;

        Ok(())
    }

    /// Resize the drawing surface and viewport to match the window.
    pub fn resize(&mut self, context: &WindowedContext<PossiblyCurrent>, size: PhysicalSize<u32>) {
        debug!(width = size.width, height = size.height, "Resizing surface");

        context.resize(size);
        unsafe {
            self.gl
                .viewport(0, 0, size.width as i32, size.height as i32);
        }
    }

    /// Destroys the app's GL objects. The context itself goes away with the window.
    #[tracing::instrument(level = "DEBUG", name = "App::destroy", skip_all)]
    pub unsafe fn destroy(&mut self) {
        destroy_pipeline(&self.gl, &mut self.data);
        destroy_vertex_buffer(&self.gl, &mut self.data);
        self.commands.clear();

        info!("Released GL objects");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use winit::window::WindowId;

    fn window_event(event: WindowEvent<'static>) -> Event<'static, ()> {
        Event::WindowEvent {
            window_id: unsafe { WindowId::dummy() },
            event,
        }
    }

    #[test]
    fn starts_running() {
        assert_eq!(LoopState::default(), LoopState::Running);
        assert!(LoopState::Running.should_render());
        assert_eq!(LoopState::Running.control_flow(), ControlFlow::Poll);
    }

    #[test]
    fn close_request_stops_the_loop() {
        let state = LoopState::Running.on_event(&window_event(WindowEvent::CloseRequested));

        assert_eq!(state, LoopState::Closing);
        assert!(!state.should_render());
        assert_eq!(state.control_flow(), ControlFlow::Exit);
    }

    #[test]
    fn other_events_keep_running() {
        let events = [
            Event::MainEventsCleared,
            Event::RedrawEventsCleared,
            window_event(WindowEvent::Focused(false)),
            window_event(WindowEvent::Resized(PhysicalSize::new(10, 10))),
        ];

        for event in &events {
            assert_eq!(LoopState::Running.on_event(event), LoopState::Running);
        }
    }

    #[test]
    fn failed_present_exits_with_one() {
        let err = FrameError::from(glutin::ContextError::ContextLost);

        assert_eq!(err.exit_code(), 1);
        assert!(err.to_string().starts_with("Failed to present frame"));
    }

    #[test]
    fn closing_is_terminal() {
        let state = LoopState::Closing
            .on_event(&Event::MainEventsCleared)
            .on_event(&window_event(WindowEvent::Focused(true)));

        assert_eq!(state, LoopState::Closing);
    }
}
