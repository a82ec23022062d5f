//! Window and OpenGL context bootstrapping.

use std::ffi::c_void;

use glow::HasContext;
use glutin::{Api, ContextBuilder, GlProfile, GlRequest, PossiblyCurrent, WindowedContext};
use thiserror::Error;
use tracing::{debug, info};
use winit::{dpi::LogicalSize, event_loop::EventLoop, window::WindowBuilder};

use super::validation::should_enable_gl_debug_output;
use crate::{GL_VERSION, WINDOW_HEIGHT, WINDOW_TITLE, WINDOW_WIDTH};

/// GL entry points that have to resolve before we'll believe the function
/// pointers were loaded. These are exactly the calls the app makes during
/// setup and in the render loop.
pub(crate) const REQUIRED_GL_FUNCTIONS: &[&str] = &[
    "glGenVertexArrays",
    "glBindVertexArray",
    "glGenBuffers",
    "glBindBuffer",
    "glBufferData",
    "glVertexAttribPointer",
    "glEnableVertexAttribArray",
    "glCreateShader",
    "glShaderSource",
    "glCompileShader",
    "glCreateProgram",
    "glAttachShader",
    "glLinkProgram",
    "glValidateProgram",
    "glUseProgram",
    "glClearColor",
    "glClear",
    "glDrawArrays",
    "glViewport",
];

/// Fatal errors while bringing up the window and its GL context.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("Window or OpenGL context creation failed: {0}")]
    Creation(#[from] glutin::CreationError),
    #[error("Failed to make the OpenGL context current: {0}")]
    MakeCurrent(glutin::ContextError),
    #[error("Failed to initialize OpenGL context: `{0}` could not be loaded")]
    Loader(&'static str),
}

impl StartupError {
    /// The code the process should exit with when this error ends it.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Creation(_) | Self::MakeCurrent(_) => 1,
            Self::Loader(_) => -1,
        }
    }
}

/// Create the event loop, a window with a current OpenGL 3.3 core context,
/// and the loaded GL function pointers.
#[tracing::instrument(level = "DEBUG", skip_all)]
pub fn create_context() -> Result<
    (
        EventLoop<()>,
        WindowedContext<PossiblyCurrent>,
        glow::Context,
    ),
    StartupError,
> {
    debug!(
        width = WINDOW_WIDTH,
        height = WINDOW_HEIGHT,
        "Creating window and event loop"
    );

    let event_loop = EventLoop::new();
    let window_builder = WindowBuilder::new()
        .with_title(WINDOW_TITLE)
        .with_inner_size(LogicalSize::new(WINDOW_WIDTH, WINDOW_HEIGHT));

    let context = ContextBuilder::new()
        .with_gl(GlRequest::Specific(Api::OpenGl, GL_VERSION))
        .with_gl_profile(GlProfile::Core)
        .with_gl_debug_flag(should_enable_gl_debug_output())
        .build_windowed(window_builder, &event_loop)?;

    debug!(window_id = ?context.window().id(), "Window creation successful");

    // Every GL call from here on targets this context.
    let context =
        unsafe { context.make_current() }.map_err(|(_, e)| StartupError::MakeCurrent(e))?;

    check_function_pointers(|name| context.get_proc_address(name))?;

    let gl =
        unsafe { glow::Context::from_loader_function(|name| context.get_proc_address(name)) };

    unsafe {
        info!(
            vendor = %gl.get_parameter_string(glow::VENDOR),
            renderer = %gl.get_parameter_string(glow::RENDERER),
            version = %gl.get_parameter_string(glow::VERSION),
            "Loaded OpenGL"
        );
    }

    Ok((event_loop, context, gl))
}

/// Make sure every function in [`REQUIRED_GL_FUNCTIONS`] resolves to something.
pub(crate) fn check_function_pointers<F>(mut loader: F) -> Result<(), StartupError>
where
    F: FnMut(&str) -> *const c_void,
{
    match REQUIRED_GL_FUNCTIONS
        .iter()
        .copied()
        .find(|name| loader(name).is_null())
    {
        Some(name) => Err(StartupError::Loader(name)),
        None => Ok(()),
    }
}
