pub mod app;
pub mod renderer;
pub(crate) mod vertex;

/// Title of the one and only window.
pub const WINDOW_TITLE: &str = "Simple Triangle";

/// Logical width of the window, in pixels.
pub const WINDOW_WIDTH: u32 = 800;

/// Logical height of the window, in pixels.
pub const WINDOW_HEIGHT: u32 = 600;

/// The OpenGL version requested for the core profile context, as `(major, minor)`.
pub const GL_VERSION: (u8, u8) = (3, 3);

/// Size of the buffer the driver's shader and program info logs are read
/// into, including the trailing NUL. Longer logs get cut off.
pub const INFO_LOG_CAPACITY: usize = 1024;

/// Opaque black.
pub const CLEAR_COLOR: [f32; 4] = [0.0, 0.0, 0.0, 1.0];
