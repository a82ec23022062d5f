//! Hooks connecting OpenGL's debug output to [`tracing`]

use glow::HasContext;
use tracing::{debug, error, trace, warn, Level};

/// Returns true if GL debug output should be enabled.
///
/// Will always return true in builds where `debug_assertions` is enabled.
/// Otherwise, will only return true if the environment variable
/// `ENABLE_GL_DEBUG_OUTPUT` is set.
#[inline]
pub(crate) fn should_enable_gl_debug_output() -> bool {
    cfg!(debug_assertions) || std::env::var("ENABLE_GL_DEBUG_OUTPUT").is_ok()
}

/// The extension that provides `glDebugMessageCallback` on a 3.3 context.
pub(crate) const DEBUG_EXTENSION: &str = "GL_KHR_debug";

/// Route the driver's debug messages through [`gl_debug_callback()`], if
/// debug output is wanted and the driver can do it.
#[tracing::instrument(level = "DEBUG", skip_all)]
pub(crate) unsafe fn enable_debug_output(gl: &mut glow::Context) {
    if !should_enable_gl_debug_output() {
        return;
    }

    if !gl.supported_extensions().contains(DEBUG_EXTENSION) {
        warn!(
            extension = DEBUG_EXTENSION,
            "GL debug output requested, but not supported by this driver"
        );
        return;
    }

    debug!(extension = DEBUG_EXTENSION, "Enabling GL debug output");
    gl.enable(glow::DEBUG_OUTPUT);
    // Report messages from inside the offending call, on this thread.
    gl.enable(glow::DEBUG_OUTPUT_SYNCHRONOUS);
    gl.debug_message_callback(gl_debug_callback);
}

/// Map a `GL_DEBUG_SEVERITY_*` value onto a log level.
pub(crate) fn severity_level(severity: u32) -> Level {
    match severity {
        glow::DEBUG_SEVERITY_HIGH => Level::ERROR,
        glow::DEBUG_SEVERITY_MEDIUM => Level::WARN,
        glow::DEBUG_SEVERITY_LOW => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/// A callback that will be called whenever the driver has a debug message to output.
pub(crate) fn gl_debug_callback(source: u32, typ: u32, id: u32, severity: u32, message: &str) {
    match severity_level(severity) {
        Level::ERROR => error!({source = source, "type" = typ, id = id}, "{}", message),
        Level::WARN => warn!({source = source, "type" = typ, id = id}, "{}", message),
        Level::DEBUG => debug!({source = source, "type" = typ, id = id}, "{}", message),
        _ => trace!({source = source, "type" = typ, id = id}, "{}", message),
    }
}
