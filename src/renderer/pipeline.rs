//! Tools for compiling, linking, and validating the shader program.

use std::fmt;

use glow::HasContext;
use thiserror::Error;
use tracing::{debug, error, info};

use crate::{app::AppData, INFO_LOG_CAPACITY};

/// GLSL source of the vertex stage. Shrinks positions to 40% in x and y.
pub const VERTEX_SHADER_SOURCE: &str = include_str!("../../shaders/triangle.vert");

/// GLSL source of the fragment stage. Everything comes out red.
pub const FRAGMENT_SHADER_SOURCE: &str = include_str!("../../shaders/triangle.frag");

/// A programmable pipeline stage.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl ShaderStage {
    /// The `GL_*_SHADER` enum for this stage.
    pub const fn gl_enum(self) -> u32 {
        match self {
            Self::Vertex => glow::VERTEX_SHADER,
            Self::Fragment => glow::FRAGMENT_SHADER,
        }
    }

    /// The built-in source for this stage.
    pub const fn source(self) -> &'static str {
        match self {
            Self::Vertex => VERTEX_SHADER_SOURCE,
            Self::Fragment => FRAGMENT_SHADER_SOURCE,
        }
    }
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Vertex => f.write_str("vertex"),
            Self::Fragment => f.write_str("fragment"),
        }
    }
}

/// Something went wrong while building the shader program.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ShaderError {
    #[error("Generation of shader program failed: {0}")]
    CreateProgram(String),
    #[error("Generation of {stage} shader failed: {reason}")]
    CreateShader { stage: ShaderStage, reason: String },
    /// `shader_type` is the raw GL enum, e.g. `35633` for a vertex shader.
    #[error("Compilation of shader of type {shader_type} failed, '{log}'")]
    Compile { shader_type: u32, log: String },
    #[error("Linking of the shader program failed, '{log}'")]
    Link { log: String },
    #[error("Shader program validation failed, '{log}'")]
    Validate { log: String },
}

/// What to do when building the shader program runs into a [`ShaderError`].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum ShaderErrorPolicy {
    /// Log the error and carry on. Drawing may then use a broken or zero
    /// program, which shows up as a blank or wrongly colored frame.
    #[default]
    LogAndContinue,
    /// Hand the first error back to the caller.
    Abort,
}

impl ShaderErrorPolicy {
    /// Apply this policy to an error. Returns `Ok` if the caller should keep going.
    pub fn handle(self, err: ShaderError) -> Result<(), ShaderError> {
        match self {
            Self::LogAndContinue => {
                error!("Error: {err}");
                Ok(())
            }
            Self::Abort => Err(err),
        }
    }
}

/// Cut a driver info log down to what fits in an [`INFO_LOG_CAPACITY`]-byte
/// buffer, leaving room for the NUL terminator.
pub fn truncate_info_log(mut log: String) -> String {
    let max = INFO_LOG_CAPACITY - 1;
    if log.len() > max {
        let mut end = max;
        while !log.is_char_boundary(end) {
            end -= 1;
        }
        log.truncate(end);
    }
    log
}

/// The steps that turn the built-in sources into a program, one call each.
pub(crate) trait ProgramSteps {
    /// Compile `stage` and attach it to the program. A stage that fails stays unattached.
    fn compile_and_attach(&mut self, stage: ShaderStage) -> Result<(), ShaderError>;
    fn link(&mut self) -> Result<(), ShaderError>;
    fn validate(&mut self) -> Result<(), ShaderError>;
    /// Throw away the program and any shaders still attached to it.
    fn discard(&mut self);
}

/// Run the build steps in order, sending every error through `policy`.
///
/// Both stages are always attempted, and linking runs even if one of them
/// failed. A failed link skips validation. If the policy gives up, the
/// half-built program is discarded before the error is returned.
pub(crate) fn build_program<S: ProgramSteps>(
    steps: &mut S,
    policy: ShaderErrorPolicy,
) -> Result<(), ShaderError> {
    let built = run_steps(steps, policy);
    if built.is_err() {
        steps.discard();
    }
    built
}

fn run_steps<S: ProgramSteps>(
    steps: &mut S,
    policy: ShaderErrorPolicy,
) -> Result<(), ShaderError> {
    for stage in [ShaderStage::Vertex, ShaderStage::Fragment] {
        if let Err(err) = steps.compile_and_attach(stage) {
            policy.handle(err)?;
        }
    }

    if let Err(err) = steps.link() {
        return policy.handle(err);
    }

    if let Err(err) = steps.validate() {
        return policy.handle(err);
    }

    info!("Shader program compiled, linked, and validated");

    Ok(())
}

/// [`ProgramSteps`] against a live GL program.
struct GlProgramSteps<'a> {
    gl: &'a glow::Context,
    program: glow::Program,
    /// Compiled and attached, not yet deleted.
    shaders: Vec<glow::Shader>,
}

impl GlProgramSteps<'_> {
    /// Detach and delete every shader still held.
    ///
    /// Called once the program has linked, or after giving up on it.
    fn release_shaders(&mut self) {
        for shader in self.shaders.drain(..) {
            unsafe {
                self.gl.detach_shader(self.program, shader);
                self.gl.delete_shader(shader);
            }
        }
    }
}

impl ProgramSteps for GlProgramSteps<'_> {
    fn compile_and_attach(&mut self, stage: ShaderStage) -> Result<(), ShaderError> {
        unsafe {
            let shader = compile_shader(self.gl, stage, stage.source())?;
            self.gl.attach_shader(self.program, shader);
            self.shaders.push(shader);
        }
        Ok(())
    }

    fn link(&mut self) -> Result<(), ShaderError> {
        let linked = unsafe { link_program(self.gl, self.program) };
        // The program keeps its own copy of the linked code.
        self.release_shaders();
        linked
    }

    fn validate(&mut self) -> Result<(), ShaderError> {
        unsafe { validate_program(self.gl, self.program) }
    }

    fn discard(&mut self) {
        self.release_shaders();
        unsafe { self.gl.delete_program(self.program) };
    }
}

/// Build the shader program from the built-in sources and store it in `data`.
///
/// Errors go through `policy`, see [`build_program()`]. With
/// [`ShaderErrorPolicy::LogAndContinue`] this always returns `Ok` and leaves
/// whatever program came out in `data`. With [`ShaderErrorPolicy::Abort`] the
/// half-built program has already been deleted when the error comes back, and
/// `data` holds no program.
///
/// # Safety
///
/// Requires a current GL context.
#[tracing::instrument(level = "DEBUG", skip_all, fields(policy = ?policy))]
pub(crate) unsafe fn create_pipeline(
    gl: &glow::Context,
    data: &mut AppData,
    policy: ShaderErrorPolicy,
) -> Result<(), ShaderError> {
    let program = match gl.create_program() {
        Ok(program) => program,
        Err(e) => {
            // Draws will run with program 0.
            data.program = None;
            return policy.handle(ShaderError::CreateProgram(e));
        }
    };

    let mut steps = GlProgramSteps {
        gl,
        program,
        shaders: Vec::with_capacity(2),
    };
    let built = build_program(&mut steps, policy);
    steps.release_shaders();

    data.program = built.is_ok().then_some(program);
    built
}

/// Compile one shader stage from GLSL source.
#[tracing::instrument(level = "DEBUG", skip(gl, source))]
pub(crate) unsafe fn compile_shader(
    gl: &glow::Context,
    stage: ShaderStage,
    source: &str,
) -> Result<glow::Shader, ShaderError> {
    let shader = gl
        .create_shader(stage.gl_enum())
        .map_err(|reason| ShaderError::CreateShader { stage, reason })?;

    gl.shader_source(shader, source);
    gl.compile_shader(shader);

    if !gl.get_shader_compile_status(shader) {
        let log = truncate_info_log(gl.get_shader_info_log(shader));
        gl.delete_shader(shader);
        return Err(ShaderError::Compile {
            shader_type: stage.gl_enum(),
            log,
        });
    }

    debug!("Compiled shader");

    Ok(shader)
}

/// Link whatever stages are attached to `program`.
pub(crate) unsafe fn link_program(
    gl: &glow::Context,
    program: glow::Program,
) -> Result<(), ShaderError> {
    gl.link_program(program);

    if !gl.get_program_link_status(program) {
        return Err(ShaderError::Link {
            log: truncate_info_log(gl.get_program_info_log(program)),
        });
    }

    Ok(())
}

/// Check that `program` can run against the current GL state.
pub(crate) unsafe fn validate_program(
    gl: &glow::Context,
    program: glow::Program,
) -> Result<(), ShaderError> {
    gl.validate_program(program);

    if !gl.get_program_validate_status(program) {
        return Err(ShaderError::Validate {
            log: truncate_info_log(gl.get_program_info_log(program)),
        });
    }

    Ok(())
}

/// Destroy the program created in [`create_pipeline()`].
pub(crate) unsafe fn destroy_pipeline(gl: &glow::Context, data: &mut AppData) {
    if let Some(program) = data.program.take() {
        gl.delete_program(program);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compile_error_names_the_shader_type() {
        let err = ShaderError::Compile {
            shader_type: ShaderStage::Vertex.gl_enum(),
            log: "0:3(1): error: syntax error".to_owned(),
        };
        let message = err.to_string();

        assert!(message.contains("Compilation of shader of type"));
        assert!(message.contains("35633"));
        assert!(message.ends_with("'0:3(1): error: syntax error'"));
    }

    #[test]
    fn link_and_validate_errors_carry_the_log() {
        let link = ShaderError::Link {
            log: "missing main".to_owned(),
        };
        assert_eq!(
            link.to_string(),
            "Linking of the shader program failed, 'missing main'"
        );

        let validate = ShaderError::Validate {
            log: String::new(),
        };
        assert!(validate
            .to_string()
            .starts_with("Shader program validation failed"));
    }

    #[test]
    fn stage_enums_match_gl() {
        assert_eq!(ShaderStage::Vertex.gl_enum(), 0x8B31);
        assert_eq!(ShaderStage::Fragment.gl_enum(), 0x8B30);
    }

    #[test]
    fn log_and_continue_swallows_errors() {
        let err = ShaderError::Link {
            log: "nope".to_owned(),
        };
        assert_eq!(ShaderErrorPolicy::default(), ShaderErrorPolicy::LogAndContinue);
        assert_eq!(ShaderErrorPolicy::LogAndContinue.handle(err), Ok(()));
    }

    #[test]
    fn abort_returns_the_error() {
        let err = ShaderError::CreateProgram("out of names".to_owned());
        assert_eq!(ShaderErrorPolicy::Abort.handle(err.clone()), Err(err));
    }

    /// Fails the given steps and records every step that ran.
    #[derive(Default)]
    struct FakeSteps {
        failing: Vec<&'static str>,
        ran: Vec<&'static str>,
    }

    impl FakeSteps {
        fn failing(steps: &[&'static str]) -> Self {
            Self {
                failing: steps.to_vec(),
                ran: Vec::new(),
            }
        }

        fn step(&mut self, name: &'static str, err: ShaderError) -> Result<(), ShaderError> {
            self.ran.push(name);
            if self.failing.contains(&name) {
                Err(err)
            } else {
                Ok(())
            }
        }
    }

    impl ProgramSteps for FakeSteps {
        fn compile_and_attach(&mut self, stage: ShaderStage) -> Result<(), ShaderError> {
            let name = match stage {
                ShaderStage::Vertex => "vertex",
                ShaderStage::Fragment => "fragment",
            };
            let err = ShaderError::Compile {
                shader_type: stage.gl_enum(),
                log: "syntax error".to_owned(),
            };
            self.step(name, err)
        }

        fn link(&mut self) -> Result<(), ShaderError> {
            let err = ShaderError::Link {
                log: "no vertex stage".to_owned(),
            };
            self.step("link", err)
        }

        fn validate(&mut self) -> Result<(), ShaderError> {
            let err = ShaderError::Validate {
                log: String::new(),
            };
            self.step("validate", err)
        }

        fn discard(&mut self) {
            self.ran.push("discard");
        }
    }

    #[test]
    fn clean_build_runs_every_step() {
        let mut steps = FakeSteps::default();

        assert_eq!(build_program(&mut steps, ShaderErrorPolicy::Abort), Ok(()));
        assert_eq!(steps.ran, ["vertex", "fragment", "link", "validate"]);
    }

    #[test]
    fn failed_vertex_stage_still_links_and_validates() {
        let mut steps = FakeSteps::failing(&["vertex"]);

        assert_eq!(
            build_program(&mut steps, ShaderErrorPolicy::LogAndContinue),
            Ok(())
        );
        assert_eq!(steps.ran, ["vertex", "fragment", "link", "validate"]);
    }

    #[test]
    fn failed_link_skips_validation() {
        let mut steps = FakeSteps::failing(&["vertex", "link"]);

        assert_eq!(
            build_program(&mut steps, ShaderErrorPolicy::LogAndContinue),
            Ok(())
        );
        assert_eq!(steps.ran, ["vertex", "fragment", "link"]);
    }

    #[test]
    fn failed_validation_is_logged_and_continued() {
        let mut steps = FakeSteps::failing(&["validate"]);

        assert_eq!(
            build_program(&mut steps, ShaderErrorPolicy::LogAndContinue),
            Ok(())
        );
        assert_eq!(steps.ran, ["vertex", "fragment", "link", "validate"]);
    }

    #[test]
    fn abort_stops_at_the_first_failure() {
        let mut steps = FakeSteps::failing(&["vertex", "link"]);
        let err = build_program(&mut steps, ShaderErrorPolicy::Abort).unwrap_err();

        assert!(err.to_string().contains("Compilation of shader of type 35633"));
        assert_eq!(steps.ran, ["vertex", "discard"]);
    }

    #[test]
    fn abort_returns_a_link_failure() {
        let mut steps = FakeSteps::failing(&["link"]);
        let err = build_program(&mut steps, ShaderErrorPolicy::Abort).unwrap_err();

        assert!(err
            .to_string()
            .contains("Linking of the shader program failed"));
        assert_eq!(steps.ran, ["vertex", "fragment", "link", "discard"]);
    }

    #[test]
    fn short_logs_are_untouched() {
        assert_eq!(truncate_info_log("fine".to_owned()), "fine");
    }

    #[test]
    fn long_logs_are_cut_to_fit_the_buffer() {
        let log = "x".repeat(4000);
        assert_eq!(truncate_info_log(log).len(), INFO_LOG_CAPACITY - 1);
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        // 'é' is two bytes, so byte 1023 lands in the middle of one.
        let log = "é".repeat(600);
        let cut = truncate_info_log(log);

        assert_eq!(cut.len(), INFO_LOG_CAPACITY - 2);
        assert!(cut.chars().all(|c| c == 'é'));
    }

    #[test]
    fn sources_target_glsl_330_core() {
        for stage in [ShaderStage::Vertex, ShaderStage::Fragment] {
            assert!(stage.source().trim_start().starts_with("#version 330"));
        }
        assert!(VERTEX_SHADER_SOURCE.contains("layout (location = 0) in vec3 position"));
        assert!(VERTEX_SHADER_SOURCE.contains("0.4 * position.x"));
        assert!(FRAGMENT_SHADER_SOURCE.contains("vec4(1.0f, 0.0f, 0.0f, 1.0f)"));
    }
}
