use color_eyre::Result;
use gl_triangle::{
    app::App,
    renderer::{context::create_context, pipeline::ShaderErrorPolicy},
};
use tracing::{error, info};
use winit::event::{Event, WindowEvent};

fn main() -> Result<()> {
    setup_logging()?;

    let (event_loop, context, gl) = match create_context() {
        Ok(parts) => parts,
        Err(err) => {
            error!(exit_code = err.exit_code(), "{err}");
            std::process::exit(err.exit_code());
        }
    };

    info!("Initializing app");
    // Shader errors get logged, then we draw whatever we ended up with.
    let mut app = unsafe { App::create(&context, gl, ShaderErrorPolicy::LogAndContinue)? };

    info!("Running event loop");
    event_loop.run(move |event, _, control_flow| {
        *control_flow = app.handle_event(&event).control_flow();

        match event {
            // Render a frame if the window hasn't been closed
            Event::MainEventsCleared if app.state().should_render() => {
                if let Err(err) = unsafe { app.render(&context) } {
                    error!(exit_code = err.exit_code(), "{err}");

                    // Leaving through the event loop always exits with 0.
                    unsafe { app.destroy() };
                    std::process::exit(err.exit_code());
                }
            }

            Event::WindowEvent {
                event: WindowEvent::Resized(size),
                ..
            } => app.resize(&context, size),

            // The state has already moved to closing, so this is the last we see of the app
            Event::WindowEvent {
                event: WindowEvent::CloseRequested,
                ..
            } => {
                info!("Destroying app");

                unsafe { app.destroy() };

                info!("Goodbye.");
            }

            _ => {}
        }
    });
}

fn setup_logging() -> Result<()> {
    use tracing_subscriber::{prelude::*, EnvFilter};
    use tracing_tree::HierarchicalLayer;

    color_eyre::install()?;

    tracing_subscriber::registry()
        .with(HierarchicalLayer::new(4).with_bracketed_fields(true))
        .with(EnvFilter::from_default_env())
        .try_init()?;

    Ok(())
}
