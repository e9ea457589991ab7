use anyhow::Result;
use gtk4::glib;

mod app;
mod config;
mod constants;
mod player;
mod ui;

fn main() -> Result<glib::ExitCode> {
    use tracing::info;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("matinee=debug".parse()?),
        )
        .init();

    info!("Starting Matinee");

    // GTK, Adwaita and GStreamer must come up before any window or
    // pipeline is built; a failure here is fatal
    gtk4::init()?;
    libadwaita::init()?;
    gstreamer::init()?;

    let app = app::MatineeApp::new()?;
    let exit_code = app.run();
    info!("Exited: {:?}", exit_code);

    Ok(exit_code)
}
