use gdk4 as gdk;
use gstreamer as gst;
use gstreamer::prelude::*;
use tracing::{info, warn};

/// Creates the video sink for the playback pipeline.
///
/// Prefers `gtk4paintablesink` so frames render into the window's
/// Picture widget; falls back to `autovideosink` (separate window) when
/// the GTK4 plugin is missing. Returns None when neither is available,
/// in which case playback proceeds with the engine's default.
pub fn create_video_sink() -> Option<gst::Element> {
    if let Ok(sink) = gst::ElementFactory::make("gtk4paintablesink")
        .name("video-sink")
        .build()
    {
        info!("Using gtk4paintablesink");
        return Some(sink);
    }

    warn!("gtk4paintablesink not available, falling back to autovideosink");
    match gst::ElementFactory::make("autovideosink")
        .name("video-sink")
        .build()
    {
        Ok(sink) => Some(sink),
        Err(_) => {
            warn!("No video sink available, video will not be displayed");
            None
        }
    }
}

/// Returns the paintable to bind to the Picture widget, when the sink
/// is a gtk4paintablesink.
pub fn extract_paintable(sink: &gst::Element) -> Option<gdk::Paintable> {
    if sink
        .factory()
        .is_some_and(|f| f.name() == "gtk4paintablesink")
    {
        Some(sink.property::<gdk::Paintable>("paintable"))
    } else {
        None
    }
}
