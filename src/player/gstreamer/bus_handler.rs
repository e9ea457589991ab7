use crate::player::gstreamer_player::PlayerState;
use gstreamer as gst;
use gstreamer::prelude::*;
use std::sync::{Arc, Mutex};
use tokio::sync::RwLock;
use tracing::{debug, error, info};

/// Maps pipeline bus messages onto the shared player state.
///
/// Runs inside the glib bus watch on the main context, so state updates
/// use `try_write` rather than blocking the main loop.
pub fn handle_bus_message_sync(
    msg: &gst::Message,
    state: &Arc<RwLock<PlayerState>>,
    pipeline_ready: &Arc<Mutex<bool>>,
) {
    use gst::MessageView;

    match msg.view() {
        MessageView::Eos(_) => {
            info!("Bus message: end of stream");
            if let Ok(mut state_guard) = state.try_write() {
                *state_guard = PlayerState::Stopped;
            }
        }
        MessageView::Error(err) => {
            error!(
                "Bus error from {:?}: {} ({:?})",
                err.src().map(|s| s.path_string()),
                err.error(),
                err.debug()
            );
            if let Ok(mut state_guard) = state.try_write() {
                *state_guard = PlayerState::Error;
            }
        }
        MessageView::StateChanged(state_changed) => {
            // Only track state changes on the playbin itself
            if let Some(src) = state_changed.src()
                && src.name().starts_with("player")
            {
                let new_state = state_changed.current();
                debug!(
                    "Pipeline state changed from {:?} to {:?}",
                    state_changed.old(),
                    new_state
                );

                if let Ok(mut state_guard) = state.try_write() {
                    match new_state {
                        gst::State::Playing => {
                            *state_guard = PlayerState::Playing;
                        }
                        gst::State::Paused => {
                            // Loading transitions through Paused during preroll
                            if !matches!(*state_guard, PlayerState::Loading) {
                                *state_guard = PlayerState::Paused;
                            }
                        }
                        gst::State::Ready | gst::State::Null => {
                            if !matches!(*state_guard, PlayerState::Error | PlayerState::Loading) {
                                *state_guard = PlayerState::Stopped;
                            }
                        }
                        _ => {}
                    }
                }
            }
        }
        MessageView::AsyncDone(_) => {
            debug!("AsyncDone: pipeline prerolled, seeking enabled");
            *pipeline_ready.lock().unwrap() = true;
        }
        MessageView::Buffering(buffering) => {
            debug!("Buffering: {}%", buffering.percent());
        }
        _ => {}
    }
}
