pub mod error;
pub mod gstreamer;
pub mod gstreamer_player;
pub mod types;

pub use error::PlayerError;
pub use gstreamer_player::{GStreamerPlayer, PlayerState};
pub use types::MediaSource;
