use anyhow::Result;
use gtk4::glib;
use std::path::{Path, PathBuf};

use crate::player::error::PlayerError;

/// A playable media source: a local file or a network stream.
///
/// Loading a new source replaces the previous one; the pipeline built
/// from the old source is torn down first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaSource {
    File(PathBuf),
    Stream(String),
}

impl MediaSource {
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        Self::File(path.as_ref().to_path_buf())
    }

    pub fn from_url(url: impl Into<String>) -> Self {
        Self::Stream(url.into())
    }

    /// The URI handed to the playback engine. Files are converted to
    /// percent-encoded `file://` URIs; stream URLs pass through as typed.
    pub fn uri(&self) -> Result<String> {
        match self {
            Self::File(path) => {
                let uri = glib::filename_to_uri(path, None)
                    .map_err(|e| PlayerError::InvalidUrl(format!("{}: {}", path.display(), e)))?;
                Ok(uri.to_string())
            }
            Self::Stream(url) => Ok(url.clone()),
        }
    }

    /// Text shown in the window title while this source is loaded.
    pub fn display_title(&self) -> String {
        match self {
            Self::File(path) => path.display().to_string(),
            Self::Stream(url) => url.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_uri_is_percent_encoded() {
        let source = MediaSource::from_path("/music/my song.mp3");
        assert_eq!(source.uri().unwrap(), "file:///music/my%20song.mp3");
    }

    #[test]
    fn test_relative_path_is_rejected() {
        let source = MediaSource::from_path("song.mp3");
        assert!(source.uri().is_err());
    }

    #[test]
    fn test_stream_url_passes_through() {
        let source = MediaSource::from_url("http://example.com/radio.ogg");
        assert_eq!(source.uri().unwrap(), "http://example.com/radio.ogg");
    }

    #[test]
    fn test_display_title_shows_source_as_typed() {
        let file = MediaSource::from_path("/media/movie.mp4");
        assert_eq!(file.display_title(), "/media/movie.mp4");

        let stream = MediaSource::from_url("rtsp://camera.local/stream1");
        assert_eq!(stream.display_title(), "rtsp://camera.local/stream1");
    }
}
