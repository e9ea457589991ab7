use thiserror::Error;

#[derive(Error, Debug)]
pub enum PlayerError {
    #[error("No media loaded")]
    NoMedia,

    #[error("Pipeline not ready for seeking")]
    NotReady,

    #[error("Failed to create element: {0}")]
    ElementCreation(String),

    #[error("State change failed: {0}")]
    StateChange(String),

    #[error("Invalid media URL: {0}")]
    InvalidUrl(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_names_the_failure() {
        assert_eq!(
            PlayerError::ElementCreation("playbin3".into()).to_string(),
            "Failed to create element: playbin3"
        );
        assert_eq!(PlayerError::NoMedia.to_string(), "No media loaded");
    }
}
