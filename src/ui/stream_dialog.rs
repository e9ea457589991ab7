use gtk4::prelude::*;
use libadwaita as adw;
use libadwaita::prelude::*;
use tracing::{debug, error};
use url::Url;

use crate::player::PlayerError;

/// Modal prompt for a network stream address.
///
/// The address is validated before it reaches the caller; a rejected
/// entry is logged and dropped so the main window only ever sees
/// playable URLs.
pub struct StreamDialog;

impl StreamDialog {
    pub fn present<F>(parent: &impl IsA<gtk4::Window>, on_play: F)
    where
        F: Fn(Url) + 'static,
    {
        let dialog = adw::MessageDialog::builder()
            .heading("Open Stream")
            .body("Enter the address of a network stream")
            .modal(true)
            .transient_for(parent)
            .build();

        let entry = gtk4::Entry::builder()
            .placeholder_text("https://example.com/stream.m3u8")
            .build();
        dialog.set_extra_child(Some(&entry));

        dialog.add_response("cancel", "Cancel");
        dialog.add_response("play", "Play");
        dialog.set_response_appearance("play", adw::ResponseAppearance::Suggested);
        dialog.set_default_response(Some("play"));
        dialog.set_close_response("cancel");

        // Enter in the entry submits the dialog
        let dialog_weak = dialog.downgrade();
        entry.connect_activate(move |_| {
            if let Some(dialog) = dialog_weak.upgrade() {
                dialog.response("play");
            }
        });

        let entry_clone = entry.clone();
        dialog.connect_response(None, move |_, response| {
            if response != "play" {
                debug!("Stream dialog dismissed");
                return;
            }

            let text = entry_clone.text();
            entry_clone.set_text("");

            match parse_stream_url(&text) {
                Ok(url) => on_play(url),
                Err(e) => error!("Rejected stream address: {}", e),
            }
        });

        dialog.present();
        entry.grab_focus();
    }
}

/// Validates a stream address, accepting only schemes the playback
/// pipeline can source from.
fn parse_stream_url(input: &str) -> Result<Url, PlayerError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(PlayerError::InvalidUrl("empty address".to_string()));
    }

    let url = Url::parse(trimmed)
        .map_err(|e| PlayerError::InvalidUrl(format!("{}: {}", trimmed, e)))?;

    match url.scheme() {
        "http" | "https" | "rtsp" | "rtmp" | "mms" | "udp" => Ok(url),
        scheme => Err(PlayerError::InvalidUrl(format!(
            "unsupported scheme '{}'",
            scheme
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_stream_url_accepts_playable_schemes() {
        for input in [
            "http://example.com/stream.m3u8",
            "https://example.com/live/feed",
            "rtsp://camera.local:554/stream1",
        ] {
            assert!(parse_stream_url(input).is_ok(), "should accept {}", input);
        }
    }

    #[test]
    fn test_parse_stream_url_trims_whitespace() {
        let url = parse_stream_url("  https://example.com/a.mp4\n").unwrap();
        assert_eq!(url.as_str(), "https://example.com/a.mp4");
    }

    #[test]
    fn test_parse_stream_url_rejects_empty_input() {
        assert!(matches!(
            parse_stream_url("   "),
            Err(PlayerError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_parse_stream_url_rejects_garbage() {
        assert!(parse_stream_url("not a url").is_err());
    }

    #[test]
    fn test_parse_stream_url_rejects_unplayable_scheme() {
        assert!(matches!(
            parse_stream_url("mailto:someone@example.com"),
            Err(PlayerError::InvalidUrl(_))
        ));
    }
}
