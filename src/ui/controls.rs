use gdk4 as gdk;
use gtk4::{glib, prelude::*};
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, error};

use crate::config::Config;
use crate::constants::{DEFAULT_WINDOW_TITLE, POSITION_UPDATE_INTERVAL, SEEK_SETTLE_DELAY};
use crate::player::GStreamerPlayer;

/// Transport controls under the video area: seek/play/stop buttons, the
/// progress slider, the clock label, and the volume slider.
///
/// The progress slider works in fractions of the media duration
/// (0.0..=1.0); the position timer feeds it while playback runs.
pub struct PlayerControls {
    widget: gtk4::Box,
    play_button: gtk4::Button,
    stop_button: gtk4::Button,
    rewind_button: gtk4::Button,
    forward_button: gtk4::Button,
    progress_bar: gtk4::Scale,
    volume_scale: gtk4::Scale,
    time_label: gtk4::Label,
    player: Arc<RwLock<GStreamerPlayer>>,
    is_seeking: Arc<RwLock<bool>>,
    seek_step: f64,
    position_timer: Rc<RefCell<Option<glib::SourceId>>>,
}

impl PlayerControls {
    pub fn new(player: Arc<RwLock<GStreamerPlayer>>, config: &Config) -> Self {
        let widget = gtk4::Box::builder()
            .orientation(gtk4::Orientation::Horizontal)
            .spacing(6)
            .margin_top(6)
            .margin_bottom(6)
            .margin_start(6)
            .margin_end(6)
            .build();
        widget.add_css_class("player-controls");

        let rewind_button = gtk4::Button::from_icon_name("media-seek-backward-symbolic");
        rewind_button.add_css_class("flat");
        rewind_button.set_tooltip_text(Some("Seek backward"));
        widget.append(&rewind_button);

        let play_button = gtk4::Button::from_icon_name("media-playback-start-symbolic");
        play_button.add_css_class("circular");
        play_button.set_tooltip_text(Some("Play/Pause"));
        widget.append(&play_button);

        let stop_button = gtk4::Button::from_icon_name("media-playback-stop-symbolic");
        stop_button.add_css_class("flat");
        stop_button.set_tooltip_text(Some("Stop"));
        widget.append(&stop_button);

        let forward_button = gtk4::Button::from_icon_name("media-seek-forward-symbolic");
        forward_button.add_css_class("flat");
        forward_button.set_tooltip_text(Some("Seek forward"));
        widget.append(&forward_button);

        let progress_bar = gtk4::Scale::with_range(gtk4::Orientation::Horizontal, 0.0, 1.0, 0.01);
        progress_bar.set_draw_value(false);
        progress_bar.set_hexpand(true);
        progress_bar.add_css_class("progress-bar");
        widget.append(&progress_bar);

        let time_label = gtk4::Label::new(Some("00:00:00"));
        time_label.add_css_class("dim-label");
        time_label.set_width_request(70);
        widget.append(&time_label);

        let volume_icon = gtk4::Image::from_icon_name("audio-volume-high-symbolic");
        widget.append(&volume_icon);

        let volume_scale = gtk4::Scale::with_range(gtk4::Orientation::Horizontal, 0.0, 1.0, 0.01);
        volume_scale.set_value(config.playback.default_volume.clamp(0.0, 1.0));
        volume_scale.set_draw_value(false);
        volume_scale.set_size_request(100, -1);
        volume_scale.set_tooltip_text(Some("Volume"));
        widget.append(&volume_scale);

        Self {
            widget,
            play_button,
            stop_button,
            rewind_button,
            forward_button,
            progress_bar,
            volume_scale,
            time_label,
            player,
            is_seeking: Arc::new(RwLock::new(false)),
            seek_step: config.playback.seek_step,
            position_timer: Rc::new(RefCell::new(None)),
        }
    }

    pub fn widget(&self) -> &gtk4::Box {
        &self.widget
    }

    pub fn setup_handlers(&self) {
        // Play/pause button. A click with nothing loaded is a no-op; the
        // icon only flips when the engine call succeeded.
        let player = self.player.clone();
        self.play_button.connect_clicked(move |btn| {
            let player = player.clone();
            let button = btn.clone();
            glib::spawn_future_local(async move {
                let player = player.read().await;
                if !player.has_media() {
                    debug!("Play ignored, no media loaded");
                    return;
                }
                if button.icon_name() == Some("media-playback-start-symbolic".into()) {
                    if let Err(e) = player.play().await {
                        error!("Failed to play: {}", e);
                        return;
                    }
                    button.set_icon_name("media-playback-pause-symbolic");
                } else {
                    if let Err(e) = player.pause().await {
                        error!("Failed to pause: {}", e);
                        return;
                    }
                    button.set_icon_name("media-playback-start-symbolic");
                }
            });
        });

        // Stop button resets the transport back to the idle look
        let player = self.player.clone();
        let play_button = self.play_button.clone();
        let progress_bar = self.progress_bar.clone();
        let time_label = self.time_label.clone();
        self.stop_button.connect_clicked(move |btn| {
            let player = player.clone();
            let play_button = play_button.clone();
            let progress_bar = progress_bar.clone();
            let time_label = time_label.clone();
            let root = btn.root();
            glib::spawn_future_local(async move {
                let player = player.read().await;
                if let Err(e) = player.stop().await {
                    error!("Failed to stop: {}", e);
                    return;
                }
                play_button.set_icon_name("media-playback-start-symbolic");
                progress_bar.set_value(0.0);
                time_label.set_text("00:00:00");
                if let Some(window) = root.and_then(|r| r.downcast::<gtk4::Window>().ok()) {
                    window.set_title(Some(DEFAULT_WINDOW_TITLE));
                }
            });
        });

        // Seek backward one step
        let player = self.player.clone();
        let seek_step = self.seek_step;
        self.rewind_button.connect_clicked(move |_| {
            let player = player.clone();
            glib::spawn_future_local(async move {
                let player = player.read().await;
                if let Some(fraction) = player.get_position_fraction().await {
                    let target = step_fraction(fraction, -seek_step);
                    if let Err(e) = player.seek_to_fraction(target).await {
                        error!("Failed to seek backward: {}", e);
                    }
                }
            });
        });

        // Seek forward one step
        let player = self.player.clone();
        self.forward_button.connect_clicked(move |_| {
            let player = player.clone();
            glib::spawn_future_local(async move {
                let player = player.read().await;
                if let Some(fraction) = player.get_position_fraction().await {
                    let target = step_fraction(fraction, seek_step);
                    if let Err(e) = player.seek_to_fraction(target).await {
                        error!("Failed to seek forward: {}", e);
                    }
                }
            });
        });

        // Volume control
        let player = self.player.clone();
        self.volume_scale.connect_value_changed(move |scale| {
            let player = player.clone();
            let volume = scale.value();
            glib::spawn_future_local(async move {
                let player = player.read().await;
                if let Err(e) = player.set_volume(volume).await {
                    error!("Failed to set volume: {}", e);
                }
            });
        });

        // Progress bar seek - only seek when the user drags, not on
        // programmatic updates
        let player = self.player.clone();
        let is_seeking = self.is_seeking.clone();
        let time_label = self.time_label.clone();
        self.progress_bar.connect_change_value(move |_, _, value| {
            let player = player.clone();
            let is_seeking = is_seeking.clone();
            let time_label = time_label.clone();
            glib::spawn_future_local(async move {
                *is_seeking.write().await = true;

                let player = player.read().await;
                if let Some(duration) = player.get_duration().await {
                    let target = value.clamp(0.0, 1.0);
                    let target_position =
                        Duration::from_secs_f64(duration.as_secs_f64() * target);
                    time_label.set_text(&format_clock(target_position));
                    if let Err(e) = player.seek_to_fraction(target).await {
                        error!("Failed to seek: {}", e);
                    }
                }

                // Clear the seeking flag once the pipeline position settles
                let is_seeking = is_seeking.clone();
                glib::timeout_add_local(SEEK_SETTLE_DELAY, move || {
                    let is_seeking = is_seeking.clone();
                    glib::spawn_future_local(async move {
                        *is_seeking.write().await = false;
                    });
                    glib::ControlFlow::Break
                });
            });

            glib::Propagation::Proceed
        });

        // Scrubbing suspends playback: pause on press, resume on release
        let gesture = gtk4::GestureClick::new();
        gesture.set_button(gdk::BUTTON_PRIMARY);
        gesture.set_propagation_phase(gtk4::PropagationPhase::Capture);

        let player = self.player.clone();
        gesture.connect_pressed(move |_, _, _, _| {
            let player = player.clone();
            glib::spawn_future_local(async move {
                let player = player.read().await;
                if let Err(e) = player.pause().await {
                    error!("Failed to pause for scrubbing: {}", e);
                }
            });
        });

        let player = self.player.clone();
        gesture.connect_released(move |_, _, _, _| {
            let player = player.clone();
            glib::spawn_future_local(async move {
                let player = player.read().await;
                if !player.has_media() {
                    return;
                }
                if let Err(e) = player.play().await {
                    error!("Failed to resume after scrubbing: {}", e);
                }
            });
        });

        self.progress_bar.add_controller(gesture);

        // Push the configured startup volume to the engine so the first
        // loaded media starts at the right level
        let player = self.player.clone();
        let initial_volume = self.volume_scale.value();
        glib::spawn_future_local(async move {
            let player = player.read().await;
            if let Err(e) = player.set_volume(initial_volume).await {
                error!("Failed to apply startup volume: {}", e);
            }
        });
    }

    /// Starts the periodic position sampler on the main context. One
    /// source owns all widget updates; `stop_position_timer` cancels it.
    pub fn start_position_timer(&self) {
        let player = self.player.clone();
        let progress_bar = self.progress_bar.clone();
        let time_label = self.time_label.clone();
        let play_button = self.play_button.clone();
        let is_seeking = self.is_seeking.clone();

        let source_id = glib::timeout_add_local(POSITION_UPDATE_INTERVAL, move || {
            let player = player.clone();
            let progress_bar = progress_bar.clone();
            let time_label = time_label.clone();
            let play_button = play_button.clone();
            let is_seeking = is_seeking.clone();

            glib::spawn_future_local(async move {
                let is_seeking = *is_seeking.read().await;
                let player = player.read().await;

                let state = player.get_state().await;

                // Keep the play button in step with the engine; this also
                // restores the play icon after end of stream
                let icon = if state.is_playing() {
                    "media-playback-pause-symbolic"
                } else {
                    "media-playback-start-symbolic"
                };
                if play_button.icon_name().as_deref() != Some(icon) {
                    play_button.set_icon_name(icon);
                }

                if !state.is_playing() {
                    return;
                }

                // Don't fight the user's drag
                if !is_seeking
                    && let Some(fraction) = player.get_position_fraction().await
                {
                    progress_bar.set_value(fraction);
                }

                if let Some(position) = player.get_position().await {
                    time_label.set_text(&format_clock(position));
                }
            });

            glib::ControlFlow::Continue
        });

        *self.position_timer.borrow_mut() = Some(source_id);
    }

    pub fn stop_position_timer(&self) {
        if let Some(source_id) = self.position_timer.borrow_mut().take() {
            source_id.remove();
            debug!("Position timer stopped");
        }
    }
}

/// Steps a position fraction, clamped to the media bounds.
fn step_fraction(current: f64, delta: f64) -> f64 {
    (current + delta).clamp(0.0, 1.0)
}

/// Formats a position as zero-padded HH:MM:SS, rounded to the nearest
/// second.
fn format_clock(position: Duration) -> String {
    let total_secs = (position.as_secs_f64() + 0.5) as u64;
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_clock_pads_all_fields() {
        assert_eq!(format_clock(Duration::ZERO), "00:00:00");
        assert_eq!(format_clock(Duration::from_secs(59)), "00:00:59");
        assert_eq!(format_clock(Duration::from_secs(61)), "00:01:01");
        assert_eq!(format_clock(Duration::from_secs(3661)), "01:01:01");
        assert_eq!(format_clock(Duration::from_secs(37425)), "10:23:45");
    }

    #[test]
    fn test_format_clock_rounds_to_nearest_second() {
        assert_eq!(format_clock(Duration::from_millis(1_499)), "00:00:01");
        assert_eq!(format_clock(Duration::from_millis(1_500)), "00:00:02");
    }

    #[test]
    fn test_step_fraction_clamps_at_media_edges() {
        assert_eq!(step_fraction(0.5, 0.1), 0.6);
        assert_eq!(step_fraction(0.05, -0.1), 0.0);
        assert_eq!(step_fraction(0.95, 0.1), 1.0);
    }
}
