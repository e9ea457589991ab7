use crate::player::MediaSource;
use crate::player::error::PlayerError;
use crate::player::gstreamer::{bus_handler, sink_factory};
use anyhow::{Context, Result};
use gstreamer as gst;
use gstreamer::bus::BusWatchGuard;
use gstreamer::glib;
use gstreamer::prelude::*;
use gtk4::{self, prelude::*};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

// Preroll must finish before Playing; the wait polls so the main loop
// keeps running, ending on AsyncDone, Paused reached, a bus error, or
// the deadline
const PREROLL_TIMEOUT: Duration = Duration::from_secs(5);
const PREROLL_POLL_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerState {
    Idle,
    Loading,
    Playing,
    Paused,
    Stopped,
    Error,
}

impl PlayerState {
    pub fn is_playing(&self) -> bool {
        matches!(self, PlayerState::Playing)
    }
}

/// Playback engine handle around a GStreamer `playbin3` pipeline.
///
/// The pipeline is built per loaded source and torn down when the next
/// one is loaded, on `release()`, and on drop. All fields are shared so
/// UI closures can clone what they need.
pub struct GStreamerPlayer {
    playbin: Arc<Mutex<Option<gst::Element>>>,
    state: Arc<RwLock<PlayerState>>,
    current_source: Arc<Mutex<Option<MediaSource>>>,
    video_sink: Arc<Mutex<Option<gst::Element>>>,
    video_widget: Arc<Mutex<Option<gtk4::Widget>>>,
    // Seeking needs AsyncDone first; flushed on stop and on every load
    pipeline_ready: Arc<Mutex<bool>>,
    bus_watch_guard: Arc<Mutex<Option<BusWatchGuard>>>,
    // Volume survives pipeline rebuilds
    volume: Arc<Mutex<f64>>,
}

impl GStreamerPlayer {
    pub fn new() -> Result<Self> {
        // Idempotent; main initializes the engine before the app runs
        gst::init().context("Failed to initialize GStreamer")?;

        Ok(Self {
            playbin: Arc::new(Mutex::new(None)),
            state: Arc::new(RwLock::new(PlayerState::Idle)),
            current_source: Arc::new(Mutex::new(None)),
            video_sink: Arc::new(Mutex::new(None)),
            video_widget: Arc::new(Mutex::new(None)),
            pipeline_ready: Arc::new(Mutex::new(false)),
            bus_watch_guard: Arc::new(Mutex::new(None)),
            volume: Arc::new(Mutex::new(1.0)),
        })
    }

    /// Creates the widget video frames render into. The first call
    /// builds the sink and the Picture; later calls return the same
    /// widget.
    pub fn create_video_widget(&self) -> gtk4::Widget {
        if let Some(widget) = self.video_widget.lock().unwrap().as_ref() {
            return widget.clone();
        }

        let picture = gtk4::Picture::new();
        picture.set_hexpand(true);
        picture.set_vexpand(true);
        picture.set_content_fit(gtk4::ContentFit::Contain);

        let video_sink = sink_factory::create_video_sink();
        if let Some(ref sink) = video_sink
            && let Some(paintable) = sink_factory::extract_paintable(sink)
        {
            picture.set_paintable(Some(&paintable));
            debug!("Paintable bound to Picture widget");
        }
        *self.video_sink.lock().unwrap() = video_sink;

        let widget = picture.upcast::<gtk4::Widget>();
        *self.video_widget.lock().unwrap() = Some(widget.clone());
        widget
    }

    pub async fn load_media(&self, source: &MediaSource) -> Result<()> {
        let uri = source.uri()?;
        info!("Loading media: {}", uri);

        *self.pipeline_ready.lock().unwrap() = false;

        {
            let mut state = self.state.write().await;
            *state = PlayerState::Loading;
        }

        // Tear down the previous pipeline before building the new one
        if let Some(old_playbin) = self.playbin.lock().unwrap().take() {
            debug!("Releasing previous pipeline");
            if let Err(e) = old_playbin.set_state(gst::State::Null) {
                warn!("Failed to null previous pipeline: {:?}", e);
            }
        }
        // BusWatchGuard removes the watch when dropped
        self.bus_watch_guard.lock().unwrap().take();

        // playbin3 state changes are async; play() walks
        // Null -> Ready -> Paused -> Playing to avoid preroll hangs
        let playbin = gst::ElementFactory::make("playbin3")
            .name("player")
            .property("uri", &uri)
            .build()
            .map_err(|_| PlayerError::ElementCreation("playbin3".into()))?;

        playbin.set_property_from_str("flags", "soft-volume+audio+video");
        playbin.set_property("volume", *self.volume.lock().unwrap());

        if let Some(sink) = self.video_sink.lock().unwrap().as_ref() {
            playbin.set_property("video-sink", sink);
        }

        let bus = playbin.bus().context("Failed to get playbin bus")?;
        let state_clone = self.state.clone();
        let pipeline_ready_clone = self.pipeline_ready.clone();
        let watch_guard = bus
            .add_watch(move |_, msg| {
                bus_handler::handle_bus_message_sync(msg, &state_clone, &pipeline_ready_clone);
                glib::ControlFlow::Continue
            })
            .context("Failed to add bus watch")?;
        *self.bus_watch_guard.lock().unwrap() = Some(watch_guard);

        *self.playbin.lock().unwrap() = Some(playbin.clone());
        *self.current_source.lock().unwrap() = Some(source.clone());

        // Preroll so duration queries and seeks become answerable before
        // playback starts; AsyncDone on the bus signals completion
        match playbin.set_state(gst::State::Paused) {
            Ok(gst::StateChangeSuccess::Success) => debug!("Pipeline prerolled"),
            Ok(gst::StateChangeSuccess::Async) => debug!("Pipeline prerolling asynchronously"),
            Ok(gst::StateChangeSuccess::NoPreroll) => debug!("Live source, no preroll"),
            Err(e) => warn!("Preroll did not start: {:?}", e),
        }

        debug!("Media loaded: {}", source.display_title());
        Ok(())
    }

    pub async fn play(&self) -> Result<()> {
        let playbin = self
            .playbin
            .lock()
            .unwrap()
            .as_ref()
            .cloned()
            .ok_or(PlayerError::NoMedia)?;

        // Going straight from Null/Ready to Playing can hang playbin3,
        // so make sure the pipeline prerolls first
        let (_, current, _) = playbin.state(gst::ClockTime::ZERO);
        if current == gst::State::Null || current == gst::State::Ready {
            debug!("Pipeline in {:?}, prerolling before play", current);
            playbin
                .set_state(gst::State::Paused)
                .map_err(|_| PlayerError::StateChange("preroll to Paused failed".into()))?;

            if !self.wait_for_preroll(&playbin).await {
                if let Some(detail) = Self::drain_bus_error(&playbin) {
                    let mut state = self.state.write().await;
                    *state = PlayerState::Error;
                    return Err(PlayerError::StateChange(detail).into());
                }
                if *self.state.read().await == PlayerState::Error {
                    return Err(PlayerError::StateChange(
                        "source failed during preroll".into(),
                    )
                    .into());
                }
                warn!("Preroll timed out without a bus error, continuing");
            }
        }

        match playbin.set_state(gst::State::Playing) {
            Ok(_) => {
                let mut state = self.state.write().await;
                *state = PlayerState::Playing;
                debug!("Playback started");
                Ok(())
            }
            Err(gst::StateChangeError) => {
                let mut state = self.state.write().await;
                *state = PlayerState::Error;
                let detail = Self::drain_bus_error(&playbin)
                    .unwrap_or_else(|| "no error details on the bus".to_string());
                Err(PlayerError::StateChange(detail).into())
            }
        }
    }

    /// Polls for preroll completion between main-loop iterations rather
    /// than blocking inside the pipeline. True once the bus reported
    /// AsyncDone or the pipeline reached Paused; false on a bus error
    /// or once `PREROLL_TIMEOUT` passes.
    async fn wait_for_preroll(&self, playbin: &gst::Element) -> bool {
        let deadline = Instant::now() + PREROLL_TIMEOUT;

        loop {
            if *self.pipeline_ready.lock().unwrap() {
                return true;
            }

            // Non-blocking query; live sources reach Paused without
            // posting AsyncDone
            let (_, current, _) = playbin.state(gst::ClockTime::ZERO);
            if current == gst::State::Paused {
                return true;
            }

            if *self.state.read().await == PlayerState::Error {
                return false;
            }
            if Instant::now() >= deadline {
                return false;
            }

            glib::timeout_future(PREROLL_POLL_INTERVAL).await;
        }
    }

    pub async fn pause(&self) -> Result<()> {
        debug!("Pausing playback");

        if let Some(playbin) = self.playbin.lock().unwrap().as_ref() {
            playbin
                .set_state(gst::State::Paused)
                .context("Failed to set pipeline to paused state")?;

            let mut state = self.state.write().await;
            *state = PlayerState::Paused;
        }
        Ok(())
    }

    /// Stops playback and resets the pipeline. The loaded source is
    /// retained, so a following play() restarts it from the beginning.
    pub async fn stop(&self) -> Result<()> {
        debug!("Stopping playback");

        if let Some(playbin) = self.playbin.lock().unwrap().as_ref() {
            playbin
                .set_state(gst::State::Null)
                .context("Failed to set pipeline to null state")?;

            *self.pipeline_ready.lock().unwrap() = false;

            let mut state = self.state.write().await;
            *state = PlayerState::Stopped;
        }
        Ok(())
    }

    pub async fn seek(&self, position: Duration) -> Result<()> {
        debug!("Seeking to {:?}", position);

        if !*self.pipeline_ready.lock().unwrap() {
            return Err(PlayerError::NotReady.into());
        }

        let playbin = self
            .playbin
            .lock()
            .unwrap()
            .as_ref()
            .cloned()
            .ok_or(PlayerError::NoMedia)?;

        let target = gst::ClockTime::from_nseconds(position.as_nanos() as u64);
        playbin
            .seek_simple(gst::SeekFlags::FLUSH | gst::SeekFlags::KEY_UNIT, target)
            .context("Seek failed")?;
        Ok(())
    }

    /// Seeks to a fraction of the media duration, the unit the progress
    /// slider and the seek buttons work in.
    pub async fn seek_to_fraction(&self, fraction: f64) -> Result<()> {
        let duration = self.get_duration().await.ok_or(PlayerError::NoMedia)?;
        self.seek(fraction_to_position(duration, fraction)).await
    }

    pub async fn get_position(&self) -> Option<Duration> {
        if let Some(playbin) = self.playbin.lock().unwrap().as_ref() {
            playbin
                .query_position::<gst::ClockTime>()
                .map(|pos| Duration::from_nanos(pos.nseconds()))
        } else {
            None
        }
    }

    pub async fn get_duration(&self) -> Option<Duration> {
        if let Some(playbin) = self.playbin.lock().unwrap().as_ref() {
            playbin
                .query_duration::<gst::ClockTime>()
                .map(|dur| Duration::from_nanos(dur.nseconds()))
        } else {
            None
        }
    }

    /// Position as a fraction of duration in 0.0..=1.0.
    pub async fn get_position_fraction(&self) -> Option<f64> {
        let position = self.get_position().await?;
        let duration = self.get_duration().await?;
        if duration.is_zero() {
            return None;
        }
        Some((position.as_secs_f64() / duration.as_secs_f64()).clamp(0.0, 1.0))
    }

    pub async fn set_volume(&self, volume: f64) -> Result<()> {
        let volume = volume.clamp(0.0, 1.0);
        *self.volume.lock().unwrap() = volume;

        if let Some(playbin) = self.playbin.lock().unwrap().as_ref() {
            playbin.set_property("volume", volume);
        }
        Ok(())
    }

    pub async fn get_state(&self) -> PlayerState {
        let cached = self.state.read().await.clone();

        // Bus-driven terminal states win: at end of stream the pipeline
        // itself still reports Playing
        if matches!(
            cached,
            PlayerState::Stopped | PlayerState::Error | PlayerState::Idle
        ) {
            return cached;
        }

        if let Some(playbin) = self.playbin.lock().unwrap().as_ref() {
            let (_, current, _) = playbin.state(gst::ClockTime::ZERO);
            match current {
                gst::State::Playing => return PlayerState::Playing,
                gst::State::Paused => return PlayerState::Paused,
                _ => {}
            }
        }

        cached
    }

    pub fn has_media(&self) -> bool {
        self.current_source.lock().unwrap().is_some()
    }

    /// Releases the pipeline and the loaded media. Safe to call more
    /// than once; the application shutdown hook uses this synchronous
    /// path.
    pub fn release(&self) {
        self.bus_watch_guard.lock().unwrap().take();

        if let Some(playbin) = self.playbin.lock().unwrap().take() {
            debug!("Setting pipeline to null state");
            if let Err(e) = playbin.set_state(gst::State::Null) {
                error!("Failed to set pipeline to null on release: {:?}", e);
            }
        }

        *self.current_source.lock().unwrap() = None;
        *self.pipeline_ready.lock().unwrap() = false;

        if let Ok(mut state) = self.state.try_write() {
            *state = PlayerState::Idle;
        }
    }

    fn drain_bus_error(playbin: &gst::Element) -> Option<String> {
        let bus = playbin.bus()?;
        while let Some(msg) = bus.pop() {
            use gst::MessageView;
            if let MessageView::Error(err) = msg.view() {
                error!("Bus error: {} ({:?})", err.error(), err.debug());
                return Some(err.error().to_string());
            }
        }
        None
    }
}

impl Drop for GStreamerPlayer {
    fn drop(&mut self) {
        debug!("Dropping player, releasing pipeline");
        self.release();
    }
}

fn fraction_to_position(duration: Duration, fraction: f64) -> Duration {
    Duration::from_secs_f64(duration.as_secs_f64() * fraction.clamp(0.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fraction_to_position_clamps_to_media_bounds() {
        let duration = Duration::from_secs(100);
        assert_eq!(
            fraction_to_position(duration, 0.5),
            Duration::from_secs(50)
        );
        assert_eq!(fraction_to_position(duration, -0.2), Duration::ZERO);
        assert_eq!(
            fraction_to_position(duration, 1.5),
            Duration::from_secs(100)
        );
    }

    #[test]
    fn test_player_state_is_playing() {
        assert!(PlayerState::Playing.is_playing());
        assert!(!PlayerState::Paused.is_playing());
        assert!(!PlayerState::Idle.is_playing());
        assert!(!PlayerState::Stopped.is_playing());
    }

    #[tokio::test]
    async fn test_new_player_is_idle_with_no_media() {
        let player = GStreamerPlayer::new().unwrap();
        assert!(!player.has_media());
        assert_eq!(player.get_state().await, PlayerState::Idle);
        assert!(player.get_position().await.is_none());
        assert!(player.get_duration().await.is_none());
    }

    #[tokio::test]
    async fn test_play_without_media_errors_fast() {
        let player = GStreamerPlayer::new().unwrap();
        assert!(player.play().await.is_err());
    }

    #[tokio::test]
    async fn test_preroll_wait_ends_when_pipeline_reaches_paused() {
        let player = GStreamerPlayer::new().unwrap();
        // identity reaches Paused synchronously, standing in for a
        // prerolled pipeline
        let element = gst::ElementFactory::make("identity").build().unwrap();
        element.set_state(gst::State::Paused).unwrap();

        assert!(player.wait_for_preroll(&element).await);

        element.set_state(gst::State::Null).unwrap();
    }

    #[tokio::test]
    async fn test_preroll_wait_honors_bus_ready_flag() {
        let player = GStreamerPlayer::new().unwrap();
        *player.pipeline_ready.lock().unwrap() = true;
        let element = gst::ElementFactory::make("identity").build().unwrap();

        assert!(player.wait_for_preroll(&element).await);
    }

    #[tokio::test]
    async fn test_preroll_wait_fails_fast_on_bus_error_state() {
        let player = GStreamerPlayer::new().unwrap();
        *player.state.write().await = PlayerState::Error;
        let element = gst::ElementFactory::make("identity").build().unwrap();

        assert!(!player.wait_for_preroll(&element).await);
    }
}
