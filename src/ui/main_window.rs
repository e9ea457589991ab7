use gtk4::{gio, glib, prelude::*};
use libadwaita as adw;
use libadwaita::prelude::*;
use std::rc::Rc;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, error, info};

use crate::config::Config;
use crate::constants::{DEFAULT_WINDOW_TITLE, MEDIA_FILE_PATTERNS};
use crate::player::{GStreamerPlayer, MediaSource};
use crate::ui::controls::PlayerControls;
use crate::ui::stream_dialog::StreamDialog;

/// The single application window: video area on top, transport controls
/// below, and a primary menu for opening files and streams.
pub struct MainWindow {
    window: adw::ApplicationWindow,
}

impl MainWindow {
    pub fn new(app: &adw::Application, config: &Config) -> anyhow::Result<Self> {
        let player = GStreamerPlayer::new()?;
        let video_widget = player.create_video_widget();
        let player = Arc::new(RwLock::new(player));

        let window = adw::ApplicationWindow::builder()
            .application(app)
            .title(DEFAULT_WINDOW_TITLE)
            .default_width(960)
            .default_height(600)
            .build();

        let main_window = Self { window };
        main_window.setup_actions(app, &player);

        let header_bar = adw::HeaderBar::new();
        header_bar.pack_end(&build_menu_button());

        let video_container = gtk4::Box::builder()
            .orientation(gtk4::Orientation::Vertical)
            .vexpand(true)
            .build();
        video_container.add_css_class("video-container");
        video_container.append(&video_widget);

        let controls = Rc::new(PlayerControls::new(player.clone(), config));
        controls.setup_handlers();

        let toolbar_view = adw::ToolbarView::new();
        toolbar_view.add_top_bar(&header_bar);
        toolbar_view.set_content(Some(&video_container));
        toolbar_view.add_bottom_bar(controls.widget());
        main_window.window.set_content(Some(&toolbar_view));

        // The position timer lives on the main context; cancel it before
        // the window goes away so it stops touching dead widgets
        let controls_clone = controls.clone();
        main_window.window.connect_close_request(move |_| {
            debug!("Window closing, stopping position timer");
            controls_clone.stop_position_timer();
            glib::Propagation::Proceed
        });

        let player_clone = player.clone();
        app.connect_shutdown(move |_| {
            info!("Shutting down, releasing playback pipeline");
            if let Ok(player) = player_clone.try_read() {
                player.release();
            }
        });

        controls.start_position_timer();

        Ok(main_window)
    }

    pub fn present(&self) {
        self.window.present();
    }

    fn setup_actions(&self, app: &adw::Application, player: &Arc<RwLock<GStreamerPlayer>>) {
        let open_file_action = gio::SimpleAction::new("open-file", None);
        {
            let window = self.window.clone();
            let player = player.clone();
            open_file_action.connect_activate(move |_, _| {
                Self::show_open_file_dialog(&window, &player);
            });
        }
        self.window.add_action(&open_file_action);

        let open_stream_action = gio::SimpleAction::new("open-stream", None);
        {
            let window = self.window.clone();
            let player = player.clone();
            open_stream_action.connect_activate(move |_, _| {
                let window_clone = window.clone();
                let player_clone = player.clone();
                StreamDialog::present(&window, move |url| {
                    Self::load_and_play(
                        &window_clone,
                        &player_clone,
                        MediaSource::from_url(url.as_str()),
                    );
                });
            });
        }
        self.window.add_action(&open_stream_action);

        let quit_action = gio::SimpleAction::new("quit", None);
        {
            let window = self.window.clone();
            quit_action.connect_activate(move |_, _| {
                if let Some(app) = window.application() {
                    app.quit();
                }
            });
        }
        self.window.add_action(&quit_action);

        app.set_accels_for_action("win.open-file", &["<primary>o"]);
        app.set_accels_for_action("win.open-stream", &["<primary>l"]);
        app.set_accels_for_action("win.quit", &["<primary>q"]);
        app.set_accels_for_action("window.close", &["<primary>w"]);
    }

    fn show_open_file_dialog(
        window: &adw::ApplicationWindow,
        player: &Arc<RwLock<GStreamerPlayer>>,
    ) {
        let filter = gtk4::FileFilter::new();
        filter.set_name(Some("Media files"));
        for pattern in MEDIA_FILE_PATTERNS {
            filter.add_pattern(pattern);
        }
        let filters = gio::ListStore::new::<gtk4::FileFilter>();
        filters.append(&filter);

        let dialog = gtk4::FileDialog::builder()
            .title("Open Media File")
            .modal(true)
            .build();
        dialog.set_filters(Some(&filters));

        let parent = window.clone();
        let window = window.clone();
        let player = player.clone();
        dialog.open(Some(&parent), gio::Cancellable::NONE, move |result| {
            match result {
                Ok(file) => {
                    if let Some(path) = file.path() {
                        Self::load_and_play(&window, &player, MediaSource::from_path(path));
                    } else {
                        error!("Selected file has no local path");
                    }
                }
                Err(e) => debug!("File dialog dismissed: {}", e),
            }
        });
    }

    /// Loads a source and starts playback. The window title changes only
    /// once playback actually started; failures are logged and the
    /// previous state is left alone.
    fn load_and_play(
        window: &adw::ApplicationWindow,
        player: &Arc<RwLock<GStreamerPlayer>>,
        source: MediaSource,
    ) {
        let window = window.clone();
        let player = player.clone();
        glib::spawn_future_local(async move {
            let title = source.display_title();
            let player = player.read().await;

            if let Err(e) = player.load_media(&source).await {
                error!("Failed to load {}: {}", title, e);
                return;
            }
            if let Err(e) = player.play().await {
                error!("Failed to start playback: {}", e);
                return;
            }

            window.set_title(Some(&title));
        });
    }
}

fn build_menu_button() -> gtk4::MenuButton {
    let media_section = gio::Menu::new();
    media_section.append(Some("_Open File…"), Some("win.open-file"));
    media_section.append(Some("Open _Stream…"), Some("win.open-stream"));

    let app_section = gio::Menu::new();
    app_section.append(Some("_Quit"), Some("win.quit"));

    let primary_menu = gio::Menu::new();
    primary_menu.append_section(None, &media_section);
    primary_menu.append_section(None, &app_section);

    let popover_menu = gtk4::PopoverMenu::from_model(Some(&primary_menu));

    let menu_button = gtk4::MenuButton::new();
    menu_button.set_icon_name("open-menu-symbolic");
    menu_button.set_tooltip_text(Some("Main Menu"));
    menu_button.set_popover(Some(&popover_menu));
    menu_button
}
