use adw::glib;
use anyhow::Result;
use gtk4::prelude::*;
use libadwaita as adw;
use libadwaita::prelude::*;
use std::sync::Arc;
use tracing::{error, info};

use crate::config::Config;
use crate::constants::APP_ID;
use crate::ui::MainWindow;

pub struct MatineeApp {
    app: adw::Application,
}

impl MatineeApp {
    pub fn new() -> Result<Self> {
        let config = Arc::new(Config::load()?);

        let app = adw::Application::builder()
            .application_id(APP_ID)
            .build();

        let config_clone = config.clone();
        app.connect_activate(move |app| {
            info!("Application activated, creating main window");

            let css_provider = gtk4::CssProvider::new();
            css_provider.load_from_string(
                ".video-container {
                    background-color: black;
                }

                .player-controls .progress-bar {
                    min-height: 6px;
                }",
            );
            gtk4::style_context_add_provider_for_display(
                &gtk4::gdk::Display::default().expect("Could not get default display"),
                &css_provider,
                gtk4::STYLE_PROVIDER_PRIORITY_APPLICATION,
            );

            // A window construction failure is fatal
            let window = match MainWindow::new(app, &config_clone) {
                Ok(window) => window,
                Err(e) => {
                    error!("Failed to create the main window: {:#}", e);
                    std::process::exit(1);
                }
            };
            window.present();
        });

        Ok(Self { app })
    }

    pub fn run(&self) -> glib::ExitCode {
        info!("Running Matinee");
        self.app.run()
    }
}
