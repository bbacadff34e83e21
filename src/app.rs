use gtk4::prelude::*;
use gtk4::{gio, Application};
use std::path::PathBuf;

use crate::config::CarouselConfig;
use crate::models::Portfolio;
use crate::ui::MainWindow;

const APP_ID: &str = "io.github.folio.Portfolio";

pub struct FolioApp {
    app: Application,
}

impl FolioApp {
    pub fn new() -> Self {
        let app = Application::builder()
            .application_id(APP_ID)
            .flags(gio::ApplicationFlags::HANDLES_OPEN)
            .build();

        app.connect_activate(Self::on_activate);
        app.connect_open(Self::on_open);

        Self { app }
    }

    pub fn run(&self) -> i32 {
        self.app.run().into()
    }

    fn on_activate(app: &Application) {
        Self::show(app, &Portfolio::showcase());
    }

    fn on_open(app: &Application, files: &[gio::File], _hint: &str) {
        let paths: Vec<PathBuf> = files.iter().filter_map(|f| f.path()).collect();
        let portfolio = match Portfolio::from_paths(&paths) {
            Ok(portfolio) => portfolio,
            Err(err) => {
                tracing::warn!("{:#}; showing the built-in page instead", err);
                Portfolio::showcase()
            }
        };
        Self::show(app, &portfolio);
    }

    fn show(app: &Application, portfolio: &Portfolio) {
        let window = MainWindow::new(app, portfolio, CarouselConfig::from_env());
        window.present();
        // Keep the window alive by storing it on the Application.
        unsafe {
            app.set_data("main-window", window);
        }
    }
}

impl Default for FolioApp {
    fn default() -> Self {
        Self::new()
    }
}
