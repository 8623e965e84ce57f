mod app;
mod color;
mod config;
mod data;
mod error;
mod state;
mod ui;
mod view;

use app::SuperstoreApp;
use config::DashboardConfig;
use eframe::egui;

fn main() -> eframe::Result {
    env_logger::init();

    let config = DashboardConfig::load_or_default();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([config.window_width, config.window_height])
            .with_min_inner_size([800.0, 500.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Superstore EDA",
        options,
        Box::new(|_cc| Ok(Box::new(SuperstoreApp::new(config)))),
    )
}
