use eframe::egui;

mod app;
mod preview;

use app::ImageLabApp;
use imagelab::SettingsStore;

fn main() -> Result<(), eframe::Error> {
    env_logger::init(); // Log to stderr (if you run with `RUST_LOG=debug`).

    let settings = SettingsStore::open();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1000.0, 600.0])
            .with_min_inner_size([640.0, 480.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Simple Image Processor",
        options,
        Box::new(|_cc| Ok(Box::new(ImageLabApp::new(settings)))),
    )
}
