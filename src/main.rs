mod app;
mod state;
mod ui;

use app::RnavistaApp;
use eframe::egui;

fn main() -> eframe::Result {
    env_logger::init();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_min_inner_size([600.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        "rnavista – RNA structure & probing viewer",
        options,
        Box::new(|_cc| Ok(Box::new(RnavistaApp::default()))),
    )
}
