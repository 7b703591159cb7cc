mod app;

use eframe::egui;
use harborview::{telemetry, Config};

fn main() -> eframe::Result {
    telemetry::init();
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            log::error!("invalid configuration: {err}");
            std::process::exit(2);
        }
    };
    log::info!(
        "backend {} (timeout {:?}), state in {}",
        config.backend_url,
        config.timeout,
        config.state_dir.display()
    );

    let mut native_options = eframe::NativeOptions::default();
    native_options.persist_window = true;
    native_options.viewport = egui::ViewportBuilder::default().with_inner_size([1400.0, 900.0]);

    eframe::run_native(
        "Harborview",
        native_options,
        Box::new(move |cc| {
            let app = app::HarborviewApp::new(cc, config)?;
            Ok(Box::new(app))
        }),
    )
}
