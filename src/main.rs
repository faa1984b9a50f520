mod app;
use lingocards::*;

use app::MyApp;
use config::AppConfig;
use database::{db::open_database, shared};

fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = AppConfig::load()?;
    let conn = open_database(&config.database_path)?;
    let app = MyApp::new(shared(conn), &config)?;

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([560.0, 760.0]),
        ..Default::default()
    };
    eframe::run_native(
        "Lingocards",
        options,
        Box::new(move |_cc| Ok(Box::new(app))),
    )?;
    Ok(())
}
