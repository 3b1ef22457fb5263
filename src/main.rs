mod app;
mod clock;
mod config;
mod dispatch;
mod logger;
mod mqtt;
mod plotter;
mod render;
mod sensor;
mod stream;
mod types;
mod utils;

use std::env;
use std::error::Error;
use std::path::{Path, PathBuf};

use eframe::egui;
use log::{error, info};

use app::SensorPlotApp;
use config::{ConfigManager, DEFAULT_CONFIG_FILE};

const USAGE: &str = "usage: SensePlot [CONFIG.toml] | --init-config [PATH]";

fn main() -> Result<(), Box<dyn Error>> {
    logger::init_logger();

    let mut args = env::args().skip(1);
    let first = args.next();
    match first.as_deref() {
        Some("--help") | Some("-h") => {
            println!("{}", USAGE);
            return Ok(());
        }
        Some("--init-config") => {
            let path = args.next().map(PathBuf::from).unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
            ConfigManager::new().save_to_file(&path)?;
            info!("Wrote default configuration to {}", path.display());
            return Ok(());
        }
        _ => {}
    }

    let config = ConfigManager::discover(first.as_deref().map(Path::new))?;
    match config.config_path() {
        Some(path) => info!("Loaded configuration from {}", path.display()),
        None => info!("Using built-in configuration"),
    }
    info!("Application starting");

    let settings = config.get_config().clone();
    let manager = sensor::create_manager(&settings.sensor, &settings.mqtt);

    let options = eframe::NativeOptions {
        vsync: settings.window.vsync,
        hardware_acceleration: if settings.window.hardware_acceleration {
            eframe::HardwareAcceleration::Preferred
        } else {
            eframe::HardwareAcceleration::Off
        },
        renderer: eframe::Renderer::Glow,
        viewport: egui::ViewportBuilder::default()
            .with_title(settings.window.title.clone())
            .with_inner_size([settings.window.width, settings.window.height])
            .with_resizable(settings.window.resizable),
        ..Default::default()
    };

    if let Err(e) = eframe::run_native(
        &settings.window.title,
        options,
        Box::new(move |cc| {
            let app = SensorPlotApp::new(cc, config, manager)?;
            Ok(Box::new(app))
        }),
    ) {
        error!("GUI failed: {}", e);
        std::process::exit(1);
    }

    info!("GUI closed, sensor pipeline stopped");
    Ok(())
}
