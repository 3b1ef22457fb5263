use std::sync::Arc;

use eframe::{egui, Frame};
use log::info;

use super::state::{AppState, StartupError};
use crate::config::ConfigManager;
use crate::sensor::SensorManager;

pub struct SensorPlotApp {
    pub state: AppState,
    pub config: ConfigManager,
}

impl SensorPlotApp {
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        config: ConfigManager,
        manager: Arc<dyn SensorManager>,
    ) -> Result<Self, StartupError> {
        let ctx = cc.egui_ctx.clone();
        let state = AppState::start(config.get_config(), manager, move || ctx.request_repaint())?;

        info!(
            "Plotting {} with a {}-reading moving average",
            state.sensor.name,
            config.get_config().smoothing.window_size
        );

        Ok(Self { state, config })
    }
}

impl eframe::App for SensorPlotApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut Frame) {
        ctx.set_visuals(egui::Visuals::light());

        // Plot state is only ever touched here, on the UI thread.
        self.state.process_pending();

        crate::app::ui::render_status_bar(self, ctx);
        crate::app::ui::render_main_panel(self, ctx);
    }
}
