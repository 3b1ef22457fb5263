use eframe::egui;
use crate::app::sensor_app::SensorPlotApp;

pub fn render_main_panel(app: &mut SensorPlotApp, ctx: &egui::Context) {
    egui::CentralPanel::default().show(ctx, |ui| {
        let config = app.config.get_config();

        ui.horizontal(|ui| {
            ui.heading("Linear acceleration");
            ui.separator();
            ui.colored_label(color(config.plot.colors.raw), "raw");
            ui.colored_label(
                color(config.plot.colors.smoothed),
                format!("smoothed ({} readings)", config.smoothing.window_size),
            );
        });
        ui.add_space(10.0);

        app.state.plot.ui(ui, &config.plot);
    });
}

fn color(rgb: [u8; 3]) -> egui::Color32 {
    egui::Color32::from_rgb(rgb[0], rgb[1], rgb[2])
}
