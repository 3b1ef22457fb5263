use eframe::egui;
use crate::app::sensor_app::SensorPlotApp;
use crate::config::SensorBackend;

pub fn render_status_bar(app: &mut SensorPlotApp, ctx: &egui::Context) {
    egui::TopBottomPanel::top("status_bar")
        .min_height(40.0)
        .show(ctx, |ui| {
            ui.add_space(5.0);
            ui.horizontal(|ui| {
                ui.label("Status:");

                let (status_text, status_color) = if app.state.is_running() {
                    ("Listening", egui::Color32::from_rgb(0, 150, 0))
                } else {
                    ("Stopped", egui::Color32::from_rgb(150, 0, 0))
                };
                ui.colored_label(status_color, status_text);

                ui.separator();
                let backend = match app.config.get_config().sensor.backend {
                    SensorBackend::Simulated => "simulated",
                    SensorBackend::Mqtt => "MQTT",
                };
                ui.label(format!("Sensor: {} ({})", app.state.sensor.name, backend));

                ui.separator();
                render_plot_details(app, ui);
            });
            ui.add_space(5.0);
        });
}

fn render_plot_details(app: &SensorPlotApp, ui: &mut egui::Ui) {
    let plot = &app.state.plot;
    let render = &app.config.get_config().render;

    ui.label(format!("Window: {:.1}s", render.max_plot_length_seconds as f64));
    ui.separator();

    let every = plot.schedule().clear_every();
    let until_clear = (every - plot.ticks() % every) % every + 1;
    ui.label(format!(
        "Tick {} ({} clears, next in {})",
        plot.ticks(),
        plot.clears(),
        until_clear
    ));
    ui.separator();

    ui.label(format!("Points: {} raw / {} smoothed", plot.raw().len(), plot.smoothed().len()));

    let dropped = app.state.queue.dropped();
    if dropped > 0 {
        ui.separator();
        ui.colored_label(
            egui::Color32::from_rgb(255, 165, 0),
            format!("{} dropped", dropped),
        );
    }
}
