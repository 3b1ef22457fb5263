use egui::Color32;
use egui_plot::{Legend, Line, Plot, PlotBounds, PlotPoints};
use log::debug;
use std::sync::Arc;
use std::time::Instant;

use crate::clock::Clock;
use crate::config::PlotConfig;
use crate::dispatch::UiMessage;
use crate::render::{TickAction, TickSchedule};
use crate::types::{PlottedPoint, Reading};
use crate::utils::{format_elapsed, format_fixed_width};

/// Raw and smoothed series sharing one time origin; a clear resets all three.
pub struct LivePlot {
    raw: Vec<PlottedPoint>,
    smoothed: Vec<PlottedPoint>,
    origin: Instant,
    clock: Arc<dyn Clock>,
    schedule: TickSchedule,
    window_ms: f64,
    ticks: u64,
    clears: u64,
}

impl LivePlot {
    pub fn new(clock: Arc<dyn Clock>, schedule: TickSchedule, window_ms: f64) -> Self {
        Self {
            raw: Vec::new(),
            smoothed: Vec::new(),
            origin: clock.now(),
            clock,
            schedule,
            window_ms,
            ticks: 0,
            clears: 0,
        }
    }

    pub fn apply(&mut self, message: UiMessage) {
        match message {
            UiMessage::Raw(reading) => {
                let point = self.point(reading);
                self.raw.push(point);
            }
            UiMessage::Smoothed(reading) => {
                let point = self.point(reading);
                self.smoothed.push(point);
            }
            UiMessage::Tick(tick) => self.on_tick(tick),
        }
    }

    fn point(&self, reading: Reading) -> PlottedPoint {
        PlottedPoint::new(reading.elapsed_ms(self.origin), reading.value)
    }

    fn on_tick(&mut self, tick: u64) {
        self.ticks += 1;
        if self.schedule.action_for(tick) == TickAction::ClearThenRedraw {
            self.clear();
        }
    }

    fn clear(&mut self) {
        debug!(
            "Clearing plot: {} raw, {} smoothed points",
            self.raw.len(),
            self.smoothed.len()
        );
        self.raw.clear();
        self.smoothed.clear();
        self.origin = self.clock.now();
        self.clears += 1;
    }

    pub fn raw(&self) -> &[PlottedPoint] {
        &self.raw
    }

    pub fn smoothed(&self) -> &[PlottedPoint] {
        &self.smoothed
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn clears(&self) -> u64 {
        self.clears
    }

    pub fn schedule(&self) -> TickSchedule {
        self.schedule
    }

    pub fn ui(&self, ui: &mut egui::Ui, config: &PlotConfig) {
        let (y_min, y_max) = self
            .raw
            .iter()
            .chain(self.smoothed.iter())
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(min, max), p| {
                (min.min(p.value), max.max(p.value))
            });
        let (y_min, y_max) = if y_min.is_finite() {
            let range = (y_max - y_min).max(0.1);
            (y_min - range * 0.05, y_max + range * 0.05)
        } else {
            (-1.0, 1.0)
        };

        let mut plot = Plot::new("linear_acceleration")
            .height(config.plot_height)
            .x_axis_formatter(|mark, _| format_elapsed(mark.value))
            .y_axis_formatter(|mark, _| format_fixed_width(mark.value))
            .show_x(config.show_axes)
            .show_y(config.show_axes)
            .allow_drag(config.allow_drag)
            .allow_zoom(config.allow_zoom);
        if config.show_legend {
            plot = plot.legend(Legend::default());
        }

        plot.show(ui, |plot_ui| {
            plot_ui.set_plot_bounds(PlotBounds::from_min_max([0.0, y_min], [self.window_ms, y_max]));

            plot_ui.line(
                Line::new("Raw", series(&self.raw))
                    .color(rgb(config.colors.raw))
                    .width(config.line_width),
            );
            plot_ui.line(
                Line::new("Smoothed", series(&self.smoothed))
                    .color(rgb(config.colors.smoothed))
                    .width(config.line_width * 1.5),
            );
        });
    }
}

fn series(points: &[PlottedPoint]) -> PlotPoints<'static> {
    PlotPoints::from(points.iter().map(PlottedPoint::as_array).collect::<Vec<_>>())
}

fn rgb(color: [u8; 3]) -> Color32 {
    Color32::from_rgb(color[0], color[1], color[2])
}
