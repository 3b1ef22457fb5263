use std::sync::Arc;

use log::info;

use crate::clock::{Clock, SystemClock};
use crate::config::AppConfig;
use crate::dispatch::{UiMessage, UiPoster, UiQueue};
use crate::plotter::LivePlot;
use crate::render::{TickSchedule, Ticker};
use crate::sensor::{ObservableSensorListener, SensorError, SensorManager};
use crate::stream::{Observable, ObservableExt, Subscription};
use crate::types::{Reading, Sensor};

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error(transparent)]
    Sensor(#[from] SensorError),
    #[error("failed to start render ticker: {0}")]
    Ticker(#[from] std::io::Error),
}

/// Attaches the raw and smoothed branches of `source` to the UI queue.
/// For each reading the raw point is posted before its smoothed point.
pub fn wire_streams<S>(source: S, window: usize, poster: &UiPoster) -> Vec<Subscription>
where
    S: Observable<Item = Reading> + Clone,
{
    let raw_poster = poster.clone();
    let raw = source.clone().map(UiMessage::Raw).subscribe(Box::new(move |message| {
        raw_poster.post(message);
    }));

    let smoothed_poster = poster.clone();
    let smoothed = source
        .smoothed(window)
        .map(UiMessage::Smoothed)
        .subscribe(Box::new(move |message| {
            smoothed_poster.post(message);
        }));

    vec![raw, smoothed]
}

/// Everything the running app owns: the sensor adapter and its stream
/// subscriptions, the render ticker, the UI queue and the plot it feeds.
pub struct AppState {
    pub plot: LivePlot,
    pub queue: UiQueue,
    pub sensor: Sensor,
    adapter: Arc<ObservableSensorListener>,
    subscriptions: Vec<Subscription>,
    ticker: Option<Ticker>,
}

impl AppState {
    /// Wires sensor → streams → UI queue and starts the ticker. `wake` is
    /// called from the ticker thread after every tick to request a repaint.
    pub fn start<W>(config: &AppConfig, manager: Arc<dyn SensorManager>, wake: W) -> Result<Self, StartupError>
    where
        W: Fn() + Send + 'static,
    {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let queue = UiQueue::new(config.channels.ui_queue_capacity);

        let adapter = ObservableSensorListener::new(manager, config.sensor.axis, Arc::clone(&clock));
        let sensor = adapter.default_sensor(config.sensor.sensor_type)?;
        let subscriptions = wire_streams(Arc::clone(&adapter), config.smoothing.window_size, &queue.poster());
        adapter.listen(&sensor, config.sensor.delay)?;

        let ticker = Ticker::spawn(config.render.tick_interval(), queue.poster(), wake)?;
        let plot = LivePlot::new(
            clock,
            TickSchedule::from_config(&config.render),
            config.render.max_plot_length_ms(),
        );

        Ok(Self {
            plot,
            queue,
            sensor,
            adapter,
            subscriptions,
            ticker: Some(ticker),
        })
    }

    /// Applies every queued message to the plot. UI thread only.
    pub fn process_pending(&mut self) -> usize {
        let mut applied = 0;
        for message in self.queue.drain() {
            self.plot.apply(message);
            applied += 1;
        }
        applied
    }

    pub fn is_running(&self) -> bool {
        self.ticker.is_some() && !self.adapter.is_disposed()
    }

    pub fn shutdown(&mut self) {
        if let Some(mut ticker) = self.ticker.take() {
            ticker.stop();
        }
        self.subscriptions.clear();
        if !self.adapter.is_disposed() {
            self.adapter.dispose();
            info!("Sensor pipeline shut down");
        }
    }
}

impl Drop for AppState {
    fn drop(&mut self) {
        self.shutdown();
    }
}
