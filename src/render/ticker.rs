use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, select, tick, Sender};
use log::{debug, error, info};

use crate::config::RenderConfig;
use crate::dispatch::{UiMessage, UiPoster};

/// What the UI does with one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickAction {
    Redraw,
    ClearThenRedraw,
}

/// Picks the action for a tick: clear whenever `tick % clear_every == 0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickSchedule {
    clear_every: u64,
}

impl TickSchedule {
    pub fn new(clear_every: u64) -> Self {
        Self {
            clear_every: clear_every.max(1),
        }
    }

    pub fn from_config(render: &RenderConfig) -> Self {
        Self::new(render.clear_every_ticks())
    }

    pub fn action_for(&self, tick: u64) -> TickAction {
        if tick % self.clear_every == 0 {
            TickAction::ClearThenRedraw
        } else {
            TickAction::Redraw
        }
    }

    pub fn clear_every(&self) -> u64 {
        self.clear_every
    }
}

/// Background timer posting `UiMessage::Tick(n)` every interval, `n`
/// counting up from zero, and waking the UI after each post.
///
/// Stops on [`stop`](Self::stop), on drop, or when the UI queue closes.
pub struct Ticker {
    stop: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl Ticker {
    pub fn spawn<W>(interval: Duration, poster: UiPoster, wake: W) -> std::io::Result<Self>
    where
        W: Fn() + Send + 'static,
    {
        let (stop, stop_rx) = bounded::<()>(0);

        let handle = thread::Builder::new()
            .name("render-ticker".to_string())
            .spawn(move || {
                let ticks = tick(interval);
                let mut count: u64 = 0;
                loop {
                    select! {
                        recv(ticks) -> _ => {
                            if !poster.post(UiMessage::Tick(count)) {
                                debug!("UI queue closed, ticker exiting");
                                break;
                            }
                            wake();
                            count += 1;
                        }
                        recv(stop_rx) -> _ => break,
                    }
                }
                info!("Render ticker stopped after {} ticks", count);
            })?;

        info!("Render ticker started every {:?}", interval);
        Ok(Self {
            stop: Some(stop),
            handle: Some(handle),
        })
    }

    pub fn stop(&mut self) {
        // Dropping the sender disconnects `stop_rx`, which wakes the select.
        self.stop.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                error!("Render ticker thread panicked");
            }
        }
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.stop();
    }
}
