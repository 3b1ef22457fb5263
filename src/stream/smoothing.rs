use std::collections::VecDeque;

use super::{Observable, Observer, Subscription};
use crate::types::Reading;

/// Trailing window mean that only reports once the window is full.
#[derive(Debug, Clone)]
pub struct MovingAverage {
    window: VecDeque<f64>,
    size: usize,
}

impl MovingAverage {
    pub fn new(size: usize) -> Self {
        let size = size.max(1);
        Self {
            window: VecDeque::with_capacity(size),
            size,
        }
    }

    /// Adds `value` and returns the mean of the last `size` values, or `None`
    /// while fewer than `size` values have been seen.
    pub fn push(&mut self, value: f64) -> Option<f64> {
        self.window.push_back(value);
        if self.window.len() > self.size {
            self.window.pop_front();
        }

        if self.window.len() < self.size {
            return None;
        }
        Some(self.window.iter().sum::<f64>() / self.size as f64)
    }
}

/// Smoothed view of a reading stream. Each subscription owns its own window,
/// and every output carries the arrival time of the newest reading in it.
pub struct Smoothed<S> {
    source: S,
    window: usize,
}

impl<S> Smoothed<S> {
    pub fn new(source: S, window: usize) -> Self {
        Self { source, window }
    }
}

impl<S: Observable<Item = Reading>> Observable for Smoothed<S> {
    type Item = Reading;

    fn subscribe(&self, mut observer: Observer<Reading>) -> Subscription {
        let mut average = MovingAverage::new(self.window);
        self.source.subscribe(Box::new(move |reading: Reading| {
            if let Some(mean) = average.push(reading.value) {
                observer(Reading::new(mean, reading.at));
            }
        }))
    }
}
