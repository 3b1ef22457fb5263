//! Single-consumer work queue bound to the UI thread.
//!
//! Sensor and timer threads never touch plot state; they post a
//! [`UiMessage`] through a [`UiPoster`] and the UI thread drains the
//! [`UiQueue`] once per frame.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crossbeam_channel::{unbounded, Receiver, Sender};
use log::warn;

use crate::types::Reading;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UiMessage {
    Raw(Reading),
    Smoothed(Reading),
    Tick(u64),
}

pub struct UiQueue {
    sender: Sender<UiMessage>,
    receiver: Receiver<UiMessage>,
    capacity: usize,
    dropped: Arc<AtomicU64>,
}

impl UiQueue {
    /// `capacity` bounds the reading backlog only; ticks are always queued.
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = unbounded();
        Self {
            sender,
            receiver,
            capacity,
            dropped: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn poster(&self) -> UiPoster {
        UiPoster {
            sender: self.sender.clone(),
            capacity: self.capacity,
            dropped: Arc::clone(&self.dropped),
        }
    }

    /// Everything posted so far, oldest first. Call only from the UI thread.
    pub fn drain(&self) -> impl Iterator<Item = UiMessage> + '_ {
        self.receiver.try_iter()
    }

    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

#[derive(Clone)]
pub struct UiPoster {
    sender: Sender<UiMessage>,
    capacity: usize,
    dropped: Arc<AtomicU64>,
}

impl UiPoster {
    /// Never blocks. Readings are dropped once the backlog reaches capacity,
    /// ticks never are. Returns `false` once a send finds the UI side gone.
    pub fn post(&self, message: UiMessage) -> bool {
        let is_reading = !matches!(message, UiMessage::Tick(_));
        if is_reading && self.sender.len() >= self.capacity {
            let dropped = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
            if dropped == 1 || dropped % 1000 == 0 {
                warn!("UI queue is full, {} readings dropped so far", dropped);
            }
            return true;
        }
        self.sender.send(message).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Instant;

    #[test]
    fn drains_in_post_order() {
        let queue = UiQueue::new(8);
        let poster = queue.poster();
        let now = Instant::now();

        poster.post(UiMessage::Raw(Reading::new(1.0, now)));
        poster.post(UiMessage::Tick(0));
        poster.post(UiMessage::Smoothed(Reading::new(2.0, now)));

        let drained: Vec<_> = queue.drain().collect();
        assert_eq!(
            drained,
            vec![
                UiMessage::Raw(Reading::new(1.0, now)),
                UiMessage::Tick(0),
                UiMessage::Smoothed(Reading::new(2.0, now)),
            ]
        );
        assert_eq!(queue.drain().count(), 0);
    }

    #[test]
    fn full_queue_drops_readings_but_keeps_ticks() {
        let queue = UiQueue::new(2);
        let poster = queue.poster();
        let now = Instant::now();

        for v in 0..4 {
            assert!(poster.post(UiMessage::Raw(Reading::new(f64::from(v), now))));
        }
        assert!(poster.post(UiMessage::Tick(7)));
        assert!(poster.post(UiMessage::Tick(8)));

        assert_eq!(queue.dropped(), 2);
        let drained: Vec<_> = queue.drain().collect();
        assert_eq!(
            drained,
            vec![
                UiMessage::Raw(Reading::new(0.0, now)),
                UiMessage::Raw(Reading::new(1.0, now)),
                UiMessage::Tick(7),
                UiMessage::Tick(8),
            ]
        );
    }

    #[test]
    fn posts_from_other_threads_arrive() {
        let queue = UiQueue::new(16);
        let poster = queue.poster();

        thread::spawn(move || {
            for tick in 0..4 {
                poster.post(UiMessage::Tick(tick));
            }
        })
        .join()
        .unwrap();

        assert_eq!(queue.drain().count(), 4);
    }

    #[test]
    fn post_reports_a_closed_queue() {
        let queue = UiQueue::new(2);
        let poster = queue.poster();
        drop(queue);

        assert!(!poster.post(UiMessage::Tick(0)));
    }
}
