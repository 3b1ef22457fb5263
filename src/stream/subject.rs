use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

use super::{lock, Observable, Observer, Subscription};

struct Slot<T> {
    active: AtomicBool,
    observer: Mutex<Observer<T>>,
}

impl<T> Slot<T> {
    fn deactivate(&self) {
        self.active.store(false, Ordering::SeqCst);
    }
}

struct Inner<T> {
    observers: Mutex<Vec<(u64, Arc<Slot<T>>)>>,
    next_id: AtomicU64,
}

/// Multicast channel: every item pushed with [`Subject::on_next`] is handed
/// synchronously, in subscription order, to every attached observer.
///
/// Cloning a `Subject` yields another handle to the same channel.
pub struct Subject<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for Subject<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Clone + Send + 'static> Subject<T> {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                observers: Mutex::new(Vec::new()),
                next_id: AtomicU64::new(0),
            }),
        }
    }

    pub fn on_next(&self, item: T) {
        // Snapshot so observers may subscribe or dispose while being notified;
        // slots detached since the snapshot are skipped.
        let slots: Vec<Arc<Slot<T>>> = lock(&self.inner.observers)
            .iter()
            .map(|(_, slot)| Arc::clone(slot))
            .collect();

        for slot in slots {
            if !slot.active.load(Ordering::SeqCst) {
                continue;
            }
            let mut observer = lock(&slot.observer);
            if slot.active.load(Ordering::SeqCst) {
                (*observer)(item.clone());
            }
        }
    }

    /// Detaches every observer. Outstanding subscriptions become no-ops and
    /// no delivery starts after this returns.
    pub fn clear(&self) {
        for (_, slot) in lock(&self.inner.observers).drain(..) {
            slot.deactivate();
        }
    }

    #[cfg(test)]
    pub fn observer_count(&self) -> usize {
        lock(&self.inner.observers).len()
    }
}

impl<T: Clone + Send + 'static> Default for Subject<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + Send + 'static> Observable for Subject<T> {
    type Item = T;

    fn subscribe(&self, observer: Observer<T>) -> Subscription {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let slot = Arc::new(Slot {
            active: AtomicBool::new(true),
            observer: Mutex::new(observer),
        });
        lock(&self.inner.observers).push((id, Arc::clone(&slot)));

        let weak: Weak<Inner<T>> = Arc::downgrade(&self.inner);
        Subscription::new(move || {
            slot.deactivate();
            if let Some(inner) = weak.upgrade() {
                lock(&inner.observers).retain(|(other, _)| *other != id);
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recorder() -> (Arc<Mutex<Vec<i32>>>, Observer<i32>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        (seen, Box::new(move |v| sink.lock().unwrap().push(v)))
    }

    #[test]
    fn every_observer_sees_every_item_in_order() {
        let subject: Subject<i32> = Subject::new();
        let (a, obs_a) = recorder();
        let (b, obs_b) = recorder();
        let _sa = subject.subscribe(obs_a);
        let _sb = subject.subscribe(obs_b);

        for v in 1..=3 {
            subject.on_next(v);
        }

        assert_eq!(*a.lock().unwrap(), vec![1, 2, 3]);
        assert_eq!(*b.lock().unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn disposed_observer_is_not_notified() {
        let subject: Subject<i32> = Subject::new();
        let (seen, observer) = recorder();
        let mut sub = subject.subscribe(observer);

        subject.on_next(1);
        sub.dispose();
        subject.on_next(2);

        assert_eq!(*seen.lock().unwrap(), vec![1]);
        assert_eq!(subject.observer_count(), 0);
    }

    #[test]
    fn dropping_subscription_detaches() {
        let subject: Subject<i32> = Subject::new();
        let (seen, observer) = recorder();
        drop(subject.subscribe(observer));

        subject.on_next(7);
        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn late_subscriber_gets_no_replay() {
        let subject: Subject<i32> = Subject::new();
        subject.on_next(1);

        let (seen, observer) = recorder();
        let _sub = subject.subscribe(observer);
        subject.on_next(2);

        assert_eq!(*seen.lock().unwrap(), vec![2]);
    }

    #[test]
    fn clear_detaches_everyone() {
        let subject: Subject<i32> = Subject::new();
        let (seen, observer) = recorder();
        let mut sub = subject.subscribe(observer);

        subject.clear();
        subject.on_next(1);
        sub.dispose();

        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn clearing_mid_delivery_skips_the_remaining_observers() {
        let subject: Subject<i32> = Subject::new();
        let handle = subject.clone();
        let _first = subject.subscribe(Box::new(move |v| {
            if v == 2 {
                handle.clear();
            }
        }));
        let (seen, observer) = recorder();
        let _second = subject.subscribe(observer);

        subject.on_next(1);
        subject.on_next(2);
        subject.on_next(3);

        assert_eq!(*seen.lock().unwrap(), vec![1]);
    }
}
