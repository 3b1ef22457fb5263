//! Push-based streams used by the sensor pipeline.

pub mod smoothing;
pub mod subject;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

pub use smoothing::Smoothed;
pub use subject::Subject;

/// Callback receiving every item of a stream.
pub type Observer<T> = Box<dyn FnMut(T) + Send>;

pub trait Observable {
    type Item;

    fn subscribe(&self, observer: Observer<Self::Item>) -> Subscription;
}

impl<O: Observable + ?Sized> Observable for Arc<O> {
    type Item = O::Item;

    fn subscribe(&self, observer: Observer<Self::Item>) -> Subscription {
        (**self).subscribe(observer)
    }
}

/// Operator combinators available on every observable.
pub trait ObservableExt: Observable + Sized {
    fn map<U, F>(self, f: F) -> Map<Self, F>
    where
        F: Fn(Self::Item) -> U + Clone + Send + 'static,
    {
        Map { source: self, f }
    }

    /// Sliding-window mean over the last `window` items, sliding by one.
    fn smoothed(self, window: usize) -> Smoothed<Self> {
        Smoothed::new(self, window)
    }
}

impl<O: Observable> ObservableExt for O {}

pub struct Map<S, F> {
    source: S,
    f: F,
}

impl<S, F, U> Observable for Map<S, F>
where
    S: Observable,
    S::Item: 'static,
    F: Fn(S::Item) -> U + Clone + Send + 'static,
    U: 'static,
{
    type Item = U;

    fn subscribe(&self, mut observer: Observer<U>) -> Subscription {
        let f = self.f.clone();
        self.source.subscribe(Box::new(move |item| observer(f(item))))
    }
}

/// Disposable handle to an attached observer. Disposing is idempotent and
/// also happens on drop.
#[must_use = "dropping a Subscription disposes it immediately"]
pub struct Subscription {
    teardown: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub fn new(teardown: impl FnOnce() + Send + 'static) -> Self {
        Self {
            teardown: Some(Box::new(teardown)),
        }
    }

    pub fn dispose(&mut self) {
        if let Some(teardown) = self.teardown.take() {
            teardown();
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.teardown.is_none()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

/// Locks a mutex, recovering the guard if a panicking observer poisoned it.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn dispose_runs_teardown_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let mut sub = Subscription::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        sub.dispose();
        sub.dispose();
        drop(sub);

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn map_transforms_each_item() {
        let subject: Subject<i32> = Subject::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);

        let _sub = subject
            .clone()
            .map(|v: i32| v * 10)
            .subscribe(Box::new(move |v| sink.lock().unwrap().push(v)));

        subject.on_next(1);
        subject.on_next(2);

        assert_eq!(*seen.lock().unwrap(), vec![10, 20]);
    }
}
