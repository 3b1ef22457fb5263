use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Weak};

use log::{debug, info, warn};

use super::{ListenerId, SensorError, SensorEventListener, SensorManager};
use crate::clock::Clock;
use crate::stream::{lock, Observable, Observer, Subject, Subscription};
use crate::types::{Reading, Sensor, SensorAccuracy, SensorDelay, SensorEvent, SensorType};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Registration {
    Idle,
    Listening(ListenerId),
    Disposed,
}

/// Bridges a sensor manager's callbacks into a [`Reading`] stream.
///
/// Every callback is republished synchronously, on the delivering thread, to
/// all current subscribers. [`dispose`](Self::dispose) unregisters from the
/// manager exactly once; afterwards nothing is emitted.
pub struct ObservableSensorListener {
    manager: Arc<dyn SensorManager>,
    registration: Mutex<Registration>,
    disposed: AtomicBool,
    readings: Subject<Reading>,
    axis: usize,
    clock: Arc<dyn Clock>,
}

impl ObservableSensorListener {
    /// `axis` picks x (0), y (1) or z (2) out of each event; `clock` stamps
    /// readings on arrival.
    pub fn new(manager: Arc<dyn SensorManager>, axis: usize, clock: Arc<dyn Clock>) -> Arc<Self> {
        Arc::new(Self {
            manager,
            registration: Mutex::new(Registration::Idle),
            disposed: AtomicBool::new(false),
            readings: Subject::new(),
            axis,
            clock,
        })
    }

    pub fn default_sensor(&self, kind: SensorType) -> Result<Sensor, SensorError> {
        self.manager
            .default_sensor(kind)
            .ok_or(SensorError::NoDefaultSensor(kind))
    }

    /// Registers with the manager. Calling it again while listening is a no-op.
    pub fn listen(self: &Arc<Self>, sensor: &Sensor, delay: SensorDelay) -> Result<(), SensorError> {
        let mut registration = lock(&self.registration);
        match *registration {
            Registration::Disposed => return Err(SensorError::Disposed),
            Registration::Listening(_) => return Ok(()),
            Registration::Idle => {}
        }

        // The manager only holds a weak handle, so dropping the adapter still disposes it.
        let forwarder = Arc::new(WeakListener(Arc::downgrade(self)));
        let id = self.manager.register_listener(forwarder, sensor, delay)?;
        *registration = Registration::Listening(id);
        info!("Listening to {} ({}) at {:?} delay as {}", sensor.name, sensor.kind, delay, id);
        Ok(())
    }

    /// Stops delivery and detaches all subscribers. Safe to call repeatedly.
    pub fn dispose(&self) {
        let previous = {
            let mut registration = lock(&self.registration);
            std::mem::replace(&mut *registration, Registration::Disposed)
        };
        self.disposed.store(true, Ordering::SeqCst);

        match previous {
            Registration::Disposed => return,
            Registration::Listening(id) => {
                self.manager.unregister_listener(id);
                info!("Sensor {} unregistered", id);
            }
            Registration::Idle => debug!("Sensor listener disposed before it was registered"),
        }
        self.readings.clear();
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }
}

impl SensorEventListener for ObservableSensorListener {
    fn on_sensor_changed(&self, event: &SensorEvent) {
        if self.is_disposed() {
            return;
        }
        match event.values.get(self.axis) {
            Some(&value) => self.readings.on_next(Reading::new(f64::from(value), self.clock.now())),
            None => warn!("Sensor event has no axis {}", self.axis),
        }
    }

    fn on_accuracy_changed(&self, sensor: &Sensor, accuracy: SensorAccuracy) {
        debug!("{} accuracy is now {:?}", sensor.name, accuracy);
    }
}

impl Observable for ObservableSensorListener {
    type Item = Reading;

    fn subscribe(&self, observer: Observer<Reading>) -> Subscription {
        if self.is_disposed() {
            return Subscription::new(|| {});
        }
        self.readings.subscribe(observer)
    }
}

impl Drop for ObservableSensorListener {
    fn drop(&mut self) {
        self.dispose();
    }
}

struct WeakListener(Weak<ObservableSensorListener>);

impl SensorEventListener for WeakListener {
    fn on_sensor_changed(&self, event: &SensorEvent) {
        if let Some(listener) = self.0.upgrade() {
            listener.on_sensor_changed(event);
        }
    }

    fn on_accuracy_changed(&self, sensor: &Sensor, accuracy: SensorAccuracy) {
        if let Some(listener) = self.0.upgrade() {
            listener.on_accuracy_changed(sensor, accuracy);
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::clock::SystemClock;
    use std::collections::HashMap;
    use std::sync::atomic::AtomicU64;

    /// Manager that records registrations and lets the test fire callbacks.
    #[derive(Default)]
    pub(crate) struct RecordingManager {
        listeners: Mutex<HashMap<ListenerId, Arc<dyn SensorEventListener>>>,
        next_id: AtomicU64,
        pub unregistered: Mutex<Vec<ListenerId>>,
        pub no_sensors: bool,
    }

    impl RecordingManager {
        pub fn fire(&self, values: [f32; 3]) {
            let listeners: Vec<_> = self.listeners.lock().unwrap().values().cloned().collect();
            for listener in listeners {
                listener.on_sensor_changed(&SensorEvent::new(values, 0));
            }
        }

        pub fn registered(&self) -> usize {
            self.listeners.lock().unwrap().len()
        }
    }

    impl SensorManager for RecordingManager {
        fn default_sensor(&self, kind: SensorType) -> Option<Sensor> {
            if self.no_sensors {
                return None;
            }
            Some(Sensor::new(kind, "test sensor", "test"))
        }

        fn register_listener(
            &self,
            listener: Arc<dyn SensorEventListener>,
            _sensor: &Sensor,
            _delay: SensorDelay,
        ) -> Result<ListenerId, SensorError> {
            let id = ListenerId(self.next_id.fetch_add(1, Ordering::SeqCst));
            self.listeners.lock().unwrap().insert(id, listener);
            Ok(id)
        }

        fn unregister_listener(&self, id: ListenerId) {
            self.listeners.lock().unwrap().remove(&id);
            self.unregistered.lock().unwrap().push(id);
        }
    }

    fn listening(manager: &Arc<RecordingManager>, axis: usize) -> Arc<ObservableSensorListener> {
        let adapter = ObservableSensorListener::new(manager.clone(), axis, Arc::new(SystemClock));
        let sensor = adapter.default_sensor(SensorType::LinearAcceleration).unwrap();
        adapter.listen(&sensor, SensorDelay::Normal).unwrap();
        adapter
    }

    fn collect(adapter: &ObservableSensorListener) -> (Arc<Mutex<Vec<f64>>>, Subscription) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let sub = adapter.subscribe(Box::new(move |r: Reading| sink.lock().unwrap().push(r.value)));
        (seen, sub)
    }

    #[test]
    fn readings_reach_every_subscriber_in_order() {
        let manager = Arc::new(RecordingManager::default());
        let adapter = listening(&manager, 0);
        let (a, _sa) = collect(&adapter);
        let (b, _sb) = collect(&adapter);

        manager.fire([1.0, 10.0, 100.0]);
        manager.fire([2.0, 20.0, 200.0]);

        assert_eq!(*a.lock().unwrap(), vec![1.0, 2.0]);
        assert_eq!(*b.lock().unwrap(), vec![1.0, 2.0]);
    }

    #[test]
    fn configured_axis_is_published() {
        let manager = Arc::new(RecordingManager::default());
        let adapter = listening(&manager, 2);
        let (seen, _sub) = collect(&adapter);

        manager.fire([1.0, 10.0, 100.0]);

        assert_eq!(*seen.lock().unwrap(), vec![100.0]);
    }

    #[test]
    fn nothing_is_emitted_after_dispose() {
        let manager = Arc::new(RecordingManager::default());
        let adapter = listening(&manager, 0);
        let (seen, _sub) = collect(&adapter);

        manager.fire([1.0, 0.0, 0.0]);
        adapter.dispose();
        manager.fire([2.0, 0.0, 0.0]);
        adapter.on_sensor_changed(&SensorEvent::new([3.0, 0.0, 0.0], 0));

        assert_eq!(*seen.lock().unwrap(), vec![1.0]);
        assert_eq!(manager.registered(), 0);
    }

    #[test]
    fn double_dispose_unregisters_once() {
        let manager = Arc::new(RecordingManager::default());
        let adapter = listening(&manager, 0);

        adapter.dispose();
        adapter.dispose();
        drop(adapter);

        assert_eq!(manager.unregistered.lock().unwrap().len(), 1);
    }

    #[test]
    fn dropping_the_adapter_unregisters() {
        let manager = Arc::new(RecordingManager::default());
        drop(listening(&manager, 0));

        assert_eq!(manager.registered(), 0);
        assert_eq!(manager.unregistered.lock().unwrap().len(), 1);
    }

    #[test]
    fn listen_after_dispose_fails() {
        let manager = Arc::new(RecordingManager::default());
        let adapter = ObservableSensorListener::new(manager.clone(), 0, Arc::new(SystemClock));
        let sensor = adapter.default_sensor(SensorType::LinearAcceleration).unwrap();

        adapter.dispose();

        assert!(matches!(adapter.listen(&sensor, SensorDelay::Normal), Err(SensorError::Disposed)));
        assert!(manager.unregistered.lock().unwrap().is_empty());
    }

    #[test]
    fn missing_sensor_is_reported() {
        let manager = Arc::new(RecordingManager {
            no_sensors: true,
            ..Default::default()
        });
        let adapter = ObservableSensorListener::new(manager, 0, Arc::new(SystemClock));

        assert!(matches!(
            adapter.default_sensor(SensorType::LinearAcceleration),
            Err(SensorError::NoDefaultSensor(SensorType::LinearAcceleration))
        ));
    }

    #[test]
    fn dispose_during_delivery_reaches_no_later_subscriber() {
        let manager = Arc::new(RecordingManager::default());
        let adapter = listening(&manager, 0);

        let weak = Arc::downgrade(&adapter);
        let _disposer = adapter.subscribe(Box::new(move |r: Reading| {
            if r.value >= 2.0 {
                if let Some(adapter) = weak.upgrade() {
                    adapter.dispose();
                }
            }
        }));
        let (seen, _sub) = collect(&adapter);

        manager.fire([1.0, 0.0, 0.0]);
        manager.fire([2.0, 0.0, 0.0]);
        manager.fire([3.0, 0.0, 0.0]);

        assert_eq!(*seen.lock().unwrap(), vec![1.0]);
        assert_eq!(manager.unregistered.lock().unwrap().len(), 1);
    }
}
