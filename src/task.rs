//! Progress reporting and cooperative cancellation for long operations

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// Callback type observing progress as a fraction in [0, 1]
///
/// Carries a lifetime so sinks may borrow caller state, like a buffer
/// collecting the emitted fractions.
pub type ProgressFn<'a> = dyn Fn(f64) + Send + Sync + 'a;

/// Cancellation flag shared between an operation and its observers
///
/// Cloning hands out another handle to the same flag. Once set, the flag
/// never clears; in-flight batch work stops at the next keypair boundary.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Monotonic progress gate in front of an optional observer
///
/// Workers finish out of order, so raw progress reports can regress. The
/// meter tracks the furthest fraction seen and drops anything that would
/// move backwards, guaranteeing observers a non-decreasing sequence.
pub struct ProgressMeter<'a> {
    sink: Option<&'a ProgressFn<'a>>,
    furthest: Mutex<f64>,
}

impl<'a> ProgressMeter<'a> {
    #[must_use]
    pub fn new(sink: Option<&'a ProgressFn<'a>>) -> Self {
        Self {
            sink,
            furthest: Mutex::new(-1.0),
        }
    }

    /// Forwards the fraction to the observer unless it would regress
    pub fn emit(&self, fraction: f64) {
        let fraction = fraction.clamp(0.0, 1.0);
        let mut furthest = self
            .furthest
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if fraction >= *furthest {
            *furthest = fraction;
            if let Some(sink) = self.sink {
                sink(fraction);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_cancel_handle_is_shared() {
        let a = CancelHandle::new();
        let b = a.clone();
        assert!(!b.is_cancelled());
        a.cancel();
        assert!(b.is_cancelled());
    }

    #[test]
    fn test_meter_suppresses_regressions() {
        let seen = Mutex::new(Vec::new());
        let sink = |f: f64| seen.lock().unwrap().push(f);
        let meter = ProgressMeter::new(Some(&sink));

        meter.emit(0.0);
        meter.emit(0.5);
        meter.emit(0.3);
        meter.emit(0.5);
        meter.emit(1.0);

        assert_eq!(*seen.lock().unwrap(), vec![0.0, 0.5, 0.5, 1.0]);
    }

    #[test]
    fn test_meter_clamps_out_of_range() {
        let seen = Mutex::new(Vec::new());
        let sink = |f: f64| seen.lock().unwrap().push(f);
        let meter = ProgressMeter::new(Some(&sink));

        meter.emit(-0.5);
        meter.emit(1.5);

        assert_eq!(*seen.lock().unwrap(), vec![0.0, 1.0]);
    }

    #[test]
    fn test_meter_without_sink_is_silent() {
        let meter = ProgressMeter::new(None);
        meter.emit(0.5);
        meter.emit(1.0);
    }
}
