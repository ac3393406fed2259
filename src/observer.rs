//! Diagnostic observers for injector lifecycle events.
//!
//! Observers are told when a service starts and finishes construction,
//! when it is finalized and when resolution fails. [`LoggingObserver`]
//! forwards the events to `tracing`; [`MetricsObserver`] counts them.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;

use crate::error::DiError;

/// Observer trait for injector lifecycle events.
///
/// Calls are made synchronously on the resolving thread. Keep
/// implementations lightweight.
///
/// # Examples
///
/// ```
/// use ferrous_inject::{InjectorObserver, Injector, Service};
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// struct PrintObserver;
///
/// impl InjectorObserver for PrintObserver {
///     fn resolving(&self, name: &str) {
///         println!("building {}", name);
///     }
///
///     fn resolved(&self, name: &str, duration: Duration) {
///         println!("built {} in {:?}", name, duration);
///     }
/// }
///
/// let injector = Injector::new();
/// injector.add_observer(Arc::new(PrintObserver));
/// injector.register(Service::factory("hello", |_| Ok("hello")));
/// injector.get_instance("hello").unwrap();
/// ```
pub trait InjectorObserver: Send + Sync {
    /// Called before a service's dependencies are resolved and its
    /// factory runs. Not called for cache hits.
    fn resolving(&self, name: &str);

    /// Called after a service was constructed and cached.
    fn resolved(&self, name: &str, duration: Duration);

    /// Called after a built service was torn down.
    fn finalized(&self, _name: &str) {}

    /// Called when resolving or finalizing a service failed.
    fn failed(&self, _name: &str, _error: &DiError) {}
}

/// Container for registered observers.
///
/// Notification works on a snapshot, so observers may resolve services
/// (or add observers) without holding the lock.
#[derive(Default)]
pub(crate) struct Observers {
    observers: RwLock<Arc<Vec<Arc<dyn InjectorObserver>>>>,
}

impl Observers {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn add(&self, observer: Arc<dyn InjectorObserver>) {
        let mut guard = self.observers.write();
        let mut next = Vec::with_capacity(guard.len() + 1);
        next.extend(guard.iter().cloned());
        next.push(observer);
        *guard = Arc::new(next);
    }

    #[inline]
    pub(crate) fn has_observers(&self) -> bool {
        !self.observers.read().is_empty()
    }

    fn snapshot(&self) -> Arc<Vec<Arc<dyn InjectorObserver>>> {
        self.observers.read().clone()
    }

    pub(crate) fn resolving(&self, name: &str) {
        for observer in self.snapshot().iter() {
            observer.resolving(name);
        }
    }

    pub(crate) fn resolved(&self, name: &str, duration: Duration) {
        for observer in self.snapshot().iter() {
            observer.resolved(name, duration);
        }
    }

    pub(crate) fn finalized(&self, name: &str) {
        for observer in self.snapshot().iter() {
            observer.finalized(name);
        }
    }

    pub(crate) fn failed(&self, name: &str, error: &DiError) {
        for observer in self.snapshot().iter() {
            observer.failed(name, error);
        }
    }
}

/// Built-in observer that forwards events to `tracing`.
///
/// ```
/// use ferrous_inject::{Injector, LoggingObserver};
/// use std::sync::Arc;
///
/// let injector = Injector::new();
/// injector.add_observer(Arc::new(LoggingObserver::with_prefix("[app]")));
/// ```
pub struct LoggingObserver {
    prefix: String,
}

impl LoggingObserver {
    pub fn new() -> Self {
        Self::with_prefix("[ferrous-inject]")
    }

    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl Default for LoggingObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl InjectorObserver for LoggingObserver {
    fn resolving(&self, name: &str) {
        tracing::info!(service = name, "{} Resolving: {}", self.prefix, name);
    }

    fn resolved(&self, name: &str, duration: Duration) {
        tracing::info!(
            service = name,
            elapsed_us = duration.as_micros() as u64,
            "{} Resolved: {} in {:?}",
            self.prefix,
            name,
            duration
        );
    }

    fn finalized(&self, name: &str) {
        tracing::info!(service = name, "{} Finalized: {}", self.prefix, name);
    }

    fn failed(&self, name: &str, error: &DiError) {
        tracing::error!(service = name, %error, "{} FAILED {}: {}", self.prefix, name, error);
    }
}

/// Observer that counts lifecycle events.
#[derive(Default)]
pub struct MetricsObserver {
    constructions: AtomicU64,
    finalizations: AtomicU64,
    failures: AtomicU64,
    total_construction_nanos: AtomicU64,
}

impl MetricsObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of services constructed (cache hits excluded).
    pub fn construction_count(&self) -> u64 {
        self.constructions.load(Ordering::Relaxed)
    }

    pub fn finalization_count(&self) -> u64 {
        self.finalizations.load(Ordering::Relaxed)
    }

    pub fn failure_count(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }

    /// Total time spent constructing, including nested dependencies.
    pub fn total_construction_time(&self) -> Duration {
        Duration::from_nanos(self.total_construction_nanos.load(Ordering::Relaxed))
    }

    /// Average construction time, if anything was constructed.
    pub fn average_construction_time(&self) -> Option<Duration> {
        match self.construction_count() {
            0 => None,
            count => Some(self.total_construction_time() / count as u32),
        }
    }

    pub fn reset(&self) {
        self.constructions.store(0, Ordering::Relaxed);
        self.finalizations.store(0, Ordering::Relaxed);
        self.failures.store(0, Ordering::Relaxed);
        self.total_construction_nanos.store(0, Ordering::Relaxed);
    }
}

impl InjectorObserver for MetricsObserver {
    fn resolving(&self, _name: &str) {}

    fn resolved(&self, _name: &str, duration: Duration) {
        self.constructions.fetch_add(1, Ordering::Relaxed);
        self.total_construction_nanos
            .fetch_add(duration.as_nanos() as u64, Ordering::Relaxed);
    }

    fn finalized(&self, _name: &str) {
        self.finalizations.fetch_add(1, Ordering::Relaxed);
    }

    fn failed(&self, _name: &str, _error: &DiError) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }
}
