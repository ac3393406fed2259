//! The injector: a name-keyed registry of singleton services.
//!
//! This module contains the [`Injector`] type and the handles it gives
//! out for resolving and finalizing registered services.

use std::any::Any;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use crate::collection::ServiceBuilder;
use crate::config::InjectorConfig;
use crate::descriptors::ServiceDescriptor;
use crate::error::{DiError, DiResult};
use crate::lifecycle::Lifecycle;
use crate::observer::{InjectorObserver, Observers};
use crate::registration::{AnyArc, Origin, ServiceEntry};

pub mod context;
mod handle;

pub use context::ResolverContext;
pub use handle::{ServiceHandle, ServiceThunk};
pub(crate) use handle::downcast;

/// Registry of named services.
///
/// Services are registered with a name, a lifecycle strategy and an
/// ordered list of dependency names. Nothing is constructed at
/// registration time: a service is built the first time it (or something
/// depending on it) is resolved, cached, and reused until it is
/// finalized.
///
/// # Thread Safety
///
/// The injector can be shared across threads and cloned cheaply (it uses
/// `Arc` internally). Each service's first construction runs under its own
/// lock, so concurrent first access builds exactly one instance.
///
/// # Examples
///
/// ```
/// use ferrous_inject::{Injector, Service};
///
/// struct Greeter {
///     hello: String,
/// }
///
/// impl Greeter {
///     fn greet(&self, name: &str) -> String {
///         format!("{} {}", self.hello, name)
///     }
/// }
///
/// let injector = Injector::new();
/// injector.register(Service::factory("hello", |_| Ok("hello".to_string())));
/// let greeter = injector.register(
///     Service::factory("greeter", |deps| {
///         Ok(Greeter { hello: deps.get::<String>(0)?.to_string() })
///     })
///     .depends_on("hello"),
/// );
///
/// let greeter = greeter.get::<Greeter>().unwrap();
/// assert_eq!(greeter.greet("Dusan"), "hello Dusan");
/// ```
#[derive(Clone)]
pub struct Injector {
    inner: Arc<InjectorInner>,
}

pub(crate) struct InjectorInner {
    entries: RwLock<HashMap<String, Arc<ServiceEntry>>>,
    pub(crate) observers: Observers,
    pub(crate) config: InjectorConfig,
    next_sequence: AtomicU64,
}

impl InjectorInner {
    pub(crate) fn entry(&self, name: &str) -> Option<Arc<ServiceEntry>> {
        self.entries.read().get(name).cloned()
    }
}

impl Injector {
    /// Creates an empty injector with default configuration.
    pub fn new() -> Self {
        Self::with_config(InjectorConfig::default())
    }

    pub fn with_config(config: InjectorConfig) -> Self {
        Self {
            inner: Arc::new(InjectorInner {
                entries: RwLock::new(HashMap::new()),
                observers: Observers::new(),
                config,
                next_sequence: AtomicU64::new(0),
            }),
        }
    }

    pub fn config(&self) -> &InjectorConfig {
        &self.inner.config
    }

    /// Inserts a service, replacing any registration with the same name.
    ///
    /// Never constructs anything. Dependencies are looked up by name when
    /// the service is first resolved, so they may be registered later.
    pub fn register<L: Lifecycle>(&self, builder: ServiceBuilder<L>) -> ServiceHandle {
        let sequence = self.inner.next_sequence.fetch_add(1, Ordering::Relaxed);
        let entry = Arc::new(builder.into_entry(sequence));

        let replaced = self
            .inner
            .entries
            .write()
            .insert(entry.name.clone(), entry.clone());
        debug!(
            service = %entry.name,
            strategy = %entry.strategy(),
            replaced = replaced.is_some(),
            "Registered"
        );

        self.handle_for(entry)
    }

    /// Thunk for `name`. `requested_by` names the service asking, for the
    /// error message; the thunk itself is resolved lazily.
    pub fn get(&self, name: &str, requested_by: Option<&str>) -> DiResult<ServiceThunk> {
        self.inner
            .entry(name)
            .map(|entry| ServiceThunk::new(self.handle_for(entry)))
            .ok_or_else(|| DiError::not_found(name, requested_by))
    }

    /// Resolves `name` to its live instance.
    pub fn get_instance(&self, name: &str) -> DiResult<AnyArc> {
        self.get(name, None)?.call()
    }

    /// Resolves `name` and downcasts it to `T`.
    pub fn get_instance_as<T: Any + Send + Sync>(&self, name: &str) -> DiResult<Arc<T>> {
        self.get(name, None)?.call_as::<T>()
    }

    pub fn handle(&self, name: &str) -> Option<ServiceHandle> {
        self.inner.entry(name).map(|entry| self.handle_for(entry))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.inner.entries.read().contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.inner.entries.read().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.inner.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.entries.read().is_empty()
    }

    /// Snapshot of every registration as `name -> thunk`.
    pub fn all_entries(&self) -> HashMap<String, ServiceThunk> {
        self.entries_filtered(|_| true)
    }

    /// Snapshot of the registrations whose origin satisfies `predicate`.
    ///
    /// ```rust
    /// use ferrous_inject::{Injector, Service};
    ///
    /// let injector = Injector::new();
    /// injector.register(Service::factory("a", |_| Ok(1u8)).declared_in("app::db"));
    /// injector.register(Service::factory("b", |_| Ok(2u8)).declared_in("app::web"));
    ///
    /// let db = injector.entries_filtered(|origin| origin.module() == Some("app::db"));
    /// assert_eq!(db.len(), 1);
    /// assert!(db.contains_key("a"));
    /// ```
    pub fn entries_filtered<P>(&self, predicate: P) -> HashMap<String, ServiceThunk>
    where
        P: Fn(&Origin) -> bool,
    {
        let entries: Vec<Arc<ServiceEntry>> = self
            .inner
            .entries
            .read()
            .values()
            .filter(|entry| predicate(&entry.origin))
            .cloned()
            .collect();

        entries
            .into_iter()
            .map(|entry| (entry.name.clone(), ServiceThunk::new(self.handle_for(entry))))
            .collect()
    }

    /// Registrations declared in any of `modules` (module path or file).
    pub fn entries_in_modules(&self, modules: &[&str]) -> HashMap<String, ServiceThunk> {
        self.entries_filtered(|origin| modules.iter().any(|m| origin.matches_module(m)))
    }

    /// Finalizes every entry, newest registration first.
    ///
    /// Never-built entries are skipped. Every entry is attempted even if
    /// some fail; the first error is returned. Calling this repeatedly is
    /// harmless.
    pub fn finalize_all(&self) -> DiResult<()> {
        let mut entries: Vec<Arc<ServiceEntry>> =
            self.inner.entries.read().values().cloned().collect();
        entries.sort_by(|a, b| b.sequence.cmp(&a.sequence));

        let mut first_error = None;
        for entry in entries {
            if let Err(err) = entry.finalize(Some(&self.inner.observers)) {
                tracing::warn!(service = %entry.name, error = %err, "Finalize failed");
                first_error.get_or_insert(err);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Descriptors of every registration, sorted by name.
    pub fn descriptors(&self) -> Vec<ServiceDescriptor> {
        let mut descriptors: Vec<ServiceDescriptor> = self
            .inner
            .entries
            .read()
            .values()
            .map(|entry| ServiceDescriptor::from_entry(entry))
            .collect();
        descriptors.sort_by(|a, b| a.name.cmp(&b.name));
        descriptors
    }

    /// Adds an observer for construction, finalization and failures.
    pub fn add_observer(&self, observer: Arc<dyn InjectorObserver>) {
        self.inner.observers.add(observer);
    }

    fn handle_for(&self, entry: Arc<ServiceEntry>) -> ServiceHandle {
        ServiceHandle::new(entry, Arc::downgrade(&self.inner))
    }

    /// Human-readable dump of the registry.
    #[cfg(feature = "diagnostics")]
    pub fn to_debug_string(&self) -> String {
        let mut out = String::from("Injector {\n");
        for descriptor in self.descriptors() {
            out.push_str(&format!(
                "  {} [{}{}] deps={:?}\n",
                descriptor.name,
                descriptor.strategy,
                if descriptor.built { ", built" } else { "" },
                descriptor.dependencies,
            ));
        }
        out.push('}');
        out
    }
}

impl Default for Injector {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Injector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Injector")
            .field("services", &self.names())
            .field("config", &self.inner.config)
            .finish()
    }
}
