//! Handles to registered services.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Weak};

use tracing::{error, warn};

use super::InjectorInner;
use crate::config::ConfigValue;
use crate::dependencies::Dependencies;
use crate::error::{DiError, DiResult};
use crate::lifecycle::Strategy;
use crate::registration::{AnyArc, Origin, ServiceEntry};

/// Handle to one registration, returned by
/// [`Injector::register`](crate::Injector::register).
///
/// The handle does not keep the injector alive; once the injector is
/// dropped, resolving through it fails with
/// [`InjectorDropped`](DiError::InjectorDropped).
///
/// ```rust
/// use ferrous_inject::{Injector, Service};
///
/// let injector = Injector::new();
/// let hello = injector.register(Service::factory("hello", |_| Ok("hello".to_string())));
///
/// assert!(!hello.is_built());
/// assert_eq!(*hello.get::<String>().unwrap(), "hello");
/// assert!(hello.is_built());
///
/// hello.finalize().unwrap();
/// assert!(!hello.is_built());
/// ```
#[derive(Clone)]
pub struct ServiceHandle {
    entry: Arc<ServiceEntry>,
    injector: Weak<InjectorInner>,
}

impl ServiceHandle {
    pub(crate) fn new(entry: Arc<ServiceEntry>, injector: Weak<InjectorInner>) -> Self {
        Self { entry, injector }
    }

    pub(crate) fn entry(&self) -> &Arc<ServiceEntry> {
        &self.entry
    }

    fn injector(&self) -> DiResult<Arc<InjectorInner>> {
        self.injector
            .upgrade()
            .ok_or_else(|| DiError::InjectorDropped(self.entry.name.clone()))
    }

    /// The live singleton, built on first call.
    pub fn get_instance(&self) -> DiResult<AnyArc> {
        let inner = self.injector()?;
        self.entry
            .get_instance(&inner)
            .map_err(|err| report(&self.entry.name, err))
    }

    /// The live singleton, downcast to `T`.
    pub fn get<T: Any + Send + Sync>(&self) -> DiResult<Arc<T>> {
        downcast(&self.entry.name, self.get_instance()?)
    }

    /// Tears down the cached instance. A no-op when nothing is built.
    pub fn finalize(&self) -> DiResult<()> {
        let inner = self.injector.upgrade();
        self.entry
            .finalize(inner.as_deref().map(|inner| &inner.observers))
    }

    /// A fresh value from `args`: no caching, no field binding, no
    /// teardown.
    pub fn new_uncached(&self, args: Dependencies) -> DiResult<AnyArc> {
        self.entry.new_uncached(&args)
    }

    /// Calls the service like its raw factory: the cached singleton when
    /// registered `inplace`, otherwise an uncached value built from `args`.
    pub fn call(&self, args: Dependencies) -> DiResult<AnyArc> {
        if self.entry.inplace {
            self.get_instance()
        } else {
            self.new_uncached(args)
        }
    }

    pub fn name(&self) -> &str {
        &self.entry.name
    }

    pub fn metadata(&self) -> &HashMap<String, ConfigValue> {
        &self.entry.metadata
    }

    pub fn metadata_value(&self, key: &str) -> Option<&ConfigValue> {
        self.entry.metadata.get(key)
    }

    pub fn origin(&self) -> &Origin {
        &self.entry.origin
    }

    pub fn dependencies(&self) -> &[String] {
        &self.entry.dependencies
    }

    pub fn strategy(&self) -> Strategy {
        self.entry.strategy()
    }

    pub fn is_built(&self) -> bool {
        self.entry.is_built()
    }

    pub fn is_inplace(&self) -> bool {
        self.entry.inplace
    }
}

impl fmt::Debug for ServiceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceHandle")
            .field("name", &self.entry.name)
            .field("strategy", &self.entry.strategy())
            .field("built", &self.entry.is_built())
            .finish()
    }
}

/// Zero-argument accessor returned by [`Injector::get`](crate::Injector::get).
///
/// Calling it yields the live singleton, constructing it on first call.
#[derive(Clone, Debug)]
pub struct ServiceThunk(ServiceHandle);

impl ServiceThunk {
    pub(crate) fn new(handle: ServiceHandle) -> Self {
        Self(handle)
    }

    pub fn call(&self) -> DiResult<AnyArc> {
        self.0.get_instance()
    }

    pub fn call_as<T: Any + Send + Sync>(&self) -> DiResult<Arc<T>> {
        self.0.get::<T>()
    }

    pub fn name(&self) -> &str {
        self.0.name()
    }

    pub fn handle(&self) -> &ServiceHandle {
        &self.0
    }
}

pub(crate) fn downcast<T: Any + Send + Sync>(name: &str, value: AnyArc) -> DiResult<Arc<T>> {
    value.downcast::<T>().map_err(|_| DiError::TypeMismatch {
        name: name.to_string(),
        expected: std::any::type_name::<T>(),
    })
}

/// Logs a failed top-level resolution once, then hands the error back.
fn report(name: &str, err: DiError) -> DiError {
    match &err {
        DiError::NotFound { .. } | DiError::RecursiveInjection { .. } => {
            warn!(service = name, error = %err, "Resolution failed");
        }
        _ => {
            error!(service = name, error = %err, "Resolution failed");
        }
    }
    err
}
