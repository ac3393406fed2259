//! Service definitions for registration.
//!
//! [`Service`] starts a definition with one of the three lifecycle
//! strategies; the returned [`ServiceBuilder`] adds dependencies,
//! metadata and strategy-specific options before it is handed to
//! [`Injector::register`](crate::Injector::register).

use std::any::Any;
use std::collections::HashMap;
use std::panic::Location;

use crate::config::ConfigValue;
use crate::dependencies::Dependencies;
use crate::error::DiResult;
use crate::injected::Injected;
use crate::lifecycle::{
    ClassLifecycle, DirectLifecycle, Injectable, Lifecycle, TwoPhase, TwoPhaseLifecycle,
};
use crate::naming::service_name_of;
use crate::registration::{Origin, ServiceEntry};
use crate::traits::Dispose;

pub mod module_system;
pub use module_system::*;

/// Entry point for service definitions.
pub struct Service;

impl Service {
    /// A service built by calling `factory` with its resolved dependencies.
    ///
    /// ```rust
    /// use ferrous_inject::{Injector, Service};
    ///
    /// let injector = Injector::new();
    /// injector.register(Service::factory("port", |_| Ok(5432u16)));
    /// injector.register(
    ///     Service::factory("url", |deps| Ok(format!("db://localhost:{}", deps.get::<u16>(0)?)))
    ///         .depends_on("port"),
    /// );
    ///
    /// let url = injector.get_instance_as::<String>("url").unwrap();
    /// assert_eq!(*url, "db://localhost:5432");
    /// ```
    #[track_caller]
    pub fn factory<T, F>(name: impl Into<String>, factory: F) -> ServiceBuilder<DirectLifecycle<T>>
    where
        T: Any + Send + Sync,
        F: Fn(&Dependencies) -> DiResult<T> + Send + Sync + 'static,
    {
        ServiceBuilder::new(name.into(), DirectLifecycle::new(factory), Location::caller())
    }

    /// A service backed by a [`TwoPhase`] resource: `setup` yields the
    /// instance, `teardown` runs on finalize.
    #[track_caller]
    pub fn two_phase<R, F>(name: impl Into<String>, factory: F) -> ServiceBuilder<TwoPhaseLifecycle<R>>
    where
        R: TwoPhase,
        F: Fn(&Dependencies) -> DiResult<R> + Send + Sync + 'static,
    {
        ServiceBuilder::new(name.into(), TwoPhaseLifecycle::new(factory), Location::caller())
    }

    /// A service instantiating `T` through [`Injectable::construct`].
    ///
    /// Named after the type (`UserRepository` registers as
    /// `user_repository`) unless [`named`](ServiceBuilder::named) is used.
    #[track_caller]
    pub fn class<T: Injectable>() -> ServiceBuilder<ClassLifecycle<T>> {
        ServiceBuilder::new(service_name_of::<T>(), ClassLifecycle::new(), Location::caller())
    }
}

/// A service definition waiting to be registered.
pub struct ServiceBuilder<L> {
    name: String,
    lifecycle: L,
    dependencies: Vec<String>,
    metadata: HashMap<String, ConfigValue>,
    origin: Origin,
    inplace: bool,
}

impl<L: Lifecycle> ServiceBuilder<L> {
    fn new(name: String, lifecycle: L, location: &'static Location<'static>) -> Self {
        Self {
            name,
            lifecycle,
            dependencies: Vec::new(),
            metadata: HashMap::new(),
            origin: Origin::from_location(location),
            inplace: false,
        }
    }

    /// Appends a dependency; the factory receives it at the next position.
    pub fn depends_on(mut self, name: impl Into<String>) -> Self {
        self.dependencies.push(name.into());
        self
    }

    /// Appends several dependencies in order.
    pub fn depends_on_all<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependencies.extend(names.into_iter().map(Into::into));
        self
    }

    /// Overrides the registry key.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// When set, [`ServiceHandle::call`](crate::ServiceHandle::call) returns
    /// the cached singleton instead of building an uncached value.
    pub fn inplace(mut self, inplace: bool) -> Self {
        self.inplace = inplace;
        self
    }

    /// Attaches a free-form metadata value, e.g. `fixture_scope`.
    pub fn metadata(mut self, key: impl Into<String>, value: impl Into<ConfigValue>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Records the module the service belongs to, usually `module_path!()`.
    pub fn declared_in(mut self, module: impl Into<String>) -> Self {
        self.origin.set_module(module.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn into_entry(self, sequence: u64) -> ServiceEntry {
        ServiceEntry::new(
            self.name,
            Box::new(self.lifecycle),
            self.dependencies,
            self.metadata,
            self.origin,
            self.inplace,
            sequence,
        )
    }
}

impl<T: Any + Send + Sync> ServiceBuilder<DirectLifecycle<T>> {
    /// Runs `finalizer` on the cached instance when it is finalized.
    pub fn on_finalize<F>(mut self, finalizer: F) -> Self
    where
        F: Fn(&T) -> DiResult<()> + Send + Sync + 'static,
    {
        self.lifecycle.set_finalizer(finalizer);
        self
    }

    /// Calls [`Dispose::dispose`] on the cached instance when it is
    /// finalized.
    pub fn disposable(self) -> Self
    where
        T: Dispose,
    {
        self.on_finalize(|value: &T| {
            value.dispose();
            Ok(())
        })
    }
}

impl<T: Injectable> ServiceBuilder<ClassLifecycle<T>> {
    /// Declares an [`Injected`] field bound to the service `target`.
    ///
    /// Eager fields (`lazy == false`) are resolved while the owner is being
    /// built, so a failure there fails the owner. Lazy fields resolve on
    /// every read.
    pub fn with_injected_field<D>(
        mut self,
        target: impl Into<String>,
        lazy: bool,
        accessor: fn(&T) -> &Injected<D>,
    ) -> Self
    where
        D: Any + Send + Sync,
    {
        self.lifecycle.add_field(target.into(), lazy, accessor);
        self
    }
}
