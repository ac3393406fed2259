//! # ferrous-inject
//!
//! A name-keyed singleton injection container.
//!
//! Services are registered under a name together with an ordered list of
//! the names they depend on. Nothing is built at registration time: the
//! first resolution of a service resolves its dependencies (recursively,
//! with cycle detection), constructs it once and caches it. Finalizing a
//! service tears it down and empties the cache, and the next resolution
//! builds it again.
//!
//! ## Features
//!
//! - **Three lifecycle strategies**: plain factories, two-phase
//!   setup/teardown resources and injectable types with container-bound
//!   fields
//! - **Forward references**: dependencies are looked up at resolution
//!   time, so registration order does not matter
//! - **Cycle detection**: a service reaching itself fails with the full
//!   dependency path instead of recursing
//! - **Repeatable finalization**: `finalize_all` can run any number of
//!   times, in any state
//! - **Thread-safe**: concurrent first access builds exactly one instance
//!
//! ## Quick Start
//!
//! ```rust
//! use ferrous_inject::{Injector, Service};
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::sync::Arc;
//!
//! let calls = Arc::new(AtomicUsize::new(0));
//! let counter = calls.clone();
//!
//! let injector = Injector::new();
//! injector.register(Service::factory("hello", move |_| {
//!     counter.fetch_add(1, Ordering::SeqCst);
//!     Ok("hello".to_string())
//! }));
//! let greeting = injector.register(
//!     Service::factory("greeting", |deps| Ok(format!("{} Dusan", deps.get::<String>(0)?)))
//!         .depends_on("hello"),
//! );
//!
//! assert_eq!(*greeting.get::<String>().unwrap(), "hello Dusan");
//! assert_eq!(*greeting.get::<String>().unwrap(), "hello Dusan");
//! assert_eq!(calls.load(Ordering::SeqCst), 1);
//!
//! injector.finalize_all().unwrap();
//! assert!(!greeting.is_built());
//! ```
//!
//! ## Two-phase services
//!
//! ```rust
//! use ferrous_inject::{Injector, Phased, Service};
//! use std::sync::atomic::{AtomicBool, Ordering};
//! use std::sync::Arc;
//!
//! let closed = Arc::new(AtomicBool::new(false));
//! let flag = closed.clone();
//!
//! let injector = Injector::new();
//! let pool = injector.register(Service::two_phase("pool", move |_| {
//!     let flag = flag.clone();
//!     Ok(Phased::new(|| Ok(vec!["conn-1", "conn-2"])).on_teardown(move || {
//!         flag.store(true, Ordering::SeqCst);
//!         Ok(())
//!     }))
//! }));
//!
//! assert_eq!(pool.get::<Vec<&str>>().unwrap().len(), 2);
//! pool.finalize().unwrap();
//! assert!(closed.load(Ordering::SeqCst));
//! ```
//!
//! ## Injected fields
//!
//! ```rust
//! use ferrous_inject::{Dependencies, DiResult, Injectable, Injected, Injector, Service};
//!
//! struct Reporter {
//!     clock: Injected<u64>,
//! }
//!
//! impl Injectable for Reporter {
//!     fn construct(_deps: &Dependencies) -> DiResult<Self> {
//!         Ok(Reporter { clock: Injected::new() })
//!     }
//! }
//!
//! let injector = Injector::new();
//! injector.register(Service::factory("clock", |_| Ok(42u64)));
//! let reporter = injector.register(
//!     Service::class::<Reporter>().with_injected_field("clock", true, |r| &r.clock),
//! );
//!
//! let reporter = reporter.get::<Reporter>().unwrap();
//! assert_eq!(*reporter.clock.get().unwrap(), 42);
//! ```

// Module declarations
pub mod collection;
pub mod config;
pub mod descriptors;
pub mod error;
pub mod fixtures;
pub mod observer;
pub mod provider;
pub mod traits;

// Internal modules
mod dependencies;
mod injected;
mod internal;
mod lifecycle;
mod naming;
mod registration;

pub use collection::{Service, ServiceBuilder, ServiceModule};
pub use config::{
    ConfigProvider, ConfigSource, ConfigValue, EnvironmentConfigSource, InjectorConfig,
    MemoryConfigSource,
};
pub use dependencies::Dependencies;
pub use descriptors::ServiceDescriptor;
pub use error::{DiError, DiResult};
pub use fixtures::{Fixture, FixtureScope, FixtureSet, FIXTURE_SCOPE_KEY};
pub use injected::Injected;
pub use lifecycle::{
    Advance, ClassLifecycle, DirectLifecycle, Injectable, Phased, Strategy, TwoPhase,
    TwoPhaseLifecycle,
};
pub use naming::{derive_service_name, service_name_of};
pub use observer::{InjectorObserver, LoggingObserver, MetricsObserver};
pub use provider::{Injector, ResolverContext, ServiceHandle, ServiceThunk};
pub use registration::Origin;
pub use traits::Dispose;
