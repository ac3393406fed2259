//! Service registration types.

use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;
use std::panic::Location;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use parking_lot::ReentrantMutex;
use tracing::{debug, debug_span};

use crate::config::ConfigValue;
use crate::dependencies::Dependencies;
use crate::error::DiResult;
use crate::internal::circular::{self, StackGuard};
use crate::lifecycle::{Lifecycle, Strategy};
use crate::observer::Observers;
use crate::provider::{InjectorInner, ResolverContext};

// Type-erased Arc for storage
pub(crate) type AnyArc = Arc<dyn Any + Send + Sync>;

pub(crate) type Teardown = Box<dyn FnOnce() -> DiResult<()> + Send>;

/// A constructed instance and the teardown that belongs to it.
pub struct Built {
    pub(crate) instance: AnyArc,
    pub(crate) teardown: Option<Teardown>,
}

impl Built {
    pub(crate) fn new(instance: AnyArc, teardown: Option<Teardown>) -> Self {
        Self { instance, teardown }
    }
}

/// Where a service was declared.
///
/// The file and line are captured automatically from the call to
/// [`Service::factory`](crate::Service::factory) and friends; the module
/// path is whatever the registration passed to
/// [`declared_in`](crate::ServiceBuilder::declared_in), usually
/// `module_path!()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Origin {
    file: &'static str,
    line: u32,
    module: Option<String>,
}

impl Origin {
    pub(crate) fn from_location(location: &'static Location<'static>) -> Self {
        Self {
            file: location.file(),
            line: location.line(),
            module: None,
        }
    }

    pub(crate) fn set_module(&mut self, module: String) {
        self.module = Some(module);
    }

    pub fn file(&self) -> &'static str {
        self.file
    }

    pub fn line(&self) -> u32 {
        self.line
    }

    pub fn module(&self) -> Option<&str> {
        self.module.as_deref()
    }

    /// True when `module` names this origin's module path or its file.
    pub fn matches_module(&self, module: &str) -> bool {
        self.module.as_deref() == Some(module) || self.file == module
    }
}

/// One registered service: its strategy, declared dependencies, cached
/// instance and descriptive data.
pub(crate) struct ServiceEntry {
    pub(crate) name: String,
    pub(crate) lifecycle: Box<dyn Lifecycle>,
    pub(crate) dependencies: Vec<String>,
    pub(crate) metadata: HashMap<String, ConfigValue>,
    pub(crate) origin: Origin,
    pub(crate) inplace: bool,
    /// Registration order, used to finalize newest first
    pub(crate) sequence: u64,
    /// Reentrant so the thread binding this entry's fields can come back
    /// for the cached instance while other threads wait.
    slot: ReentrantMutex<RefCell<Option<Built>>>,
    built: AtomicBool,
}

impl ServiceEntry {
    pub(crate) fn new(
        name: String,
        lifecycle: Box<dyn Lifecycle>,
        dependencies: Vec<String>,
        metadata: HashMap<String, ConfigValue>,
        origin: Origin,
        inplace: bool,
        sequence: u64,
    ) -> Self {
        Self {
            name,
            lifecycle,
            dependencies,
            metadata,
            origin,
            inplace,
            sequence,
            slot: ReentrantMutex::new(RefCell::new(None)),
            built: AtomicBool::new(false),
        }
    }

    pub(crate) fn strategy(&self) -> Strategy {
        self.lifecycle.strategy()
    }

    pub(crate) fn is_built(&self) -> bool {
        self.built.load(Ordering::Acquire)
    }

    /// Returns the cached instance, constructing it first if needed.
    ///
    /// The cycle check runs before the slot lock is taken, so a service
    /// reaching itself on the same thread fails instead of waiting on its
    /// own construction.
    pub(crate) fn get_instance(&self, inner: &Arc<InjectorInner>) -> DiResult<AnyArc> {
        let span = debug_span!("resolve", service = %self.name, depth = circular::depth());
        let _span = span.enter();

        let guard = circular::enter(self.id(), &self.name, inner.config.max_depth)?;
        let slot = self.slot.lock();

        let cached = slot.borrow().as_ref().map(|built| built.instance.clone());
        if let Some(instance) = cached {
            if inner.config.trace_resolution {
                debug!("Found in cache");
            }
            return Ok(instance);
        }
        debug!("Not found in cache");

        let observers = &inner.observers;
        let notify = observers.has_observers();
        if notify {
            observers.resolving(&self.name);
        }
        let start = Instant::now();

        let ctx = ResolverContext::new(inner, &self.name);
        match self.build(&slot, &ctx, guard) {
            Ok(instance) => {
                debug!(strategy = %self.strategy(), "Constructed");
                if notify {
                    observers.resolved(&self.name, start.elapsed());
                }
                Ok(instance)
            }
            Err(err) => {
                if notify {
                    observers.failed(&self.name, &err);
                }
                Err(err)
            }
        }
    }

    fn build(
        &self,
        slot: &RefCell<Option<Built>>,
        ctx: &ResolverContext<'_>,
        guard: StackGuard,
    ) -> DiResult<AnyArc> {
        let args = ctx.resolve_all(&self.dependencies)?;
        let built = self.lifecycle.construct(&self.name, &args)?;
        let instance = built.instance.clone();

        // Cached and off the stack before binding, so services that
        // depend back on this one receive it.
        drop(guard);
        *slot.borrow_mut() = Some(built);

        if let Err(err) = self.lifecycle.bind(&instance, ctx) {
            let discarded = slot.borrow_mut().take();
            drop(discarded);
            return Err(err);
        }

        self.built.store(true, Ordering::Release);
        Ok(instance)
    }

    fn id(&self) -> usize {
        self as *const Self as usize
    }

    /// Drops the cached instance and runs its teardown. A no-op when the
    /// entry was never built.
    ///
    /// The slot is emptied before the teardown runs, so the entry is
    /// unbuilt afterwards even when the teardown fails.
    pub(crate) fn finalize(&self, observers: Option<&Observers>) -> DiResult<()> {
        let taken = {
            let slot = self.slot.lock();
            self.built.store(false, Ordering::Release);
            slot.replace(None)
        };
        let Some(Built { instance, teardown }) = taken else {
            return Ok(());
        };

        let result = match teardown {
            Some(teardown) => teardown(),
            None => Ok(()),
        };
        drop(instance);

        match &result {
            Ok(()) => {
                debug!(service = %self.name, "Finalized");
                if let Some(observers) = observers {
                    observers.finalized(&self.name);
                }
            }
            Err(err) => {
                debug!(service = %self.name, error = %err, "Finalize failed");
                if let Some(observers) = observers {
                    observers.failed(&self.name, err);
                }
            }
        }
        result
    }

    /// Builds a fresh value from caller-supplied arguments, bypassing the
    /// cache and field injection.
    pub(crate) fn new_uncached(&self, args: &Dependencies) -> DiResult<AnyArc> {
        self.lifecycle.create_uncached(&self.name, args)
    }
}
