use std::any::Any;
use std::sync::Arc;

use super::{Lifecycle, Strategy};
use crate::dependencies::Dependencies;
use crate::error::{DiError, DiResult};
use crate::registration::{AnyArc, Built, Teardown};

/// What a two-phase resource reports when it is torn down.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advance<T> {
    /// The resource ran to completion.
    Complete,
    /// The resource produced another value; this is an error.
    Yield(T),
}

/// A resource acquired by `setup` and released by `teardown`.
///
/// The container calls `setup` once when the service is first needed and
/// caches its value. On finalize it calls `teardown`, which must report
/// [`Advance::Complete`]; a resource that yields a second value fails
/// with [`DiError::MultipleYields`].
///
/// ```rust
/// use ferrous_inject::{Advance, DiResult, Injector, Service, TwoPhase};
///
/// struct Connection {
///     url: String,
/// }
///
/// impl TwoPhase for Connection {
///     type Output = String;
///
///     fn setup(&mut self) -> DiResult<String> {
///         Ok(format!("connected to {}", self.url))
///     }
///
///     fn teardown(&mut self) -> DiResult<Advance<String>> {
///         Ok(Advance::Complete)
///     }
/// }
///
/// let injector = Injector::new();
/// let handle = injector.register(Service::two_phase("connection", |_| {
///     Ok(Connection { url: "db://local".to_string() })
/// }));
///
/// assert_eq!(*handle.get::<String>().unwrap(), "connected to db://local");
/// handle.finalize().unwrap();
/// ```
pub trait TwoPhase: Send + 'static {
    type Output: Any + Send + Sync;

    fn setup(&mut self) -> DiResult<Self::Output>;

    fn teardown(&mut self) -> DiResult<Advance<Self::Output>> {
        Ok(Advance::Complete)
    }
}

type SetupFn<T> = Box<dyn FnMut() -> DiResult<T> + Send>;
type TeardownFn<T> = Box<dyn FnMut() -> DiResult<Advance<T>> + Send>;

/// A [`TwoPhase`] resource assembled from closures.
///
/// ```rust
/// use ferrous_inject::{Injector, Phased, Service};
///
/// let injector = Injector::new();
/// injector.register(Service::two_phase("pool", |_| {
///     Ok(Phased::new(|| Ok(vec![1, 2, 3])).on_teardown(|| {
///         println!("pool closed");
///         Ok(())
///     }))
/// }));
/// ```
pub struct Phased<T> {
    setup: SetupFn<T>,
    teardown: Option<TeardownFn<T>>,
}

impl<T: Any + Send + Sync> Phased<T> {
    pub fn new<F>(setup: F) -> Self
    where
        F: FnMut() -> DiResult<T> + Send + 'static,
    {
        Self {
            setup: Box::new(setup),
            teardown: None,
        }
    }

    /// Runs `teardown` on finalize; the resource then counts as complete.
    pub fn on_teardown<F>(self, mut teardown: F) -> Self
    where
        F: FnMut() -> DiResult<()> + Send + 'static,
    {
        self.advance_with(move || teardown().map(|()| Advance::Complete))
    }

    /// Full control over what teardown reports.
    pub fn advance_with<F>(mut self, teardown: F) -> Self
    where
        F: FnMut() -> DiResult<Advance<T>> + Send + 'static,
    {
        self.teardown = Some(Box::new(teardown));
        self
    }
}

impl<T: Any + Send + Sync> TwoPhase for Phased<T> {
    type Output = T;

    fn setup(&mut self) -> DiResult<T> {
        (self.setup)()
    }

    fn teardown(&mut self) -> DiResult<Advance<T>> {
        match self.teardown.as_mut() {
            Some(teardown) => teardown(),
            None => Ok(Advance::Complete),
        }
    }
}

type Factory<R> = Arc<dyn Fn(&Dependencies) -> DiResult<R> + Send + Sync>;

/// Creates a [`TwoPhase`] resource per construction and keeps it until
/// finalize.
pub struct TwoPhaseLifecycle<R> {
    factory: Factory<R>,
}

impl<R: TwoPhase> TwoPhaseLifecycle<R> {
    pub(crate) fn new<F>(factory: F) -> Self
    where
        F: Fn(&Dependencies) -> DiResult<R> + Send + Sync + 'static,
    {
        Self {
            factory: Arc::new(factory),
        }
    }
}

impl<R: TwoPhase> Lifecycle for TwoPhaseLifecycle<R> {
    fn strategy(&self) -> Strategy {
        Strategy::TwoPhase
    }

    fn construct(&self, name: &str, args: &Dependencies) -> DiResult<Built> {
        let mut resource = (self.factory)(args)?;
        let instance: AnyArc = Arc::new(resource.setup()?);

        let name = name.to_string();
        let teardown: Teardown = Box::new(move || match resource.teardown()? {
            Advance::Complete => Ok(()),
            Advance::Yield(_) => Err(DiError::MultipleYields(name)),
        });

        Ok(Built::new(instance, Some(teardown)))
    }

    fn create_uncached(&self, _name: &str, args: &Dependencies) -> DiResult<AnyArc> {
        let mut resource = (self.factory)(args)?;
        Ok(Arc::new(resource.setup()?))
    }
}
