//! Test-fixture adapter.
//!
//! Maps registry entries to fixtures. Each service's fixture scope comes
//! from its `fixture_scope` metadata value (`"session"` or `"function"`),
//! falling back to [`InjectorConfig::default_fixture_scope`](crate::InjectorConfig).
//!
//! * A **function** fixture finalizes its service when the [`Fixture`] is
//!   dropped, so the next test gets a freshly constructed instance.
//! * A **session** fixture stays built; its finalizer runs when the
//!   [`FixtureSet`] finishes, in reverse order of first use.
//!
//! ```rust
//! use ferrous_inject::{FixtureSet, Injector, Service};
//!
//! let injector = Injector::new();
//! injector.register(Service::factory("config", |_| Ok("prod".to_string())));
//! injector.register(
//!     Service::factory("request", |_| Ok(Vec::<u8>::new()))
//!         .metadata("fixture_scope", "function"),
//! );
//!
//! let mut fixtures = FixtureSet::new(&injector);
//! {
//!     let request = fixtures.fixture("request").unwrap();
//!     assert!(request.get::<Vec<u8>>().unwrap().is_empty());
//! } // "request" is finalized here
//! assert!(!injector.handle("request").unwrap().is_built());
//!
//! let config = fixtures.fixture("config").unwrap();
//! assert_eq!(*config.get::<String>().unwrap(), "prod");
//! drop(config);
//! assert!(injector.handle("config").unwrap().is_built());
//!
//! fixtures.finish().unwrap();
//! assert!(!injector.handle("config").unwrap().is_built());
//! ```

use std::any::Any;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::{DiError, DiResult};
use crate::internal::DisposeBag;
use crate::provider::{Injector, ServiceHandle, ServiceThunk};
use crate::registration::AnyArc;

/// Metadata key read to decide a service's fixture scope.
pub const FIXTURE_SCOPE_KEY: &str = "fixture_scope";

/// How long a fixture's service stays built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FixtureScope {
    /// Built once, finalized when the fixture set finishes
    #[default]
    Session,
    /// Finalized after every use
    Function,
}

impl FixtureScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            FixtureScope::Session => "session",
            FixtureScope::Function => "function",
        }
    }
}

impl fmt::Display for FixtureScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FixtureScope {
    type Err = DiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "session" => Ok(FixtureScope::Session),
            "function" => Ok(FixtureScope::Function),
            _ => Err(DiError::TypeMismatch {
                name: s.to_string(),
                expected: "fixture scope \"session\" or \"function\"",
            }),
        }
    }
}

#[derive(Default)]
struct SessionState {
    finalizers: DisposeBag,
    registered: HashSet<String>,
}

/// A set of fixtures backed by injector entries.
pub struct FixtureSet {
    thunks: HashMap<String, ServiceThunk>,
    default_scope: FixtureScope,
    session: Mutex<SessionState>,
}

impl FixtureSet {
    /// Fixtures for every registered service.
    pub fn new(injector: &Injector) -> Self {
        Self::from_entries(injector, injector.all_entries())
    }

    /// Fixtures for a filtered listing, e.g. from
    /// [`Injector::entries_in_modules`].
    pub fn from_entries(injector: &Injector, entries: HashMap<String, ServiceThunk>) -> Self {
        Self {
            thunks: entries,
            default_scope: injector.config().default_fixture_scope,
            session: Mutex::new(SessionState::default()),
        }
    }

    /// Fixture names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.thunks.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn contains(&self, name: &str) -> bool {
        self.thunks.contains_key(name)
    }

    /// Scope of `name`, from its metadata or the configured default.
    pub fn scope_of(&self, name: &str) -> DiResult<FixtureScope> {
        let thunk = self.thunk(name)?;
        match thunk.handle().metadata_value(FIXTURE_SCOPE_KEY) {
            Some(value) => value.as_str()?.parse(),
            None => Ok(self.default_scope),
        }
    }

    /// Resolves the service behind `name` and wraps it as a fixture.
    pub fn fixture(&self, name: &str) -> DiResult<Fixture> {
        let scope = self.scope_of(name)?;
        let thunk = self.thunk(name)?;
        let value = thunk.call()?;

        let finalize_on_drop = match scope {
            FixtureScope::Function => Some(thunk.handle().clone()),
            FixtureScope::Session => {
                let mut session = self.session.lock();
                if session.registered.insert(name.to_string()) {
                    let handle = thunk.handle().clone();
                    session.finalizers.push(Box::new(move || handle.finalize()));
                }
                None
            }
        };

        tracing::debug!(fixture = name, scope = scope.as_str(), "Fixture provided");
        Ok(Fixture {
            name: name.to_string(),
            scope,
            value,
            finalize_on_drop,
        })
    }

    /// Runs session finalizers, most recently first used first. Every
    /// finalizer runs; the first error is returned.
    pub fn finish(&mut self) -> DiResult<()> {
        let session = self.session.get_mut();
        session.registered.clear();
        session.finalizers.run_all_reverse()
    }

    fn thunk(&self, name: &str) -> DiResult<&ServiceThunk> {
        self.thunks
            .get(name)
            .ok_or_else(|| DiError::not_found(name, None))
    }
}

impl Drop for FixtureSet {
    fn drop(&mut self) {
        if self.session.get_mut().finalizers.is_empty() {
            return;
        }
        if let Err(err) = self.finish() {
            tracing::warn!(error = %err, "Session fixture finalization failed");
        }
    }
}

/// A resolved fixture value.
pub struct Fixture {
    name: String,
    scope: FixtureScope,
    value: AnyArc,
    finalize_on_drop: Option<ServiceHandle>,
}

impl Fixture {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn scope(&self) -> FixtureScope {
        self.scope
    }

    pub fn value(&self) -> &AnyArc {
        &self.value
    }

    pub fn get<T: Any + Send + Sync>(&self) -> DiResult<Arc<T>> {
        self.value
            .clone()
            .downcast::<T>()
            .map_err(|_| DiError::TypeMismatch {
                name: self.name.clone(),
                expected: std::any::type_name::<T>(),
            })
    }

    /// Ends the fixture now, reporting a finalization error instead of
    /// logging it.
    pub fn finish(mut self) -> DiResult<()> {
        match self.finalize_on_drop.take() {
            Some(handle) => handle.finalize(),
            None => Ok(()),
        }
    }
}

impl Drop for Fixture {
    fn drop(&mut self) {
        if let Some(handle) = self.finalize_on_drop.take() {
            if let Err(err) = handle.finalize() {
                tracing::warn!(fixture = %self.name, error = %err, "Fixture finalization failed");
            }
        }
    }
}

impl fmt::Debug for Fixture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fixture")
            .field("name", &self.name)
            .field("scope", &self.scope)
            .finish()
    }
}
