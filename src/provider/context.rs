//! Resolver context for dependency injection.
//!
//! A context is created for each construction. Nested resolutions go
//! through the same per-thread resolution stack as every other entry
//! point, so they see every service currently under construction.

use std::sync::Arc;

use super::{InjectorInner, ServiceHandle, ServiceThunk};
use crate::dependencies::Dependencies;
use crate::error::{DiError, DiResult};
use crate::registration::{AnyArc, ServiceEntry};

/// Context handed to lifecycle strategies while a service is being built.
pub struct ResolverContext<'a> {
    inner: &'a Arc<InjectorInner>,
    owner: &'a str,
}

impl<'a> ResolverContext<'a> {
    pub(crate) fn new(inner: &'a Arc<InjectorInner>, owner: &'a str) -> Self {
        Self { inner, owner }
    }

    /// Name of the service being built.
    pub fn owner(&self) -> &str {
        self.owner
    }

    /// Resolves declared dependencies in order. The first failure aborts.
    pub(crate) fn resolve_all(&self, names: &[String]) -> DiResult<Dependencies> {
        let mut deps = Dependencies::with_capacity(names.len());
        for name in names {
            let entry = self.lookup(name)?;
            let value = entry.get_instance(self.inner)?;
            deps.push(name.clone(), value);
        }
        Ok(deps)
    }

    /// Thunk for `name`, failing with `NotFound` attributed to the owner.
    pub(crate) fn thunk(&self, name: &str) -> DiResult<ServiceThunk> {
        let entry = self.lookup(name)?;
        Ok(ServiceThunk::new(ServiceHandle::new(
            entry,
            Arc::downgrade(self.inner),
        )))
    }

    /// Resolves a thunk on behalf of the owner.
    pub(crate) fn resolve_thunk(&self, thunk: &ServiceThunk) -> DiResult<AnyArc> {
        thunk.handle().entry().get_instance(self.inner)
    }

    fn lookup(&self, name: &str) -> DiResult<Arc<ServiceEntry>> {
        self.inner
            .entry(name)
            .ok_or_else(|| DiError::not_found(name, Some(self.owner)))
    }
}
