//! Lifecycle strategies.
//!
//! A strategy wraps a user factory and decides how an instance is built
//! and torn down. Three shapes are supported:
//!
//! * [`DirectLifecycle`]: a plain function of the dependencies, with an
//!   optional finalizer.
//! * [`TwoPhaseLifecycle`]: a [`TwoPhase`] resource whose `setup` yields
//!   the instance and whose `teardown` must complete without yielding again.
//! * [`ClassLifecycle`]: an [`Injectable`] type whose [`Injected`](crate::Injected)
//!   fields are bound after construction.

use std::fmt;

use crate::dependencies::Dependencies;
use crate::error::DiResult;
use crate::provider::ResolverContext;
use crate::registration::{AnyArc, Built};

mod class;
mod direct;
mod two_phase;

pub use class::{ClassLifecycle, Injectable};
pub use direct::DirectLifecycle;
pub use two_phase::{Advance, Phased, TwoPhase, TwoPhaseLifecycle};

/// Which lifecycle strategy a service was registered with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    Direct,
    TwoPhase,
    Class,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Direct => "direct",
            Strategy::TwoPhase => "two_phase",
            Strategy::Class => "class",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a registered service is built and torn down.
///
/// Implemented by the strategy types; registrations are created through
/// [`Service`](crate::Service) rather than by implementing this directly.
pub trait Lifecycle: Send + Sync + 'static {
    fn strategy(&self) -> Strategy;

    /// Builds the instance from resolved arguments. The returned
    /// [`Built`] carries the teardown to run on finalize.
    fn construct(&self, name: &str, args: &Dependencies) -> DiResult<Built>;

    /// Completes an instance after it has been cached: the owner is no
    /// longer under construction, so services depending back on it
    /// receive it. A failure uncaches the instance.
    fn bind(&self, _instance: &AnyArc, _ctx: &ResolverContext<'_>) -> DiResult<()> {
        Ok(())
    }

    /// Builds a value the ordinary way: no caching, no field binding,
    /// no teardown.
    fn create_uncached(&self, name: &str, args: &Dependencies) -> DiResult<AnyArc>;
}
