//! Service module system for modular registration.
//!
//! This module provides a trait for organizing service registrations into
//! reusable modules.

use crate::error::DiResult;
use crate::provider::Injector;

/// A group of services registered together.
///
/// # Example
///
/// ```rust
/// use ferrous_inject::{DiResult, Injector, Service, ServiceModule};
///
/// struct DatabaseModule {
///     url: String,
/// }
///
/// impl ServiceModule for DatabaseModule {
///     fn register_services(self, injector: &Injector) -> DiResult<()> {
///         let url = self.url;
///         injector.register(
///             Service::factory("database_url", move |_| Ok(url.clone())).declared_in("database"),
///         );
///         injector.register(
///             Service::factory("pool_size", |_| Ok(4usize)).declared_in("database"),
///         );
///         Ok(())
///     }
/// }
///
/// # fn main() -> DiResult<()> {
/// let injector = Injector::new();
/// injector.add_module(DatabaseModule { url: "db://local".to_string() })?;
/// assert_eq!(injector.entries_in_modules(&["database"]).len(), 2);
/// # Ok(())
/// # }
/// ```
pub trait ServiceModule {
    /// Register this module's services with the injector.
    fn register_services(self, injector: &Injector) -> DiResult<()>;
}

impl Injector {
    /// Registers every service of `module`.
    pub fn add_module<M: ServiceModule>(&self, module: M) -> DiResult<&Self> {
        module.register_services(self)?;
        Ok(self)
    }
}
