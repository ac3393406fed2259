//! Disposal trait for resource cleanup.

/// Trait for synchronous resource disposal.
///
/// Implement this for services that need structured teardown (flushing
/// caches, closing connections) and register them with
/// [`disposable`](crate::ServiceBuilder::disposable). `dispose` runs when
/// the service is finalized.
///
/// # Examples
///
/// ```
/// use ferrous_inject::{Dispose, Injector, Service};
///
/// struct Cache {
///     name: String,
/// }
///
/// impl Dispose for Cache {
///     fn dispose(&self) {
///         println!("Flushing cache: {}", self.name);
///     }
/// }
///
/// let injector = Injector::new();
/// let cache = injector.register(
///     Service::factory("cache", |_| Ok(Cache { name: "user_cache".to_string() })).disposable(),
/// );
/// cache.get_instance().unwrap();
/// cache.finalize().unwrap();
/// ```
pub trait Dispose: Send + Sync + 'static {
    /// Perform synchronous cleanup of resources.
    fn dispose(&self);
}
