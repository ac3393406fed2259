//! Service descriptors for introspection and diagnostics.

use crate::lifecycle::Strategy;
use crate::registration::{Origin, ServiceEntry};

/// Service descriptor for introspection and diagnostics
///
/// A point-in-time description of one registration, as returned by
/// [`Injector::descriptors`](crate::Injector::descriptors).
///
/// # Examples
///
/// ```rust
/// use ferrous_inject::{Injector, Service, Strategy};
///
/// let injector = Injector::new();
/// injector.register(Service::factory("hello", |_| Ok("hello")));
/// injector.register(
///     Service::factory("greeter", |_| Ok(()))
///         .depends_on("hello")
///         .metadata("fixture_scope", "function"),
/// );
/// injector.get_instance("hello").unwrap();
///
/// let descriptors = injector.descriptors();
/// let greeter = descriptors.iter().find(|d| d.name == "greeter").unwrap();
/// assert_eq!(greeter.strategy, Strategy::Direct);
/// assert_eq!(greeter.dependencies, vec!["hello".to_string()]);
/// assert!(!greeter.built);
/// assert!(greeter.has_metadata("fixture_scope"));
///
/// let built = descriptors.iter().filter(|d| d.built).count();
/// assert_eq!(built, 1);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceDescriptor {
    /// Registry key
    pub name: String,
    /// Lifecycle strategy
    pub strategy: Strategy,
    /// Declared dependency names, in positional order
    pub dependencies: Vec<String>,
    /// Where the service was declared
    pub origin: Origin,
    /// Whether an instance is currently cached
    pub built: bool,
    pub inplace: bool,
    /// Metadata keys, sorted
    pub metadata_keys: Vec<String>,
}

impl ServiceDescriptor {
    pub(crate) fn from_entry(entry: &ServiceEntry) -> Self {
        let mut metadata_keys: Vec<String> = entry.metadata.keys().cloned().collect();
        metadata_keys.sort();

        Self {
            name: entry.name.clone(),
            strategy: entry.strategy(),
            dependencies: entry.dependencies.clone(),
            origin: entry.origin.clone(),
            built: entry.is_built(),
            inplace: entry.inplace,
            metadata_keys,
        }
    }

    pub fn has_metadata(&self, key: &str) -> bool {
        self.metadata_keys.iter().any(|k| k == key)
    }

    /// True when the service declares no dependencies.
    pub fn is_leaf(&self) -> bool {
        self.dependencies.is_empty()
    }
}
