//! Positional arguments handed to factories.

use std::any::Any;
use std::sync::Arc;

use crate::error::{DiError, DiResult};
use crate::registration::AnyArc;

/// Resolved dependency values, in the order they were declared.
///
/// A service declares `depends_on("a").depends_on("b")`; its factory then
/// receives the instance of `a` at index 0 and of `b` at index 1.
///
/// # Examples
///
/// ```rust
/// use ferrous_inject::{Injector, Service};
/// use std::sync::Arc;
///
/// let injector = Injector::new();
/// injector.register(Service::factory("host", |_| Ok("localhost".to_string())));
/// injector.register(Service::factory("port", |_| Ok(8080u16)));
/// injector.register(
///     Service::factory("address", |deps| {
///         let host = deps.get::<String>(0)?;
///         let port = deps.get::<u16>(1)?;
///         Ok(format!("{}:{}", host, port))
///     })
///     .depends_on("host")
///     .depends_on("port"),
/// );
///
/// let address = injector.get_instance_as::<String>("address").unwrap();
/// assert_eq!(*address, "localhost:8080");
/// ```
#[derive(Clone, Default)]
pub struct Dependencies {
    names: Vec<String>,
    values: Vec<AnyArc>,
}

impl Dependencies {
    /// An empty argument list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a value under `name`. Used to build arguments for
    /// [`ServiceHandle::new_uncached`](crate::ServiceHandle::new_uncached).
    pub fn with<T: Any + Send + Sync>(mut self, name: impl Into<String>, value: T) -> Self {
        self.push(name.into(), Arc::new(value));
        self
    }

    /// Appends an already shared value under `name`.
    pub fn with_arc<T: Any + Send + Sync>(mut self, name: impl Into<String>, value: Arc<T>) -> Self {
        self.push(name.into(), value);
        self
    }

    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            names: Vec::with_capacity(capacity),
            values: Vec::with_capacity(capacity),
        }
    }

    pub(crate) fn push(&mut self, name: String, value: AnyArc) {
        self.names.push(name);
        self.values.push(value);
    }

    /// Typed access by position.
    pub fn get<T: Any + Send + Sync>(&self, index: usize) -> DiResult<Arc<T>> {
        let value = self.raw(index)?;
        value.clone().downcast::<T>().map_err(|_| DiError::TypeMismatch {
            name: self.names[index].clone(),
            expected: std::any::type_name::<T>(),
        })
    }

    /// Typed access by declared dependency name.
    pub fn by_name<T: Any + Send + Sync>(&self, name: &str) -> DiResult<Arc<T>> {
        match self.names.iter().position(|n| n == name) {
            Some(index) => self.get(index),
            None => Err(DiError::not_found(name, None)),
        }
    }

    /// Untyped access by position.
    pub fn raw(&self, index: usize) -> DiResult<&AnyArc> {
        self.values.get(index).ok_or(DiError::MissingArgument {
            index,
            len: self.values.len(),
        })
    }

    /// Declared names in positional order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl std::fmt::Debug for Dependencies {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dependencies")
            .field("names", &self.names)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positional_access() {
        let deps = Dependencies::new()
            .with("hello", "hello".to_string())
            .with("answer", 42u32);

        assert_eq!(deps.len(), 2);
        assert_eq!(*deps.get::<String>(0).unwrap(), "hello");
        assert_eq!(*deps.get::<u32>(1).unwrap(), 42);
        assert_eq!(*deps.by_name::<u32>("answer").unwrap(), 42);
        assert_eq!(deps.names(), &["hello".to_string(), "answer".to_string()]);
    }

    #[test]
    fn test_out_of_range_and_mismatch() {
        let deps = Dependencies::new().with("answer", 42u32);

        match deps.get::<u32>(3) {
            Err(DiError::MissingArgument { index: 3, len: 1 }) => {}
            other => panic!("unexpected: {:?}", other.map(|_| ())),
        }
        match deps.get::<String>(0) {
            Err(DiError::TypeMismatch { name, .. }) => assert_eq!(name, "answer"),
            other => panic!("unexpected: {:?}", other.map(|_| ())),
        }
        assert!(deps.by_name::<u32>("missing").unwrap_err().is_not_found());
    }

    #[test]
    fn test_empty() {
        let deps = Dependencies::new();
        assert!(deps.is_empty());
        assert!(deps.raw(0).is_err());
    }
}
