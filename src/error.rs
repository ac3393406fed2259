//! Error types for the injection container.

use std::fmt;
use std::sync::Arc;

/// Injection errors
///
/// Every failure the container reports is a variant of this one enum, so
/// callers can match broadly (`Err(_)`) or on a specific kind.
///
/// # Examples
///
/// ```rust
/// use ferrous_inject::{DiError, Injector, Service};
///
/// let injector = Injector::new();
/// injector.register(
///     Service::factory("needs_db", |_| Ok(())).depends_on("database"),
/// );
///
/// match injector.get_instance("needs_db") {
///     Err(DiError::NotFound { name, requested_by }) => {
///         assert_eq!(name, "database");
///         assert_eq!(requested_by.as_deref(), Some("needs_db"));
///     }
///     _ => unreachable!(),
/// }
/// ```
///
/// ```rust
/// use ferrous_inject::DiError;
///
/// let cycle = DiError::RecursiveInjection {
///     name: "a".to_string(),
///     path: vec!["a".to_string(), "b".to_string(), "a".to_string()],
/// };
/// println!("Error: {}", cycle);
/// assert!(cycle.is_recursive());
/// ```
#[derive(Debug, Clone)]
pub enum DiError {
    /// A dependency name has no registration at resolution time
    NotFound {
        name: String,
        requested_by: Option<String>,
    },
    /// The service depends (directly or transitively) on itself
    RecursiveInjection { name: String, path: Vec<String> },
    /// A two-phase factory produced a value during teardown
    MultipleYields(String),
    /// Downcast to the requested type failed
    TypeMismatch {
        name: String,
        expected: &'static str,
    },
    /// Positional argument index out of range
    MissingArgument { index: usize, len: usize },
    /// Read of an injected field that is not bound to an instance
    UnboundField(String),
    /// Maximum resolution depth exceeded
    DepthExceeded(usize),
    /// The injector owning a handle or thunk was dropped
    InjectorDropped(String),
    /// A user factory reported a failure
    Factory {
        service: String,
        source: Arc<dyn std::error::Error + Send + Sync>,
    },
}

impl DiError {
    /// Wraps an arbitrary error returned by a user factory.
    pub fn factory<E>(service: impl Into<String>, error: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        DiError::Factory {
            service: service.into(),
            source: Arc::from(error.into()),
        }
    }

    pub(crate) fn not_found(name: &str, requested_by: Option<&str>) -> Self {
        DiError::NotFound {
            name: name.to_string(),
            requested_by: requested_by.map(str::to_string),
        }
    }

    /// Every variant is an injection failure; kept for callers that
    /// only want the coarse classification.
    pub fn is_injection_failure(&self) -> bool {
        true
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, DiError::NotFound { .. })
    }

    pub fn is_recursive(&self) -> bool {
        matches!(self, DiError::RecursiveInjection { .. })
    }

    pub fn is_multiple_yields(&self) -> bool {
        matches!(self, DiError::MultipleYields(_))
    }
}

impl fmt::Display for DiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiError::NotFound { name, requested_by } => match requested_by {
                Some(service) => write!(
                    f,
                    "Cannot inject {} into service {}: no such service is registered",
                    name, service
                ),
                None => write!(f, "Service not found: {}", name),
            },
            DiError::RecursiveInjection { name, path } => write!(
                f,
                "Cannot inject {}: the service depends on itself ({})",
                name,
                path.join(" -> ")
            ),
            DiError::MultipleYields(name) => {
                write!(f, "Two-phase service {} must yield exactly once", name)
            }
            DiError::TypeMismatch { name, expected } => {
                write!(f, "Type mismatch for {}: expected {}", name, expected)
            }
            DiError::MissingArgument { index, len } => {
                write!(f, "Argument {} requested but only {} supplied", index, len)
            }
            DiError::UnboundField(name) => write!(f, "Injected field {} is not bound", name),
            DiError::DepthExceeded(depth) => write!(f, "Max depth {} exceeded", depth),
            DiError::InjectorDropped(name) => {
                write!(f, "Injector owning service {} was dropped", name)
            }
            DiError::Factory { service, source } => {
                write!(f, "Factory for {} failed: {}", service, source)
            }
        }
    }
}

impl std::error::Error for DiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DiError::Factory { source, .. } => Some(&**source),
            _ => None,
        }
    }
}

/// Result type for injection operations
///
/// # Examples
///
/// ```rust
/// use ferrous_inject::{DiResult, DiError};
///
/// fn connect() -> DiResult<String> {
///     Ok("connected".to_string())
/// }
///
/// fn failing() -> DiResult<()> {
///     Err(DiError::factory("database", "connection refused"))
/// }
///
/// assert!(connect().is_ok());
/// assert!(failing().is_err());
/// ```
pub type DiResult<T> = Result<T, DiError>;
