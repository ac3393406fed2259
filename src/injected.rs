//! Container-bound fields of class services.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::{DiError, DiResult};
use crate::provider::ServiceThunk;

enum Binding<D> {
    Unbound { last_target: Option<String> },
    Eager { target: String, value: Arc<D> },
    Lazy(ServiceThunk),
}

/// A field populated by the container after its owner is constructed.
///
/// Declared with
/// [`with_injected_field`](crate::ServiceBuilder::with_injected_field):
///
/// * **eager** fields resolve their target immediately, as part of
///   building the owner, and keep that value;
/// * **lazy** fields keep a thunk and resolve the target on every read,
///   so a finalized target is rebuilt on the next access.
///
/// Both are reset when the owner is finalized; reading a reset field is
/// an [`UnboundField`](DiError::UnboundField) error.
pub struct Injected<D> {
    binding: RwLock<Binding<D>>,
}

impl<D: Any + Send + Sync> Injected<D> {
    pub fn new() -> Self {
        Self {
            binding: RwLock::new(Binding::Unbound { last_target: None }),
        }
    }

    /// Current value of the field.
    pub fn get(&self) -> DiResult<Arc<D>> {
        let thunk = match &*self.binding.read() {
            Binding::Eager { value, .. } => return Ok(value.clone()),
            Binding::Lazy(thunk) => thunk.clone(),
            Binding::Unbound { last_target } => {
                return Err(DiError::UnboundField(
                    last_target
                        .clone()
                        .unwrap_or_else(|| std::any::type_name::<D>().to_string()),
                ))
            }
        };
        thunk.call_as::<D>()
    }

    pub fn is_bound(&self) -> bool {
        !matches!(&*self.binding.read(), Binding::Unbound { .. })
    }

    pub fn is_lazy(&self) -> bool {
        matches!(&*self.binding.read(), Binding::Lazy(_))
    }

    /// Name of the service this field is bound to.
    pub fn target(&self) -> Option<String> {
        match &*self.binding.read() {
            Binding::Eager { target, .. } => Some(target.clone()),
            Binding::Lazy(thunk) => Some(thunk.name().to_string()),
            Binding::Unbound { .. } => None,
        }
    }

    pub(crate) fn bind_eager(&self, target: &str, value: Arc<D>) {
        *self.binding.write() = Binding::Eager {
            target: target.to_string(),
            value,
        };
    }

    pub(crate) fn bind_lazy(&self, thunk: ServiceThunk) {
        *self.binding.write() = Binding::Lazy(thunk);
    }

    /// Idempotent.
    pub(crate) fn reset(&self) {
        let last_target = self.target();
        let mut binding = self.binding.write();
        if let Binding::Unbound { .. } = &*binding {
            return;
        }
        *binding = Binding::Unbound { last_target };
    }
}

impl<D: Any + Send + Sync> Default for Injected<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D> fmt::Debug for Injected<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match &*self.binding.read() {
            Binding::Unbound { .. } => "unbound".to_string(),
            Binding::Eager { target, .. } => format!("eager({})", target),
            Binding::Lazy(thunk) => format!("lazy({})", thunk.name()),
        };
        f.debug_struct("Injected").field("binding", &state).finish()
    }
}
