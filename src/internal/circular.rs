//! Circular dependency detection infrastructure.

use std::cell::RefCell;
use std::marker::PhantomData;

use crate::error::{DiError, DiResult};

pub(crate) const DEFAULT_MAX_DEPTH: usize = 1024;

// Thread-local resolution state for circular dependency detection
thread_local! {
    static RESOLUTION_TLS: RefCell<Vec<Frame>> = const { RefCell::new(Vec::new()) };
}

/// One service under construction on this thread.
struct Frame {
    /// Address of the entry, so equal names in different injectors stay apart
    id: usize,
    name: String,
}

/// Marks the entry `id` as under construction on this thread until the
/// guard drops.
///
/// Every entry point (a handle, a thunk, a lazy field read, a factory
/// resolving by name) shares the same per-thread stack, so re-entering a
/// service that is still being built is reported instead of blocking on
/// its lock.
pub(crate) fn enter(id: usize, name: &str, max_depth: usize) -> DiResult<StackGuard> {
    RESOLUTION_TLS.with(|tls| {
        let mut stack = tls.borrow_mut();

        // Circular detection BEFORE pushing the new name
        if stack.iter().any(|frame| frame.id == id) {
            let mut path: Vec<String> = stack.iter().map(|frame| frame.name.clone()).collect();
            path.push(name.to_string());
            return Err(DiError::RecursiveInjection {
                name: name.to_string(),
                path,
            });
        }

        if stack.len() >= max_depth {
            return Err(DiError::DepthExceeded(stack.len()));
        }

        let index = stack.len();
        stack.push(Frame {
            id,
            name: name.to_string(),
        });
        Ok(StackGuard {
            index,
            _not_send: PhantomData,
        })
    })
}

/// Number of services under construction on this thread.
pub(crate) fn depth() -> usize {
    RESOLUTION_TLS.with(|tls| tls.borrow().len())
}

/// Pops its frame (and anything left above it) on drop, on success,
/// error and unwind paths alike.
pub(crate) struct StackGuard {
    index: usize,
    _not_send: PhantomData<*const ()>,
}

impl Drop for StackGuard {
    fn drop(&mut self) {
        let _ = RESOLUTION_TLS.try_with(|tls| tls.borrow_mut().truncate(self.index));
    }
}
