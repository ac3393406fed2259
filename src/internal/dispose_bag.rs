//! Internal disposal bag for deferred finalizers.

use crate::error::DiResult;

type Finalizer = Box<dyn FnOnce() -> DiResult<()> + Send>;

/// Container for finalizer hooks with LIFO execution order.
#[derive(Default)]
pub(crate) struct DisposeBag {
    hooks: Vec<Finalizer>,
}

impl DisposeBag {
    pub(crate) fn push(&mut self, f: Finalizer) {
        self.hooks.push(f);
    }

    /// Runs every hook in reverse order; all hooks run even when one
    /// fails, and the first failure is returned.
    pub(crate) fn run_all_reverse(&mut self) -> DiResult<()> {
        let mut first_error = None;
        while let Some(f) = self.hooks.pop() {
            if let Err(err) = (f)() {
                first_error.get_or_insert(err);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.hooks.len()
    }
}
