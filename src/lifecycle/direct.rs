use std::any::Any;
use std::sync::Arc;

use super::{Lifecycle, Strategy};
use crate::dependencies::Dependencies;
use crate::error::DiResult;
use crate::registration::{AnyArc, Built, Teardown};

type Factory<T> = Arc<dyn Fn(&Dependencies) -> DiResult<T> + Send + Sync>;
type Finalizer<T> = Arc<dyn Fn(&T) -> DiResult<()> + Send + Sync>;

/// Calls the factory once and caches its result.
pub struct DirectLifecycle<T> {
    factory: Factory<T>,
    finalizer: Option<Finalizer<T>>,
}

impl<T: Any + Send + Sync> DirectLifecycle<T> {
    pub(crate) fn new<F>(factory: F) -> Self
    where
        F: Fn(&Dependencies) -> DiResult<T> + Send + Sync + 'static,
    {
        Self {
            factory: Arc::new(factory),
            finalizer: None,
        }
    }

    pub(crate) fn set_finalizer<F>(&mut self, finalizer: F)
    where
        F: Fn(&T) -> DiResult<()> + Send + Sync + 'static,
    {
        self.finalizer = Some(Arc::new(finalizer));
    }
}

impl<T: Any + Send + Sync> Lifecycle for DirectLifecycle<T> {
    fn strategy(&self) -> Strategy {
        Strategy::Direct
    }

    fn construct(&self, _name: &str, args: &Dependencies) -> DiResult<Built> {
        let value = Arc::new((self.factory)(args)?);

        let teardown = self.finalizer.clone().map(|finalizer| {
            let value = value.clone();
            Box::new(move || finalizer(&value)) as Teardown
        });

        Ok(Built::new(value, teardown))
    }

    fn create_uncached(&self, _name: &str, args: &Dependencies) -> DiResult<AnyArc> {
        Ok(Arc::new((self.factory)(args)?))
    }
}
