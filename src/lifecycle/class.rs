use std::any::Any;
use std::marker::PhantomData;
use std::sync::Arc;

use super::{Lifecycle, Strategy};
use crate::dependencies::Dependencies;
use crate::error::DiResult;
use crate::injected::Injected;
use crate::provider::{downcast, ResolverContext};
use crate::registration::{AnyArc, Built, Teardown};

/// A type the container can instantiate itself.
///
/// `construct` receives the declared dependencies; fields of type
/// [`Injected`] are left unbound and filled in by the container once the
/// instance exists (see
/// [`with_injected_field`](crate::ServiceBuilder::with_injected_field)).
/// Outside the container the type is an ordinary type: building it
/// through `construct` or a plain constructor involves no caching.
///
/// ```rust
/// use ferrous_inject::{Dependencies, DiResult, Injectable, Injected, Injector, Service};
///
/// struct Greeter {
///     greeting: Injected<String>,
/// }
///
/// impl Injectable for Greeter {
///     fn construct(_deps: &Dependencies) -> DiResult<Self> {
///         Ok(Greeter { greeting: Injected::new() })
///     }
/// }
///
/// let injector = Injector::new();
/// injector.register(Service::factory("greeting", |_| Ok("hello".to_string())));
/// injector.register(
///     Service::class::<Greeter>().with_injected_field("greeting", false, |g: &Greeter| &g.greeting),
/// );
///
/// let greeter = injector.get_instance_as::<Greeter>("greeter").unwrap();
/// assert_eq!(*greeter.greeting.get().unwrap(), "hello");
/// ```
pub trait Injectable: Any + Send + Sync + Sized {
    fn construct(deps: &Dependencies) -> DiResult<Self>;

    /// Teardown hook run on finalize, before injected fields are reset.
    fn finalize(&self) -> DiResult<()> {
        Ok(())
    }
}

/// One declared injected field of `T`.
pub(crate) trait FieldBinding<T>: Send + Sync {
    fn bind(&self, owner: &T, ctx: &ResolverContext<'_>) -> DiResult<()>;
    fn reset(&self, owner: &T);
}

struct FieldSpec<T, D> {
    target: String,
    lazy: bool,
    accessor: fn(&T) -> &Injected<D>,
    _marker: PhantomData<fn() -> D>,
}

impl<T, D> FieldBinding<T> for FieldSpec<T, D>
where
    T: Send + Sync + 'static,
    D: Any + Send + Sync,
{
    fn bind(&self, owner: &T, ctx: &ResolverContext<'_>) -> DiResult<()> {
        let field = (self.accessor)(owner);
        let thunk = ctx.thunk(&self.target)?;

        if self.lazy {
            field.bind_lazy(thunk);
            return Ok(());
        }

        let value = downcast::<D>(&self.target, ctx.resolve_thunk(&thunk)?)?;
        field.bind_eager(&self.target, value);
        Ok(())
    }

    fn reset(&self, owner: &T) {
        (self.accessor)(owner).reset();
    }
}

/// Instantiates an [`Injectable`] once and binds its injected fields.
pub struct ClassLifecycle<T> {
    fields: Vec<Arc<dyn FieldBinding<T>>>,
}

impl<T: Injectable> ClassLifecycle<T> {
    pub(crate) fn new() -> Self {
        Self { fields: Vec::new() }
    }

    pub(crate) fn add_field<D: Any + Send + Sync>(
        &mut self,
        target: String,
        lazy: bool,
        accessor: fn(&T) -> &Injected<D>,
    ) {
        self.fields.push(Arc::new(FieldSpec {
            target,
            lazy,
            accessor,
            _marker: PhantomData,
        }));
    }
}

impl<T: Injectable> Lifecycle for ClassLifecycle<T> {
    fn strategy(&self) -> Strategy {
        Strategy::Class
    }

    fn construct(&self, _name: &str, args: &Dependencies) -> DiResult<Built> {
        let instance = Arc::new(T::construct(args)?);

        let fields = self.fields.clone();
        let owner = instance.clone();
        let teardown: Teardown = Box::new(move || {
            let result = owner.finalize();
            for field in &fields {
                field.reset(&owner);
            }
            result
        });

        Ok(Built::new(instance, Some(teardown)))
    }

    fn bind(&self, instance: &AnyArc, ctx: &ResolverContext<'_>) -> DiResult<()> {
        if self.fields.is_empty() {
            return Ok(());
        }
        let owner = downcast::<T>(ctx.owner(), instance.clone())?;
        for field in &self.fields {
            field.bind(&owner, ctx)?;
        }
        Ok(())
    }

    fn create_uncached(&self, _name: &str, args: &Dependencies) -> DiResult<AnyArc> {
        Ok(Arc::new(T::construct(args)?))
    }
}
