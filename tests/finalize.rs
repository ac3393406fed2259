use ferrous_inject::{
    Advance, Dependencies, DiError, DiResult, Dispose, Injectable, Injector, MetricsObserver,
    Phased, Service,
};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

struct TrackedCache {
    disposed: Arc<AtomicUsize>,
}

impl Dispose for TrackedCache {
    fn dispose(&self) {
        self.disposed.fetch_add(1, Ordering::SeqCst);
    }
}

#[test]
fn test_finalize_all_is_idempotent() {
    let finalized = Arc::new(AtomicUsize::new(0));
    let counter = finalized.clone();

    let injector = Injector::new();
    injector.register(Service::factory("built", |_| Ok(1u8)).on_finalize(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }));
    injector.register(Service::factory("never_built", |_| Ok(2u8)));

    // Nothing built yet
    injector.finalize_all().unwrap();
    assert_eq!(finalized.load(Ordering::SeqCst), 0);

    injector.get_instance("built").unwrap();
    injector.finalize_all().unwrap();
    injector.finalize_all().unwrap();
    assert_eq!(finalized.load(Ordering::SeqCst), 1);
}

#[test]
fn test_finalize_all_newest_first() {
    let order = Arc::new(Mutex::new(Vec::new()));

    let injector = Injector::new();
    for name in ["first", "second", "third"] {
        let order = order.clone();
        injector.register(Service::factory(name, |_| Ok(())).on_finalize(move |_| {
            order.lock().unwrap().push(name);
            Ok(())
        }));
        injector.get_instance(name).unwrap();
    }

    injector.finalize_all().unwrap();
    assert_eq!(*order.lock().unwrap(), vec!["third", "second", "first"]);
}

#[test]
fn test_finalize_all_attempts_every_entry() {
    let finalized = Arc::new(AtomicUsize::new(0));

    let injector = Injector::new();
    injector.register(Service::two_phase("chatty", |_| {
        Ok(Phased::new(|| Ok(1u8)).advance_with(|| Ok(Advance::Yield(2u8))))
    }));
    for name in ["a", "b"] {
        let finalized = finalized.clone();
        injector.register(Service::factory(name, |_| Ok(())).on_finalize(move |_| {
            finalized.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }));
    }
    for name in ["a", "chatty", "b"] {
        injector.get_instance(name).unwrap();
    }

    let err = injector.finalize_all().unwrap_err();
    assert!(err.is_multiple_yields());
    assert_eq!(finalized.load(Ordering::SeqCst), 2);
    assert!(injector.descriptors().iter().all(|d| !d.built));

    // A second pass has nothing left to fail on
    injector.finalize_all().unwrap();
}

#[test]
fn test_finalizer_error_is_reported() {
    let injector = Injector::new();
    let handle = injector.register(
        Service::factory("socket", |_| Ok("open"))
            .on_finalize(|_| Err(DiError::factory("socket", "already closed"))),
    );

    handle.get_instance().unwrap();
    let err = handle.finalize().unwrap_err();
    assert!(matches!(err, DiError::Factory { ref service, .. } if service == "socket"));
    assert!(!handle.is_built());
}

#[test]
fn test_disposable_runs_dispose() {
    let disposed = Arc::new(AtomicUsize::new(0));
    let counter = disposed.clone();

    let injector = Injector::new();
    let cache = injector.register(
        Service::factory("cache", move |_| {
            Ok(TrackedCache {
                disposed: counter.clone(),
            })
        })
        .disposable(),
    );

    cache.get_instance().unwrap();
    cache.finalize().unwrap();
    assert_eq!(disposed.load(Ordering::SeqCst), 1);

    cache.get_instance().unwrap();
    injector.finalize_all().unwrap();
    assert_eq!(disposed.load(Ordering::SeqCst), 2);
}

#[test]
fn test_finalize_does_not_cascade() {
    let injector = Injector::new();
    let base = injector.register(Service::factory("base", |_| Ok(10u32)));
    let derived = injector.register(
        Service::factory("derived", |d| Ok(*d.get::<u32>(0)? * 2)).depends_on("base"),
    );

    derived.get_instance().unwrap();
    base.finalize().unwrap();

    assert!(!base.is_built());
    assert!(derived.is_built());
    assert_eq!(*derived.get::<u32>().unwrap(), 20);
}

#[test]
fn test_observer_counts() -> DiResult<()> {
    let metrics = Arc::new(MetricsObserver::new());

    let injector = Injector::new();
    injector.add_observer(metrics.clone());
    injector.register(Service::factory("leaf", |_| Ok(1u8)));
    injector.register(Service::factory("root", |_| Ok(2u8)).depends_on("leaf"));
    injector.register(Service::factory("broken", |_| Ok(())).depends_on("missing"));

    injector.get_instance("root")?;
    injector.get_instance("root")?;
    assert!(injector.get_instance("broken").is_err());
    injector.finalize_all()?;

    assert_eq!(metrics.construction_count(), 2);
    assert_eq!(metrics.finalization_count(), 2);
    assert_eq!(metrics.failure_count(), 1);
    Ok(())
}

static X_CONSTRUCTED: AtomicUsize = AtomicUsize::new(0);
static X_CLOSED: AtomicBool = AtomicBool::new(false);

struct X;

impl Injectable for X {
    fn construct(_deps: &Dependencies) -> DiResult<Self> {
        X_CONSTRUCTED.fetch_add(1, Ordering::SeqCst);
        Ok(X)
    }

    fn finalize(&self) -> DiResult<()> {
        X_CLOSED.store(true, Ordering::SeqCst);
        Ok(())
    }
}

#[test]
fn test_class_rebuilt_after_finalize() {
    let injector = Injector::new();
    let x = injector.register(Service::class::<X>());
    assert_eq!(x.name(), "x");

    // Finalizing before construction does nothing
    x.finalize().unwrap();
    assert!(!X_CLOSED.load(Ordering::SeqCst));
    assert_eq!(X_CONSTRUCTED.load(Ordering::SeqCst), 0);

    let first = x.get::<X>().unwrap();
    let second = x.get::<X>().unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(X_CONSTRUCTED.load(Ordering::SeqCst), 1);

    x.finalize().unwrap();
    assert!(X_CLOSED.load(Ordering::SeqCst));

    let third = x.get::<X>().unwrap();
    assert_eq!(X_CONSTRUCTED.load(Ordering::SeqCst), 2);
    assert!(!Arc::ptr_eq(&first, &third));
}
