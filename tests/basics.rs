use ferrous_inject::{DiError, Injector, Service, Strategy};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

struct Greeter {
    hello: Arc<String>,
}

impl Greeter {
    fn greet(&self, name: &str) -> String {
        format!("{} {}", self.hello, name)
    }
}

#[test]
fn test_hello_greeter() {
    let hello_calls = Arc::new(AtomicUsize::new(0));
    let calls = hello_calls.clone();

    let injector = Injector::new();
    injector.register(Service::factory("hello", move |_| {
        calls.fetch_add(1, Ordering::SeqCst);
        Ok("hello".to_string())
    }));
    let greeter = injector.register(
        Service::factory("greeter", |deps| {
            Ok(Greeter {
                hello: deps.get::<String>(0)?,
            })
        })
        .depends_on("hello"),
    );

    assert_eq!(greeter.get::<Greeter>().unwrap().greet("Dusan"), "hello Dusan");
    assert_eq!(greeter.get::<Greeter>().unwrap().greet("Dusan"), "hello Dusan");
    assert_eq!(hello_calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_singleton_identity() {
    let injector = Injector::new();
    let handle = injector.register(Service::factory("numbers", |_| Ok(vec![1, 2, 3])));

    let first = handle.get::<Vec<i32>>().unwrap();
    let second = injector.get_instance_as::<Vec<i32>>("numbers").unwrap();
    let third = injector.get("numbers", None).unwrap().call_as::<Vec<i32>>().unwrap();

    assert!(Arc::ptr_eq(&first, &second)); // Same instance
    assert!(Arc::ptr_eq(&second, &third));
}

#[test]
fn test_registration_does_not_construct() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();

    let injector = Injector::new();
    let handle = injector.register(Service::factory("lazy", move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }));

    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert!(!handle.is_built());

    handle.get_instance().unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(handle.is_built());
}

#[test]
fn test_dependencies_resolved_in_declared_order() {
    let order = Arc::new(Mutex::new(Vec::new()));

    let injector = Injector::new();
    for name in ["c", "a", "b"] {
        let order = order.clone();
        injector.register(Service::factory(name, move |_| {
            order.lock().unwrap().push(name);
            Ok(name.to_string())
        }));
    }
    let joined = injector.register(
        Service::factory("joined", |deps| {
            let parts: Vec<String> = (0..deps.len())
                .map(|i| deps.get::<String>(i).map(|s| s.to_string()))
                .collect::<Result<_, _>>()?;
            Ok(parts.join(","))
        })
        .depends_on_all(["a", "b", "c"]),
    );

    assert_eq!(*joined.get::<String>().unwrap(), "a,b,c");
    assert_eq!(*order.lock().unwrap(), vec!["a", "b", "c"]);
}

#[test]
fn test_forward_references() {
    let injector = Injector::new();
    let user = injector.register(
        Service::factory("user", |deps| Ok(format!("user@{}", deps.get::<String>(0)?)))
            .depends_on("domain"),
    );
    // Registered after the service that needs it
    injector.register(Service::factory("domain", |_| Ok("example.org".to_string())));

    assert_eq!(*user.get::<String>().unwrap(), "user@example.org");
}

#[test]
fn test_not_found_names_requesting_service() {
    let injector = Injector::new();
    let handle = injector.register(Service::factory("api", |_| Ok(())).depends_on("database"));

    match handle.get_instance() {
        Err(DiError::NotFound { name, requested_by }) => {
            assert_eq!(name, "database");
            assert_eq!(requested_by.as_deref(), Some("api"));
        }
        other => panic!("expected NotFound, got {:?}", other.map(|_| ())),
    }
    assert!(!handle.is_built());

    // Registering the missing dependency later makes the service resolvable
    injector.register(Service::factory("database", |_| Ok(())));
    assert!(handle.get_instance().is_ok());
}

#[test]
fn test_get_unknown_name() {
    let injector = Injector::new();

    match injector.get("missing", Some("caller")) {
        Err(DiError::NotFound { name, requested_by }) => {
            assert_eq!(name, "missing");
            assert_eq!(requested_by.as_deref(), Some("caller"));
        }
        _ => panic!("expected NotFound"),
    }
    assert!(injector.get_instance("missing").unwrap_err().is_not_found());
}

#[test]
fn test_last_registration_wins() {
    let injector = Injector::new();
    injector.register(Service::factory("value", |_| Ok(1u32)));
    injector.register(Service::factory("value", |_| Ok(2u32)));

    assert_eq!(injector.len(), 1);
    assert_eq!(*injector.get_instance_as::<u32>("value").unwrap(), 2);
}

#[test]
fn test_type_mismatch() {
    let injector = Injector::new();
    injector.register(Service::factory("port", |_| Ok(8080u16)));

    match injector.get_instance_as::<String>("port") {
        Err(DiError::TypeMismatch { name, .. }) => assert_eq!(name, "port"),
        other => panic!("expected TypeMismatch, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_factory_error_leaves_entry_unbuilt() {
    let attempts = Arc::new(AtomicUsize::new(0));
    let counter = attempts.clone();

    let injector = Injector::new();
    let handle = injector.register(Service::factory("flaky", move |_| {
        if counter.fetch_add(1, Ordering::SeqCst) == 0 {
            Err(DiError::factory("flaky", "first attempt fails"))
        } else {
            Ok("ready")
        }
    }));

    let err = handle.get_instance().unwrap_err();
    assert!(matches!(err, DiError::Factory { .. }));
    assert!(!handle.is_built());

    assert_eq!(*handle.get::<&str>().unwrap(), "ready");
    assert_eq!(attempts.load(Ordering::SeqCst), 2);
}

#[test]
fn test_handle_introspection() {
    let injector = Injector::new();
    let handle = injector.register(
        Service::factory("api", |_| Ok(()))
            .depends_on("db")
            .depends_on("cache")
            .metadata("fixture_scope", "function")
            .metadata("retries", 3),
    );

    assert_eq!(handle.name(), "api");
    assert_eq!(handle.strategy(), Strategy::Direct);
    assert_eq!(handle.dependencies(), &["db".to_string(), "cache".to_string()]);
    assert_eq!(handle.metadata().len(), 2);
    assert_eq!(handle.metadata_value("retries").unwrap().as_i64().unwrap(), 3);
    assert!(handle.origin().file().ends_with("basics.rs"));
    assert!(!handle.is_inplace());

    assert!(injector.contains("api"));
    assert_eq!(injector.names(), vec!["api".to_string()]);
    assert!(!injector.is_empty());
}

#[test]
fn test_dropped_injector() {
    let injector = Injector::new();
    let handle = injector.register(Service::factory("orphan", |_| Ok(1u8)));
    drop(injector);

    assert!(matches!(handle.get_instance(), Err(DiError::InjectorDropped(name)) if name == "orphan"));
    // Finalizing an entry that was never built is still fine
    assert!(handle.finalize().is_ok());
}

#[test]
fn test_traced_resolution() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new("ferrous_inject=trace"))
        .with_test_writer()
        .try_init();

    let injector = Injector::with_config(ferrous_inject::InjectorConfig {
        trace_resolution: true,
        ..Default::default()
    });
    injector.register(Service::factory("hello", |_| Ok("hello")));
    injector.register(Service::factory("traced", |_| Ok(1u8)).depends_on("hello"));

    assert_eq!(*injector.get_instance_as::<u8>("traced").unwrap(), 1);
    assert_eq!(*injector.get_instance_as::<u8>("traced").unwrap(), 1);
    assert!(injector.get_instance("missing").unwrap_err().is_not_found());
}
