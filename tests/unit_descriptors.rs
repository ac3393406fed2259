use ferrous_inject::{Injector, Phased, Service, Strategy};

#[test]
fn test_descriptors_reflect_registrations() {
    let injector = Injector::new();
    injector.register(Service::factory("hello", |_| Ok("hello")).declared_in("app::greetings"));
    injector.register(
        Service::two_phase("session", |_| Ok(Phased::new(|| Ok(1u8))))
            .depends_on("hello")
            .inplace(true)
            .metadata("fixture_scope", "function")
            .metadata("owner", "tests"),
    );

    let descriptors = injector.descriptors();
    assert_eq!(descriptors.len(), 2);
    assert_eq!(descriptors[0].name, "hello");
    assert_eq!(descriptors[1].name, "session");

    let hello = &descriptors[0];
    assert_eq!(hello.strategy, Strategy::Direct);
    assert!(hello.is_leaf());
    assert_eq!(hello.origin.module(), Some("app::greetings"));

    let session = &descriptors[1];
    assert_eq!(session.strategy, Strategy::TwoPhase);
    assert_eq!(session.dependencies, vec!["hello".to_string()]);
    assert!(session.inplace);
    assert_eq!(session.metadata_keys, vec!["fixture_scope".to_string(), "owner".to_string()]);
    assert!(!session.built);
}

#[test]
fn test_descriptors_track_built_state() {
    let injector = Injector::new();
    injector.register(Service::factory("a", |_| Ok(())));

    assert!(!injector.descriptors()[0].built);
    injector.get_instance("a").unwrap();
    assert!(injector.descriptors()[0].built);
    injector.finalize_all().unwrap();
    assert!(!injector.descriptors()[0].built);
}

#[test]
fn test_strategy_display() {
    assert_eq!(Strategy::Direct.to_string(), "direct");
    assert_eq!(Strategy::TwoPhase.to_string(), "two_phase");
    assert_eq!(Strategy::Class.to_string(), "class");
}

#[cfg(feature = "diagnostics")]
#[test]
fn test_debug_string_lists_services() {
    let injector = Injector::new();
    injector.register(Service::factory("hello", |_| Ok("hello")));
    injector.register(Service::factory("greeter", |_| Ok(())).depends_on("hello"));
    injector.get_instance("hello").unwrap();

    let dump = injector.to_debug_string();
    assert!(dump.contains("hello [direct, built]"), "got: {}", dump);
    assert!(dump.contains("greeter [direct] deps=[\"hello\"]"), "got: {}", dump);
}
