use ferrous_inject::{
    ConfigProvider, ConfigValue, EnvironmentConfigSource, FixtureScope, Injector, InjectorConfig,
    MemoryConfigSource, Service,
};
use serial_test::serial;
use std::env;

fn clear_env() {
    for key in ["INJECT_MAX_DEPTH", "INJECT_FIXTURE_SCOPE", "INJECT_TRACE_RESOLUTION"] {
        env::remove_var(key);
    }
}

#[test]
#[serial]
fn test_from_env_defaults() {
    clear_env();
    assert_eq!(InjectorConfig::from_env(), InjectorConfig::default());
}

#[test]
#[serial]
fn test_from_env_reads_prefixed_variables() {
    clear_env();
    env::set_var("INJECT_MAX_DEPTH", "4");
    env::set_var("INJECT_FIXTURE_SCOPE", "function");
    env::set_var("INJECT_TRACE_RESOLUTION", "true");

    let config = InjectorConfig::from_env();
    clear_env();

    assert_eq!(config.max_depth, 4);
    assert_eq!(config.default_fixture_scope, FixtureScope::Function);
    assert!(config.trace_resolution);

    let injector = Injector::with_config(config);
    for i in 0..6 {
        injector.register(Service::factory(format!("s{}", i), |_| Ok(())).depends_on(format!("s{}", i + 1)));
    }
    injector.register(Service::factory("s6", |_| Ok(())));
    assert!(injector.get_instance("s0").is_err());
    assert!(injector.get_instance("s3").is_ok());
}

#[test]
#[serial]
fn test_environment_source_typed_values() {
    env::set_var("APPCFG_DATABASE_POOL", "16");
    env::set_var("APPCFG_DATABASE_URL", "postgres://localhost");

    let source = EnvironmentConfigSource::with_prefix("appcfg");
    let mut provider = ConfigProvider::new();
    provider
        .add_source(Box::new(MemoryConfigSource::new().set("database.url", "memory://override")))
        .add_source(Box::new(source));

    assert_eq!(provider.get("database.pool"), Some(ConfigValue::Integer(16)));
    assert_eq!(provider.get_string_or("database.url", ""), "memory://override");
    assert!(provider.all_keys().contains(&"database_pool".to_string()));

    env::remove_var("APPCFG_DATABASE_POOL");
    env::remove_var("APPCFG_DATABASE_URL");

    // Cached until invalidated
    assert_eq!(provider.get_i64_or("database.pool", 0), 16);
    provider.invalidate_cache();
    assert_eq!(provider.get_i64_or("database.pool", 0), 0);
}
