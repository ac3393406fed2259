//! Configuration values and sources for the injector.
//!
//! [`ConfigValue`] doubles as the value type of registration metadata, so
//! hints such as a fixture scope can be attached to a service and read
//! back by adapters. [`InjectorConfig`] holds the container's own knobs and
//! can be loaded from any [`ConfigProvider`], including the environment.

use std::collections::HashMap;
use std::env;

use parking_lot::RwLock;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{DiError, DiResult};
use crate::fixtures::FixtureScope;
use crate::internal::DEFAULT_MAX_DEPTH;

/// A configuration value that can be various types
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum ConfigValue {
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Array(Vec<ConfigValue>),
    Object(HashMap<String, ConfigValue>),
}

impl ConfigValue {
    /// Try to convert to string
    pub fn as_str(&self) -> DiResult<&str> {
        match self {
            ConfigValue::String(s) => Ok(s),
            _ => Err(mismatch::<String>("config value")),
        }
    }

    /// Try to convert to integer
    pub fn as_i64(&self) -> DiResult<i64> {
        match self {
            ConfigValue::Integer(i) => Ok(*i),
            _ => Err(mismatch::<i64>("config value")),
        }
    }

    /// Try to convert to boolean
    pub fn as_bool(&self) -> DiResult<bool> {
        match self {
            ConfigValue::Boolean(b) => Ok(*b),
            _ => Err(mismatch::<bool>("config value")),
        }
    }

    /// Parses a raw string the way environment values are parsed:
    /// integer, then float, then boolean, else string.
    pub fn parse(raw: &str) -> Self {
        if let Ok(int_val) = raw.parse::<i64>() {
            ConfigValue::Integer(int_val)
        } else if let Ok(float_val) = raw.parse::<f64>() {
            ConfigValue::Float(float_val)
        } else if let Ok(bool_val) = raw.parse::<bool>() {
            ConfigValue::Boolean(bool_val)
        } else {
            ConfigValue::String(raw.to_string())
        }
    }
}

fn mismatch<T>(name: &str) -> DiError {
    DiError::TypeMismatch {
        name: name.to_string(),
        expected: std::any::type_name::<T>(),
    }
}

impl From<&str> for ConfigValue {
    fn from(value: &str) -> Self {
        ConfigValue::String(value.to_string())
    }
}

impl From<String> for ConfigValue {
    fn from(value: String) -> Self {
        ConfigValue::String(value)
    }
}

impl From<i64> for ConfigValue {
    fn from(value: i64) -> Self {
        ConfigValue::Integer(value)
    }
}

impl From<i32> for ConfigValue {
    fn from(value: i32) -> Self {
        ConfigValue::Integer(i64::from(value))
    }
}

impl From<f64> for ConfigValue {
    fn from(value: f64) -> Self {
        ConfigValue::Float(value)
    }
}

impl From<bool> for ConfigValue {
    fn from(value: bool) -> Self {
        ConfigValue::Boolean(value)
    }
}

impl<V: Into<ConfigValue>> From<Vec<V>> for ConfigValue {
    fn from(values: Vec<V>) -> Self {
        ConfigValue::Array(values.into_iter().map(Into::into).collect())
    }
}

/// Trait for configuration sources
pub trait ConfigSource: Send + Sync + std::fmt::Debug {
    /// Get a configuration value by key
    fn get(&self, key: &str) -> Option<ConfigValue>;

    /// List all available keys
    fn keys(&self) -> Vec<String>;
}

/// Environment variable configuration source
#[derive(Debug, Default)]
pub struct EnvironmentConfigSource {
    /// Prefix to filter environment variables
    prefix: Option<String>,
}

impl EnvironmentConfigSource {
    pub fn new() -> Self {
        Self { prefix: None }
    }

    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: Some(prefix.into()),
        }
    }

    fn env_key(&self, key: &str) -> String {
        let key = key.replace('.', "_").to_uppercase();
        match &self.prefix {
            Some(prefix) => format!("{}_{}", prefix.to_uppercase(), key),
            None => key,
        }
    }
}

impl ConfigSource for EnvironmentConfigSource {
    fn get(&self, key: &str) -> Option<ConfigValue> {
        env::var(self.env_key(key))
            .ok()
            .map(|value| ConfigValue::parse(&value))
    }

    fn keys(&self) -> Vec<String> {
        env::vars()
            .filter_map(|(key, _)| match &self.prefix {
                Some(prefix) => {
                    let prefix_upper = format!("{}_", prefix.to_uppercase());
                    key.strip_prefix(&prefix_upper).map(str::to_lowercase)
                }
                None => Some(key.to_lowercase()),
            })
            .collect()
    }
}

/// In-memory configuration source, mostly for tests and embedding.
#[derive(Debug, Default, Clone)]
pub struct MemoryConfigSource {
    values: HashMap<String, ConfigValue>,
}

impl MemoryConfigSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, key: impl Into<String>, value: impl Into<ConfigValue>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }
}

impl ConfigSource for MemoryConfigSource {
    fn get(&self, key: &str) -> Option<ConfigValue> {
        self.values.get(key).cloned()
    }

    fn keys(&self) -> Vec<String> {
        self.values.keys().cloned().collect()
    }
}

/// Configuration provider checking its sources in priority order
#[derive(Debug, Default)]
pub struct ConfigProvider {
    /// Configuration sources in priority order
    sources: Vec<Box<dyn ConfigSource>>,
    /// Cached configuration values
    cache: RwLock<HashMap<String, ConfigValue>>,
}

impl ConfigProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a configuration source (higher priority sources should be added first)
    pub fn add_source(&mut self, source: Box<dyn ConfigSource>) -> &mut Self {
        self.sources.push(source);
        self
    }

    /// Get a configuration value, checking sources in priority order
    pub fn get(&self, key: &str) -> Option<ConfigValue> {
        if let Some(value) = self.cache.read().get(key) {
            return Some(value.clone());
        }

        let value = self.sources.iter().find_map(|source| source.get(key))?;
        self.cache.write().insert(key.to_string(), value.clone());
        Some(value)
    }

    pub fn get_string_or(&self, key: &str, default: &str) -> String {
        self.get(key)
            .and_then(|v| v.as_str().ok().map(str::to_string))
            .unwrap_or_else(|| default.to_string())
    }

    pub fn get_i64_or(&self, key: &str, default: i64) -> i64 {
        self.get(key)
            .and_then(|v| v.as_i64().ok())
            .unwrap_or(default)
    }

    pub fn get_bool_or(&self, key: &str, default: bool) -> bool {
        self.get(key)
            .and_then(|v| v.as_bool().ok())
            .unwrap_or(default)
    }

    /// Clear the configuration cache (forces reload from sources)
    pub fn invalidate_cache(&self) {
        self.cache.write().clear();
    }

    /// Get all configuration keys from all sources
    pub fn all_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.sources.iter().flat_map(|s| s.keys()).collect();
        keys.sort();
        keys.dedup();
        keys
    }
}

/// Knobs of the injector itself.
#[derive(Debug, Clone, PartialEq)]
pub struct InjectorConfig {
    /// Deepest dependency chain a single resolution may follow
    pub max_depth: usize,
    /// Fixture scope for services whose metadata names none
    pub default_fixture_scope: FixtureScope,
    /// Emit a `tracing` event for every cache hit, not just constructions
    pub trace_resolution: bool,
}

impl Default for InjectorConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            default_fixture_scope: FixtureScope::Session,
            trace_resolution: false,
        }
    }
}

impl InjectorConfig {
    /// Loads from a provider; keys: `max_depth`, `fixture_scope`,
    /// `trace_resolution`. Missing or malformed values keep the defaults.
    pub fn load(provider: &ConfigProvider) -> Self {
        let defaults = Self::default();
        let max_depth = provider.get_i64_or("max_depth", defaults.max_depth as i64);
        let scope = provider.get_string_or("fixture_scope", defaults.default_fixture_scope.as_str());

        Self {
            max_depth: usize::try_from(max_depth).unwrap_or(defaults.max_depth),
            default_fixture_scope: scope.parse().unwrap_or(defaults.default_fixture_scope),
            trace_resolution: provider.get_bool_or("trace_resolution", defaults.trace_resolution),
        }
    }

    /// Loads from environment variables prefixed with `INJECT_`.
    pub fn from_env() -> Self {
        let mut provider = ConfigProvider::new();
        provider.add_source(Box::new(EnvironmentConfigSource::with_prefix("INJECT")));
        Self::load(&provider)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_value_conversions() {
        assert_eq!(ConfigValue::from("hello").as_str().unwrap(), "hello");
        assert_eq!(ConfigValue::from(42i64).as_i64().unwrap(), 42);
        assert!(ConfigValue::from(true).as_bool().unwrap());
        assert!(ConfigValue::from("hello").as_i64().is_err());
        assert_eq!(
            ConfigValue::from(vec!["a", "b"]),
            ConfigValue::Array(vec!["a".into(), "b".into()])
        );
    }

    #[test]
    fn test_parse() {
        assert_eq!(ConfigValue::parse("12"), ConfigValue::Integer(12));
        assert_eq!(ConfigValue::parse("1.5"), ConfigValue::Float(1.5));
        assert_eq!(ConfigValue::parse("false"), ConfigValue::Boolean(false));
        assert_eq!(ConfigValue::parse("function"), ConfigValue::String("function".into()));
    }

    #[test]
    fn test_provider_priority_and_cache() {
        let mut provider = ConfigProvider::new();
        provider
            .add_source(Box::new(MemoryConfigSource::new().set("max_depth", 8)))
            .add_source(Box::new(
                MemoryConfigSource::new()
                    .set("max_depth", 99)
                    .set("fixture_scope", "function"),
            ));

        assert_eq!(provider.get_i64_or("max_depth", 0), 8);
        assert_eq!(provider.get_string_or("fixture_scope", "session"), "function");
        assert_eq!(provider.get_string_or("missing", "default"), "default");

        let keys = provider.all_keys();
        assert_eq!(keys, vec!["fixture_scope".to_string(), "max_depth".to_string()]);
    }

    #[test]
    fn test_injector_config_load() {
        let mut provider = ConfigProvider::new();
        provider.add_source(Box::new(
            MemoryConfigSource::new()
                .set("max_depth", 16)
                .set("fixture_scope", "function")
                .set("trace_resolution", true),
        ));

        let config = InjectorConfig::load(&provider);
        assert_eq!(config.max_depth, 16);
        assert_eq!(config.default_fixture_scope, FixtureScope::Function);
        assert!(config.trace_resolution);
    }

    #[test]
    fn test_injector_config_malformed_values_keep_defaults() {
        let mut provider = ConfigProvider::new();
        provider.add_source(Box::new(
            MemoryConfigSource::new()
                .set("max_depth", -3)
                .set("fixture_scope", "module"),
        ));

        assert_eq!(InjectorConfig::load(&provider), InjectorConfig::default());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_config_value_json() {
        let value: ConfigValue = serde_json::from_str(r#"{"scope": "function", "depth": 4}"#).unwrap();
        match value {
            ConfigValue::Object(map) => {
                assert_eq!(map["scope"], ConfigValue::String("function".into()));
                assert_eq!(map["depth"], ConfigValue::Integer(4));
            }
            other => panic!("unexpected: {:?}", other),
        }
    }
}
