use std::collections::HashMap;

/// A dynamically typed configuration value.
///
/// Engines receive configuration as a generic string-keyed mapping; each engine
/// parses the values it recognizes and ignores the rest. Integer hints are
/// accepted as either 32- or 64-bit.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValue {
    Int(i32),
    Long(i64),
    Text(String),
}

impl ConfigValue {
    /// Returns the value as a 64-bit integer if it is an `Int` or a `Long`.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            ConfigValue::Int(v) => Some(*v as i64),
            ConfigValue::Long(v) => Some(*v),
            _ => None,
        }
    }
}

impl From<i32> for ConfigValue {
    fn from(v: i32) -> Self {
        ConfigValue::Int(v)
    }
}

impl From<i64> for ConfigValue {
    fn from(v: i64) -> Self {
        ConfigValue::Long(v)
    }
}

impl From<&str> for ConfigValue {
    fn from(v: &str) -> Self {
        ConfigValue::Text(v.to_string())
    }
}

/// Generic, string-keyed configuration mapping passed to `Engine::create`.
///
/// # Purpose
/// `StoreOptions` carries engine-specific hints without coupling callers to any
/// particular backend. Unrecognized keys are ignored; recognized keys with a
/// value of the wrong type fall back to the engine's default.
///
/// # Usage
/// ```text
/// let options = StoreOptions::new()
///     .with(memory::MAX_SIZE_OPTION, 1024i64)
///     .with(memory::MAX_VERSIONS_OPTION, 5);
/// let store = engine.create("cache", "/data/cache", &options)?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct StoreOptions {
    entries: HashMap<String, ConfigValue>,
}

impl StoreOptions {
    /// Creates an empty options mapping.
    pub fn new() -> StoreOptions {
        StoreOptions {
            entries: HashMap::new(),
        }
    }

    /// Builder-style insertion of a configuration value.
    pub fn with(mut self, key: &str, value: impl Into<ConfigValue>) -> Self {
        self.entries.insert(key.to_string(), value.into());
        self
    }

    /// Returns the value under `key` as an integer, accepting both `Int` and
    /// `Long`. Absent keys and wrong-typed values yield `None` so engines can
    /// apply their defaults.
    pub fn get_integer(&self, key: &str) -> Option<i64> {
        self.entries.get(key).and_then(ConfigValue::as_integer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_builder() {
        let options = StoreOptions::new()
            .with("max_size", 1024i64)
            .with("max_versions", 5);
        assert_eq!(options.get_integer("max_size"), Some(1024));
        assert_eq!(options.get_integer("max_versions"), Some(5));
    }

    #[test]
    fn test_integer_accepts_both_widths() {
        let options = StoreOptions::new()
            .with("narrow", 20i32)
            .with("wide", 1_i64 << 40);
        assert_eq!(options.get_integer("narrow"), Some(20));
        assert_eq!(options.get_integer("wide"), Some(1_i64 << 40));
    }

    #[test]
    fn test_wrong_type_yields_none() {
        // A wrong-typed value must behave like an absent key so the engine
        // falls back to its default.
        let options = StoreOptions::new().with("max_size", "not a number");
        assert_eq!(options.get_integer("max_size"), None);
    }

    #[test]
    fn test_absent_key_yields_none() {
        let options = StoreOptions::new();
        assert_eq!(options.get_integer("max_size"), None);
    }
}
