//! Startup secrets
//!
//! Resolved once from the vault and immutable afterwards.

pub mod vault;

use serde_json::{Map, Value};
use std::collections::HashMap;

use crate::error::ConfigError;

pub use vault::load_secrets;

/// A secret as stored in the KV engine
#[derive(Debug, Clone, PartialEq)]
pub enum SecretValue {
    Scalar(String),
    Structured(Map<String, Value>),
}

impl SecretValue {
    /// Resolve raw KV data. A mapping whose only key is `value` is
    /// unwrapped; any other mapping stays structured.
    pub fn from_data(mut data: Map<String, Value>) -> Self {
        if data.len() != 1 || !data.contains_key("value") {
            return SecretValue::Structured(data);
        }
        match data.remove("value") {
            Some(Value::String(s)) => SecretValue::Scalar(s),
            Some(Value::Object(inner)) => SecretValue::Structured(inner),
            Some(other) => SecretValue::Scalar(other.to_string()),
            None => SecretValue::Structured(Map::new()),
        }
    }

    pub fn as_scalar(&self) -> Option<&str> {
        match self {
            SecretValue::Scalar(s) => Some(s),
            SecretValue::Structured(_) => None,
        }
    }
}

/// Name to value mapping for every resolved secret
#[derive(Debug, Default)]
pub struct Secrets {
    values: HashMap<String, SecretValue>,
}

impl Secrets {
    pub fn insert(&mut self, name: impl Into<String>, value: SecretValue) {
        self.values.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&SecretValue> {
        self.values.get(name)
    }

    /// Plain-string secret, or a `ConfigError` naming it
    pub fn require(&self, name: &str) -> Result<&str, ConfigError> {
        self.get(name)
            .and_then(SecretValue::as_scalar)
            .ok_or_else(|| ConfigError::MissingSecret(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(v: Value) -> Map<String, Value> {
        match v {
            Value::Object(m) => m,
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_single_value_key_is_unwrapped() {
        let v = SecretValue::from_data(map(json!({"value": "abc"})));
        assert_eq!(v, SecretValue::Scalar("abc".into()));
    }

    #[test]
    fn test_non_string_value_becomes_text() {
        let v = SecretValue::from_data(map(json!({"value": 42})));
        assert_eq!(v.as_scalar(), Some("42"));
    }

    #[test]
    fn test_nested_value_mapping_is_structured() {
        let v = SecretValue::from_data(map(json!({"value": {"user": "u"}})));
        assert_eq!(v, SecretValue::Structured(map(json!({"user": "u"}))));
    }

    #[test]
    fn test_other_mappings_are_structured() {
        let data = map(json!({"value": "a", "other": "b"}));
        assert_eq!(
            SecretValue::from_data(data.clone()),
            SecretValue::Structured(data)
        );

        let data = map(json!({"token": "a"}));
        assert_eq!(
            SecretValue::from_data(data.clone()),
            SecretValue::Structured(data)
        );
    }

    #[test]
    fn test_require() {
        let mut secrets = Secrets::default();
        secrets.insert("plain", SecretValue::Scalar("x".into()));
        secrets.insert("nested", SecretValue::Structured(Map::new()));

        assert_eq!(secrets.require("plain").unwrap(), "x");
        assert!(matches!(
            secrets.require("nested"),
            Err(ConfigError::MissingSecret(n)) if n == "nested"
        ));
        assert!(secrets.require("absent").is_err());
    }
}
