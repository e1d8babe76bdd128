use dashmap::DashMap;
use serde_json::Value;

/// Thread-safe key/value attribute store shared by deployed applications.
///
/// Values live as long as the context; nothing is evicted. Applications that
/// share one context namespace their keys (e.g. `"<app>.servletCache"`).
#[derive(Debug, Default)]
pub struct ApplicationContext {
    attributes: DashMap<String, Value>,
}

impl ApplicationContext {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Clone of the value stored under `key`.
    #[must_use]
    pub fn get_attribute(&self, key: &str) -> Option<Value> {
        self.attributes.get(key).map(|v| v.value().clone())
    }

    /// Store `value` under `key`, returning the previous value.
    pub fn set_attribute(&self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.attributes.insert(key.into(), value)
    }

    pub fn remove_attribute(&self, key: &str) -> Option<Value> {
        self.attributes.remove(key).map(|(_, v)| v)
    }

    /// Read the value under `key` in place without cloning it.
    pub fn with_attribute<R>(&self, key: &str, f: impl FnOnce(&Value) -> R) -> Option<R> {
        self.attributes.get(key).map(|v| f(v.value()))
    }

    /// Mutate the value under `key` in place, starting from `null` if absent.
    ///
    /// The closure runs while the entry is locked; it must not call back
    /// into this context.
    pub fn update_attribute<R>(&self, key: &str, f: impl FnOnce(&mut Value) -> R) -> R {
        let mut entry = self
            .attributes
            .entry(key.to_string())
            .or_insert(Value::Null);
        f(entry.value_mut())
    }

    #[must_use]
    pub fn attribute_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.attributes.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }
}
