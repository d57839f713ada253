// ============================================================================
// FILTER CONFIGURATION — typed key/value store with registered defaults
// ============================================================================

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

/// Configuration object handed to filters by the host.
///
/// Values are written by the host's settings layer and persisted externally;
/// defaults are registered once by the filter's `get_defaults` hook. Typed
/// getters fall back to the registered default (and then to a zero value),
/// so a filter never has to care whether a key has been persisted yet.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct FilterData {
    values: Map<String, Value>,
    defaults: Map<String, Value>,
}

impl FilterData {
    pub fn new() -> Self {
        Self::default()
    }

    // ------------------------------------------------------------------
    // Host-side setters
    // ------------------------------------------------------------------

    pub fn set_int(&mut self, key: &str, value: i64) {
        self.values.insert(key.to_string(), Value::from(value));
    }

    pub fn set_double(&mut self, key: &str, value: f64) {
        // Non-finite values have no JSON representation; drop them.
        if let Some(n) = Number::from_f64(value) {
            self.values.insert(key.to_string(), Value::Number(n));
        }
    }

    pub fn set_bool(&mut self, key: &str, value: bool) {
        self.values.insert(key.to_string(), Value::Bool(value));
    }

    /// Remove a stored value, reverting the key to its default.
    pub fn unset(&mut self, key: &str) {
        self.values.remove(key);
    }

    // ------------------------------------------------------------------
    // Default registration
    // ------------------------------------------------------------------

    pub fn set_default_int(&mut self, key: &str, value: i64) {
        self.defaults.insert(key.to_string(), Value::from(value));
    }

    pub fn set_default_double(&mut self, key: &str, value: f64) {
        if let Some(n) = Number::from_f64(value) {
            self.defaults.insert(key.to_string(), Value::Number(n));
        }
    }

    pub fn set_default_bool(&mut self, key: &str, value: bool) {
        self.defaults.insert(key.to_string(), Value::Bool(value));
    }

    // ------------------------------------------------------------------
    // Typed getters
    // ------------------------------------------------------------------

    pub fn get_int(&self, key: &str) -> i64 {
        self.values
            .get(key)
            .and_then(Value::as_i64)
            .unwrap_or_else(|| self.get_default_int(key))
    }

    pub fn get_double(&self, key: &str) -> f64 {
        self.values
            .get(key)
            .and_then(Value::as_f64)
            .unwrap_or_else(|| self.get_default_double(key))
    }

    pub fn get_bool(&self, key: &str) -> bool {
        self.values
            .get(key)
            .and_then(Value::as_bool)
            .unwrap_or_else(|| self.get_default_bool(key))
    }

    /// The registered default, bypassing any stored value.
    pub fn get_default_int(&self, key: &str) -> i64 {
        self.defaults.get(key).and_then(Value::as_i64).unwrap_or(0)
    }

    pub fn get_default_double(&self, key: &str) -> f64 {
        self.defaults.get(key).and_then(Value::as_f64).unwrap_or(0.0)
    }

    pub fn get_default_bool(&self, key: &str) -> bool {
        self.defaults
            .get(key)
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stored_values_win_over_defaults() {
        let mut data = FilterData::new();
        data.set_default_int("size", 5);
        assert_eq!(data.get_int("size"), 5);

        data.set_int("size", 12);
        assert_eq!(data.get_int("size"), 12);
        assert_eq!(data.get_default_int("size"), 5);
    }

    #[test]
    fn unset_reverts_to_default() {
        let mut data = FilterData::new();
        data.set_default_double("feather", 0.0);
        data.set_double("feather", 25.0);
        data.unset("feather");
        assert_eq!(data.get_double("feather"), 0.0);
    }

    #[test]
    fn missing_keys_read_as_zero_values() {
        let data = FilterData::new();
        assert_eq!(data.get_int("nope"), 0);
        assert_eq!(data.get_double("nope"), 0.0);
        assert!(!data.get_bool("nope"));
    }

    #[test]
    fn doubles_read_integers_too() {
        let mut data = FilterData::new();
        data.set_int("radius", 7);
        assert_eq!(data.get_double("radius"), 7.0);
    }
}
