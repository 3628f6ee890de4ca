//! Prebaked launch-argument store.
//!
//! Holds key/value overrides configured ahead of a launch, merged into every
//! composed payload beneath the call-site arguments. Owned exclusively by the
//! device instance.

use serde_json::{Map, Value};

/// Store of prebaked launch arguments, one value per key.
#[derive(Debug, Default)]
pub struct LaunchArgsStore {
    args: Map<String, Value>,
}

impl LaunchArgsStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store or overwrite a value for `key`. Passing `None` clears the key,
    /// exactly as [`clear`](Self::clear) does.
    pub fn set(&mut self, key: impl Into<String>, value: Option<Value>) {
        let key = key.into();
        match value {
            Some(value) => {
                self.args.insert(key, value);
            }
            None => {
                self.args.remove(&key);
            }
        }
    }

    /// Remove `key` if present; no-op otherwise.
    pub fn clear(&mut self, key: &str) {
        self.args.remove(key);
    }

    /// An owned copy of the current contents, safe to merge from without
    /// exposing the live map.
    pub fn snapshot(&self) -> Map<String, Value> {
        self.args.clone()
    }
}
