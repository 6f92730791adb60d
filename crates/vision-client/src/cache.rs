//! Locally cached server configuration.

use serde_json::Value;
use vision_protocol::Payload;

/// Configuration accumulated from `config` pushes.
///
/// Updates are merged into the cache: objects merge key by key, any other
/// value replaces what was there.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigCache {
    values: Payload,
}

impl ConfigCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge a pushed configuration into the cache.
    pub fn merge(&mut self, update: Payload) {
        merge_map(&mut self.values, update);
    }

    /// Cached configuration.
    pub fn values(&self) -> &Payload {
        &self.values
    }

    /// Whether `models.<model>` is present.
    pub fn has_model(&self, model: &str) -> bool {
        self.values
            .get("models")
            .and_then(Value::as_object)
            .is_some_and(|models| models.contains_key(model))
    }

    /// First entry of `models.<model>.config.device`.
    pub fn first_device(&self, model: &str) -> Option<&str> {
        self.values
            .get("models")?
            .get(model)?
            .get("config")?
            .get("device")?
            .as_array()?
            .first()?
            .as_str()
    }
}

fn merge_map(target: &mut Payload, update: Payload) {
    for (key, value) in update {
        let Value::Object(incoming) = value else {
            target.insert(key, value);
            continue;
        };

        if let Some(Value::Object(existing)) = target.get_mut(&key) {
            merge_map(existing, incoming);
        } else {
            target.insert(key, Value::Object(incoming));
        }
    }
}
