//! Per-widget state on top of a storage backend.

use std::sync::Mutex;

use serde_json::{Map, Value};

use super::codec::{CodecError, decode, encode};
use super::storage::{StateStorage, StorageKind};

/// Reads and writes the state of named widgets.
///
/// All widgets share one encoded object in the backend, keyed by widget
/// name. Writes are read-modify-write under a lock.
#[derive(Debug)]
pub struct StateHandler {
    storage: Box<dyn StateStorage>,
    lock: Mutex<()>,
}

impl StateHandler {
    /// Create a handler over a backend.
    pub fn new(storage: impl StateStorage + 'static) -> Self {
        Self {
            storage: Box::new(storage),
            lock: Mutex::new(()),
        }
    }

    /// Backend kind.
    pub fn kind(&self) -> StorageKind {
        self.storage.kind()
    }

    /// The backend.
    pub fn storage(&self) -> &dyn StateStorage {
        self.storage.as_ref()
    }

    /// Every widget's state.
    pub fn all(&self) -> Result<Map<String, Value>, CodecError> {
        let Some(encoded) = self.storage.load() else {
            return Ok(Map::new());
        };
        match decode(&encoded)? {
            Value::Object(map) => Ok(map),
            _ => Ok(Map::new()),
        }
    }

    /// State of one widget.
    pub fn get_widget_state(&self, name: &str) -> Result<Option<Value>, CodecError> {
        Ok(self.all()?.remove(name))
    }

    /// Replace the state of one widget.
    ///
    /// Undecodable stored state is discarded rather than blocking the write.
    pub fn set_widget_state(&self, name: &str, state: Value) {
        self.modify(|map| {
            map.insert(name.to_string(), state);
        });
    }

    /// Forget the state of one widget.
    pub fn remove_widget_state(&self, name: &str) {
        self.modify(|map| {
            map.remove(name);
        });
    }

    /// Drop every widget's state.
    pub fn clear(&self) {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        self.storage.clear();
    }

    fn modify<F>(&self, f: F)
    where
        F: FnOnce(&mut Map<String, Value>),
    {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut map = self.all().unwrap_or_else(|e| {
            log::warn!("Discarding unreadable widget state: {}", e);
            Map::new()
        });
        f(&mut map);
        if map.is_empty() {
            self.storage.clear();
        } else {
            self.storage.save(&encode(&Value::Object(map)));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persist::MemoryStorage;
    use serde_json::json;

    #[test]
    fn test_widget_states_share_one_slot() {
        let handler = StateHandler::new(MemoryStorage::local());
        handler.set_widget_state("tabs1", json!({"activeIndex": 2}));
        handler.set_widget_state("orders", json!({"page": 3}));

        assert_eq!(
            handler.get_widget_state("tabs1").unwrap(),
            Some(json!({"activeIndex": 2}))
        );
        assert_eq!(
            handler.storage().load().as_deref(),
            Some("(tabs1~(activeIndex~2)_orders~(page~3))")
        );

        handler.remove_widget_state("tabs1");
        assert_eq!(handler.get_widget_state("tabs1").unwrap(), None);
        handler.remove_widget_state("orders");
        assert_eq!(handler.storage().load(), None);
    }

    #[test]
    fn test_unreadable_state_is_replaced() {
        let storage = MemoryStorage::session();
        storage.save("(broken");
        let handler = StateHandler::new(storage);
        assert!(handler.get_widget_state("x").is_err());
        handler.set_widget_state("x", json!(1));
        assert_eq!(handler.get_widget_state("x").unwrap(), Some(json!(1)));
    }
}
