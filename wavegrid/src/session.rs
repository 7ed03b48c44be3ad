//! Per-session context shared by the widgets of one user session.
//!
//! Holds what would otherwise be process-wide caches: resolved role
//! checks, app variables and the widget state handler. A host creates one
//! per login and calls [`SessionContext::reset`] on logout.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde_json::Value;
use uuid::Uuid;

use crate::persist::{MemoryStorage, StateHandler, StorageKind};

type AccessResolver = Box<dyn Fn(&str) -> bool + Send + Sync>;

/// Context for one user session.
pub struct SessionContext {
    id: Uuid,
    created_at: DateTime<Utc>,
    resolver: AccessResolver,
    access: DashMap<String, bool>,
    variables: DashMap<String, Value>,
    state: StateHandler,
}

impl std::fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionContext")
            .field("id", &self.id)
            .field("created_at", &self.created_at)
            .field("cached_roles", &self.access.len())
            .field("variables", &self.variables.len())
            .field("state", &self.state.kind())
            .finish()
    }
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::new(|_| true)
    }
}

impl SessionContext {
    /// Create a session whose role checks go through `resolver`.
    ///
    /// Widget state goes to session storage.
    pub fn new<F>(resolver: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        Self::with_state(resolver, StateHandler::new(MemoryStorage::session()))
    }

    /// Create a session with an explicit widget state handler.
    pub fn with_state<F>(resolver: F, state: StateHandler) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        let id = Uuid::new_v4();
        log::debug!("Session {} started", id);
        Self {
            id,
            created_at: Utc::now(),
            resolver: Box::new(resolver),
            access: DashMap::new(),
            variables: DashMap::new(),
            state,
        }
    }

    /// Session id.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// When the session started.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Whether the user holds `role`. Resolved once per role and cached.
    pub fn is_allowed(&self, role: &str) -> bool {
        if let Some(allowed) = self.access.get(role) {
            return *allowed;
        }
        let allowed = (self.resolver)(role);
        self.access.insert(role.to_string(), allowed);
        allowed
    }

    /// Number of cached role checks.
    pub fn cached_roles(&self) -> usize {
        self.access.len()
    }

    /// Read an app variable.
    pub fn variable(&self, name: &str) -> Option<Value> {
        self.variables.get(name).map(|entry| entry.value().clone())
    }

    /// Set an app variable, returning the previous value.
    pub fn set_variable(&self, name: impl Into<String>, value: Value) -> Option<Value> {
        self.variables.insert(name.into(), value)
    }

    /// Widget state handler.
    pub fn state(&self) -> &StateHandler {
        &self.state
    }

    /// Clear everything tied to the logged-in user.
    ///
    /// Session-scoped widget state is dropped; URL and local state survive.
    pub fn reset(&self) {
        self.access.clear();
        self.variables.clear();
        if self.state.kind() == StorageKind::Session {
            self.state.clear();
        }
        log::debug!("Session {} reset", self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_access_checks_are_cached() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let session = SessionContext::new(move |role| {
            counter.fetch_add(1, Ordering::SeqCst);
            role == "editor"
        });
        assert!(session.is_allowed("editor"));
        assert!(session.is_allowed("editor"));
        assert!(!session.is_allowed("admin"));
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        session.reset();
        assert_eq!(session.cached_roles(), 0);
        assert!(session.is_allowed("editor"));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_reset_clears_variables_and_session_state() {
        let session = SessionContext::default();
        session.set_variable("region", json!("eu"));
        session.state().set_widget_state("tabs", json!({"activeIndex": 1}));
        assert_eq!(session.variable("region"), Some(json!("eu")));

        session.reset();
        assert_eq!(session.variable("region"), None);
        assert_eq!(session.state().get_widget_state("tabs").unwrap(), None);
    }

    #[test]
    fn test_reset_keeps_local_state() {
        let session = SessionContext::with_state(|_| true, StateHandler::new(MemoryStorage::local()));
        session.state().set_widget_state("tabs", json!(1));
        session.reset();
        assert_eq!(session.state().get_widget_state("tabs").unwrap(), Some(json!(1)));
    }
}
