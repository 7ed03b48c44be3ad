//! Storage backends for encoded widget state.

use std::sync::{Arc, RwLock};

use url::Url;

/// URL query parameter holding the encoded state.
pub const STATE_PARAM: &str = "wm_state";

/// Where a backend keeps its state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageKind {
    /// A query parameter of the page URL.
    Url,
    /// Survives across sessions.
    Local,
    /// Cleared when the session ends.
    Session,
}

/// A slot holding one encoded state string.
pub trait StateStorage: Send + Sync + std::fmt::Debug {
    /// Backend kind.
    fn kind(&self) -> StorageKind;

    /// Read the encoded state, if any was saved.
    fn load(&self) -> Option<String>;

    /// Replace the encoded state.
    fn save(&self, encoded: &str);

    /// Remove the encoded state.
    fn clear(&self);
}

impl<T: StateStorage + ?Sized> StateStorage for Arc<T> {
    fn kind(&self) -> StorageKind {
        (**self).kind()
    }

    fn load(&self) -> Option<String> {
        (**self).load()
    }

    fn save(&self, encoded: &str) {
        (**self).save(encoded)
    }

    fn clear(&self) {
        (**self).clear()
    }
}

/// State kept in the `wm_state` query parameter of a URL.
///
/// Other query parameters are preserved in their original order.
#[derive(Debug)]
pub struct UrlStorage {
    url: RwLock<Url>,
}

impl UrlStorage {
    /// Wrap a page URL.
    pub fn new(url: Url) -> Self {
        Self {
            url: RwLock::new(url),
        }
    }

    /// Parse a page URL.
    pub fn parse(input: &str) -> Result<Self, url::ParseError> {
        Ok(Self::new(Url::parse(input)?))
    }

    /// Current URL, including the state parameter.
    pub fn url(&self) -> Url {
        match self.url.read() {
            Ok(url) => url.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn rewrite(&self, state: Option<&str>) {
        let mut url = match self.url.write() {
            Ok(url) => url,
            Err(poisoned) => poisoned.into_inner(),
        };
        let kept: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(key, _)| key != STATE_PARAM)
            .map(|(key, value)| (key.into_owned(), value.into_owned()))
            .collect();
        if kept.is_empty() && state.is_none() {
            url.set_query(None);
            return;
        }
        let mut pairs = url.query_pairs_mut();
        pairs.clear();
        for (key, value) in &kept {
            pairs.append_pair(key, value);
        }
        if let Some(state) = state {
            pairs.append_pair(STATE_PARAM, state);
        }
    }
}

impl StateStorage for UrlStorage {
    fn kind(&self) -> StorageKind {
        StorageKind::Url
    }

    fn load(&self) -> Option<String> {
        self.url()
            .query_pairs()
            .find(|(key, _)| key == STATE_PARAM)
            .map(|(_, value)| value.into_owned())
    }

    fn save(&self, encoded: &str) {
        self.rewrite(Some(encoded));
    }

    fn clear(&self) {
        self.rewrite(None);
    }
}

/// In-process stand-in for browser local or session storage.
#[derive(Debug)]
pub struct MemoryStorage {
    kind: StorageKind,
    slot: RwLock<Option<String>>,
}

impl MemoryStorage {
    /// Storage that survives across sessions.
    pub fn local() -> Self {
        Self {
            kind: StorageKind::Local,
            slot: RwLock::new(None),
        }
    }

    /// Storage cleared with the session.
    pub fn session() -> Self {
        Self {
            kind: StorageKind::Session,
            slot: RwLock::new(None),
        }
    }
}

impl StateStorage for MemoryStorage {
    fn kind(&self) -> StorageKind {
        self.kind
    }

    fn load(&self) -> Option<String> {
        self.slot.read().ok().and_then(|slot| slot.clone())
    }

    fn save(&self, encoded: &str) {
        if let Ok(mut slot) = self.slot.write() {
            *slot = Some(encoded.to_string());
        }
    }

    fn clear(&self) {
        if let Ok(mut slot) = self.slot.write() {
            *slot = None;
        }
    }
}
