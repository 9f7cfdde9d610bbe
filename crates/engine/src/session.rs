//! Per-user editor state kept between requests.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::trace;

use formforge_core::{Draft, SessionId};

use crate::error::EngineError;

/// Opaque byte storage keyed by session. Implementations decide where the
/// bytes live; the engine only encodes and decodes them.
pub trait SessionStore {
    fn load(&self, session: SessionId) -> Result<Option<Vec<u8>>, EngineError>;

    fn save(&mut self, session: SessionId, bytes: Vec<u8>) -> Result<(), EngineError>;

    fn clear(&mut self, session: SessionId) -> Result<(), EngineError>;
}

#[derive(Debug, Default)]
pub struct MemorySessionStore {
    entries: HashMap<SessionId, Vec<u8>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self, session: SessionId) -> Result<Option<Vec<u8>>, EngineError> {
        Ok(self.entries.get(&session).cloned())
    }

    fn save(&mut self, session: SessionId, bytes: Vec<u8>) -> Result<(), EngineError> {
        self.entries.insert(session, bytes);
        Ok(())
    }

    fn clear(&mut self, session: SessionId) -> Result<(), EngineError> {
        self.entries.remove(&session);
        Ok(())
    }
}

/// What one session holds: the form draft (absent means the editor is
/// empty) and the choice list being built for a select field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionData {
    pub draft: Option<Draft>,
    pub choices: Vec<String>,
}

impl SessionData {
    pub fn to_bytes(&self) -> Result<Vec<u8>, EngineError> {
        rmp_serde::to_vec(self).map_err(|e| EngineError::Session(e.to_string()))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, EngineError> {
        rmp_serde::from_slice(bytes).map_err(|e| EngineError::Session(e.to_string()))
    }

    pub fn load(store: &impl SessionStore, session: SessionId) -> Result<Self, EngineError> {
        match store.load(session)? {
            Some(bytes) => Self::from_bytes(&bytes),
            None => Ok(Self::default()),
        }
    }

    /// Write back, dropping the entry entirely once nothing is left in it.
    pub fn store(&self, store: &mut impl SessionStore, session: SessionId) -> Result<(), EngineError> {
        if *self == Self::default() {
            trace!(%session, "clearing empty session");
            store.clear(session)
        } else {
            store.save(session, self.to_bytes()?)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use formforge_core::FieldType;

    #[test]
    fn missing_session_loads_as_empty() {
        let store = MemorySessionStore::new();
        let data = SessionData::load(&store, SessionId::new()).unwrap();
        assert_eq!(data, SessionData::default());
    }

    #[test]
    fn draft_survives_encoding() {
        let mut store = MemorySessionStore::new();
        let session = SessionId::new();

        let mut draft = Draft::new();
        draft.add_static("body", FieldType::TextArea, "Body").unwrap();
        draft
            .add_select("favorite", "Color", vec!["Red".into(), "Blue".into()])
            .unwrap();
        let data = SessionData {
            draft: Some(draft),
            choices: vec!["S".into()],
        };
        data.store(&mut store, session).unwrap();

        assert_eq!(SessionData::load(&store, session).unwrap(), data);
    }

    #[test]
    fn sessions_are_isolated() {
        let mut store = MemorySessionStore::new();
        let (a, b) = (SessionId::new(), SessionId::new());
        let data = SessionData {
            draft: None,
            choices: vec!["x".into()],
        };
        data.store(&mut store, a).unwrap();

        assert_eq!(SessionData::load(&store, b).unwrap(), SessionData::default());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn storing_empty_data_clears_the_entry() {
        let mut store = MemorySessionStore::new();
        let session = SessionId::new();
        SessionData {
            draft: Some(Draft::new()),
            choices: vec![],
        }
        .store(&mut store, session)
        .unwrap();
        assert_eq!(store.len(), 1);

        SessionData::default().store(&mut store, session).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn garbage_bytes_are_a_session_error() {
        let mut store = MemorySessionStore::new();
        let session = SessionId::new();
        store.save(session, vec![0xc1]).unwrap();
        assert!(matches!(
            SessionData::load(&store, session),
            Err(EngineError::Session(_))
        ));
    }
}
