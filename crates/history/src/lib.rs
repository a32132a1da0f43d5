use api::{ChatMessage, ChatRole};
use foundation::truncate_chars;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// `localStorage` key holding the JSON array of saved sessions.
pub const SESSIONS_KEY: &str = "chatSessions";
pub const MAX_SAVED_SESSIONS: usize = 50;

const TITLE_CHARS: usize = 50;
const PREVIEW_CHARS: usize = 60;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatSession {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
    /// Milliseconds since the Unix epoch of the last save.
    pub timestamp: i64,
}

impl ChatSession {
    pub fn new(id: impl Into<String>, messages: Vec<ChatMessage>, timestamp: i64) -> Self {
        let title = session_title(&messages);
        Self {
            id: id.into(),
            title,
            messages,
            timestamp,
        }
    }

    /// First message truncated to 60 characters, or "New conversation".
    pub fn preview(&self) -> String {
        match self.messages.first() {
            Some(m) => {
                let cut = truncate_chars(&m.content, PREVIEW_CHARS);
                if cut.len() < m.content.len() {
                    format!("{cut}...")
                } else {
                    cut.to_string()
                }
            }
            None => "New conversation".to_string(),
        }
    }

    pub fn display_title(&self) -> &str {
        if self.title.is_empty() {
            "Chat Session"
        } else {
            &self.title
        }
    }

    pub fn matches(&self, query: &str) -> bool {
        let q = query.to_lowercase();
        self.title.to_lowercase().contains(&q)
            || self
                .messages
                .iter()
                .any(|m| m.content.to_lowercase().contains(&q))
    }

    /// `(text, is_user)` pairs in transcript order.
    pub fn replay(&self) -> impl Iterator<Item = (&str, bool)> + '_ {
        self.messages
            .iter()
            .map(|m| (m.content.as_str(), m.role == ChatRole::User))
    }
}

pub fn session_title(messages: &[ChatMessage]) -> String {
    match messages.first().map(|m| truncate_chars(&m.content, TITLE_CHARS)) {
        Some(t) if !t.is_empty() => t.to_string(),
        _ => "New Chat".to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    NotFound,
    StorageUnavailable,
    Corrupt(String),
    Io(String),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::NotFound => write!(f, "chat session not found"),
            StoreError::StorageUnavailable => write!(f, "browser storage unavailable"),
            StoreError::Corrupt(msg) => write!(f, "chat history corrupt: {msg}"),
            StoreError::Io(msg) => write!(f, "chat history storage error: {msg}"),
        }
    }
}

impl std::error::Error for StoreError {}

/// Raw persistence of the ordered session list (oldest first).
pub trait SessionStore {
    fn load(&self) -> Result<Vec<ChatSession>, StoreError>;
    fn store(&mut self, sessions: &[ChatSession]) -> Result<(), StoreError>;
}

#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    sessions: Vec<ChatSession>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for InMemorySessionStore {
    fn load(&self) -> Result<Vec<ChatSession>, StoreError> {
        Ok(self.sessions.clone())
    }

    fn store(&mut self, sessions: &[ChatSession]) -> Result<(), StoreError> {
        self.sessions = sessions.to_vec();
        Ok(())
    }
}

/// Saved conversations of the user chat, capped at the 50 most recent.
pub struct SessionHistory {
    store: Box<dyn SessionStore>,
    limit: usize,
}

impl SessionHistory {
    pub fn new(store: Box<dyn SessionStore>) -> Self {
        Self {
            store,
            limit: MAX_SAVED_SESSIONS,
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit.max(1);
        self
    }

    /// Upserts the session in place; an empty transcript is not saved.
    pub fn save(
        &mut self,
        id: &str,
        messages: &[ChatMessage],
        now_ms: i64,
    ) -> Result<bool, StoreError> {
        if messages.is_empty() {
            return Ok(false);
        }
        let mut sessions = self.store.load()?;
        let session = ChatSession::new(id, messages.to_vec(), now_ms);
        match sessions.iter_mut().find(|s| s.id == id) {
            Some(existing) => *existing = session,
            None => sessions.push(session),
        }
        if sessions.len() > self.limit {
            let excess = sessions.len() - self.limit;
            sessions.drain(..excess);
            debug!(dropped = excess, "trimmed saved chat sessions");
        }
        self.store.store(&sessions)?;
        Ok(true)
    }

    /// Most recently saved first.
    pub fn list(&self) -> Result<Vec<ChatSession>, StoreError> {
        let mut sessions = self.store.load()?;
        sessions.reverse();
        Ok(sessions)
    }

    pub fn search(&self, query: &str) -> Result<Vec<ChatSession>, StoreError> {
        let mut hits: Vec<_> = self
            .store
            .load()?
            .into_iter()
            .filter(|s| s.matches(query))
            .collect();
        hits.reverse();
        Ok(hits)
    }

    pub fn get(&self, id: &str) -> Result<ChatSession, StoreError> {
        self.store
            .load()?
            .into_iter()
            .find(|s| s.id == id)
            .ok_or(StoreError::NotFound)
    }

    pub fn delete(&mut self, id: &str) -> Result<bool, StoreError> {
        let mut sessions = self.store.load()?;
        let before = sessions.len();
        sessions.retain(|s| s.id != id);
        let removed = sessions.len() != before;
        if removed {
            self.store.store(&sessions)?;
        }
        Ok(removed)
    }
}

#[cfg(target_arch = "wasm32")]
mod wasm_storage {
    use super::{ChatSession, SESSIONS_KEY, SessionStore, StoreError};

    /// Sessions stored as one JSON array under a single `localStorage` key.
    #[derive(Debug)]
    pub struct LocalStorageSessionStore {
        key: String,
    }

    impl LocalStorageSessionStore {
        pub fn new() -> Result<Self, StoreError> {
            Self::with_key(SESSIONS_KEY)
        }

        pub fn with_key(key: impl Into<String>) -> Result<Self, StoreError> {
            window_local_storage()?;
            Ok(Self { key: key.into() })
        }
    }

    impl SessionStore for LocalStorageSessionStore {
        fn load(&self) -> Result<Vec<ChatSession>, StoreError> {
            let storage = window_local_storage()?;
            let raw = storage
                .get_item(&self.key)
                .map_err(|e| StoreError::Io(format!("get_item failed: {:?}", e)))?;
            let Some(raw) = raw else {
                return Ok(Vec::new());
            };
            if raw.trim().is_empty() {
                return Ok(Vec::new());
            }
            serde_json::from_str(&raw).map_err(|e| StoreError::Corrupt(e.to_string()))
        }

        fn store(&mut self, sessions: &[ChatSession]) -> Result<(), StoreError> {
            let storage = window_local_storage()?;
            let raw = serde_json::to_string(sessions).map_err(|e| StoreError::Io(e.to_string()))?;
            storage
                .set_item(&self.key, &raw)
                .map_err(|e| StoreError::Io(format!("set_item failed: {:?}", e)))
        }
    }

    fn window_local_storage() -> Result<web_sys::Storage, StoreError> {
        let win = web_sys::window().ok_or(StoreError::StorageUnavailable)?;
        win.local_storage()
            .map_err(|e| StoreError::Io(format!("localStorage error: {:?}", e)))?
            .ok_or(StoreError::StorageUnavailable)
    }
}

#[cfg(target_arch = "wasm32")]
pub use wasm_storage::LocalStorageSessionStore;

#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug)]
pub struct LocalStorageSessionStore;

#[cfg(not(target_arch = "wasm32"))]
impl LocalStorageSessionStore {
    pub fn new() -> Result<Self, StoreError> {
        Err(StoreError::StorageUnavailable)
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl SessionStore for LocalStorageSessionStore {
    fn load(&self) -> Result<Vec<ChatSession>, StoreError> {
        Err(StoreError::StorageUnavailable)
    }

    fn store(&mut self, _sessions: &[ChatSession]) -> Result<(), StoreError> {
        Err(StoreError::StorageUnavailable)
    }
}
